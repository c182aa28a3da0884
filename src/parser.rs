use crate::boxes::{BoxHeader, FourCC, SampleDescription, SampleEntry};
use crate::cursor::ByteCursor;
use crate::registry::{Registry, sample_entry_registry};

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("truncated input: {needed} bytes needed at offset {offset}")]
    TruncatedInput { offset: u64, needed: usize },
    #[error("unknown box `{tag}` in `{parent}`")]
    UnknownBoxType { tag: FourCC, parent: FourCC },
    #[error("expected `{expected}` box, found `{found}`")]
    UnexpectedBoxType { expected: FourCC, found: FourCC },
    #[error("`{parent}` declares {declared} bytes but its contents account for {consumed}")]
    SizeAccounting { parent: FourCC, declared: u64, consumed: u64 },
    #[error("invalid size {size} for `{tag}` box")]
    InvalidSize { tag: FourCC, size: u32 },
    #[error("`{tag}` payload of {len} bytes matches no known layout")]
    InvalidPayload { tag: FourCC, len: u32 },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Cursor offset the error is tied to, when there is one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            DecodeError::TruncatedInput { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// How a composite box reacts when its children do not land exactly on its
/// declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    /// Any mismatch is a [`DecodeError::SizeAccounting`]. A child whose
    /// header or declared length would run past its parent is rejected before
    /// any of it is read.
    #[default]
    Strict,
    /// Keep reading children while the running total is below the declared
    /// size and accept an overshoot with a warning.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub size_policy: SizePolicy,
}

impl DecodeOptions {
    pub fn lenient() -> Self {
        Self { size_policy: SizePolicy::Lenient }
    }

    fn strict(&self) -> bool {
        self.size_policy == SizePolicy::Strict
    }
}

/// A box that can decode its own body once the caller has read its header.
///
/// `decode_body` must consume exactly `hdr.payload_len()` bytes; the caller
/// adds the 8 header bytes to its own running total.
pub trait DecodeBox: Sized {
    const TYPE: FourCC;

    fn decode_body(cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<Self>;
}

pub fn read_box_header(cursor: &mut ByteCursor<'_>) -> Result<BoxHeader> {
    let start = cursor.consumed();
    let size = cursor.read_u32()?;
    let typ = cursor.read_tag()?;

    // 0 (to end of file) and 1 (64-bit size) are not used inside sample descriptions
    if size < BoxHeader::SIZE {
        return Err(DecodeError::InvalidSize { tag: typ, size });
    }

    Ok(BoxHeader { size, typ, start })
}

/// Read a header of type `T::TYPE` and decode the whole box.
///
/// Returns the box together with the number of bytes consumed, header
/// included.
pub fn decode_box<T: DecodeBox>(cursor: &mut ByteCursor<'_>, opts: &DecodeOptions) -> Result<(T, u64)> {
    let hdr = read_box_header(cursor)?;
    if hdr.typ != T::TYPE {
        return Err(DecodeError::UnexpectedBoxType { expected: T::TYPE, found: hdr.typ });
    }
    let value = T::decode_body(cursor, &hdr, opts)?;
    let consumed = cursor.consumed() - hdr.start;
    check_consumed(&hdr, consumed, opts)?;
    Ok((value, consumed))
}

/// Decode a single sample entry, dispatching on its format tag.
pub fn decode_sample_entry(cursor: &mut ByteCursor<'_>, opts: &DecodeOptions) -> Result<(SampleEntry, u64)> {
    decode_sample_entry_with(cursor, sample_entry_registry(), opts)
}

pub fn decode_sample_entry_with(
    cursor: &mut ByteCursor<'_>,
    registry: &Registry<SampleEntry>,
    opts: &DecodeOptions,
) -> Result<(SampleEntry, u64)> {
    let hdr = read_box_header(cursor)?;
    let entry = registry
        .resolve(&hdr.typ)
        .ok_or(DecodeError::UnknownBoxType { tag: hdr.typ, parent: FourCC::STSD })?;
    let value = entry.decode(cursor, &hdr, opts)?;
    let consumed = cursor.consumed() - hdr.start;
    check_consumed(&hdr, consumed, opts)?;
    Ok((value, consumed))
}

/// Decode children of `parent` until the running total reaches its declared
/// size.
///
/// `count` is what the parent has already consumed, its own header included.
pub fn decode_children<T>(
    cursor: &mut ByteCursor<'_>,
    parent: &BoxHeader,
    mut count: u64,
    registry: &Registry<T>,
    opts: &DecodeOptions,
) -> Result<Vec<T>> {
    let declared = u64::from(parent.size);
    let mut children = Vec::new();
    while count < declared {
        let (child, used) = decode_child(cursor, parent, count, registry, opts)?;
        count += used;
        children.push(child);
    }
    check_total(parent, count, opts)?;
    Ok(children)
}

/// Read one child header, resolve it and decode its body. Returns the child
/// and the bytes it took, header included.
fn decode_child<T>(
    cursor: &mut ByteCursor<'_>,
    parent: &BoxHeader,
    count: u64,
    registry: &Registry<T>,
    opts: &DecodeOptions,
) -> Result<(T, u64)> {
    let declared = u64::from(parent.size);
    let header_end = count + u64::from(BoxHeader::SIZE);
    if opts.strict() && header_end > declared {
        return Err(DecodeError::SizeAccounting { parent: parent.typ, declared, consumed: header_end });
    }
    let hdr = read_box_header(cursor)?;
    let entry = registry
        .resolve(&hdr.typ)
        .ok_or(DecodeError::UnknownBoxType { tag: hdr.typ, parent: parent.typ })?;

    let end = count + u64::from(hdr.size);
    if opts.strict() && end > declared {
        return Err(DecodeError::SizeAccounting { parent: parent.typ, declared, consumed: end });
    }

    log::debug!("{} @ {}: {} ({} bytes) in {}", hdr.typ, hdr.start, entry.label(), hdr.size, parent.typ);
    let child = entry.decode(cursor, &hdr, opts)?;
    let used = cursor.consumed() - hdr.start;
    check_consumed(&hdr, used, opts)?;
    Ok((child, used))
}

/// Strict-only counterpart of [`check_total`] for callers that read a box's
/// header. Composites report their own mismatches, so nothing is logged here.
fn check_consumed(hdr: &BoxHeader, consumed: u64, opts: &DecodeOptions) -> Result<()> {
    if opts.strict() {
        check_total(hdr, consumed, opts)?;
    }
    Ok(())
}

/// Compare what a box consumed against what it declared.
pub(crate) fn check_total(hdr: &BoxHeader, consumed: u64, opts: &DecodeOptions) -> Result<()> {
    let declared = u64::from(hdr.size);
    if consumed == declared {
        return Ok(());
    }
    if opts.strict() {
        return Err(DecodeError::SizeAccounting { parent: hdr.typ, declared, consumed });
    }
    log::warn!("{} @ {}: declared {} bytes, consumed {}", hdr.typ, hdr.start, declared, consumed);
    Ok(())
}

/// Fail early when a box cannot even hold its fixed fields.
pub(crate) fn check_fixed(hdr: &BoxHeader, fixed: u32, opts: &DecodeOptions) -> Result<()> {
    if opts.strict() && hdr.size < fixed {
        return Err(DecodeError::SizeAccounting {
            parent: hdr.typ,
            declared: u64::from(hdr.size),
            consumed: u64::from(fixed),
        });
    }
    Ok(())
}

impl SampleDescription {
    pub const FIXED_SIZE: u32 = BoxHeader::SIZE + 8;

    /// Decode an `stsd` body, dispatching entries through `registry`.
    pub fn decode_body_with(
        cursor: &mut ByteCursor<'_>,
        hdr: &BoxHeader,
        registry: &Registry<SampleEntry>,
        opts: &DecodeOptions,
    ) -> Result<Self> {
        check_fixed(hdr, Self::FIXED_SIZE, opts)?;
        let version = cursor.read_u8()?;
        let flags = cursor.read_u24()?;
        let entry_count = cursor.read_u32()?;
        let mut count = u64::from(Self::FIXED_SIZE);

        // entry_count is untrusted; let the vector grow with real entries
        let mut entries = Vec::new();
        for _ in 0..entry_count {
            let (entry, used) = decode_child(cursor, hdr, count, registry, opts)?;
            count += used;
            entries.push(entry);
        }
        check_total(hdr, count, opts)?;

        Ok(SampleDescription { size: hdr.size, version, flags, entries })
    }
}

impl DecodeBox for SampleDescription {
    const TYPE: FourCC = FourCC::STSD;

    fn decode_body(cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<Self> {
        Self::decode_body_with(cursor, hdr, sample_entry_registry(), opts)
    }
}
