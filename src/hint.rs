//! RTP hint sample entry and the additional-data boxes it carries.

use crate::boxes::{
    BoxHeader, FourCC, HintBox, RtpHintSampleEntry, SampleEntryHeader, SequenceOffset, TimeOffset,
    TimeScaleEntry,
};
use crate::cursor::ByteCursor;
use crate::parser::{DecodeBox, DecodeError, DecodeOptions, Result, check_fixed, decode_children};
use crate::registry::{Registry, hint_registry};

impl SampleEntryHeader {
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let _reserved = cursor.read_bytes(6)?;
        let data_reference_index = cursor.read_u16()?;
        Ok(SampleEntryHeader { data_reference_index })
    }
}

impl RtpHintSampleEntry {
    /// Decode the body of an `rtp ` entry, resolving additional data through
    /// `registry`.
    pub fn decode_body_with(
        cursor: &mut ByteCursor<'_>,
        hdr: &BoxHeader,
        registry: &Registry<HintBox>,
        opts: &DecodeOptions,
    ) -> Result<Self> {
        check_fixed(hdr, Self::FIXED_SIZE, opts)?;

        let header = SampleEntryHeader::decode(cursor)?;
        let hint_track_version = cursor.read_u16()?;
        let highest_compatible_version = cursor.read_u16()?;
        let max_packet_size = cursor.read_u32()?;

        let additional_boxes =
            decode_children(cursor, hdr, u64::from(Self::FIXED_SIZE), registry, opts)?;

        Ok(RtpHintSampleEntry {
            size: hdr.size,
            header,
            hint_track_version,
            highest_compatible_version,
            max_packet_size,
            additional_boxes,
        })
    }
}

impl DecodeBox for RtpHintSampleEntry {
    const TYPE: FourCC = FourCC::RTP;

    fn decode_body(cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<Self> {
        Self::decode_body_with(cursor, hdr, hint_registry(), opts)
    }
}

/// Read a leaf holding a single 32-bit word.
///
/// An empty payload leaves the value unset. Bytes past the word are consumed
/// and returned so the box still accounts for its declared length.
fn read_word_leaf<'c, T>(
    cursor: &mut ByteCursor<'c>,
    hdr: &BoxHeader,
    read: impl FnOnce(&mut ByteCursor<'c>) -> Result<T>,
) -> Result<(Option<T>, Vec<u8>)> {
    let len = hdr.payload_len();
    match len {
        0 => Ok((None, Vec::new())),
        1..=3 => Err(DecodeError::InvalidPayload { tag: hdr.typ, len }),
        _ => {
            let value = read(cursor)?;
            let trailing = cursor.read_bytes((len - 4) as usize)?;
            if !trailing.is_empty() {
                log::warn!("{} @ {}: {} trailing bytes", hdr.typ, hdr.start, trailing.len());
            }
            Ok((Some(value), trailing))
        }
    }
}

impl DecodeBox for TimeScaleEntry {
    const TYPE: FourCC = FourCC::TIMS;

    fn decode_body(cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, _opts: &DecodeOptions) -> Result<Self> {
        let (timescale, trailing) = read_word_leaf(cursor, hdr, ByteCursor::read_u32)?;
        Ok(TimeScaleEntry { size: hdr.size, timescale, trailing })
    }
}

impl DecodeBox for TimeOffset {
    const TYPE: FourCC = FourCC::TSRO;

    fn decode_body(cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, _opts: &DecodeOptions) -> Result<Self> {
        let (offset, trailing) = read_word_leaf(cursor, hdr, ByteCursor::read_i32)?;
        Ok(TimeOffset { size: hdr.size, offset, trailing })
    }
}

impl DecodeBox for SequenceOffset {
    const TYPE: FourCC = FourCC::SNRO;

    fn decode_body(cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, _opts: &DecodeOptions) -> Result<Self> {
        let (offset, trailing) = read_word_leaf(cursor, hdr, ByteCursor::read_i32)?;
        Ok(SequenceOffset { size: hdr.size, offset, trailing })
    }
}
