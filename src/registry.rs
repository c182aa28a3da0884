use crate::boxes::{
    BoxHeader, FourCC, HintBox, RtpHintSampleEntry, SampleEntry, SequenceOffset, TimeOffset,
    TimeScaleEntry,
};
use crate::cursor::ByteCursor;
use crate::parser::{DecodeBox, DecodeOptions, Result};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Trait for box decoders.
///
/// A decoder interprets the body of one box type (the header has already
/// been read by the caller) and returns a value of the family `T`.
pub trait BoxDecoder<T>: Send + Sync {
    fn decode(&self, cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<T>;
}

/// Registry of decoders keyed by type tag.
///
/// The registry is immutable once constructed; use [`Registry::with_decoder`]
/// to build it fluently. Lookups compare all four tag bytes exactly.
pub struct Registry<T> {
    map: HashMap<FourCC, RegistryEntry<T>>,
}

pub struct RegistryEntry<T> {
    inner: Box<dyn BoxDecoder<T>>,
    label: String,
}

impl<T> RegistryEntry<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn decode(&self, cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<T> {
        self.inner.decode(cursor, hdr, opts)
    }
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with the given decoder added.
    ///
    /// `label` is human-readable and used for logging and listings.
    pub fn with_decoder(mut self, tag: FourCC, label: &str, dec: Box<dyn BoxDecoder<T>>) -> Self {
        self.map.insert(
            tag,
            RegistryEntry {
                inner: dec,
                label: label.to_string(),
            },
        );
        self
    }

    pub fn resolve(&self, tag: &FourCC) -> Option<&RegistryEntry<T>> {
        self.map.get(tag)
    }

    pub fn contains(&self, tag: &FourCC) -> bool {
        self.map.contains_key(tag)
    }

    pub fn label(&self, tag: &FourCC) -> Option<&str> {
        self.resolve(tag).map(RegistryEntry::label)
    }

    /// Registered tags in byte order.
    pub fn tags(&self) -> Vec<FourCC> {
        let mut tags: Vec<FourCC> = self.map.keys().copied().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------- Decoders ----------

pub struct TimsDecoder;

impl BoxDecoder<HintBox> for TimsDecoder {
    fn decode(&self, cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<HintBox> {
        TimeScaleEntry::decode_body(cursor, hdr, opts).map(HintBox::TimeScale)
    }
}

pub struct TsroDecoder;

impl BoxDecoder<HintBox> for TsroDecoder {
    fn decode(&self, cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<HintBox> {
        TimeOffset::decode_body(cursor, hdr, opts).map(HintBox::TimeOffset)
    }
}

pub struct SnroDecoder;

impl BoxDecoder<HintBox> for SnroDecoder {
    fn decode(&self, cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<HintBox> {
        SequenceOffset::decode_body(cursor, hdr, opts).map(HintBox::SequenceOffset)
    }
}

// rtp : additional data resolved through the default hint registry
pub struct RtpDecoder;

impl BoxDecoder<SampleEntry> for RtpDecoder {
    fn decode(&self, cursor: &mut ByteCursor<'_>, hdr: &BoxHeader, opts: &DecodeOptions) -> Result<SampleEntry> {
        RtpHintSampleEntry::decode_body(cursor, hdr, opts).map(SampleEntry::RtpHint)
    }
}

impl Registry<HintBox> {
    /// Additional-data boxes of an RTP hint sample entry.
    pub fn hint_track() -> Self {
        Registry::new()
            .with_decoder(FourCC::TIMS, "time scale entry", Box::new(TimsDecoder))
            .with_decoder(FourCC::TSRO, "time offset", Box::new(TsroDecoder))
            .with_decoder(FourCC::SNRO, "sequence offset", Box::new(SnroDecoder))
    }
}

impl Registry<SampleEntry> {
    /// Sample entry formats understood inside `stsd`.
    pub fn sample_entries() -> Self {
        Registry::new().with_decoder(FourCC::RTP, "RTP hint sample entry", Box::new(RtpDecoder))
    }
}

static HINT_REGISTRY: LazyLock<Registry<HintBox>> = LazyLock::new(Registry::<HintBox>::hint_track);
static SAMPLE_ENTRY_REGISTRY: LazyLock<Registry<SampleEntry>> = LazyLock::new(Registry::<SampleEntry>::sample_entries);

/// Process-wide hint-track registry, built on first use and never mutated.
pub fn hint_registry() -> &'static Registry<HintBox> {
    &HINT_REGISTRY
}

pub fn sample_entry_registry() -> &'static Registry<SampleEntry> {
    &SAMPLE_ENTRY_REGISTRY
}

/// Build both default registries now rather than on the first decode.
pub fn init() {
    LazyLock::force(&HINT_REGISTRY);
    LazyLock::force(&SAMPLE_ENTRY_REGISTRY);
}
