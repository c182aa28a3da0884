use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const RTP: FourCC = FourCC(*b"rtp ");
    pub const STSD: FourCC = FourCC(*b"stsd");
    pub const TIMS: FourCC = FourCC(*b"tims");
    pub const TSRO: FourCC = FourCC(*b"tsro");
    pub const SNRO: FourCC = FourCC(*b"snro");

    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

/// The `(length, type)` pair that precedes every box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub size: u32,   // total size including this header
    pub typ: FourCC,
    pub start: u64,  // cursor offset of header start
}

impl BoxHeader {
    pub const SIZE: u32 = 8;

    /// Bytes left for the body once the header itself is accounted for.
    pub fn payload_len(&self) -> u32 {
        self.size.saturating_sub(Self::SIZE)
    }
}

/// Codec-neutral fields shared by every sample entry: six reserved bytes and
/// the data reference index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SampleEntryHeader {
    pub data_reference_index: u16,
}

impl SampleEntryHeader {
    pub const SIZE: u32 = 8;
}

/// `rtp ` sample entry of an RTP hint track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RtpHintSampleEntry {
    pub size: u32,
    pub header: SampleEntryHeader,
    pub hint_track_version: u16,
    pub highest_compatible_version: u16,
    pub max_packet_size: u32,
    /// Additional data boxes in stream order. Repeats are kept.
    pub additional_boxes: Vec<HintBox>,
}

impl RtpHintSampleEntry {
    /// Box header, sample entry header and the three hint fields.
    pub const FIXED_SIZE: u32 = BoxHeader::SIZE + SampleEntryHeader::SIZE + 8;
}

/// `tims`: RTP timestamp clock rate of the hint track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeScaleEntry {
    pub size: u32,
    pub timescale: Option<u32>,
    #[serde(serialize_with = "crate::util::serialize_hex", skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<u8>,
}

/// `tsro`: offset added to the stored RTP timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeOffset {
    pub size: u32,
    pub offset: Option<i32>,
    #[serde(serialize_with = "crate::util::serialize_hex", skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<u8>,
}

/// `snro`: offset added to the stored RTP sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceOffset {
    pub size: u32,
    pub offset: Option<i32>,
    #[serde(serialize_with = "crate::util::serialize_hex", skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<u8>,
}

/// A child box of an RTP hint sample entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum HintBox {
    #[serde(rename = "tims")]
    TimeScale(TimeScaleEntry),
    #[serde(rename = "tsro")]
    TimeOffset(TimeOffset),
    #[serde(rename = "snro")]
    SequenceOffset(SequenceOffset),
}

impl HintBox {
    pub fn tag(&self) -> FourCC {
        match self {
            HintBox::TimeScale(_) => FourCC::TIMS,
            HintBox::TimeOffset(_) => FourCC::TSRO,
            HintBox::SequenceOffset(_) => FourCC::SNRO,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            HintBox::TimeScale(b) => b.size,
            HintBox::TimeOffset(b) => b.size,
            HintBox::SequenceOffset(b) => b.size,
        }
    }
}

/// One entry of a sample description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format")]
pub enum SampleEntry {
    #[serde(rename = "rtp ")]
    RtpHint(RtpHintSampleEntry),
}

impl SampleEntry {
    pub fn tag(&self) -> FourCC {
        match self {
            SampleEntry::RtpHint(_) => FourCC::RTP,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            SampleEntry::RtpHint(e) => e.size,
        }
    }
}

/// `stsd`: the ordered sample entries of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleDescription {
    pub size: u32,
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<SampleEntry>,
}
