pub mod boxes;
pub mod cursor;
pub mod hint;
pub mod parser;
pub mod registry;
pub mod util;

pub use boxes::{
    BoxHeader, FourCC, HintBox, RtpHintSampleEntry, SampleDescription, SampleEntry,
    SampleEntryHeader, SequenceOffset, TimeOffset, TimeScaleEntry,
};
pub use cursor::ByteCursor;
pub use parser::{
    DecodeBox, DecodeError, DecodeOptions, SizePolicy, decode_box, decode_children,
    decode_sample_entry, read_box_header,
};
pub use registry::{BoxDecoder, Registry, hint_registry, sample_entry_registry};
