use serde::Serializer;
use std::io::{Read, Seek, SeekFrom};

/// Up to `len` bytes starting at `offset`; shorter when the source ends first.
pub fn read_slice<R: Read + Seek>(r: &mut R, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    r.seek(SeekFrom::Start(offset))?;
    let mut v = Vec::new();
    r.take(len).read_to_end(&mut v)?;
    Ok(v)
}

/// Hex dump of `bytes`, whose first byte sits at `start_offset`.
///
/// Lines are 16 bytes wide; the byte at `mark` (an absolute offset), if it
/// falls inside the dump, is bracketed.
pub fn hex_dump(bytes: &[u8], start_offset: u64, mark: Option<u64>) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let offs = start_offset + (i as u64) * 16;
        let hexs: String = chunk.iter().enumerate().map(|(j, b)| {
            if mark == Some(offs + j as u64) { format!("[{:02x}]", b) } else { format!("{:02x} ", b) }
        }).collect();
        let ascii: String = chunk.iter().map(|b| {
            let c = *b;
            if (32..=126).contains(&c) { c as char } else { '.' }
        }).collect();
        out.push_str(&format!("{:08x}  {:<50}  |{}|\n", offs, hexs, ascii));
    }
    out
}

pub(crate) fn serialize_hex<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}
