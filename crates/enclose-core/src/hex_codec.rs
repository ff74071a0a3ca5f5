//! Hexadecimal rendering of byte buffers
//!
//! Digests are turned into directory names with [`encode_hex`], so the output
//! is always lowercase and exactly twice as long as the input.

use crate::Result;

/// Encode bytes as lowercase hexadecimal, two digits per byte.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Encode signed bytes as lowercase hexadecimal.
///
/// Each value is rendered as its two's-complement byte, so `-1` becomes
/// `"ff"`. The length is always taken from the slice.
pub fn encode_signed_hex(bytes: &[i8]) -> String {
    let unsigned: Vec<u8> = bytes.iter().map(|&b| b as u8).collect();
    hex::encode(unsigned)
}

/// Encode the UTF-8 bytes of a string.
pub fn encode_str_hex(s: &str) -> String {
    hex::encode(s.as_bytes())
}

/// Decode hexadecimal text (either case) back into bytes.
pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(text)?)
}
