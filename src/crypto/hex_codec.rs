//! `0x`-prefixed lowercase hex text codec

use crate::{Result, hex_error};

/// Prefix carried by every hex value the crate emits
pub const HEX_PREFIX: &str = "0x";

/// Converts between raw bytes and `0x`-prefixed hex text
pub struct HexCodec;

impl HexCodec {
    /// Encode bytes as `0x` followed by lowercase hex
    pub fn encode(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(HEX_PREFIX.len() + bytes.len() * 2);
        out.push_str(HEX_PREFIX);
        out.push_str(&hex::encode(bytes));
        out
    }

    /// Decode hex text, with or without the `0x` prefix
    ///
    /// Mixed case is accepted. Odd length or non-hex characters fail with
    /// `MalformedHex`.
    pub fn decode(text: &str) -> Result<Vec<u8>> {
        let digits = Self::strip_prefix(text);
        hex::decode(digits).map_err(|e| hex_error!("{}", e))
    }

    /// Decode hex text that must hold exactly `N` bytes
    pub fn decode_array<const N: usize>(text: &str) -> Result<[u8; N]> {
        let digits = Self::strip_prefix(text);
        if digits.len() != N * 2 {
            return Err(hex_error!(
                "expected {} hex characters, got {}",
                N * 2,
                digits.len()
            ));
        }

        let mut out = [0u8; N];
        hex::decode_to_slice(digits, &mut out).map_err(|e| hex_error!("{}", e))?;
        Ok(out)
    }

    /// True iff `text` is `0x` followed by exactly `digits` hex characters
    pub fn is_prefixed_hex(text: &str, digits: usize) -> bool {
        match text.strip_prefix(HEX_PREFIX) {
            Some(rest) => rest.len() == digits && rest.bytes().all(|b| b.is_ascii_hexdigit()),
            None => false,
        }
    }

    fn strip_prefix(text: &str) -> &str {
        text.strip_prefix(HEX_PREFIX).unwrap_or(text)
    }
}
