//! Raw characteristic payloads.
//!
//! Transports hand payloads around as bytes. Text based transports report
//! them as whitespace separated hex pairs (`54 3d 32 32`), which
//! [`RawPayload::from_hex_str`] turns back into bytes.

use bytes::Bytes;

use crate::error::DecodeError;

/// Bytes produced by a characteristic read or a notification.
///
/// An empty payload means the device produced nothing in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawPayload(Bytes);

impl RawPayload {
    /// An empty payload.
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Wrap raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Parse transport text made of hex byte pairs.
    ///
    /// Whitespace between pairs is optional, so both `"01 00"` and `"0100"`
    /// are accepted. Blank text yields an empty payload.
    ///
    /// # Example
    ///
    /// ```
    /// use mijia_ht_ble::protocol::RawPayload;
    ///
    /// let payload = RawPayload::from_hex_str("54 3d 32").unwrap();
    /// assert_eq!(payload.as_bytes(), b"T=2");
    /// ```
    pub fn from_hex_str(text: &str) -> Result<Self, DecodeError> {
        let digits: String = text.split_whitespace().collect();
        let bytes = hex::decode(&digits).map_err(|_| DecodeError::InvalidHex {
            input: text.trim().to_string(),
        })?;
        Ok(Self(Bytes::from(bytes)))
    }

    /// The payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as space separated lowercase hex pairs, the way gatttool prints values.
    pub fn to_hex_string(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render as text, replacing invalid UTF-8 and dropping trailing NULs.
    pub fn to_text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0)
            .trim_end_matches('\0')
            .to_string()
    }
}

impl std::fmt::Display for RawPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<&'static [u8]> for RawPayload {
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_str_spaced_pairs() {
        let payload = RawPayload::from_hex_str("54 3d 32 32 2e 36 ").unwrap();
        assert_eq!(payload.as_bytes(), b"T=22.6");
    }

    #[test]
    fn test_from_hex_str_contiguous() {
        let payload = RawPayload::from_hex_str("0100").unwrap();
        assert_eq!(payload.as_bytes(), &[0x01, 0x00]);
    }

    #[test]
    fn test_from_hex_str_blank_is_empty() {
        assert!(RawPayload::from_hex_str("  ").unwrap().is_empty());
    }

    #[test]
    fn test_from_hex_str_rejects_non_hex() {
        assert_eq!(
            RawPayload::from_hex_str("zz"),
            Err(DecodeError::InvalidHex {
                input: "zz".to_string()
            })
        );
        // A dangling nibble is not a byte.
        assert!(RawPayload::from_hex_str("3").is_err());
    }

    #[test]
    fn test_to_hex_string() {
        let payload = RawPayload::from(vec![0x01, 0x00, 0xab]);
        assert_eq!(payload.to_hex_string(), "01 00 ab");
        assert_eq!(payload.to_string(), "01 00 ab");
    }

    #[test]
    fn test_to_text_lossy_trims_nul() {
        let payload = RawPayload::from(&b"MJ_HT_V1\0\0"[..]);
        assert_eq!(payload.to_text_lossy(), "MJ_HT_V1");
    }
}
