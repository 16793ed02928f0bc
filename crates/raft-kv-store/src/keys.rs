//! # keys
//!
//! why: big-endian fixed-width indices make byte order equal numeric order
//! relations: used by log_store for entry keys and scans, fact_store for fact keys
//! what: key builders, suffix parsing, u64 value codec

use crate::error::CodecError;

/// width of an encoded log index
pub const INDEX_LEN: usize = 8;

/// `prefix ++ be_u64(index)`
pub fn log_key(prefix: &[u8], index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + INDEX_LEN);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// index encoded in `raw_key`, if it is a well-formed log key under `prefix`
///
/// keys sharing the prefix with a suffix of any other length are foreign and
/// yield `None`.
pub fn log_index(prefix: &[u8], raw_key: &[u8]) -> Option<u64> {
    let suffix = raw_key.strip_prefix(prefix)?;
    let bytes: [u8; INDEX_LEN] = suffix.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// seek key for reverse scans: sorts after every `prefix ++ 8-byte suffix`
pub fn reverse_seek_key(prefix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + INDEX_LEN + 1);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&[0xFF; INDEX_LEN + 1]);
    key
}

/// `prefix ++ key`
pub fn fact_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(prefix.len() + key.len());
    raw.extend_from_slice(prefix);
    raw.extend_from_slice(key);
    raw
}

pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

pub fn decode_u64(bytes: &[u8]) -> Result<u64, CodecError> {
    let fixed: [u8; 8] = bytes
        .try_into()
        .map_err(|_| CodecError::Uint64Length(bytes.len()))?;
    Ok(u64::from_be_bytes(fixed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_key_layout_is_prefix_then_big_endian() {
        let key = log_key(b"log", 0x0102);
        assert_eq!(key, b"log\x00\x00\x00\x00\x00\x00\x01\x02".to_vec());
    }

    #[test]
    fn byte_order_matches_numeric_order() {
        let indices = [0u64, 1, 255, 256, 65_535, 1 << 40, u64::MAX - 1, u64::MAX];
        for pair in indices.windows(2) {
            assert!(log_key(b"p", pair[0]) < log_key(b"p", pair[1]));
        }
    }

    #[test]
    fn log_index_rejects_foreign_suffixes() {
        assert_eq!(log_index(b"log", &log_key(b"log", 42)), Some(42));
        assert_eq!(log_index(b"log", b"log1234567"), None);
        assert_eq!(log_index(b"log", b"log123456789"), None);
        assert_eq!(log_index(b"log", b"other\x00\x00\x00\x00\x00\x00\x00\x01"), None);
    }

    #[test]
    fn reverse_seek_key_sorts_after_max_index() {
        let seek = reverse_seek_key(b"log");
        assert!(seek > log_key(b"log", u64::MAX));
        assert!(seek.starts_with(b"log"));
    }

    #[test]
    fn fact_key_concatenates() {
        assert_eq!(fact_key(b"conf", b"term"), b"confterm".to_vec());
        assert_eq!(fact_key(b"conf", b""), b"conf".to_vec());
    }

    #[test]
    fn u64_codec_requires_eight_bytes() {
        assert_eq!(decode_u64(&encode_u64(42)).unwrap(), 42);
        assert!(matches!(decode_u64(b"abc"), Err(CodecError::Uint64Length(3))));
        assert!(matches!(decode_u64(&[0; 9]), Err(CodecError::Uint64Length(9))));
    }
}
