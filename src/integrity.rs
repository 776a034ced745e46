//! Checksum re-verification and content-addressing digests. A checksum
//! mismatch is data about the media, not a failure: both values are
//! returned and decoding elsewhere proceeds regardless of the outcome.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};

use crate::error::LayoutError;

/// Offset of the stored CRC32 field inside a GPT header.
pub const GPT_HEADER_CRC_OFFSET: usize = 0x10;
pub const CRC32_FIELD_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChecksumCheck {
    pub computed: u32,
    pub stored: u32,
}

impl ChecksumCheck {
    pub fn matches(&self) -> bool {
        self.computed == self.stored
    }
}

/// Recompute a structure's CRC32 with its stored-checksum field zeroed in
/// a working copy, and return both values. The input itself is never
/// touched.
pub fn crc32_with_zeroed_field(
    bytes: &[u8],
    field_offset: usize,
    field_len: usize,
) -> Result<ChecksumCheck, LayoutError> {
    if field_len != CRC32_FIELD_LEN {
        return Err(LayoutError::invalid_argument(format!(
            "a CRC32 field is {CRC32_FIELD_LEN} bytes, got {field_len}"
        )));
    }
    let end = field_offset
        .checked_add(field_len)
        .filter(|end| *end <= bytes.len())
        .ok_or(LayoutError::OutOfBounds {
            context: "stored checksum field",
            needed: field_offset.saturating_add(field_len),
            available: bytes.len(),
        })?;

    let stored = LittleEndian::read_u32(&bytes[field_offset..end]);
    let mut working = bytes.to_vec();
    working[field_offset..end].fill(0);

    Ok(ChecksumCheck {
        computed: crc32fast::hash(&working),
        stored,
    })
}

/// CRC32 check of a GPT header region (stored field at offset 0x10).
pub fn verify_gpt_header_crc32(header: &[u8]) -> Result<ChecksumCheck, LayoutError> {
    if header.len() < crate::layout::gpt::GPT_HEADER_MIN_SIZE {
        return Err(LayoutError::OutOfBounds {
            context: "gpt header",
            needed: crate::layout::gpt::GPT_HEADER_MIN_SIZE,
            available: header.len(),
        });
    }
    crc32_with_zeroed_field(header, GPT_HEADER_CRC_OFFSET, CRC32_FIELD_LEN)
}

/// Tamper-evidence fingerprints over the raw bytes of one entry.
/// Deterministic, independent of any parsed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentDigest {
    pub sha256: String,
    pub sha512: String,
}

pub fn digest_entry(bytes: &[u8]) -> ContentDigest {
    ContentDigest {
        sha256: hex::encode(Sha256::digest(bytes)),
        sha512: hex::encode(Sha512::digest(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_vector() {
        // Standard CRC-32 check value.
        assert_eq!(crc32fast::hash(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn zeroing_the_field_reproduces_the_stored_value() {
        // Region whose stored field already holds the CRC of the zeroed copy.
        let mut region = vec![0u8; 16];
        region[0..4].copy_from_slice(b"HEAD");
        region[8..16].copy_from_slice(b"PAYLOAD!");
        let mut zeroed = region.clone();
        zeroed[4..8].fill(0);
        let crc = crc32fast::hash(&zeroed);
        region[4..8].copy_from_slice(&crc.to_le_bytes());

        let check = crc32_with_zeroed_field(&region, 4, 4).unwrap();
        assert_eq!(check.computed, crc);
        assert_eq!(check.stored, crc);
        assert!(check.matches());

        // Flipping an unrelated byte flips the verdict, not the call.
        let mut tampered = region.clone();
        tampered[9] ^= 0xFF;
        let check = crc32_with_zeroed_field(&tampered, 4, 4).unwrap();
        assert!(!check.matches());
        assert_eq!(check.stored, crc);
    }

    #[test]
    fn field_must_lie_inside_the_region() {
        assert!(matches!(
            crc32_with_zeroed_field(&[0u8; 8], 6, 4),
            Err(LayoutError::OutOfBounds { .. })
        ));
        assert!(matches!(
            crc32_with_zeroed_field(&[0u8; 8], 0, 2),
            Err(LayoutError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn digests_match_reference_vectors() {
        // SHA-2 digests of 16 zero bytes.
        let digest = digest_entry(&[0u8; 16]);
        assert_eq!(
            digest.sha256,
            "374708fff7719dd5979ec875d56cd2286f6d3cf7ec317a3b25632aab28ec37bb"
        );
        assert_eq!(
            digest.sha512,
            "0b6cbac838dfe7f47ea1bd0df00ec282fdf45510c92161072ccfb84035390c4d\
             a743d9c3b954eaa1b0f86fc9861b23cc6c8667ab232c11c686432ebb5c8c3f27"
        );
        // Same input, same fingerprint.
        assert_eq!(digest_entry(&[0u8; 16]), digest);
    }
}
