use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Serialize, Serializer};

use crate::error::LayoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Immutable byte region with a known total length. Every read checks
/// `offset + length` against the region before touching the bytes.
#[derive(Debug, Clone, Copy)]
pub struct ByteRegion<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteRegion<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn slice(
        &self,
        context: &'static str,
        offset: usize,
        length: usize,
    ) -> Result<&'a [u8], LayoutError> {
        let end = offset.checked_add(length).ok_or(LayoutError::OutOfBounds {
            context,
            needed: usize::MAX,
            available: self.bytes.len(),
        })?;
        if end > self.bytes.len() {
            return Err(LayoutError::OutOfBounds {
                context,
                needed: end,
                available: self.bytes.len(),
            });
        }
        Ok(&self.bytes[offset..end])
    }

    /// Unsigned integer of 1..=8 bytes at `offset`.
    pub fn read_uint(
        &self,
        context: &'static str,
        offset: usize,
        length: usize,
        endian: Endian,
    ) -> Result<u64, LayoutError> {
        if length == 0 || length > 8 {
            return Err(LayoutError::invalid_argument(format!(
                "{context}: integer width {length} is outside 1..=8 bytes"
            )));
        }
        let raw = self.slice(context, offset, length)?;
        Ok(match endian {
            Endian::Little => LittleEndian::read_uint(raw, length),
            Endian::Big => BigEndian::read_uint(raw, length),
        })
    }

    /// Fixed-width ASCII text. Bytes above 0x7F cannot be decoded and are
    /// dropped rather than rejected: the media under inspection may be
    /// corrupted, and a mangled label is still worth returning. NULs and
    /// surrounding whitespace padding are trimmed.
    pub fn read_ascii(
        &self,
        context: &'static str,
        offset: usize,
        length: usize,
    ) -> Result<String, LayoutError> {
        let raw = self.slice(context, offset, length)?;
        let filtered: Vec<u8> = raw.iter().copied().filter(|b| b.is_ascii()).collect();
        let text = String::from_utf8_lossy(&filtered)
            .trim_matches('\0')
            .trim()
            .to_string();
        Ok(text)
    }

    /// Fixed-width UTF-16LE text. Unpaired surrogates are dropped (same
    /// lossy policy as ASCII), trailing NULs are trimmed.
    pub fn read_utf16le(
        &self,
        context: &'static str,
        offset: usize,
        length: usize,
    ) -> Result<String, LayoutError> {
        let raw = self.slice(context, offset, length)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        let text: String = String::from_utf16_lossy(&units)
            .chars()
            .filter(|c| *c != '\u{FFFD}')
            .collect();
        Ok(text.trim_end_matches('\0').to_string())
    }

    /// 16-byte mixed-endian GUID rendered in canonical hyphenated form.
    pub fn read_guid(
        &self,
        context: &'static str,
        offset: usize,
    ) -> Result<String, LayoutError> {
        let raw = self.slice(context, offset, 16)?;
        Ok(format_guid(raw))
    }

    /// Raw bytes rendered as lowercase hex, in on-disk order.
    pub fn read_hex(
        &self,
        context: &'static str,
        offset: usize,
        length: usize,
    ) -> Result<String, LayoutError> {
        Ok(hex::encode(self.slice(context, offset, length)?))
    }
}

/// On-disk GUID encoding: first three groups little-endian, final two
/// groups raw big-endian bytes.
pub fn format_guid(raw: &[u8]) -> String {
    debug_assert_eq!(raw.len(), 16);
    format!(
        "{:08x}-{:04x}-{:04x}-{}-{}",
        LittleEndian::read_u32(&raw[0..4]),
        LittleEndian::read_u16(&raw[4..6]),
        LittleEndian::read_u16(&raw[6..8]),
        hex::encode(&raw[8..10]),
        hex::encode(&raw[10..16]),
    )
}

/// Value of the inclusive bit range `low..=high` of `raw`.
pub fn bit_range(raw: u64, low: u32, high: u32) -> u64 {
    debug_assert!(low <= high && high < 64);
    let width = high - low + 1;
    let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
    (raw >> low) & mask
}

/// One named flag bit inside a packed integer.
#[derive(Debug, Clone, Copy)]
pub struct BitFlag {
    pub bit: u32,
    pub name: &'static str,
}

/// Set flags of `raw`, in the order the table declares them.
pub fn decode_flags(raw: u64, table: &[BitFlag]) -> Vec<&'static str> {
    table
        .iter()
        .filter(|flag| raw & (1u64 << flag.bit) != 0)
        .map(|flag| flag.name)
        .collect()
}

/// FAT-style packed date: bits 0-4 day, bits 5-8 month, bits 9-15 year
/// offset from 1980. Raw field values are preserved even when they do not
/// form a real calendar date; `to_naive_date` is the strict view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl PackedDate {
    pub fn decode(raw: u16) -> Self {
        Self {
            year: (raw >> 9) + 1980,
            month: ((raw >> 5) & 0x0F) as u8,
            day: (raw & 0x1F) as u8,
        }
    }

    pub fn to_naive_date(self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
    }
}

impl std::fmt::Display for PackedDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Serialize for PackedDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// FAT-style packed time: bits 0-4 seconds/2, bits 5-10 minutes,
/// bits 11-15 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl PackedTime {
    pub fn decode(raw: u16) -> Self {
        Self {
            hours: ((raw >> 11) & 0x1F) as u8,
            minutes: ((raw >> 5) & 0x3F) as u8,
            seconds: ((raw & 0x1F) * 2) as u8,
        }
    }

    pub fn to_naive_time(self) -> Option<chrono::NaiveTime> {
        chrono::NaiveTime::from_hms_opt(
            self.hours as u32,
            self.minutes as u32,
            self.seconds as u32,
        )
    }
}

impl std::fmt::Display for PackedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl Serialize for PackedTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
