use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::Serialize;

use super::record::{FieldSpec, LayoutSize, StructLayout};
use super::region::{BitFlag, ByteRegion, PackedDate, PackedTime};
use crate::error::LayoutError;

pub const DIRECTORY_ENTRY_SIZE: usize = 32;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
/// Long-file-name marker: read-only + hidden + system + volume id.
pub const ATTR_LONG_NAME: u8 = 0x0F;

const FAT32_ATTRIBUTE_FLAGS: &[BitFlag] = &[
    BitFlag { bit: 0, name: "READ_ONLY" },
    BitFlag { bit: 1, name: "HIDDEN" },
    BitFlag { bit: 2, name: "SYSTEM" },
    BitFlag { bit: 3, name: "VOLUME_ID" },
    BitFlag { bit: 4, name: "DIRECTORY" },
    BitFlag { bit: 5, name: "ARCHIVE" },
];

pub static DIRECTORY_ENTRY_LAYOUT: StructLayout = StructLayout {
    name: "fat32 directory entry",
    size: LayoutSize::Exact(DIRECTORY_ENTRY_SIZE),
    fields: &[
        FieldSpec::ascii("short_name", 0x00, 8),
        FieldSpec::ascii("extension", 0x08, 3),
        FieldSpec::flags("attributes", 0x0B, 1, FAT32_ATTRIBUTE_FLAGS),
        FieldSpec::uint("attribute_byte", 0x0B, 1),
        FieldSpec::uint("reserved", 0x0C, 1),
        FieldSpec::uint("creation_millis", 0x0D, 1),
        FieldSpec::time("creation_time", 0x0E),
        FieldSpec::date("creation_date", 0x10),
        FieldSpec::date("last_access_date", 0x12),
        FieldSpec::uint("first_cluster_high", 0x14, 2),
        FieldSpec::time("last_write_time", 0x16),
        FieldSpec::date("last_write_date", 0x18),
        FieldSpec::uint("first_cluster_low", 0x1A, 2),
        FieldSpec::uint("file_size", 0x1C, 4),
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Fat32DirectoryEntry {
    pub short_name: String,
    pub extension: String,
    pub attributes: Vec<&'static str>,
    pub attribute_byte: u8,
    pub reserved: u8,
    /// 10 ms units, 0-199, refining the 2-second creation time stamp.
    pub creation_millis: u8,
    pub creation_time: PackedTime,
    pub creation_date: PackedDate,
    pub last_access_date: PackedDate,
    pub first_cluster_high: u16,
    pub first_cluster_low: u16,
    /// 32-bit starting cluster reassembled from the two 16-bit halves.
    pub first_cluster: u32,
    pub last_write_time: PackedTime,
    pub last_write_date: PackedDate,
    pub file_size: u32,
}

impl Fat32DirectoryEntry {
    pub fn parse(bytes: &[u8]) -> Result<Self, LayoutError> {
        let record = DIRECTORY_ENTRY_LAYOUT.decode(&ByteRegion::new(bytes))?;

        let first_cluster_high = record.uint("first_cluster_high")? as u16;
        let first_cluster_low = record.uint("first_cluster_low")? as u16;
        Ok(Self {
            short_name: record.text("short_name")?.to_string(),
            extension: record.text("extension")?.to_string(),
            attributes: record.flags("attributes")?.to_vec(),
            attribute_byte: record.uint("attribute_byte")? as u8,
            reserved: record.uint("reserved")? as u8,
            creation_millis: record.uint("creation_millis")? as u8,
            creation_time: record.time("creation_time")?,
            creation_date: record.date("creation_date")?,
            last_access_date: record.date("last_access_date")?,
            first_cluster_high,
            first_cluster_low,
            first_cluster: ((first_cluster_high as u32) << 16) | first_cluster_low as u32,
            last_write_time: record.time("last_write_time")?,
            last_write_date: record.date("last_write_date")?,
            file_size: record.uint("file_size")? as u32,
        })
    }

    pub fn is_directory(&self) -> bool {
        self.attribute_byte & ATTR_DIRECTORY != 0
    }

    pub fn is_volume_label(&self) -> bool {
        self.attribute_byte & ATTR_VOLUME_ID != 0
    }

    pub fn is_long_name(&self) -> bool {
        self.attribute_byte & ATTR_LONG_NAME == ATTR_LONG_NAME
    }

    /// Creation stamp as a real timestamp, including the 10 ms refinement.
    /// `None` when the on-disk fields do not form a calendar date.
    pub fn created(&self) -> Option<NaiveDateTime> {
        let date = self.creation_date.to_naive_date()?;
        let time = self.creation_time.to_naive_time()?;
        Some(date.and_time(time) + Duration::milliseconds(self.creation_millis as i64 * 10))
    }

    pub fn last_written(&self) -> Option<NaiveDateTime> {
        let date = self.last_write_date.to_naive_date()?;
        let time = self.last_write_time.to_naive_time()?;
        Some(date.and_time(time))
    }
}

/// Result of slicing a directory region into consecutive 32-byte entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DirectoryBatch {
    pub entries: Vec<Fat32DirectoryEntry>,
    /// A final slice shorter than one entry is discarded, not decoded as
    /// a partial entry; its length is reported here.
    pub discarded_trailing_bytes: usize,
}

/// Decode a concatenation of directory entries in order.
pub fn parse_directory(bytes: &[u8]) -> Result<DirectoryBatch, LayoutError> {
    let mut entries = Vec::with_capacity(bytes.len() / DIRECTORY_ENTRY_SIZE);
    for chunk in bytes.chunks_exact(DIRECTORY_ENTRY_SIZE) {
        entries.push(Fat32DirectoryEntry::parse(chunk)?);
    }
    let discarded = bytes.len() % DIRECTORY_ENTRY_SIZE;
    if discarded != 0 {
        debug!("directory region has {discarded} trailing bytes, discarded");
    }
    Ok(DirectoryBatch {
        entries,
        discarded_trailing_bytes: discarded,
    })
}
