use log::warn;
use serde::Serialize;

use super::record::{FieldSpec, LayoutSize, StructLayout};
use super::region::{bit_range, decode_flags, BitFlag, ByteRegion};
use crate::addressing::DEFAULT_SECTOR_SIZE;
use crate::error::LayoutError;

pub const GPT_HEADER_MIN_SIZE: usize = 92;
pub const GPT_PARTITION_ENTRY_SIZE: usize = 128;
pub const GPT_SIGNATURE: &str = "EFI PART";

pub static GPT_HEADER_LAYOUT: StructLayout = StructLayout {
    name: "gpt header",
    size: LayoutSize::AtLeast(GPT_HEADER_MIN_SIZE),
    fields: &[
        FieldSpec::ascii("signature", 0x00, 8),
        FieldSpec::uint("revision", 0x08, 4),
        FieldSpec::uint("header_size", 0x0C, 2),
        FieldSpec::uint("header_crc32", 0x10, 4),
        FieldSpec::uint("current_lba", 0x18, 8),
        FieldSpec::uint("backup_lba", 0x20, 8),
        FieldSpec::uint("first_usable_lba", 0x28, 8),
        FieldSpec::uint("last_usable_lba", 0x30, 8),
        FieldSpec::guid("disk_guid", 0x38),
        FieldSpec::uint("partition_entry_lba", 0x48, 8),
        FieldSpec::uint("partition_entry_count", 0x50, 4),
        FieldSpec::uint("partition_entry_size", 0x54, 4),
        FieldSpec::uint("partition_array_crc32", 0x58, 4),
    ],
};

/// The three defined attribute bits; bits 3-47 are reserved and bits
/// 48-63 belong to the partition type.
const GPT_ATTRIBUTE_FLAGS: &[BitFlag] = &[
    BitFlag { bit: 0, name: "REQUIRED_PARTITION" },
    BitFlag { bit: 1, name: "NO_BLOCK_IO_PROTOCOL" },
    BitFlag { bit: 2, name: "LEGACY_BIOS_BOOTABLE" },
];

pub static GPT_PARTITION_ENTRY_LAYOUT: StructLayout = StructLayout {
    name: "gpt partition entry",
    size: LayoutSize::Exact(GPT_PARTITION_ENTRY_SIZE),
    fields: &[
        FieldSpec::guid("partition_type_guid", 0x00),
        FieldSpec::guid("unique_partition_guid", 0x10),
        FieldSpec::uint("starting_lba", 0x20, 8),
        FieldSpec::uint("ending_lba", 0x28, 8),
        FieldSpec::uint("attributes", 0x30, 8),
        FieldSpec::flags("attribute_flags", 0x30, 8, GPT_ATTRIBUTE_FLAGS),
        FieldSpec::utf16("partition_name", 0x38, 72),
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GptHeader {
    pub signature: String,
    /// Advisory only: a wrong signature is logged and surfaced here, the
    /// header is still decoded for the caller to judge.
    pub signature_valid: bool,
    pub revision: u32,
    pub header_size: u16,
    pub header_crc32: u32,
    pub current_lba: u64,
    pub backup_lba: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub disk_guid: String,
    pub partition_entry_lba: u64,
    pub partition_entry_count: u32,
    pub partition_entry_size: u32,
    pub partition_array_crc32: u32,
}

impl GptHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, LayoutError> {
        let record = GPT_HEADER_LAYOUT.decode(&ByteRegion::new(bytes))?;

        let signature = record.text("signature")?.to_string();
        let signature_valid = signature == GPT_SIGNATURE;
        if !signature_valid {
            warn!("GPT header signature is {signature:?}, expected {GPT_SIGNATURE:?}");
        }

        Ok(Self {
            signature,
            signature_valid,
            revision: record.uint("revision")? as u32,
            header_size: record.uint("header_size")? as u16,
            header_crc32: record.uint("header_crc32")? as u32,
            current_lba: record.uint("current_lba")?,
            backup_lba: record.uint("backup_lba")?,
            first_usable_lba: record.uint("first_usable_lba")?,
            last_usable_lba: record.uint("last_usable_lba")?,
            disk_guid: record.guid("disk_guid")?.to_string(),
            partition_entry_lba: record.uint("partition_entry_lba")?,
            partition_entry_count: record.uint("partition_entry_count")? as u32,
            partition_entry_size: record.uint("partition_entry_size")? as u32,
            partition_array_crc32: record.uint("partition_array_crc32")? as u32,
        })
    }
}

/// 64-bit attribute field split into its defined ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GptAttributes {
    pub raw: String,
    pub flags: Vec<&'static str>,
    /// Bits 0-2.
    pub gpt_attributes: u8,
    /// Bits 3-47, zero on well-formed entries.
    pub reserved: u64,
    /// Bits 48-63, meaning owned by the partition type.
    pub type_specific: u16,
}

impl GptAttributes {
    pub fn split(raw: u64) -> Self {
        Self {
            raw: format!("{raw:#018x}"),
            flags: decode_flags(raw, GPT_ATTRIBUTE_FLAGS),
            gpt_attributes: bit_range(raw, 0, 2) as u8,
            reserved: bit_range(raw, 3, 47),
            type_specific: bit_range(raw, 48, 63) as u16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GptPartitionEntry {
    pub partition_type_guid: String,
    pub unique_partition_guid: String,
    pub starting_lba: u64,
    pub ending_lba: u64,
    /// `(ending_lba - starting_lba + 1) * sector_size`. `None` when the
    /// span is nonsensical (end before start) or does not fit in bytes;
    /// a corrupt span never aborts the parse.
    pub size_bytes: Option<u64>,
    pub attributes: GptAttributes,
    pub partition_name: String,
}

impl GptPartitionEntry {
    /// Decode one 128-byte entry. `sector_size` only affects the derived
    /// byte size; pass [`DEFAULT_SECTOR_SIZE`] for the common case.
    pub fn parse(bytes: &[u8], sector_size: u64) -> Result<Self, LayoutError> {
        if sector_size == 0 {
            return Err(LayoutError::invalid_argument("sector size must be positive"));
        }
        let record = GPT_PARTITION_ENTRY_LAYOUT.decode(&ByteRegion::new(bytes))?;

        let starting_lba = record.uint("starting_lba")?;
        let ending_lba = record.uint("ending_lba")?;
        let size_bytes = ending_lba
            .checked_sub(starting_lba)
            .and_then(|span| span.checked_add(1))
            .and_then(|sectors| sectors.checked_mul(sector_size));
        if size_bytes.is_none() {
            warn!("partition span {starting_lba}..={ending_lba} does not fit in bytes");
        }

        Ok(Self {
            partition_type_guid: record.guid("partition_type_guid")?.to_string(),
            unique_partition_guid: record.guid("unique_partition_guid")?.to_string(),
            starting_lba,
            ending_lba,
            size_bytes,
            attributes: GptAttributes::split(record.uint("attributes")?),
            partition_name: record.text("partition_name")?.to_string(),
        })
    }

    pub fn parse_with_default_sector(bytes: &[u8]) -> Result<Self, LayoutError> {
        Self::parse(bytes, DEFAULT_SECTOR_SIZE)
    }
}
