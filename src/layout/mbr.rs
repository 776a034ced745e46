use log::warn;
use serde::Serialize;

use super::record::{FieldSpec, LayoutSize, StructLayout};
use super::region::{ByteRegion, Endian};
use crate::error::LayoutError;

pub const MBR_ENTRY_SIZE: usize = 16;
pub const MBR_SECTOR_SIZE: usize = 512;
/// First entry of the four-slot table inside the boot sector.
pub const MBR_TABLE_OFFSET: usize = 0x1BE;
pub const MBR_DISK_SIGNATURE_OFFSET: usize = 440;

pub static MBR_PARTITION_ENTRY_LAYOUT: StructLayout = StructLayout {
    name: "mbr partition entry",
    size: LayoutSize::Exact(MBR_ENTRY_SIZE),
    fields: &[
        FieldSpec::uint("boot_indicator", 0x00, 1),
        FieldSpec::hex("starting_chs", 0x01, 3),
        FieldSpec::uint("partition_type", 0x04, 1),
        FieldSpec::hex("ending_chs", 0x05, 3),
        FieldSpec::uint("starting_lba", 0x08, 4),
        FieldSpec::uint("total_sectors", 0x0C, 4),
    ],
};

/// Packed 3-byte CHS address: head, then sector in the low 6 bits of the
/// middle byte with cylinder bits 8-9 in its top 2 bits, then cylinder
/// bits 0-7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChsAddress {
    pub raw: String,
    pub cylinder: u16,
    pub head: u8,
    pub sector: u8,
}

impl ChsAddress {
    fn from_packed(raw: &[u8]) -> Self {
        debug_assert_eq!(raw.len(), 3);
        Self {
            raw: hex::encode(raw),
            cylinder: (((raw[1] & 0xC0) as u16) << 2) | raw[2] as u16,
            head: raw[0],
            sector: raw[1] & 0x3F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MbrPartitionEntry {
    pub bootable: bool,
    pub boot_indicator: u8,
    pub starting_chs: ChsAddress,
    pub partition_type: u8,
    pub type_name: String,
    pub ending_chs: ChsAddress,
    pub starting_lba: u32,
    pub total_sectors: u32,
}

impl MbrPartitionEntry {
    /// Decode one 16-byte table entry. The boot byte is a binary
    /// classification: 0x80 is active, every other value (0x00 included)
    /// is inactive. Unknown type codes are rendered, never rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self, LayoutError> {
        let region = ByteRegion::new(bytes);
        let record = MBR_PARTITION_ENTRY_LAYOUT.decode(&region)?;

        let boot_indicator = record.uint("boot_indicator")? as u8;
        let partition_type = record.uint("partition_type")? as u8;
        Ok(Self {
            bootable: boot_indicator == 0x80,
            boot_indicator,
            starting_chs: ChsAddress::from_packed(region.slice("mbr partition entry", 0x01, 3)?),
            partition_type,
            type_name: partition_type_name(partition_type),
            ending_chs: ChsAddress::from_packed(region.slice("mbr partition entry", 0x05, 3)?),
            starting_lba: record.uint("starting_lba")? as u32,
            total_sectors: record.uint("total_sectors")? as u32,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.partition_type == 0x00
    }
}

/// The four-entry table of a full 512-byte boot sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MbrTable {
    pub disk_signature: u32,
    pub boot_signature_valid: bool,
    pub entries: Vec<MbrPartitionEntry>,
}

impl MbrTable {
    /// Decode all four slots of a boot sector. A missing 0x55AA boot
    /// signature is advisory: it is reported on the record and logged,
    /// and the slots are decoded regardless.
    pub fn parse(sector: &[u8]) -> Result<Self, LayoutError> {
        let region = ByteRegion::new(sector);
        if region.len() != MBR_SECTOR_SIZE {
            return Err(LayoutError::OutOfBounds {
                context: "mbr boot sector",
                needed: MBR_SECTOR_SIZE,
                available: region.len(),
            });
        }

        let boot_signature_valid = sector[510] == 0x55 && sector[511] == 0xAA;
        if !boot_signature_valid {
            warn!(
                "boot sector signature is {:02x}{:02x}, expected 55aa",
                sector[510], sector[511]
            );
        }

        let disk_signature =
            region.read_uint("mbr boot sector", MBR_DISK_SIGNATURE_OFFSET, 4, Endian::Little)? as u32;

        let mut entries = Vec::with_capacity(4);
        for slot in 0..4 {
            let raw = region.slice(
                "mbr boot sector",
                MBR_TABLE_OFFSET + slot * MBR_ENTRY_SIZE,
                MBR_ENTRY_SIZE,
            )?;
            entries.push(MbrPartitionEntry::parse(raw)?);
        }

        Ok(Self {
            disk_signature,
            boot_signature_valid,
            entries,
        })
    }
}

/// Human-readable name for a legacy partition type code.
pub fn partition_type_name(code: u8) -> String {
    match PARTITION_TYPES.iter().find(|(c, _)| *c == code) {
        Some((_, name)) => (*name).to_string(),
        None => format!("Unknown(0x{code:02x})"),
    }
}

/// Legacy partition type codes. Immutable process-wide data, built at
/// compile time.
pub static PARTITION_TYPES: &[(u8, &str)] = &[
    (0x00, "Empty"),
    (0x01, "FAT12"),
    (0x02, "XENIX root"),
    (0x03, "XENIX usr"),
    (0x04, "FAT16 <32M"),
    (0x05, "Extended"),
    (0x06, "FAT16"),
    (0x07, "HPFS/NTFS/exFAT"),
    (0x08, "AIX"),
    (0x09, "AIX bootable"),
    (0x0A, "OS/2 Boot Manager"),
    (0x0B, "W95 FAT32"),
    (0x0C, "W95 FAT32 (LBA)"),
    (0x0E, "W95 FAT16 (LBA)"),
    (0x0F, "W95 Extended (LBA)"),
    (0x10, "OPUS"),
    (0x11, "Hidden FAT12"),
    (0x12, "Compaq diagnostics"),
    (0x14, "Hidden FAT16 <32M"),
    (0x16, "Hidden FAT16"),
    (0x17, "Hidden HPFS/NTFS"),
    (0x18, "AST SmartSleep"),
    (0x1B, "Hidden W95 FAT32"),
    (0x1C, "Hidden W95 FAT32 (LBA)"),
    (0x1E, "Hidden W95 FAT16 (LBA)"),
    (0x24, "NEC DOS"),
    (0x27, "Hidden NTFS WinRE"),
    (0x39, "Plan 9"),
    (0x3C, "PartitionMagic"),
    (0x40, "Venix 80286"),
    (0x41, "PPC PReP Boot"),
    (0x42, "SFS"),
    (0x4D, "QNX4.x"),
    (0x4E, "QNX4.x 2nd part"),
    (0x4F, "QNX4.x 3rd part"),
    (0x50, "OnTrack DM"),
    (0x51, "OnTrack DM6 Aux1"),
    (0x52, "CP/M"),
    (0x53, "OnTrack DM6 Aux3"),
    (0x54, "OnTrackDM6"),
    (0x55, "EZ-Drive"),
    (0x56, "Golden Bow"),
    (0x5C, "Priam Edisk"),
    (0x61, "SpeedStor"),
    (0x63, "GNU HURD or SysV"),
    (0x64, "Novell Netware 286"),
    (0x65, "Novell Netware 386"),
    (0x70, "DiskSecure Multi-Boot"),
    (0x75, "PC/IX"),
    (0x80, "Old Minix"),
    (0x81, "Minix / old Linux"),
    (0x82, "Linux swap / Solaris"),
    (0x83, "Linux"),
    (0x84, "OS/2 hidden C: drive"),
    (0x85, "Linux extended"),
    (0x86, "NTFS volume set"),
    (0x87, "NTFS volume set"),
    (0x88, "Linux plaintext"),
    (0x8E, "Linux LVM"),
    (0x93, "Amoeba"),
    (0x94, "Amoeba BBT"),
    (0x9F, "BSD/OS"),
    (0xA0, "IBM Thinkpad hibernation"),
    (0xA5, "FreeBSD"),
    (0xA6, "OpenBSD"),
    (0xA7, "NeXTSTEP"),
    (0xA8, "Darwin UFS"),
    (0xA9, "NetBSD"),
    (0xAB, "Darwin boot"),
    (0xAF, "HFS / HFS+"),
    (0xB7, "BSDI fs"),
    (0xB8, "BSDI swap"),
    (0xBB, "Boot Wizard hidden"),
    (0xBC, "Acronis FAT32 LBA"),
    (0xBE, "Solaris boot"),
    (0xBF, "Solaris"),
    (0xC1, "DRDOS/sec (FAT-12)"),
    (0xC4, "DRDOS/sec (FAT-16 <32M)"),
    (0xC6, "DRDOS/sec (FAT-16)"),
    (0xC7, "Syrinx"),
    (0xDA, "Non-FS data"),
    (0xDB, "CP/M / CTOS /..."),
    (0xDE, "Dell Utility"),
    (0xDF, "BootIt"),
    (0xE1, "DOS access"),
    (0xE3, "DOS R/O"),
    (0xE4, "SpeedStor"),
    (0xEB, "BeOS fs"),
    (0xEE, "GPT"),
    (0xEF, "EFI (FAT-12/16/32)"),
    (0xF0, "Linux/PA-RISC boot"),
    (0xF1, "SpeedStor"),
    (0xF2, "DOS secondary"),
    (0xF4, "SpeedStor"),
    (0xFB, "VMware VMFS"),
    (0xFC, "VMware VMKCORE"),
    (0xFD, "Linux raid auto"),
    (0xFE, "LANstep"),
    (0xFF, "BBT"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_validates() {
        MBR_PARTITION_ENTRY_LAYOUT.validate().unwrap();
    }

    // 8000 0183 0008 0000 00ee 3608 00...: active, type 0x0C, LBA 2048
    fn sample_entry() -> [u8; 16] {
        let mut e = [0u8; 16];
        e[0] = 0x80;
        e[1] = 0x20;
        e[2] = 0x21;
        e[3] = 0x00;
        e[4] = 0x0C;
        e[5] = 0xFE;
        e[6] = 0xFF;
        e[7] = 0xFF;
        e[8..12].copy_from_slice(&2048u32.to_le_bytes());
        e[12..16].copy_from_slice(&204800u32.to_le_bytes());
        e
    }

    #[test]
    fn parses_active_fat32_entry() {
        let entry = MbrPartitionEntry::parse(&sample_entry()).unwrap();
        assert!(entry.bootable);
        assert_eq!(entry.partition_type, 0x0C);
        assert_eq!(entry.type_name, "W95 FAT32 (LBA)");
        assert_eq!(entry.starting_lba, 2048);
        assert_eq!(entry.total_sectors, 204800);
        assert_eq!(entry.starting_chs.raw, "202100");
        assert_eq!(entry.starting_chs.head, 0x20);
        assert_eq!(entry.starting_chs.sector, 0x21 & 0x3F);
        // Ending CHS fe ff ff: cylinder carries the two high bits of 0xff.
        assert_eq!(entry.ending_chs.cylinder, 0x3FF);
        assert_eq!(entry.ending_chs.head, 0xFE);
        assert_eq!(entry.ending_chs.sector, 0x3F);
    }

    #[test]
    fn boot_byte_is_a_binary_classification() {
        let mut raw = sample_entry();
        raw[0] = 0x00;
        assert!(!MbrPartitionEntry::parse(&raw).unwrap().bootable);
        // Any other nonzero byte is still just "inactive".
        raw[0] = 0x01;
        assert!(!MbrPartitionEntry::parse(&raw).unwrap().bootable);
    }

    #[test]
    fn unknown_type_code_is_rendered_not_rejected() {
        let mut raw = sample_entry();
        raw[4] = 0x9A;
        let entry = MbrPartitionEntry::parse(&raw).unwrap();
        assert_eq!(entry.type_name, "Unknown(0x9a)");
    }

    #[test]
    fn entry_size_is_exact() {
        assert!(matches!(
            MbrPartitionEntry::parse(&[0u8; 15]),
            Err(LayoutError::OutOfBounds { needed: 16, available: 15, .. })
        ));
        assert!(MbrPartitionEntry::parse(&[0u8; 17]).is_err());
    }

    #[test]
    fn full_sector_table_decodes_four_slots() {
        let mut sector = [0u8; 512];
        sector[MBR_DISK_SIGNATURE_OFFSET..MBR_DISK_SIGNATURE_OFFSET + 4]
            .copy_from_slice(&0xCAFEBABEu32.to_le_bytes());
        sector[MBR_TABLE_OFFSET..MBR_TABLE_OFFSET + 16].copy_from_slice(&sample_entry());
        sector[510] = 0x55;
        sector[511] = 0xAA;

        let table = MbrTable::parse(&sector).unwrap();
        assert!(table.boot_signature_valid);
        assert_eq!(table.disk_signature, 0xCAFEBABE);
        assert_eq!(table.entries.len(), 4);
        assert_eq!(table.entries[0].type_name, "W95 FAT32 (LBA)");
        assert!(table.entries[1].is_empty());

        // A wrong boot signature is reported, not fatal.
        sector[511] = 0x00;
        let table = MbrTable::parse(&sector).unwrap();
        assert!(!table.boot_signature_valid);
        assert_eq!(table.entries.len(), 4);
    }
}
