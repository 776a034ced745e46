//! End-to-end decoding of realistic fixtures: a GPT header with a valid
//! stored CRC32, a populated boot sector, and a FAT32 directory region.

use disk_shadow_probe::addressing::{cluster_to_lba, sector_to_cluster};
use disk_shadow_probe::integrity::{digest_entry, verify_gpt_header_crc32};
use disk_shadow_probe::layout::fat32::parse_directory;
use disk_shadow_probe::layout::gpt::GptHeader;
use disk_shadow_probe::layout::mbr::{MbrTable, MBR_TABLE_OFFSET, MBR_PARTITION_ENTRY_LAYOUT};
use disk_shadow_probe::layout::ByteRegion;

/// 92-byte GPT header whose stored CRC32 (0x261AD1CE) is correct for the
/// rest of the bytes.
const GPT_HEADER_HEX: &str = "4546492050415254000001005c000000ced11a26000000000100000000000000ffff1f00000000002200000000000000deff1f000000000028732ac11ff8d211ba4b00a0c93ec93b02000000000000008000000080000000efbeadde";

fn gpt_header_bytes() -> Vec<u8> {
    hex::decode(GPT_HEADER_HEX).unwrap()
}

#[test]
fn gpt_header_roundtrip_with_crc_verification() {
    let bytes = gpt_header_bytes();
    assert_eq!(bytes.len(), 92);

    let check = verify_gpt_header_crc32(&bytes).unwrap();
    assert_eq!(check.stored, 0x261A_D1CE);
    assert!(check.matches());

    let header = GptHeader::parse(&bytes).unwrap();
    assert!(header.signature_valid);
    assert_eq!(header.header_crc32, check.stored);
    assert_eq!(header.current_lba, 1);
    assert_eq!(header.backup_lba, 0x1F_FFFF);
    assert_eq!(header.disk_guid, "c12a7328-f81f-11d2-ba4b-00a0c93ec93b");
    assert_eq!(header.partition_entry_count, 128);
}

#[test]
fn single_byte_flip_is_detected_but_not_fatal() {
    // Flip one byte unrelated to the checksum field in every position
    // after the CRC field; the header must still decode and the check
    // must report a mismatch.
    let mut bytes = gpt_header_bytes();
    bytes[0x20] ^= 0xFF;

    let check = verify_gpt_header_crc32(&bytes).unwrap();
    assert!(!check.matches());
    assert_eq!(check.stored, 0x261A_D1CE);

    let header = GptHeader::parse(&bytes).unwrap();
    assert!(header.signature_valid);
    assert_ne!(header.backup_lba, 0x1F_FFFF);
}

#[test]
fn boot_sector_with_gpt_protective_entry() {
    let mut sector = [0u8; 512];
    let entry = &mut sector[MBR_TABLE_OFFSET..MBR_TABLE_OFFSET + 16];
    entry[4] = 0xEE; // GPT protective
    entry[8..12].copy_from_slice(&1u32.to_le_bytes());
    entry[12..16].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    sector[510] = 0x55;
    sector[511] = 0xAA;

    let table = MbrTable::parse(&sector).unwrap();
    assert!(table.boot_signature_valid);
    assert_eq!(table.entries[0].type_name, "GPT");
    assert!(!table.entries[0].bootable);
    assert_eq!(table.entries[0].starting_lba, 1);
    assert_eq!(table.entries[0].total_sectors, 0xFFFF_FFFF);
}

#[test]
fn decoded_record_serializes_in_declaration_order() {
    let mut raw = [0u8; 16];
    raw[0] = 0x80;
    raw[4] = 0x83;
    let record = MBR_PARTITION_ENTRY_LAYOUT
        .decode(&ByteRegion::new(&raw))
        .unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let boot = json.find("boot_indicator").unwrap();
    let chs = json.find("starting_chs").unwrap();
    let lba = json.find("starting_lba").unwrap();
    assert!(boot < chs && chs < lba);
    assert_eq!(record.uint("partition_type").unwrap(), 0x83);
}

#[test]
fn directory_region_and_digest_fingerprints() {
    // Two entries plus a torn half-entry at the end.
    let mut region = vec![0u8; 64];
    region[0..8].copy_from_slice(b"KERNEL  ");
    region[8..11].copy_from_slice(b"IMG");
    region[0x0B] = 0x20;
    region[32..40].copy_from_slice(b"BOOT    ");
    region[32 + 0x0B] = 0x10;
    region.extend_from_slice(&[0xE5; 12]);

    let batch = parse_directory(&region).unwrap();
    assert_eq!(batch.entries.len(), 2);
    assert_eq!(batch.discarded_trailing_bytes, 12);
    assert_eq!(batch.entries[0].short_name, "KERNEL");
    assert_eq!(batch.entries[0].extension, "IMG");
    assert!(batch.entries[1].is_directory());

    // The fingerprint covers raw bytes, so the two identical-length
    // entries still differ.
    let first = digest_entry(&region[0..32]);
    let second = digest_entry(&region[32..64]);
    assert_ne!(first.sha256, second.sha256);
    assert_eq!(first.sha256.len(), 64);
    assert_eq!(first.sha512.len(), 128);
}

#[test]
fn cluster_and_sector_conversions_agree() {
    // LBA of a cluster maps back to the same cluster.
    for cluster in [2u64, 3, 117, 4096] {
        let lba = cluster_to_lba(cluster, 2048, 8).unwrap();
        assert_eq!(sector_to_cluster(lba, 2048, 8).unwrap(), cluster);
    }
}
