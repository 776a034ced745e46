use disk_shadow_probe::integrity;
use disk_shadow_probe::layout::gpt::{GptHeader, GptPartitionEntry};
use disk_shadow_probe::layout::mbr::{MbrPartitionEntry, MbrTable};

use crate::output::RecordWriter;

pub fn run_mbr(bytes: &[u8], table: bool) -> Result<(), String> {
    println!("[*] Разбор MBR ({} байт)", bytes.len());
    let mut writer = RecordWriter::stdout();
    if table {
        let table = MbrTable::parse(bytes).map_err(|e| e.to_string())?;
        if !table.boot_signature_valid {
            println!("[!] Сигнатура 55AA отсутствует - сектор может быть не загрузочным");
        }
        writer.write_pretty(&table).map_err(|e| e.to_string())?;
    } else {
        let entry = MbrPartitionEntry::parse(bytes).map_err(|e| e.to_string())?;
        writer.write_pretty(&entry).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn run_gpt_header(bytes: &[u8]) -> Result<(), String> {
    println!("[*] Разбор заголовка GPT ({} байт)", bytes.len());
    let check = integrity::verify_gpt_header_crc32(bytes).map_err(|e| e.to_string())?;
    if check.matches() {
        println!("[*] CRC32: OK (0x{:08X})", check.computed);
    } else {
        println!(
            "[!] CRC32: несовпадение (вычислено 0x{:08X}, в заголовке 0x{:08X})",
            check.computed, check.stored
        );
    }

    // Заголовок разбирается независимо от результата проверки.
    let header = GptHeader::parse(bytes).map_err(|e| e.to_string())?;
    RecordWriter::stdout()
        .write_pretty(&header)
        .map_err(|e| e.to_string())
}

pub fn run_gpt_entry(bytes: &[u8], sector_size: u64) -> Result<(), String> {
    println!("[*] Разбор записи GPT-раздела (сектор {sector_size} байт)");
    let entry = GptPartitionEntry::parse(bytes, sector_size).map_err(|e| e.to_string())?;
    RecordWriter::stdout()
        .write_pretty(&entry)
        .map_err(|e| e.to_string())
}
