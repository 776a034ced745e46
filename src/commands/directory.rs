use std::fs::File;
use std::io::BufWriter;

use disk_shadow_probe::layout::fat32::parse_directory;

use crate::output::RecordWriter;

pub fn run(bytes: &[u8], out_json: Option<&str>) -> Result<(), String> {
    println!("[*] Разбор каталога FAT32 ({} байт)", bytes.len());
    let batch = parse_directory(bytes).map_err(|e| e.to_string())?;
    println!(
        "[*] Записей: {}, отброшено хвостовых байтов: {}",
        batch.entries.len(),
        batch.discarded_trailing_bytes
    );

    match out_json {
        Some(path) => {
            let file = File::create(path).map_err(|e| format!("не удалось создать {path}: {e}"))?;
            let mut writer = RecordWriter::new(BufWriter::new(file));
            for entry in &batch.entries {
                writer.write_line(entry).map_err(|e| e.to_string())?;
            }
            writer.flush().map_err(|e| e.to_string())?;
            println!("[*] Готово: {path}");
        }
        None => {
            let mut writer = RecordWriter::stdout();
            for entry in &batch.entries {
                writer.write_line(entry).map_err(|e| e.to_string())?;
            }
            writer.flush().map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}
