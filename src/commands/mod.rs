pub mod convert;
pub mod directory;
pub mod hash;
pub mod partitions;

use std::fs;

use crate::cli::InputArgs;

/// Переводит hex-строку в байты: пробелы, переводы строк и префикс 0x
/// игнорируются (hex копируют прямо из hex-редактора).
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, String> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    hex::decode(cleaned).map_err(|e| format!("некорректная hex-строка: {e}"))
}

pub fn read_input(input: &InputArgs) -> Result<Vec<u8>, String> {
    match (&input.hex, &input.file) {
        (Some(hex), _) => hex_to_bytes(hex),
        (None, Some(path)) => {
            fs::read(path).map_err(|e| format!("не удалось прочитать {path}: {e}"))
        }
        (None, None) => Err("нужен --hex или --file".to_string()),
    }
}
