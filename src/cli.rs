use clap::{Args, Parser, Subcommand};
use disk_shadow_probe::addressing::{
    DEFAULT_HEADS_PER_CYLINDER, DEFAULT_SECTOR_SIZE, DEFAULT_SECTORS_PER_TRACK,
};

const ASCII_LOGO: &str = r#"
     ____  _     _    ____  _               _               ____            _
    |  _ \(_)___| | _/ ___|| |__   __ _  __| | _____      _|  _ \ _ __ ___ | |__   ___
    | | | | / __| |/ /\___ \| '_ \ / _` |/ _` |/ _ \ \ /\ / / |_) | '__/ _ \| '_ \ / _ \
    | |_| | \__ \   <  ___) | | | | (_| | (_| | (_) \ V  V /|  __/| | | (_) | |_) |  __/
    |____/|_|___/_|\_\|____/|_| |_|\__,_|\__,_|\___/ \_/\_/ |_|   |_|  \___/|_.__/ \___|
"#;

const EXAMPLES: &str = r#"
ПРИМЕРЫ ИСПОЛЬЗОВАНИЯ:

  1. MBR-ЗАПИСЬ (16 байт, hex из hex-редактора)
     DiskShadowProbe mbr --hex "80 20 21 00 0c fe ff ff 00 08 00 00 00 20 03 00"

     Весь загрузочный сектор (512 байт) из файла:
     DiskShadowProbe mbr --file sector0.bin --table

  2. ЗАГОЛОВОК GPT (>= 92 байт) с проверкой CRC32
     DiskShadowProbe gpt-header --file lba1.bin

  3. ЗАПИСЬ GPT-РАЗДЕЛА (128 байт)
     DiskShadowProbe gpt-entry --file entry.bin --sector-size 4096

  4. КАТАЛОГ FAT32 (поток 32-байтных записей) в JSONL
     DiskShadowProbe fat32 --file dir.bin --out-json dir.jsonl

  5. ОТПЕЧАТКИ ЗАПИСИ (SHA-256 / SHA-512)
     DiskShadowProbe hash --hex "802021000cfeffff0008000000200300"

  6. ПРЕОБРАЗОВАНИЯ АДРЕСОВ
     DiskShadowProbe convert chs-to-lba 0 1 1
     DiskShadowProbe convert cluster-to-lba 118 2048 8
     DiskShadowProbe convert offset 2048 --until 0x200000
"#;

#[derive(Parser, Debug)]
#[command(name = "DiskShadowProbe")]
#[command(version = "1.0")]
#[command(before_help = ASCII_LOGO)] // Вставляем логотип НАД меню
#[command(about = "DFIR tool for decoding on-disk partition tables and FAT32 directory structures")]
#[command(after_help = EXAMPLES)]    // Вставляем примеры ПОД меню
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Источник байтов структуры: hex-строка или файл с сырыми байтами.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Hex-строка (пробелы и префикс 0x допустимы)
    #[arg(short = 'x', long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Файл с сырыми байтами
    #[arg(short, long)]
    pub file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Разбирает 16-байтную запись MBR (или весь сектор с --table)
    Mbr {
        #[command(flatten)]
        input: InputArgs,
        /// Разобрать все 4 слота таблицы из полного 512-байтного сектора
        #[arg(short, long)]
        table: bool,
    },
    /// Разбирает заголовок GPT (>= 92 байт) и сверяет CRC32
    GptHeader {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Разбирает 128-байтную запись GPT-раздела
    GptEntry {
        #[command(flatten)]
        input: InputArgs,
        /// Размер сектора для вычисления размера раздела в байтах
        #[arg(short, long, default_value_t = DEFAULT_SECTOR_SIZE)]
        sector_size: u64,
    },
    /// Разбирает каталог FAT32 (поток 32-байтных записей) в JSONL
    Fat32 {
        #[command(flatten)]
        input: InputArgs,
        /// Путь к итоговому JSONL (по умолчанию - stdout)
        #[arg(short = 'j', long)]
        out_json: Option<String>,
    },
    /// SHA-256 / SHA-512 отпечатки сырых байтов записи
    Hash {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Преобразования адресов: CHS / LBA / кластер / сектор / смещение
    Convert {
        #[command(subcommand)]
        conversion: Conversion,
    },
}

#[derive(Subcommand, Debug)]
pub enum Conversion {
    /// CHS -> LBA
    ChsToLba {
        cylinder: u64,
        head: u64,
        /// Номер сектора (нумерация с 1)
        sector: u64,
        #[arg(long, default_value_t = DEFAULT_HEADS_PER_CYLINDER)]
        hpc: u64,
        #[arg(long, default_value_t = DEFAULT_SECTORS_PER_TRACK)]
        spt: u64,
    },
    /// Кластер -> LBA
    ClusterToLba {
        cluster: u64,
        first_data_sector: u64,
        sectors_per_cluster: u64,
    },
    /// LBA -> кластер
    LbaToCluster {
        lba: u64,
        #[arg(long, default_value_t = DEFAULT_SECTOR_SIZE)]
        sector_size: u64,
        #[arg(long, default_value_t = 4096)]
        cluster_size: u64,
        #[arg(long, default_value_t = 2)]
        cluster_start: u64,
    },
    /// Сектор -> кластер
    SectorToCluster {
        sector: u64,
        first_data_sector: u64,
        sectors_per_cluster: u64,
    },
    /// Байтовое смещение LBA, опционально разница до второго адреса
    Offset {
        lba: u64,
        #[arg(long, default_value_t = DEFAULT_SECTOR_SIZE)]
        sector_size: u64,
        /// Адрес конца данных (hex) для вычисления разницы
        #[arg(long)]
        until: Option<String>,
    },
}
