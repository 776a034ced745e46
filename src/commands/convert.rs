use disk_shadow_probe::addressing::{
    address_difference, byte_offset, chs_to_lba, cluster_to_lba, lba_to_cluster,
    sector_to_cluster,
};

use crate::cli::Conversion;
use crate::commands::hex_to_bytes;

fn parse_hex_address(input: &str) -> Result<u64, String> {
    let bytes = hex_to_bytes(input)?;
    if bytes.len() > 8 {
        return Err(format!("адрес {input} не помещается в u64"));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

pub fn run(conversion: &Conversion) -> Result<(), String> {
    match conversion {
        Conversion::ChsToLba { cylinder, head, sector, hpc, spt } => {
            let lba =
                chs_to_lba(*cylinder, *head, *sector, *hpc, *spt).map_err(|e| e.to_string())?;
            println!("LBA: {lba}");
        }
        Conversion::ClusterToLba { cluster, first_data_sector, sectors_per_cluster } => {
            let lba = cluster_to_lba(*cluster, *first_data_sector, *sectors_per_cluster)
                .map_err(|e| e.to_string())?;
            println!("Кластер {cluster} -> LBA {lba}");
        }
        Conversion::LbaToCluster { lba, sector_size, cluster_size, cluster_start } => {
            let cluster = lba_to_cluster(*lba, *sector_size, *cluster_size, *cluster_start)
                .map_err(|e| e.to_string())?;
            println!("LBA {lba} -> кластер {cluster}");
        }
        Conversion::SectorToCluster { sector, first_data_sector, sectors_per_cluster } => {
            let cluster = sector_to_cluster(*sector, *first_data_sector, *sectors_per_cluster)
                .map_err(|e| e.to_string())?;
            println!("Сектор {sector} -> кластер {cluster}");
        }
        Conversion::Offset { lba, sector_size, until } => {
            let offset = byte_offset(*lba, *sector_size).map_err(|e| e.to_string())?;
            println!("Смещение: {offset} байт ({offset:#x})");
            if let Some(until) = until {
                let end = parse_hex_address(until)?;
                let diff = address_difference(end, offset);
                println!("Разница: {} байт ({})", diff.decimal, diff.hex);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_addresses_accept_prefix_and_odd_digits_fail() {
        assert_eq!(parse_hex_address("0x200000").unwrap(), 0x200000);
        assert_eq!(parse_hex_address("ff").unwrap(), 0xFF);
        assert!(parse_hex_address("0x123").is_err()); // нечётная длина
        assert!(parse_hex_address("11223344556677889900").is_err());
    }
}
