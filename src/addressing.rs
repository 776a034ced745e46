//! Pure conversions between the addressing domains disks expose:
//! CHS, LBA, cluster, sector and byte offset. All division is integer
//! floor division; arithmetic that would overflow `u64` is rejected
//! instead of wrapping.

use serde::Serialize;

use crate::error::LayoutError;

pub const DEFAULT_HEADS_PER_CYLINDER: u64 = 255;
pub const DEFAULT_SECTORS_PER_TRACK: u64 = 63;
pub const DEFAULT_SECTOR_SIZE: u64 = 512;
/// Clusters 0 and 1 are reserved; data clusters start at 2.
pub const FIRST_DATA_CLUSTER: u64 = 2;

fn overflow(what: &str) -> LayoutError {
    LayoutError::invalid_argument(format!("{what} does not fit in u64"))
}

/// `(cylinder * hpc + head) * spt + (sector - 1)`. Sector numbering is
/// 1-based; cylinder and head are 0-based.
pub fn chs_to_lba(
    cylinder: u64,
    head: u64,
    sector: u64,
    heads_per_cylinder: u64,
    sectors_per_track: u64,
) -> Result<u64, LayoutError> {
    if heads_per_cylinder == 0 || sectors_per_track == 0 {
        return Err(LayoutError::invalid_argument(
            "geometry parameters must be positive",
        ));
    }
    if sector == 0 {
        return Err(LayoutError::invalid_argument(
            "sector numbering is 1-based, got sector 0",
        ));
    }
    cylinder
        .checked_mul(heads_per_cylinder)
        .and_then(|c| c.checked_add(head))
        .and_then(|track| track.checked_mul(sectors_per_track))
        .and_then(|base| base.checked_add(sector - 1))
        .ok_or_else(|| overflow("CHS address"))
}

/// `first_data_sector + (cluster - 2) * sectors_per_cluster`.
pub fn cluster_to_lba(
    cluster: u64,
    first_data_sector: u64,
    sectors_per_cluster: u64,
) -> Result<u64, LayoutError> {
    if sectors_per_cluster == 0 {
        return Err(LayoutError::invalid_argument(
            "sectors per cluster must be positive",
        ));
    }
    if cluster < FIRST_DATA_CLUSTER {
        return Err(LayoutError::invalid_argument(format!(
            "cluster {cluster} is reserved, numbering starts at {FIRST_DATA_CLUSTER}"
        )));
    }
    (cluster - FIRST_DATA_CLUSTER)
        .checked_mul(sectors_per_cluster)
        .and_then(|span| span.checked_add(first_data_sector))
        .ok_or_else(|| overflow("cluster address"))
}

/// `(lba / (cluster_size / sector_size)) + cluster_start`, floor semantics.
pub fn lba_to_cluster(
    lba: u64,
    sector_size: u64,
    cluster_size: u64,
    cluster_start: u64,
) -> Result<u64, LayoutError> {
    if sector_size == 0 || cluster_size == 0 {
        return Err(LayoutError::invalid_argument(
            "sector and cluster sizes must be positive",
        ));
    }
    let sectors_per_cluster = cluster_size / sector_size;
    if sectors_per_cluster == 0 {
        return Err(LayoutError::invalid_argument(format!(
            "cluster size {cluster_size} is smaller than sector size {sector_size}"
        )));
    }
    (lba / sectors_per_cluster)
        .checked_add(cluster_start)
        .ok_or_else(|| overflow("cluster number"))
}

/// `((sector - first_data_sector) / sectors_per_cluster) + 2`.
pub fn sector_to_cluster(
    sector: u64,
    first_data_sector: u64,
    sectors_per_cluster: u64,
) -> Result<u64, LayoutError> {
    if sectors_per_cluster == 0 {
        return Err(LayoutError::invalid_argument(
            "sectors per cluster must be positive",
        ));
    }
    if sector < first_data_sector {
        return Err(LayoutError::invalid_argument(format!(
            "sector {sector} is before the data region at {first_data_sector}"
        )));
    }
    Ok((sector - first_data_sector) / sectors_per_cluster + FIRST_DATA_CLUSTER)
}

/// Byte offset of a sector or LBA start.
pub fn byte_offset(lba: u64, sector_size: u64) -> Result<u64, LayoutError> {
    if sector_size == 0 {
        return Err(LayoutError::invalid_argument("sector size must be positive"));
    }
    lba.checked_mul(sector_size)
        .ok_or_else(|| overflow("byte offset"))
}

/// Absolute distance between two byte addresses, carried in both decimal
/// and hexadecimal renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressDifference {
    pub decimal: u64,
    pub hex: String,
}

pub fn address_difference(a: u64, b: u64) -> AddressDifference {
    let decimal = a.abs_diff(b);
    AddressDifference {
        decimal,
        hex: format!("{decimal:#x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chs_origin_and_first_head() {
        assert_eq!(chs_to_lba(0, 0, 1, 255, 63).unwrap(), 0);
        assert_eq!(chs_to_lba(0, 1, 1, 255, 63).unwrap(), 63);
        assert_eq!(chs_to_lba(1, 0, 1, 255, 63).unwrap(), 255 * 63);
        assert_eq!(chs_to_lba(0, 0, 63, 255, 63).unwrap(), 62);
    }

    #[test]
    fn chs_rejects_bad_geometry() {
        assert!(chs_to_lba(0, 0, 0, 255, 63).is_err());
        assert!(chs_to_lba(0, 0, 1, 0, 63).is_err());
        assert!(chs_to_lba(0, 0, 1, 255, 0).is_err());
        assert!(chs_to_lba(u64::MAX, 0, 1, 255, 63).is_err());
    }

    #[test]
    fn cluster_to_lba_at_the_data_region_start() {
        assert_eq!(cluster_to_lba(2, 2048, 8).unwrap(), 2048);
        assert_eq!(cluster_to_lba(118, 2048, 8).unwrap(), 2048 + 116 * 8);
        assert!(matches!(
            cluster_to_lba(1, 2048, 8),
            Err(LayoutError::InvalidArgument { .. })
        ));
        assert!(cluster_to_lba(0, 2048, 8).is_err());
    }

    #[test]
    fn lba_to_cluster_floors() {
        assert_eq!(lba_to_cluster(0, 512, 4096, 2).unwrap(), 2);
        assert_eq!(lba_to_cluster(7, 512, 4096, 2).unwrap(), 2);
        assert_eq!(lba_to_cluster(8, 512, 4096, 2).unwrap(), 3);
        assert!(lba_to_cluster(8, 512, 256, 2).is_err());
        assert!(lba_to_cluster(8, 0, 4096, 2).is_err());
    }

    #[test]
    fn sector_to_cluster_boundaries() {
        assert_eq!(sector_to_cluster(2048, 2048, 8).unwrap(), 2);
        assert_eq!(sector_to_cluster(2055, 2048, 8).unwrap(), 2);
        assert_eq!(sector_to_cluster(2056, 2048, 8).unwrap(), 3);
        assert!(matches!(
            sector_to_cluster(2047, 2048, 8),
            Err(LayoutError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn byte_offsets_and_differences() {
        assert_eq!(byte_offset(2048, DEFAULT_SECTOR_SIZE).unwrap(), 1_048_576);
        assert!(byte_offset(u64::MAX, 512).is_err());
        assert!(byte_offset(1, 0).is_err());

        let diff = address_difference(0x100000, 0x80);
        assert_eq!(diff.decimal, 0x100000 - 0x80);
        assert_eq!(diff.hex, "0xfff80");
        // Order does not matter.
        assert_eq!(address_difference(0x80, 0x100000), diff);
        assert_eq!(address_difference(5, 5).decimal, 0);
    }
}
