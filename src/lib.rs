//! Read-only decoding of raw on-disk partitioning and filesystem
//! structures (MBR tables, GPT headers and entries, FAT32 directory
//! entries) into typed records, plus address-space conversions and
//! checksum/digest verification. The library never performs I/O: callers
//! hand it byte regions and parameters and get records back.

pub mod addressing;
pub mod error;
pub mod integrity;
pub mod layout;

pub use error::LayoutError;
