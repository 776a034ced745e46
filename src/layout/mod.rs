//! Fixed-layout decoding of on-disk structures. Each structure variant
//! has one static [`record::StructLayout`] table; the typed parsers in
//! [`mbr`], [`gpt`] and [`fat32`] apply it and add the derived values.

pub mod fat32;
pub mod gpt;
pub mod mbr;
pub mod record;
pub mod region;

pub use record::{DecodedRecord, DecodedValue, FieldKind, FieldSpec, LayoutSize, StructLayout};
pub use region::{BitFlag, ByteRegion, Endian, PackedDate, PackedTime};
