use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::region::{decode_flags, BitFlag, ByteRegion, Endian, PackedDate, PackedTime};
use crate::error::LayoutError;

/// Semantic kind of one field inside a structure layout.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    UInt,
    Ascii,
    Utf16,
    Guid,
    Bitfield(&'static [BitFlag]),
    PackedDate,
    PackedTime,
    /// Opaque bytes carried as raw hex (packed CHS triplets and the like).
    HexBytes,
}

/// Declarative description of one field: where it sits, how wide it is,
/// and how its bytes turn into a value.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub length: usize,
    pub endian: Endian,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn uint(name: &'static str, offset: usize, length: usize) -> Self {
        Self { name, offset, length, endian: Endian::Little, kind: FieldKind::UInt }
    }

    pub const fn ascii(name: &'static str, offset: usize, length: usize) -> Self {
        Self { name, offset, length, endian: Endian::Little, kind: FieldKind::Ascii }
    }

    pub const fn utf16(name: &'static str, offset: usize, length: usize) -> Self {
        Self { name, offset, length, endian: Endian::Little, kind: FieldKind::Utf16 }
    }

    pub const fn guid(name: &'static str, offset: usize) -> Self {
        Self { name, offset, length: 16, endian: Endian::Little, kind: FieldKind::Guid }
    }

    pub const fn flags(name: &'static str, offset: usize, length: usize, table: &'static [BitFlag]) -> Self {
        Self { name, offset, length, endian: Endian::Little, kind: FieldKind::Bitfield(table) }
    }

    pub const fn date(name: &'static str, offset: usize) -> Self {
        Self { name, offset, length: 2, endian: Endian::Little, kind: FieldKind::PackedDate }
    }

    pub const fn time(name: &'static str, offset: usize) -> Self {
        Self { name, offset, length: 2, endian: Endian::Little, kind: FieldKind::PackedTime }
    }

    pub const fn hex(name: &'static str, offset: usize, length: usize) -> Self {
        Self { name, offset, length, endian: Endian::Little, kind: FieldKind::HexBytes }
    }
}

/// Size contract a region must satisfy before any field is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSize {
    Exact(usize),
    AtLeast(usize),
}

/// One immutable layout definition per structure variant. The static
/// tables in `mbr`, `gpt` and `fat32` are the only instances.
#[derive(Debug)]
pub struct StructLayout {
    pub name: &'static str,
    pub size: LayoutSize,
    pub fields: &'static [FieldSpec],
}

impl StructLayout {
    /// Layout self-consistency: field slices inside the size bound,
    /// usable integer widths, unique names. Checked by the test suite for
    /// every static layout instead of being re-derived per decode call.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let bound = match self.size {
            LayoutSize::Exact(n) | LayoutSize::AtLeast(n) => n,
        };
        for (i, field) in self.fields.iter().enumerate() {
            let end = field.offset.checked_add(field.length).ok_or_else(|| {
                LayoutError::invalid_argument(format!(
                    "{}: field `{}` overflows usize",
                    self.name, field.name
                ))
            })?;
            if end > bound {
                return Err(LayoutError::invalid_argument(format!(
                    "{}: field `{}` ends at {} past the {} byte bound",
                    self.name, field.name, end, bound
                )));
            }
            let width_ok = match field.kind {
                FieldKind::UInt | FieldKind::Bitfield(_) => (1..=8).contains(&field.length),
                FieldKind::Guid => field.length == 16,
                FieldKind::PackedDate | FieldKind::PackedTime => field.length == 2,
                FieldKind::Ascii | FieldKind::Utf16 | FieldKind::HexBytes => field.length > 0,
            };
            if !width_ok {
                return Err(LayoutError::invalid_argument(format!(
                    "{}: field `{}` has unusable width {}",
                    self.name, field.name, field.length
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(LayoutError::invalid_argument(format!(
                    "{}: duplicate field name `{}`",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }

    pub fn check_region(&self, region: &ByteRegion<'_>) -> Result<(), LayoutError> {
        let (needed, ok) = match self.size {
            LayoutSize::Exact(n) => (n, region.len() == n),
            LayoutSize::AtLeast(n) => (n, region.len() >= n),
        };
        if !ok {
            return Err(LayoutError::OutOfBounds {
                context: self.name,
                needed,
                available: region.len(),
            });
        }
        Ok(())
    }

    /// Apply every field of the layout to the region, in declaration order.
    pub fn decode(&self, region: &ByteRegion<'_>) -> Result<DecodedRecord, LayoutError> {
        self.check_region(region)?;
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in self.fields {
            let value = match spec.kind {
                FieldKind::UInt => DecodedValue::UInt(region.read_uint(
                    self.name,
                    spec.offset,
                    spec.length,
                    spec.endian,
                )?),
                FieldKind::Ascii => {
                    DecodedValue::Text(region.read_ascii(self.name, spec.offset, spec.length)?)
                }
                FieldKind::Utf16 => {
                    DecodedValue::Text(region.read_utf16le(self.name, spec.offset, spec.length)?)
                }
                FieldKind::Guid => DecodedValue::Guid(region.read_guid(self.name, spec.offset)?),
                FieldKind::Bitfield(table) => {
                    let raw =
                        region.read_uint(self.name, spec.offset, spec.length, spec.endian)?;
                    DecodedValue::Flags(decode_flags(raw, table))
                }
                FieldKind::PackedDate => {
                    let raw =
                        region.read_uint(self.name, spec.offset, spec.length, spec.endian)?;
                    DecodedValue::Date(PackedDate::decode(raw as u16))
                }
                FieldKind::PackedTime => {
                    let raw =
                        region.read_uint(self.name, spec.offset, spec.length, spec.endian)?;
                    DecodedValue::Time(PackedTime::decode(raw as u16))
                }
                FieldKind::HexBytes => {
                    DecodedValue::Hex(region.read_hex(self.name, spec.offset, spec.length)?)
                }
            };
            fields.push((spec.name, value));
        }
        Ok(DecodedRecord {
            structure: self.name,
            fields,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    UInt(u64),
    Text(String),
    Guid(String),
    Flags(Vec<&'static str>),
    Date(PackedDate),
    Time(PackedTime),
    Hex(String),
}

/// Ordered field name -> value mapping produced by one layout decode.
/// Immutable once produced; carries no reference back to the source bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    structure: &'static str,
    fields: Vec<(&'static str, DecodedValue)>,
}

impl DecodedRecord {
    pub fn structure(&self) -> &'static str {
        self.structure
    }

    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DecodedValue)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    fn missing(&self, field: &'static str) -> LayoutError {
        LayoutError::MissingField {
            structure: self.structure,
            field,
        }
    }

    pub fn uint(&self, name: &'static str) -> Result<u64, LayoutError> {
        match self.get(name) {
            Some(DecodedValue::UInt(v)) => Ok(*v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn text(&self, name: &'static str) -> Result<&str, LayoutError> {
        match self.get(name) {
            Some(DecodedValue::Text(v)) => Ok(v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn guid(&self, name: &'static str) -> Result<&str, LayoutError> {
        match self.get(name) {
            Some(DecodedValue::Guid(v)) => Ok(v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn flags(&self, name: &'static str) -> Result<&[&'static str], LayoutError> {
        match self.get(name) {
            Some(DecodedValue::Flags(v)) => Ok(v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn date(&self, name: &'static str) -> Result<PackedDate, LayoutError> {
        match self.get(name) {
            Some(DecodedValue::Date(v)) => Ok(*v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn time(&self, name: &'static str) -> Result<PackedTime, LayoutError> {
        match self.get(name) {
            Some(DecodedValue::Time(v)) => Ok(*v),
            _ => Err(self.missing(name)),
        }
    }

    pub fn hex(&self, name: &'static str) -> Result<&str, LayoutError> {
        match self.get(name) {
            Some(DecodedValue::Hex(v)) => Ok(v),
            _ => Err(self.missing(name)),
        }
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: StructLayout = StructLayout {
        name: "sample",
        size: LayoutSize::Exact(8),
        fields: &[
            FieldSpec::uint("first", 0, 2),
            FieldSpec::ascii("label", 2, 4),
            FieldSpec::uint("last", 6, 2),
        ],
    };

    #[test]
    fn sample_layout_validates() {
        SAMPLE.validate().unwrap();
    }

    #[test]
    fn decode_preserves_declaration_order() {
        let bytes = [0x01, 0x00, b'o', b'k', 0, 0, 0xFF, 0x00];
        let record = SAMPLE.decode(&ByteRegion::new(&bytes)).unwrap();
        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["first", "label", "last"]);
        assert_eq!(record.uint("first").unwrap(), 1);
        assert_eq!(record.text("label").unwrap(), "ok");
        assert_eq!(record.uint("last").unwrap(), 0xFF);
    }

    #[test]
    fn exact_size_is_enforced_both_ways() {
        let short = [0u8; 7];
        let long = [0u8; 9];
        assert!(matches!(
            SAMPLE.decode(&ByteRegion::new(&short)),
            Err(LayoutError::OutOfBounds { needed: 8, available: 7, .. })
        ));
        assert!(matches!(
            SAMPLE.decode(&ByteRegion::new(&long)),
            Err(LayoutError::OutOfBounds { needed: 8, available: 9, .. })
        ));
    }

    #[test]
    fn mistyped_lookup_is_a_missing_field() {
        let bytes = [0u8; 8];
        let record = SAMPLE.decode(&ByteRegion::new(&bytes)).unwrap();
        assert!(matches!(
            record.guid("first"),
            Err(LayoutError::MissingField { field: "first", .. })
        ));
        assert!(record.get("absent").is_none());
    }

    #[test]
    fn bad_layouts_fail_validation() {
        static PAST_END: StructLayout = StructLayout {
            name: "past_end",
            size: LayoutSize::Exact(4),
            fields: &[FieldSpec::uint("wide", 2, 4)],
        };
        static DUPLICATE: StructLayout = StructLayout {
            name: "duplicate",
            size: LayoutSize::Exact(4),
            fields: &[FieldSpec::uint("x", 0, 2), FieldSpec::uint("x", 2, 2)],
        };
        assert!(PAST_END.validate().is_err());
        assert!(DUPLICATE.validate().is_err());
    }
}
