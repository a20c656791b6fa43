//! Named bitfield layouts.
//!
//! A layout describes how a word of a fixed width splits into named fields, for
//! instance the fields of an instruction encoding or a hardware register:
//!
//! ```toml
//! width = 32
//!
//! [fields.op]
//! start = 26
//! end = 32
//!
//! [fields.imm]
//! start = 0
//! end = 16
//! signed = true
//! ```
//!
//! Fields may overlap, since encodings often reinterpret the same bits.

use crate::bit::SignExtend;
use crate::error::Error;
use crate::range::BitRange;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::fmt;
use std::fs;

/// Word widths a layout can describe.
const WIDTHS: [usize; 5] = [8, 16, 32, 64, 128];

#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("failed to load layout file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize layout: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to deserialize layout: {0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("unsupported word width {0}, must be 8, 16, 32, 64 or 128")]
    Width(usize),

    #[error("layout is {layout} bits wide, but the word is {word} bits")]
    WidthMismatch {
        layout: usize,
        word: usize,
    },

    #[error("field '{name}': {source}")]
    Field {
        name: String,
        #[source]
        source: Error,
    },
}

impl LayoutError {
    fn field(name: &str, source: Error) -> Self {
        LayoutError::Field { name: name.to_string(), source }
    }
}

/// A single named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct Field {
    pub range: BitRange,
    /// Interpret the field as two's complement.
    pub signed: bool,
}

impl Field {
    pub fn unsigned(range: BitRange) -> Self {
        Self { range, signed: false }
    }

    pub fn signed(range: BitRange) -> Self {
        Self { range, signed: true }
    }

    /// Extract the field from `value`, sign extended if the field is signed.
    pub fn extract<W: SignExtend>(&self, value: W) -> Result<Value, Error> {
        let raw = value.checked_extract_bitfield(self.range)?.widen();
        Ok(if self.signed {
            Value::Signed(raw.sign_extend(self.range.len()))
        } else {
            Value::Unsigned(raw)
        })
    }
}

#[derive(Serialize, Deserialize)]
struct RawField {
    start: usize,
    end: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    signed: bool,
}

fn is_false(val: &bool) -> bool {
    !*val
}

impl TryFrom<RawField> for Field {
    type Error = Error;

    fn try_from(raw: RawField) -> Result<Self, Error> {
        Ok(Self {
            range: BitRange::new(raw.start, raw.end)?,
            signed: raw.signed,
        })
    }
}

impl From<Field> for RawField {
    fn from(field: Field) -> Self {
        Self {
            start: field.range.start(),
            end: field.range.end(),
            signed: field.signed,
        }
    }
}

/// Value of a decoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Unsigned(u128),
    Signed(i128),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Unsigned(val) => write!(f, "{val:#x}"),
            Value::Signed(val) => write!(f, "{val}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded<'a> {
    pub name: &'a str,
    pub range: BitRange,
    pub value: Value,
}

impl fmt::Display for Decoded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}] = {}", self.name, self.range, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    width: usize,
    #[serde(default)]
    fields: BTreeMap<String, Field>,
}

impl Layout {
    /// Empty layout for words of `width` bits.
    pub fn new(width: usize) -> Result<Self, LayoutError> {
        if !WIDTHS.contains(&width) {
            return Err(LayoutError::Width(width));
        }
        Ok(Self { width, fields: BTreeMap::new() })
    }

    /// Add or replace the field `name`.
    pub fn with_field(mut self, name: &str, field: Field) -> Result<Self, LayoutError> {
        self.check_field(name, &field)?;
        self.fields.insert(name.to_string(), field);
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields sorted by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    fn check_field(&self, name: &str, field: &Field) -> Result<(), LayoutError> {
        if field.range.end() > self.width {
            return Err(LayoutError::field(
                name,
                Error::OutOfRange { index: field.range.end(), width: self.width },
            ));
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if !WIDTHS.contains(&self.width) {
            return Err(LayoutError::Width(self.width));
        }
        for (name, field) in &self.fields {
            self.check_field(name, field)?;
        }
        for (i, (a, fa)) in self.fields.iter().enumerate() {
            for (b, fb) in self.fields.iter().skip(i + 1) {
                if fa.range.overlaps(fb.range) {
                    warn!("fields '{a}' ({}) and '{b}' ({}) overlap", fa.range, fb.range);
                }
            }
        }
        Ok(())
    }

    pub fn from_toml(input: &str) -> Result<Self, LayoutError> {
        let layout: Self = toml::from_str(input)?;
        layout.validate()?;
        debug!("parsed {}-bit layout with {} fields", layout.width, layout.fields.len());
        Ok(layout)
    }

    pub fn to_toml(&self) -> Result<String, LayoutError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        debug!("loading layout from {}", path.display());
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn store(&self, path: &Path) -> Result<(), LayoutError> {
        debug!("storing layout to {}", path.display());
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let string = self.to_toml()?;
        Ok(file.write_all(string.as_bytes())?)
    }

    fn check_word<W: SignExtend>(&self) -> Result<(), LayoutError> {
        if W::BITS != self.width {
            return Err(LayoutError::WidthMismatch { layout: self.width, word: W::BITS });
        }
        Ok(())
    }

    /// Split `value` into its fields, sorted by name.
    pub fn decode<W: SignExtend>(&self, value: W) -> Result<Vec<Decoded<'_>>, LayoutError> {
        self.check_word::<W>()?;
        self.fields
            .iter()
            .map(|(name, field)| {
                let value = field
                    .extract(value)
                    .map_err(|err| LayoutError::field(name, err))?;
                trace!("{name} [{}] = {value}", field.range);
                Ok(Decoded { name, range: field.range, value })
            })
            .collect()
    }

    /// Decode a single field. `None` if the layout has no field called `name`.
    pub fn decode_field<W: SignExtend>(
        &self,
        value: W,
        name: &str,
    ) -> Result<Option<Value>, LayoutError> {
        self.check_word::<W>()?;
        let Some(field) = self.fields.get(name) else {
            return Ok(None);
        };
        field
            .extract(value)
            .map(Some)
            .map_err(|err| LayoutError::field(name, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMMEDIATE: &str = r#"
        width = 32

        [fields.op]
        start = 26
        end = 32

        [fields.rs]
        start = 21
        end = 26

        [fields.rt]
        start = 16
        end = 21

        [fields.imm]
        start = 0
        end = 16
        signed = true
    "#;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn range(start: usize, end: usize) -> BitRange {
        BitRange::new(start, end).unwrap()
    }

    #[test]
    fn decode_immediate() {
        init();

        let layout = Layout::from_toml(IMMEDIATE).unwrap();
        assert_eq!(layout.width(), 32);

        // `addiu $sp, $sp, -24`.
        let decoded = layout.decode(0x27bd_ffe8_u32).unwrap();
        let names: Vec<&str> = decoded.iter().map(|d| d.name).collect();
        assert_eq!(names, ["imm", "op", "rs", "rt"]);

        assert_eq!(decoded[0].value, Value::Signed(-24));
        assert_eq!(decoded[1].value, Value::Unsigned(0x09));
        assert_eq!(decoded[2].value, Value::Unsigned(29));
        assert_eq!(decoded[3].value, Value::Unsigned(29));
        assert_eq!(decoded[1].to_string(), "op [26..32] = 0x9");
    }

    #[test]
    fn decode_field() {
        let layout = Layout::from_toml(IMMEDIATE).unwrap();
        let ins = 0x2408_7fff_u32;
        assert_eq!(layout.decode_field(ins, "imm").unwrap(), Some(Value::Signed(0x7fff)));
        assert_eq!(layout.decode_field(ins, "rt").unwrap(), Some(Value::Unsigned(8)));
        assert_eq!(layout.decode_field(ins, "funct").unwrap(), None);
    }

    #[test]
    fn width_mismatch() {
        let layout = Layout::from_toml(IMMEDIATE).unwrap();
        assert!(matches!(
            layout.decode(0_u64),
            Err(LayoutError::WidthMismatch { layout: 32, word: 64 }),
        ));
        assert!(matches!(
            layout.decode(0xffff_u16),
            Err(LayoutError::WidthMismatch { layout: 32, word: 16 }),
        ));
    }

    #[test]
    fn decode_field_width_mismatch() {
        let layout = Layout::from_toml(IMMEDIATE).unwrap();
        assert!(matches!(
            layout.decode_field(0xffff_u16, "imm"),
            Err(LayoutError::WidthMismatch { layout: 32, word: 16 }),
        ));
        assert!(matches!(
            layout.decode_field(u64::MAX, "op"),
            Err(LayoutError::WidthMismatch { layout: 32, word: 64 }),
        ));
        assert!(matches!(
            layout.decode_field(u64::MAX, "funct"),
            Err(LayoutError::WidthMismatch { layout: 32, word: 64 }),
        ));
    }

    #[test]
    fn field_extract() {
        let imm = Field::signed(range(0, 16));
        assert_eq!(imm.extract(0x27bd_ffe8_u32), Ok(Value::Signed(-24)));
        assert_eq!(Field::unsigned(range(0, 16)).extract(0x27bd_ffe8_u32), Ok(Value::Unsigned(0xffe8)));
        assert_eq!(
            Field::unsigned(range(0, 16)).extract(0xff_u8),
            Err(Error::OutOfRange { index: 16, width: 8 }),
        );
    }

    #[test]
    fn reversed_field() {
        let input = r#"
            width = 16

            [fields.bad]
            start = 10
            end = 5
        "#;
        assert!(matches!(Layout::from_toml(input), Err(LayoutError::Deserialize(_))));
    }

    #[test]
    fn field_out_of_range() {
        let input = r#"
            width = 64

            [fields.high]
            start = 60
            end = 70
        "#;
        match Layout::from_toml(input) {
            Err(LayoutError::Field { name, source }) => {
                assert_eq!(name, "high");
                assert_eq!(source, Error::OutOfRange { index: 70, width: 64 });
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unsupported_width() {
        assert!(matches!(Layout::from_toml("width = 24"), Err(LayoutError::Width(24))));
        assert!(matches!(Layout::new(0), Err(LayoutError::Width(0))));
    }

    #[test]
    fn overlapping_fields_are_allowed() {
        init();

        let layout = Layout::new(32)
            .unwrap()
            .with_field("target", Field::unsigned(range(0, 26)))
            .unwrap()
            .with_field("imm", Field::unsigned(range(0, 16)))
            .unwrap();

        assert!(Layout::from_toml(&layout.to_toml().unwrap()).is_ok());
    }

    #[test]
    fn builder() {
        let layout = Layout::new(8)
            .unwrap()
            .with_field("low", Field::unsigned(range(0, 4)))
            .unwrap()
            .with_field("high", Field::signed(range(4, 8)))
            .unwrap();

        let names: Vec<&str> = layout.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["high", "low"]);
        assert_eq!(layout.get("high"), Some(&Field::signed(range(4, 8))));
        assert_eq!(layout.decode_field(0xf3_u8, "high").unwrap(), Some(Value::Signed(-1)));
        assert_eq!(layout.decode_field(0xf3_u8, "low").unwrap(), Some(Value::Unsigned(3)));

        assert!(Layout::new(8)
            .unwrap()
            .with_field("wide", Field::unsigned(range(0, 9)))
            .is_err());
    }

    #[test]
    fn store_and_load() {
        init();

        let layout = Layout::from_toml(IMMEDIATE).unwrap();
        let path = std::env::temp_dir().join(format!("bitfields-layout-{}.toml", std::process::id()));

        layout.store(&path).unwrap();
        let loaded = Layout::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(layout, loaded);
        assert_eq!(loaded.get("imm"), Some(&Field::signed(range(0, 16))));
        assert_eq!(loaded.get("op"), Some(&Field::unsigned(range(26, 32))));
    }

    #[test]
    fn missing_file() {
        let path = Path::new("/nonexistent/bitfields/layout.toml");
        assert!(matches!(Layout::load(path), Err(LayoutError::Io(_))));
    }
}
