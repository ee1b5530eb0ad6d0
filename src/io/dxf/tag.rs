//! The tag: one group code and its typed value

use std::fmt;

use super::binary::CompressedBinary;
use super::group_code::GroupCodeValueType;
use crate::error::{DxfError, Result};
use crate::types::{Handle, Vector3};

/// Typed value of a tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Str(String),
    Int(i64),
    Float(f64),
    Handle(Handle),
    Binary(Vec<u8>),
    /// Run of binary chunks stored zlib compressed in memory
    Compressed(CompressedBinary),
}

/// A group code / value pair
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub code: i32,
    pub value: TagValue,
}

impl Tag {
    /// Create a tag from a code and an already typed value.
    pub fn new(code: i32, value: TagValue) -> Self {
        Self { code, value }
    }

    pub fn string(code: i32, value: impl Into<String>) -> Self {
        Self::new(code, TagValue::Str(value.into()))
    }

    pub fn int(code: i32, value: i64) -> Self {
        Self::new(code, TagValue::Int(value))
    }

    pub fn float(code: i32, value: f64) -> Self {
        Self::new(code, TagValue::Float(value))
    }

    pub fn handle(code: i32, value: Handle) -> Self {
        Self::new(code, TagValue::Handle(value))
    }

    pub fn binary(code: i32, value: Vec<u8>) -> Self {
        Self::new(code, TagValue::Binary(value))
    }

    /// Structure tag `0 <name>` opening a group.
    pub fn structure(name: &str) -> Self {
        Self::string(0, name)
    }

    /// Subclass marker `100 <name>`.
    pub fn subclass(name: &str) -> Self {
        Self::string(100, name)
    }

    /// Coordinate tags `code`, `code + 10`, `code + 20`.
    pub fn point(code: i32, p: Vector3) -> [Tag; 3] {
        [
            Self::float(code, p.x),
            Self::float(code + 10, p.y),
            Self::float(code + 20, p.z),
        ]
    }

    /// Parse a raw value line according to the value type of `code`.
    ///
    /// `line` is only used for error reporting.
    pub fn parse(code: i32, raw: &str, line: usize) -> Result<Self> {
        let value = match GroupCodeValueType::from_code(code) {
            GroupCodeValueType::String => TagValue::Str(raw.to_string()),
            GroupCodeValueType::Integer => {
                let text = raw.trim();
                let value = text.parse::<i64>().map_err(|_| {
                    DxfError::decode(line, format!("invalid integer '{}' for group code {}", text, code))
                })?;
                TagValue::Int(value)
            }
            GroupCodeValueType::Double => {
                let text = raw.trim();
                let value = text.parse::<f64>().map_err(|_| {
                    DxfError::decode(line, format!("invalid float '{}' for group code {}", text, code))
                })?;
                TagValue::Float(value)
            }
            GroupCodeValueType::Handle => {
                let handle = Handle::from_hex(raw).ok_or_else(|| {
                    DxfError::decode(line, format!("invalid handle '{}' for group code {}", raw.trim(), code))
                })?;
                TagValue::Handle(handle)
            }
            GroupCodeValueType::Binary => {
                let bytes = decode_hex(raw.trim()).ok_or_else(|| {
                    DxfError::decode(line, format!("invalid binary data for group code {}", code))
                })?;
                TagValue::Binary(bytes)
            }
        };
        Ok(Self { code, value })
    }

    /// String value, if this is a text tag
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is an integer tag
    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            TagValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Float value; integer tags are widened
    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            TagValue::Float(v) => Some(v),
            TagValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Handle value, if this is a handle tag
    pub fn as_handle(&self) -> Option<Handle> {
        match self.value {
            TagValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// True if this is `0 <name>`.
    pub fn is_structure(&self, name: &str) -> bool {
        self.code == 0 && self.as_str().map_or(false, |s| s.trim() == name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            TagValue::Str(s) => write!(f, "({}, {:?})", self.code, s),
            TagValue::Int(v) => write!(f, "({}, {})", self.code, v),
            TagValue::Float(v) => write!(f, "({}, {})", self.code, v),
            TagValue::Handle(h) => write!(f, "({}, {:X})", self.code, h),
            TagValue::Binary(b) => write!(f, "({}, <{} bytes>)", self.code, b.len()),
            TagValue::Compressed(c) => {
                write!(f, "({}, <{} chunks compressed>)", self.code, c.chunk_count())
            }
        }
    }
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| text.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_code_range() {
        assert_eq!(Tag::parse(0, "LINE", 1).unwrap(), Tag::string(0, "LINE"));
        assert_eq!(Tag::parse(70, "  42", 1).unwrap(), Tag::int(70, 42));
        assert_eq!(Tag::parse(10, "1.5", 1).unwrap(), Tag::float(10, 1.5));
        assert_eq!(Tag::parse(5, "2F", 1).unwrap(), Tag::handle(5, Handle::new(0x2F)));
        assert_eq!(
            Tag::parse(310, "00FF10", 1).unwrap(),
            Tag::binary(310, vec![0x00, 0xFF, 0x10])
        );
    }

    #[test]
    fn test_strings_keep_interior_spaces() {
        let tag = Tag::parse(1, " some text ", 1).unwrap();
        assert_eq!(tag.as_str(), Some(" some text "));
    }

    #[test]
    fn test_malformed_values_fail_with_line() {
        match Tag::parse(70, "abc", 17) {
            Err(DxfError::Decode { line, .. }) => assert_eq!(line, 17),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(Tag::parse(10, "1,5", 1).is_err());
        assert!(Tag::parse(330, "ZZ", 1).is_err());
        assert!(Tag::parse(310, "ABC", 1).is_err());
    }

    #[test]
    fn test_structure() {
        assert!(Tag::structure("SECTION").is_structure("SECTION"));
        assert!(!Tag::string(2, "SECTION").is_structure("SECTION"));
    }

    #[test]
    fn test_float_widening() {
        assert_eq!(Tag::int(62, 7).as_float(), Some(7.0));
    }
}
