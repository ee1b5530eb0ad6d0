//! ASCII DXF writer

use std::io::Write;

use encoding_rs::Encoding;

use super::TagWriter;
use crate::error::Result;
use crate::io::dxf::{Tag, TagValue};

/// ASCII DXF stream writer
pub struct DxfTextWriter<W: Write> {
    writer: W,
    encoding: &'static Encoding,
}

impl<W: Write> DxfTextWriter<W> {
    /// Create a new ASCII DXF writer producing UTF-8
    pub fn new(writer: W) -> Self {
        Self::with_encoding(writer, encoding_rs::UTF_8)
    }

    /// Create a writer encoding text with a legacy code page.
    ///
    /// Characters the code page cannot represent are written as `\U+XXXX`.
    pub fn with_encoding(writer: W, encoding: &'static Encoding) -> Self {
        Self { writer, encoding }
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write a group code right-aligned in a 3-character field
    fn write_code(&mut self, code: i32) -> Result<()> {
        writeln!(self.writer, "{:>3}", code)?;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let bytes = encode_text(text, self.encoding);
        self.writer.write_all(&bytes)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn write_binary(&mut self, code: i32, data: &[u8]) -> Result<()> {
        self.write_code(code)?;
        for byte in data {
            write!(self.writer, "{:02X}", byte)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> TagWriter for DxfTextWriter<W> {
    fn write_tag(&mut self, tag: &Tag) -> Result<()> {
        match &tag.value {
            TagValue::Str(s) => {
                self.write_code(tag.code)?;
                self.write_text(s)
            }
            TagValue::Int(v) => {
                self.write_code(tag.code)?;
                writeln!(self.writer, "{}", v)?;
                Ok(())
            }
            TagValue::Float(v) => {
                self.write_code(tag.code)?;
                writeln!(self.writer, "{}", format_float(*v))?;
                Ok(())
            }
            TagValue::Handle(h) => {
                self.write_code(tag.code)?;
                writeln!(self.writer, "{:X}", h)?;
                Ok(())
            }
            TagValue::Binary(data) => self.write_binary(tag.code, data),
            TagValue::Compressed(packed) => {
                for chunk in packed.expand()? {
                    self.write_binary(tag.code, &chunk)?;
                }
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Shortest representation that reads back to the same value, always with
/// a decimal point.
fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}

fn encode_text(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    if encoding == encoding_rs::UTF_8 || text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch as u8);
            continue;
        }
        let (bytes, _, had_errors) = encoding.encode(ch.encode_utf8(&mut buf));
        if had_errors {
            out.extend_from_slice(format!("\\U+{:04X}", ch as u32).as_bytes());
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dxf::writer::TagWriterExt;
    use crate::types::Handle;

    fn written(tags: &[Tag], encoding: &'static Encoding) -> Vec<u8> {
        let mut writer = DxfTextWriter::with_encoding(Vec::new(), encoding);
        writer.write_tags(tags).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_code_alignment() {
        let out = written(
            &[Tag::string(0, "LINE"), Tag::int(62, 1), Tag::string(100, "AcDbLine")],
            encoding_rs::UTF_8,
        );
        assert_eq!(String::from_utf8(out).unwrap(), "  0\nLINE\n 62\n1\n100\nAcDbLine\n");
    }

    #[test]
    fn test_value_formats() {
        let out = written(
            &[
                Tag::float(10, 1.0),
                Tag::float(20, 0.1),
                Tag::handle(5, Handle::new(0x2AF)),
                Tag::binary(310, vec![0x0A, 0xFF]),
            ],
            encoding_rs::UTF_8,
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            " 10\n1.0\n 20\n0.1\n  5\n2AF\n310\n0AFF\n"
        );
    }

    #[test]
    fn test_unencodable_characters_are_escaped() {
        let out = written(&[Tag::string(1, "é€Ж")], encoding_rs::WINDOWS_1252);
        // é and € exist in Windows-1252, Ж does not
        assert_eq!(out, b"  1\n\xE9\x80\\U+0416\n");
    }

    #[test]
    fn test_float_round_trip() {
        for value in [0.0, -1.5, 1e-9, 123456789.123, 1e21] {
            let text = format_float(value);
            assert_eq!(text.parse::<f64>().unwrap(), value);
        }
    }
}
