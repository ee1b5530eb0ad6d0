//! DXF ASCII text reader

use std::borrow::Cow;
use std::io::BufRead;

use encoding_rs::Encoding;

use super::TagStream;
use crate::error::{DxfError, Result};
use crate::io::dxf::Tag;

/// DXF ASCII tag reader.
///
/// Each tag spans two lines: the group code and the value. Lines are read
/// lazily; nothing is buffered beyond one pushed back tag.
pub struct DxfTextReader<R: BufRead> {
    reader: R,
    line_number: usize,
    pushed_back: Option<Tag>,
    /// Decoding for non-UTF-8 input. `None` means UTF-8 with a
    /// Windows-1252 fallback for invalid lines.
    encoding: Option<&'static Encoding>,
    /// Replace `\U+XXXX` escapes in values; off for Unicode revisions
    unicode_escapes: bool,
    buffer: Vec<u8>,
}

impl<R: BufRead> DxfTextReader<R> {
    /// Create a new DXF text reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            pushed_back: None,
            encoding: None,
            unicode_escapes: true,
            buffer: Vec::with_capacity(256),
        }
    }

    /// Read one line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.buffer.clear();
        let count = self.reader.read_until(b'\n', &mut self.buffer)?;
        if count == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(self.buffer.last(), Some(b'\n') | Some(b'\r')) {
            self.buffer.pop();
        }

        let line = match self.encoding {
            Some(enc) => enc.decode_without_bom_handling(&self.buffer).0.into_owned(),
            None => match std::str::from_utf8(&self.buffer) {
                Ok(s) => s.to_string(),
                Err(_) => encoding_rs::WINDOWS_1252
                    .decode_without_bom_handling(&self.buffer)
                    .0
                    .into_owned(),
            },
        };
        Ok(Some(line))
    }

    fn read_tag_internal(&mut self) -> Result<Option<Tag>> {
        let code_line = loop {
            match self.read_line()? {
                // Tolerate blank lines between tags (e.g. a trailing newline after EOF)
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
                None => return Ok(None),
            }
        };
        let code_line_number = self.line_number;

        let code = code_line
            .trim()
            .trim_start_matches('\u{feff}')
            .parse::<i32>()
            .map_err(|_| {
                DxfError::decode(
                    code_line_number,
                    format!("invalid group code '{}'", code_line.trim()),
                )
            })?;

        let value = self.read_line()?.ok_or_else(|| {
            DxfError::decode(
                code_line_number,
                format!("missing value line after group code {}", code),
            )
        })?;

        // Structure names and table entry names never carry meaningful spaces
        let value = if code == 0 || code == 2 {
            value.trim().to_string()
        } else {
            value
        };
        let value = if self.unicode_escapes {
            match decode_unicode_escapes(&value) {
                Cow::Owned(decoded) => decoded,
                Cow::Borrowed(_) => value,
            }
        } else {
            value
        };

        Tag::parse(code, &value, self.line_number).map(Some)
    }
}

impl<R: BufRead> TagStream for DxfTextReader<R> {
    fn read_tag(&mut self) -> Result<Option<Tag>> {
        if let Some(tag) = self.pushed_back.take() {
            return Ok(Some(tag));
        }
        self.read_tag_internal()
    }

    fn push_back(&mut self, tag: Tag) {
        self.pushed_back = Some(tag);
    }

    fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = Some(encoding);
    }

    fn set_unicode_escapes(&mut self, enabled: bool) {
        self.unicode_escapes = enabled;
    }

    fn line_number(&self) -> usize {
        self.line_number
    }
}

/// Replace `\U+XXXX` sequences (four hex digits) with their character.
///
/// Code page text uses them for characters outside the code page.
/// Malformed sequences and surrogates are kept as written.
pub fn decode_unicode_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains("\\U+") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("\\U+") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 3..];
        let decoded = after
            .get(..4)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &after[4..];
            }
            None => {
                out.push_str("\\U+");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

impl<R: BufRead> Iterator for DxfTextReader<R> {
    type Item = Result<Tag>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_tag().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dxf::TagValue;
    use crate::types::Handle;
    use std::io::Cursor;

    fn reader(data: &[u8]) -> DxfTextReader<Cursor<Vec<u8>>> {
        DxfTextReader::new(Cursor::new(data.to_vec()))
    }

    #[test]
    fn test_read_simple_pair() {
        let mut r = reader(b"  0\nSECTION\n");
        let tag = r.read_tag().unwrap().unwrap();
        assert_eq!(tag, Tag::string(0, "SECTION"));
        assert!(r.read_tag().unwrap().is_none());
    }

    #[test]
    fn test_crlf_and_typed_values() {
        let mut r = reader(b" 70\r\n42\r\n 10\r\n123.456\r\n  5\r\n1F\r\n");
        let tags: Vec<Tag> = r.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(tags[0].value, TagValue::Int(42));
        assert_eq!(tags[1].value, TagValue::Float(123.456));
        assert_eq!(tags[2].value, TagValue::Handle(Handle::new(0x1F)));
        assert_eq!(r.line_number(), 6);
    }

    #[test]
    fn test_push_back_and_peek() {
        let mut r = reader(b"0\nSECTION\n2\nHEADER\n");
        assert_eq!(r.peek_code().unwrap(), Some(0));
        let tag = r.read_tag().unwrap().unwrap();
        assert!(tag.is_structure("SECTION"));
        r.push_back(tag.clone());
        assert_eq!(r.read_tag().unwrap(), Some(tag));
        assert_eq!(r.read_tag().unwrap(), Some(Tag::string(2, "HEADER")));
    }

    #[test]
    fn test_invalid_code_reports_line() {
        let mut r = reader(b"0\nSECTION\nXX\nHEADER\n");
        r.read_tag().unwrap();
        match r.read_tag() {
            Err(DxfError::Decode { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_value_line() {
        let mut r = reader(b"0\n");
        assert!(matches!(r.read_tag(), Err(DxfError::Decode { .. })));
    }

    #[test]
    fn test_legacy_code_page_decoding() {
        // 0xE9 is 'é' in Windows-1252 and invalid as UTF-8
        let mut r = reader(b"1\ncaf\xE9\n");
        assert_eq!(r.read_tag().unwrap().unwrap().as_str(), Some("café"));

        let mut r = reader(b"1\n\xC0\xE1\n");
        r.set_encoding(encoding_rs::WINDOWS_1251);
        assert_eq!(r.read_tag().unwrap().unwrap().as_str(), Some("Аб"));
    }

    #[test]
    fn test_unicode_escapes() {
        let mut r = reader(b"  2\n\\U+0416\\U+0436\n  1\nx\\U+00zz \\U+\n");
        assert_eq!(r.read_tag().unwrap().unwrap().as_str(), Some("Жж"));
        assert_eq!(r.read_tag().unwrap().unwrap().as_str(), Some("x\\U+00zz \\U+"));

        let mut r = reader(b"  1\n\\U+0416\n");
        r.set_unicode_escapes(false);
        assert_eq!(r.read_tag().unwrap().unwrap().as_str(), Some("\\U+0416"));
    }

    #[test]
    fn test_decode_unicode_escapes() {
        assert!(matches!(decode_unicode_escapes("plain"), Cow::Borrowed("plain")));
        assert_eq!(decode_unicode_escapes("a\\U+00E9b"), "a\u{e9}b");
        // surrogate halves are not characters
        assert_eq!(decode_unicode_escapes("\\U+D800"), "\\U+D800");
    }
}
