//! DXF tag stream reading

mod text_reader;

pub use text_reader::{decode_unicode_escapes, DxfTextReader};

use encoding_rs::Encoding;

use super::Tag;
use crate::error::Result;

/// A forward-only source of tags.
///
/// One tag of lookahead can be returned with [`TagStream::push_back`].
pub trait TagStream {
    /// Read the next tag; `Ok(None)` at end of input.
    fn read_tag(&mut self) -> Result<Option<Tag>>;

    /// Return a tag to the stream; the next `read_tag` yields it again.
    fn push_back(&mut self, tag: Tag);

    /// Decode the remaining text with `encoding`.
    fn set_encoding(&mut self, encoding: &'static Encoding);

    /// Enable or disable decoding of `\U+XXXX` escapes in values.
    fn set_unicode_escapes(&mut self, enabled: bool);

    /// Line number of the last line read (1-based).
    fn line_number(&self) -> usize;

    /// Peek at the code of the next tag without consuming it.
    fn peek_code(&mut self) -> Result<Option<i32>> {
        match self.read_tag()? {
            Some(tag) => {
                let code = tag.code;
                self.push_back(tag);
                Ok(Some(code))
            }
            None => Ok(None),
        }
    }
}
