//! DXF tag stream writing

mod text_writer;

pub use text_writer::DxfTextWriter;

use super::Tag;
use crate::error::Result;

/// Trait for writing tags
pub trait TagWriter {
    /// Write one tag
    fn write_tag(&mut self, tag: &Tag) -> Result<()>;

    /// Flush the writer
    fn flush(&mut self) -> Result<()>;
}

/// Extension trait for convenient writing operations
pub trait TagWriterExt: TagWriter {
    /// Write every tag of a slice
    fn write_tags(&mut self, tags: &[Tag]) -> Result<()> {
        for tag in tags {
            self.write_tag(tag)?;
        }
        Ok(())
    }

    /// Write a code/value pair with a string value
    fn write_string(&mut self, code: i32, value: &str) -> Result<()> {
        self.write_tag(&Tag::string(code, value))
    }

    /// Write section start
    fn write_section_start(&mut self, section_name: &str) -> Result<()> {
        self.write_string(0, "SECTION")?;
        self.write_string(2, section_name)
    }

    /// Write section end
    fn write_section_end(&mut self) -> Result<()> {
        self.write_string(0, "ENDSEC")
    }

    /// Write end of file
    fn write_eof(&mut self) -> Result<()> {
        self.write_string(0, "EOF")
    }
}

// Auto-implement the extension trait for all tag writers
impl<T: TagWriter + ?Sized> TagWriterExt for T {}

/// In-memory writer collecting tags, used by tests.
impl TagWriter for Vec<Tag> {
    fn write_tag(&mut self, tag: &Tag) -> Result<()> {
        self.push(tag.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
