//! DXF (Drawing Exchange Format) tag level reading and writing

mod binary;
mod code_page;
mod group_code;
mod tag;
pub mod reader;
pub mod writer;

pub use binary::CompressedBinary;
pub use code_page::{code_page_from_encoding, encoding_from_code_page};
pub use group_code::{is_pointer_code, GroupCodeValueType};
pub use reader::{DxfTextReader, TagStream};
pub use tag::{Tag, TagValue};
pub use writer::{DxfTextWriter, TagWriter, TagWriterExt};
