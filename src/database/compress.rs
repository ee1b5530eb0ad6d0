//! In-memory compression of binary payloads (thumbnails, proxy graphics)

use super::TagGroup;
use crate::error::Result;
use crate::io::dxf::{CompressedBinary, Tag, TagValue};

/// Minimum run length worth compressing.
const MIN_RUN: usize = 2;

/// Replace every run of consecutive binary tags with the same code by one
/// compressed tag. Returns true if anything was compressed.
pub(crate) fn compress_group(group: &mut TagGroup) -> Result<bool> {
    let tags = group.tags_mut();
    let mut changed = false;
    let mut index = 0;
    while index < tags.len() {
        let code = tags[index].code;
        let run = tags[index..]
            .iter()
            .take_while(|t| t.code == code && matches!(t.value, TagValue::Binary(_)))
            .count();
        if run < MIN_RUN {
            index += 1;
            continue;
        }
        let packed = {
            let chunks = tags[index..index + run].iter().filter_map(|t| match &t.value {
                TagValue::Binary(data) => Some(data.as_slice()),
                _ => None,
            });
            CompressedBinary::compress(chunks)?
        };
        tags.splice(
            index..index + run,
            std::iter::once(Tag::new(code, TagValue::Compressed(packed))),
        );
        changed = true;
        index += 1;
    }
    Ok(changed)
}
