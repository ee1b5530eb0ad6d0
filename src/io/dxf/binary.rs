//! zlib compression of binary chunk runs (code 310..319)

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{DxfError, Result};

/// A run of consecutive binary chunks compressed into one buffer.
///
/// The chunk lengths are kept so the run is written back with the same
/// line layout it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedBinary {
    data: Vec<u8>,
    chunk_lengths: Vec<usize>,
}

impl CompressedBinary {
    /// Compress a run of chunks.
    pub fn compress<'a, I>(chunks: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        let mut chunk_lengths = Vec::new();
        for chunk in chunks {
            encoder
                .write_all(chunk)
                .map_err(|e| DxfError::Compression(e.to_string()))?;
            chunk_lengths.push(chunk.len());
        }
        let data = encoder
            .finish()
            .map_err(|e| DxfError::Compression(e.to_string()))?;
        Ok(Self { data, chunk_lengths })
    }

    /// Decompress back into the original chunks.
    pub fn expand(&self) -> Result<Vec<Vec<u8>>> {
        let mut raw = Vec::new();
        ZlibDecoder::new(self.data.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| DxfError::Compression(e.to_string()))?;
        let total: usize = self.chunk_lengths.iter().sum();
        if total != raw.len() {
            return Err(DxfError::Compression(format!(
                "expanded {} bytes, expected {}",
                raw.len(),
                total
            )));
        }
        let mut chunks = Vec::with_capacity(self.chunk_lengths.len());
        let mut offset = 0;
        for &len in &self.chunk_lengths {
            chunks.push(raw[offset..offset + len].to_vec());
            offset += len;
        }
        Ok(chunks)
    }

    /// Number of chunks in the run
    pub fn chunk_count(&self) -> usize {
        self.chunk_lengths.len()
    }

    /// Size of the compressed buffer
    pub fn compressed_len(&self) -> usize {
        self.data.len()
    }
}
