//! On-disk byte encoding for chunks and other storage records.
//!
//! ## Frame
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | Compression flag (`0x00` raw, `0x01` LZ4) |
//! | 1 | .. | Body, LZ4 size-prepended when the flag is `0x01` |
//!
//! The body is the [`postcard`] encoding of the record. For chunks that is the
//! `[blocks, indices]` pair from [`chunk_serial`](crate::chunk_serial): the
//! outer pair and both inner lists carry varint length prefixes, so a
//! truncated or reshaped file fails to decode instead of loading garbage.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::chunk::ChunkBlocks;
use crate::chunk_serial::{ChunkFormatError, SerializedChunk};

/// Compression flag: body is stored as-is.
pub const COMPRESSION_FLAG_NONE: u8 = 0x00;

/// Compression flag: body is LZ4-compressed.
pub const COMPRESSION_FLAG_LZ4: u8 = 0x01;

/// Largest decompressed body accepted, guarding against corrupt size headers.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Controls when record bodies are compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Minimum body size (bytes) before compression is applied. Default: 256.
    pub threshold: usize,
    /// Whether compression is enabled at all. Default: true.
    pub enabled: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold: 256,
            enabled: true,
        }
    }
}

/// Errors that can occur while encoding or decoding a record.
#[derive(Debug, thiserror::Error)]
pub enum ChunkCodecError {
    /// No compression flag present.
    #[error("empty payload, no compression flag")]
    EmptyPayload,
    /// The compression flag byte is not recognised.
    #[error("unknown compression flag: 0x{0:02X}")]
    UnknownFlag(u8),
    /// LZ4 decompression failed.
    #[error("LZ4 decompression failed: {0}")]
    Decompress(String),
    /// The declared decompressed size exceeds [`MAX_BODY_BYTES`].
    #[error("declared body size {0} exceeds limit")]
    BodyTooLarge(usize),
    /// Postcard serialization failed.
    #[error("encode error: {0}")]
    Encode(#[source] postcard::Error),
    /// The body does not have the record's structure.
    #[error("decode error: {0}")]
    Decode(#[source] postcard::Error),
    /// Bytes left over after the record.
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
    /// The chunk decoded but its contents are inconsistent.
    #[error(transparent)]
    Format(#[from] ChunkFormatError),
}

/// Encodes `value` into a framed, possibly compressed, byte vector.
pub fn encode_record<T: Serialize + ?Sized>(
    value: &T,
    config: &CompressionConfig,
) -> Result<Vec<u8>, ChunkCodecError> {
    let body = postcard::to_allocvec(value).map_err(ChunkCodecError::Encode)?;
    Ok(frame_body(&body, config))
}

/// Decodes a record produced by [`encode_record`].
pub fn decode_record<T: DeserializeOwned>(data: &[u8]) -> Result<T, ChunkCodecError> {
    let body = unframe_body(data)?;
    let (value, rest) = postcard::take_from_bytes(&body).map_err(ChunkCodecError::Decode)?;
    if !rest.is_empty() {
        return Err(ChunkCodecError::TrailingBytes(rest.len()));
    }
    Ok(value)
}

/// Encodes a chunk with reference deduplication.
pub fn encode_chunk<const N: usize>(
    chunk: &ChunkBlocks<N>,
    config: &CompressionConfig,
) -> Result<Vec<u8>, ChunkCodecError> {
    let serialized = chunk.to_serialized();
    let bytes = encode_record(&serialized, config)?;
    tracing::debug!(
        unique = serialized.blocks.len(),
        bytes = bytes.len(),
        compressed = bytes.first() == Some(&COMPRESSION_FLAG_LZ4),
        "encoded chunk"
    );
    Ok(bytes)
}

/// Decodes a chunk produced by [`encode_chunk`].
pub fn decode_chunk<const N: usize>(data: &[u8]) -> Result<ChunkBlocks<N>, ChunkCodecError> {
    let serialized: SerializedChunk = decode_record(data)?;
    Ok(serialized.resolve::<N>()?)
}

/// Decodes a chunk into `target`, leaving it untouched on any error.
pub fn decode_chunk_into<const N: usize>(
    data: &[u8],
    target: &mut ChunkBlocks<N>,
) -> Result<(), ChunkCodecError> {
    *target = decode_chunk(data)?;
    Ok(())
}

fn frame_body(body: &[u8], config: &CompressionConfig) -> Vec<u8> {
    if !config.enabled || body.len() < config.threshold {
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(COMPRESSION_FLAG_NONE);
        out.extend_from_slice(body);
        out
    } else {
        let compressed = compress_prepend_size(body);
        let mut out = Vec::with_capacity(1 + compressed.len());
        out.push(COMPRESSION_FLAG_LZ4);
        out.extend_from_slice(&compressed);
        out
    }
}

fn unframe_body(data: &[u8]) -> Result<Vec<u8>, ChunkCodecError> {
    let Some((&flag, rest)) = data.split_first() else {
        return Err(ChunkCodecError::EmptyPayload);
    };

    match flag {
        COMPRESSION_FLAG_NONE => Ok(rest.to_vec()),
        COMPRESSION_FLAG_LZ4 => {
            if let Some(header) = rest.first_chunk::<4>() {
                let declared = u32::from_le_bytes(*header) as usize;
                if declared > MAX_BODY_BYTES {
                    return Err(ChunkCodecError::BodyTooLarge(declared));
                }
            }
            decompress_size_prepended(rest).map_err(|e| ChunkCodecError::Decompress(e.to_string()))
        }
        flag => Err(ChunkCodecError::UnknownFlag(flag)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
