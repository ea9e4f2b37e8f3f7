//! Directory-backed persistence for chunks and world state.
//!
//! Layout under the world root:
//!
//! ```text
//! <root>/world.dat               WorldState record
//! <root>/chunks/c.<x>.<y>.<z>.chunk
//! ```
//!
//! Every file is written to a sibling `.tmp` path and renamed into place, so
//! a crash mid-write leaves either the old file or the new one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::chunk::ChunkBlocks;
use crate::chunk_codec::{
    ChunkCodecError, CompressionConfig, decode_chunk, decode_record, encode_chunk, encode_record,
};
use crate::world_state::WorldState;

const CHUNK_DIR: &str = "chunks";
const WORLD_FILE: &str = "world.dat";

/// Identifies a chunk's position in the chunk grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkAddress {
    /// Chunk-grid X coordinate.
    pub x: i64,
    /// Chunk-grid Y coordinate.
    pub y: i64,
    /// Chunk-grid Z coordinate.
    pub z: i64,
}

impl ChunkAddress {
    /// Creates a new chunk address.
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    fn file_name(&self) -> String {
        format!("c.{}.{}.{}.chunk", self.x, self.y, self.z)
    }
}

/// Errors from the world store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// File contents could not be encoded or decoded.
    #[error("corrupt record {path}: {source}")]
    Codec {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ChunkCodecError,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn codec(path: &Path, source: ChunkCodecError) -> Self {
        Self::Codec {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads and writes one world's files.
#[derive(Debug, Clone)]
pub struct WorldStore {
    root: PathBuf,
    compression: CompressionConfig,
}

impl WorldStore {
    /// Opens (creating if needed) the world rooted at `root`.
    pub fn open(
        root: impl Into<PathBuf>,
        compression: CompressionConfig,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        let chunk_dir = root.join(CHUNK_DIR);
        fs::create_dir_all(&chunk_dir).map_err(|e| StorageError::io(&chunk_dir, e))?;
        tracing::info!("opened world store at {}", root.display());
        Ok(Self { root, compression })
    }

    /// The world root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the chunk at `addr`.
    pub fn chunk_path(&self, addr: ChunkAddress) -> PathBuf {
        self.root.join(CHUNK_DIR).join(addr.file_name())
    }

    /// Writes the chunk at `addr`, replacing any previous version.
    pub fn save_chunk<const N: usize>(
        &self,
        addr: ChunkAddress,
        chunk: &ChunkBlocks<N>,
    ) -> Result<(), StorageError> {
        let path = self.chunk_path(addr);
        let bytes =
            encode_chunk(chunk, &self.compression).map_err(|e| StorageError::codec(&path, e))?;
        write_atomic(&path, &bytes)?;
        tracing::debug!(?addr, bytes = bytes.len(), "saved chunk");
        Ok(())
    }

    /// Reads the chunk at `addr`, or `None` if it was never saved.
    pub fn load_chunk<const N: usize>(
        &self,
        addr: ChunkAddress,
    ) -> Result<Option<ChunkBlocks<N>>, StorageError> {
        let path = self.chunk_path(addr);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        match decode_chunk(&bytes) {
            Ok(chunk) => {
                tracing::debug!(?addr, bytes = bytes.len(), "loaded chunk");
                Ok(Some(chunk))
            }
            Err(e) => {
                tracing::warn!(?addr, "corrupt chunk file {}: {}", path.display(), e);
                Err(StorageError::codec(&path, e))
            }
        }
    }

    /// Loads the chunk at `addr` into `target`.
    ///
    /// Returns `false` (and leaves `target` alone) if no file exists. On
    /// error `target` is also left unchanged.
    pub fn load_chunk_into<const N: usize>(
        &self,
        addr: ChunkAddress,
        target: &mut ChunkBlocks<N>,
    ) -> Result<bool, StorageError> {
        match self.load_chunk(addr)? {
            Some(chunk) => {
                *target = chunk;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns `true` if a file exists for the chunk at `addr`.
    pub fn has_chunk(&self, addr: ChunkAddress) -> bool {
        self.chunk_path(addr).is_file()
    }

    /// Writes the world record.
    pub fn save_world(&self, state: &WorldState) -> Result<(), StorageError> {
        let path = self.root.join(WORLD_FILE);
        let bytes =
            encode_record(state, &self.compression).map_err(|e| StorageError::codec(&path, e))?;
        write_atomic(&path, &bytes)?;
        tracing::debug!(tick = state.tick, "saved world state");
        Ok(())
    }

    /// Reads the world record, or `None` for a fresh world.
    pub fn load_world(&self) -> Result<Option<WorldState>, StorageError> {
        let path = self.root.join(WORLD_FILE);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        decode_record(&bytes)
            .map(Some)
            .map_err(|e| StorageError::codec(&path, e))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
