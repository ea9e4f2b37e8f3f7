//! Voxel block storage: shared block references, the fixed-size chunk
//! container, reference-deduplicating chunk serialization, and the on-disk
//! world store.

pub mod block;
pub mod chunk;
pub mod chunk_codec;
pub mod chunk_serial;
pub mod color;
pub mod registry;
pub mod storage;
pub mod world_state;

pub use block::{Block, BlockIdentity, BlockRef};
pub use chunk::{
    CHUNK_BLOCK_COUNT, CHUNK_SIZE, ChunkBlockData, ChunkBlocks, ChunkError, local_index,
};
pub use chunk_codec::{
    ChunkCodecError, CompressionConfig, decode_chunk, decode_chunk_into, decode_record,
    encode_chunk, encode_record,
};
pub use chunk_serial::{ChunkFormatError, SerializedChunk};
pub use color::{BrightnessScale, Color, ColorError};
pub use registry::{BlockRegistry, RegistryError, Transparency, VoxelTypeDef, VoxelTypeId};
pub use storage::{ChunkAddress, StorageError, WorldStore};
pub use world_state::WorldState;
