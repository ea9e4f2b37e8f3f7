//! Implementations of the `cairn` subcommands.

use std::io::Write;
use std::path::Path;

use cairn_config::{Config, ConfigError};
use cairn_voxel::{
    BlockRegistry, BrightnessScale, CHUNK_SIZE, ChunkAddress, ChunkBlockData, ChunkCodecError,
    ChunkError, ColorError, CompressionConfig, RegistryError, SerializedChunk, StorageError,
    Color, Transparency, VoxelTypeDef, WorldState, WorldStore, decode_chunk,
};
use thiserror::Error;

/// Chunk written by `tick` when the world has no origin chunk yet.
pub const SAMPLE_CHUNK: ChunkAddress = ChunkAddress { x: 0, y: 0, z: 0 };

const STONE_LAYERS: usize = 4;
const DIRT_LAYERS: usize = 2;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: ChunkCodecError,
    },
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Storage settings derived from the loaded config.
pub fn compression_from(config: &Config) -> CompressionConfig {
    CompressionConfig {
        threshold: config.storage.compression_threshold,
        enabled: config.storage.compress,
    }
}

/// Decodes the chunk file at `path` and writes a summary to `out`.
pub fn inspect(
    path: &Path,
    scale: BrightnessScale,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let bytes = std::fs::read(path).map_err(|source| AppError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let chunk: ChunkBlockData = decode_chunk(&bytes).map_err(|source| AppError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(bytes = bytes.len(), "decoded {}", path.display());

    let SerializedChunk { blocks, indices } = chunk.to_serialized();
    let mut counts = vec![0usize; blocks.len()];
    for &index in &indices {
        counts[index as usize] += 1;
    }

    writeln!(out, "cells:  {}", chunk.len()).map_err(AppError::Output)?;
    writeln!(out, "unique: {}", blocks.len()).map_err(AppError::Output)?;
    for (i, (block, count)) in blocks.iter().zip(&counts).enumerate() {
        let [r, g, b] = block.color.to_f32(scale);
        writeln!(
            out,
            "  #{i:<4} kind {:<5} color {:?} ({r:.3}, {g:.3}, {b:.3})  cells {count}",
            block.kind.0,
            block.color.channels(),
        )
        .map_err(AppError::Output)?;
    }
    Ok(())
}

/// Advances the world stored under the configured directory by one tick.
///
/// Also writes [`SAMPLE_CHUNK`] the first time a world is ticked.
pub fn tick(config: &Config) -> Result<WorldState, AppError> {
    let world_dir = config.storage.resolve_world_dir()?;
    tick_world(&world_dir, compression_from(config))
}

/// [`tick`] against an explicit world directory.
pub fn tick_world(
    world_dir: &Path,
    compression: CompressionConfig,
) -> Result<WorldState, AppError> {
    let store = WorldStore::open(world_dir, compression)?;

    let mut state = store.load_world()?.unwrap_or_default();
    state.advance();
    store.save_world(&state)?;

    if !store.has_chunk(SAMPLE_CHUNK) {
        let registry = default_registry()?;
        let chunk = sample_chunk(&registry)?;
        store.save_chunk(SAMPLE_CHUNK, &chunk)?;
        tracing::info!(
            unique = chunk.unique_count(),
            "wrote sample chunk to {}",
            store.chunk_path(SAMPLE_CHUNK).display()
        );
    }

    tracing::info!(tick = state.tick, "world advanced");
    Ok(state)
}

/// Air plus a few terrain types.
pub fn default_registry() -> Result<BlockRegistry, AppError> {
    let mut registry = BlockRegistry::new();
    for (name, color) in [
        ("stone", Color::new(128, 128, 128)),
        ("dirt", Color::new(134, 96, 67)),
        ("grass", Color::new(95, 159, 53)),
    ] {
        registry.register(VoxelTypeDef {
            name: name.to_string(),
            solid: true,
            transparency: Transparency::Opaque,
            default_color: color,
        })?;
    }
    Ok(registry)
}

/// Layered terrain built from the registry's shared default blocks, so each
/// type occupies a single instance in the chunk.
pub fn sample_chunk(registry: &BlockRegistry) -> Result<ChunkBlockData, AppError> {
    let shared = |name: &str| {
        registry
            .lookup_by_name(name)
            .and_then(|id| registry.shared_block(id))
            .unwrap_or_else(|| registry.air())
    };
    let stone = shared("stone");
    let dirt = shared("dirt");
    let grass = shared("grass");

    let mut chunk = ChunkBlockData::filled(registry.air());
    for y in 0..=STONE_LAYERS + DIRT_LAYERS {
        let layer = match y {
            y if y < STONE_LAYERS => &stone,
            y if y < STONE_LAYERS + DIRT_LAYERS => &dirt,
            _ => &grass,
        };
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                chunk.set_xyz(x, y, z, layer.clone())?;
            }
        }
    }
    Ok(chunk)
}
