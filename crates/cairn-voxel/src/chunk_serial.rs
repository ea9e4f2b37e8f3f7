//! Reference-deduplicating serialization for [`ChunkBlocks`].
//!
//! A chunk is written as a two-element sequence:
//!
//! ```text
//! [ [unique_block, ...], [index_for_cell_0, ..., index_for_cell_N-1] ]
//! ```
//!
//! The unique list holds every distinct block *allocation* in the order it is
//! first met scanning cells `0..N`; ids are positions in that list. Two
//! separately allocated blocks with identical content get separate entries.
//! This keeps saving free of block comparisons and makes loading restore the
//! exact aliasing pattern of the saved chunk.
//!
//! The layout is expressed through serde, so any structured format can carry
//! it. [`chunk_codec`](crate::chunk_codec) pins the on-disk encoding.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::block::{BlockIdentity, BlockRef};
use crate::chunk::ChunkBlocks;

/// Structural problems found while rebuilding a chunk from its serialized
/// form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkFormatError {
    /// The index array does not have one entry per cell.
    #[error("expected {expected} cell indices, got {actual}")]
    CellCount {
        /// Number of cells in the chunk.
        expected: usize,
        /// Number of indices decoded.
        actual: usize,
    },
    /// More unique blocks than a chunk has cells.
    #[error("unique block list has {actual} entries, chunk only has {max} cells")]
    TooManyBlocks {
        /// Number of cells in the chunk.
        max: usize,
        /// Number of blocks decoded.
        actual: usize,
    },
    /// A cell points past the end of the unique block list.
    #[error("cell {cell} references block {index}, but only {len} blocks were decoded")]
    DanglingIndex {
        /// Cell holding the bad index.
        cell: usize,
        /// The index itself.
        index: u32,
        /// Length of the unique block list.
        len: usize,
    },
}

/// The `[blocks, indices]` pair a chunk is saved as.
#[derive(Clone, Debug, Default)]
pub struct SerializedChunk {
    /// Distinct block allocations in first-seen order.
    pub blocks: Vec<BlockRef>,
    /// Position in `blocks` for each cell, in cell order.
    pub indices: Vec<u32>,
}

impl SerializedChunk {
    /// Rebuilds a chunk of `N` cells.
    ///
    /// Cells that share an index share one block allocation in the result.
    ///
    /// # Errors
    ///
    /// - [`ChunkFormatError::CellCount`] if `indices.len() != N`
    /// - [`ChunkFormatError::TooManyBlocks`] if `blocks.len() > N`
    /// - [`ChunkFormatError::DanglingIndex`] if any index is `>= blocks.len()`
    pub fn resolve<const N: usize>(&self) -> Result<ChunkBlocks<N>, ChunkFormatError> {
        if self.indices.len() != N {
            return Err(ChunkFormatError::CellCount {
                expected: N,
                actual: self.indices.len(),
            });
        }
        if self.blocks.len() > N {
            return Err(ChunkFormatError::TooManyBlocks {
                max: N,
                actual: self.blocks.len(),
            });
        }

        let cells = self
            .indices
            .iter()
            .enumerate()
            .map(|(cell, &index)| {
                self.blocks
                    .get(index as usize)
                    .cloned()
                    .ok_or(ChunkFormatError::DanglingIndex {
                        cell,
                        index,
                        len: self.blocks.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        ChunkBlocks::from_blocks(cells).map_err(|_| ChunkFormatError::CellCount {
            expected: N,
            actual: self.indices.len(),
        })
    }
}

impl<const N: usize> ChunkBlocks<N> {
    /// Deduplicates cells by block identity into the serialized pair.
    ///
    /// Ids are assigned 0, 1, 2, ... in the order distinct allocations are
    /// first met scanning cells `0..N`.
    pub fn to_serialized(&self) -> SerializedChunk {
        let mut ids: FxHashMap<BlockIdentity, u32> = FxHashMap::default();
        let mut blocks = Vec::new();
        let mut indices = Vec::with_capacity(N);

        for cell in self.iter() {
            let id = *ids.entry(cell.identity()).or_insert_with(|| {
                blocks.push(cell.clone());
                // Bounded by N, the number of cells.
                (blocks.len() - 1) as u32
            });
            indices.push(id);
        }

        tracing::trace!(cells = N, unique = blocks.len(), "deduplicated chunk blocks");
        SerializedChunk { blocks, indices }
    }

    /// Replaces this chunk's contents with a chunk read from `deserializer`.
    ///
    /// The chunk is decoded and validated in full before anything is
    /// committed; on error `self` is left exactly as it was.
    pub fn load_from<'de, D>(&mut self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        *self = Self::deserialize(deserializer)?;
        Ok(())
    }
}

impl Serialize for SerializedChunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.blocks)?;
        seq.serialize_element(&self.indices)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SerializedChunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(SerializedChunkVisitor)
    }
}

struct SerializedChunkVisitor;

impl<'de> Visitor<'de> for SerializedChunkVisitor {
    type Value = SerializedChunk;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 2-element array [blocks, indices]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        if let Some(len) = seq.size_hint()
            && len != 2
        {
            return Err(de::Error::invalid_length(len, &self));
        }

        let blocks: Vec<BlockRef> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let indices: Vec<u32> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;

        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }

        Ok(SerializedChunk { blocks, indices })
    }
}

impl<const N: usize> Serialize for ChunkBlocks<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_serialized().serialize(serializer)
    }
}

impl<'de, const N: usize> Deserialize<'de> for ChunkBlocks<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SerializedChunk::deserialize(deserializer)?
            .resolve::<N>()
            .map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::chunk::{CHUNK_BLOCK_COUNT, ChunkBlockData};
    use crate::color::Color;
    use crate::registry::VoxelTypeId;

    fn block(kind: u16) -> BlockRef {
        BlockRef::new(Block::new(VoxelTypeId(kind), Color::splat(kind as u8)))
    }

    /// `[A, B, A, A, C, B, A, C]` by identity.
    fn sample() -> (ChunkBlocks<8>, [BlockRef; 3]) {
        let a = block(1);
        let b = block(2);
        let c = block(3);
        let cells = [&a, &b, &a, &a, &c, &b, &a, &c]
            .into_iter()
            .cloned()
            .collect();
        (ChunkBlocks::from_blocks(cells).unwrap(), [a, b, c])
    }

    fn identity_pattern<const N: usize>(chunk: &ChunkBlocks<N>) -> Vec<u32> {
        chunk.to_serialized().indices
    }

    #[test]
    fn test_dedup_first_seen_order() {
        let (chunk, [a, b, c]) = sample();
        let serialized = chunk.to_serialized();

        assert_eq!(serialized.indices, vec![0, 1, 0, 0, 2, 1, 0, 2]);
        assert_eq!(serialized.blocks.len(), 3);
        assert!(BlockRef::ptr_eq(&serialized.blocks[0], &a));
        assert!(BlockRef::ptr_eq(&serialized.blocks[1], &b));
        assert!(BlockRef::ptr_eq(&serialized.blocks[2], &c));
    }

    #[test]
    fn test_equal_content_distinct_instances_not_merged() {
        let first = block(4);
        let twin = block(4);
        assert_eq!(first, twin);

        let mut chunk = ChunkBlocks::<4>::filled(first);
        chunk.set(2, twin).unwrap();
        let serialized = chunk.to_serialized();

        assert_eq!(serialized.blocks.len(), 2);
        assert_eq!(serialized.indices, vec![0, 0, 1, 0]);
        assert_eq!(serialized.blocks.len(), chunk.unique_count());
    }

    #[test]
    fn test_json_shape() {
        let (chunk, _) = sample();
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(
            json,
            "[[[1,[1,1,1]],[2,[2,2,2]],[3,[3,3,3]]],[0,1,0,0,2,1,0,2]]"
        );
    }

    #[test]
    fn test_roundtrip_restores_identity_pattern() {
        let (chunk, _) = sample();
        let json = serde_json::to_string(&chunk).unwrap();
        let restored: ChunkBlocks<8> = serde_json::from_str(&json).unwrap();

        assert_eq!(identity_pattern(&restored), identity_pattern(&chunk));
        assert_eq!(restored.unique_count(), 3);
        for (original, loaded) in chunk.iter().zip(restored.iter()) {
            assert_eq!(original, loaded);
        }
        // Aliased cells share one freshly decoded allocation.
        let cells = restored.as_slice();
        assert!(BlockRef::ptr_eq(&cells[0], &cells[6]));
        assert!(!BlockRef::ptr_eq(&cells[0], &cells[1]));
        // Decoded blocks are new allocations, not the saved ones.
        assert!(!BlockRef::ptr_eq(&cells[0], &chunk.as_slice()[0]));
    }

    #[test]
    fn test_full_size_chunk_roundtrip() {
        let air = block(0);
        let mut chunk = ChunkBlockData::filled(air);
        let stone = block(1);
        for i in (0..CHUNK_BLOCK_COUNT).step_by(3) {
            chunk.set(i, stone.clone()).unwrap();
        }
        // A few independently configured instances.
        for i in (1..CHUNK_BLOCK_COUNT).step_by(97) {
            chunk.set(i, block(2)).unwrap();
        }

        let value = serde_json::to_value(&chunk).unwrap();
        let restored: ChunkBlockData = serde_json::from_value(value).unwrap();
        assert_eq!(identity_pattern(&restored), identity_pattern(&chunk));
        assert_eq!(restored.unique_count(), chunk.unique_count());
    }

    #[test]
    fn test_top_level_arity_rejected() {
        let one = "[[[1,[1,1,1]]]]";
        let three = "[[[1,[1,1,1]]],[0,0,0,0,0,0,0,0],[]]";
        let not_array = "{\"blocks\":[]}";
        for input in [one, three, not_array] {
            assert!(
                serde_json::from_str::<ChunkBlocks<8>>(input).is_err(),
                "accepted {input}"
            );
        }
    }

    #[test]
    fn test_cell_count_mismatch_rejected() {
        let short = SerializedChunk {
            blocks: vec![block(1)],
            indices: vec![0; 7],
        };
        assert_eq!(
            short.resolve::<8>().unwrap_err(),
            ChunkFormatError::CellCount {
                expected: 8,
                actual: 7
            }
        );

        let long = "[[[1,[1,1,1]]],[0,0,0,0,0,0,0,0,0]]";
        let err = serde_json::from_str::<ChunkBlocks<8>>(long).unwrap_err();
        assert!(err.to_string().contains("expected 8 cell indices"), "{err}");
    }

    #[test]
    fn test_dangling_index_rejected() {
        let dangling = SerializedChunk {
            blocks: vec![block(1), block(2)],
            indices: vec![0, 1, 0, 2],
        };
        assert_eq!(
            dangling.resolve::<4>().unwrap_err(),
            ChunkFormatError::DanglingIndex {
                cell: 3,
                index: 2,
                len: 2
            }
        );

        let no_blocks = SerializedChunk {
            blocks: Vec::new(),
            indices: vec![0; 4],
        };
        assert!(matches!(
            no_blocks.resolve::<4>(),
            Err(ChunkFormatError::DanglingIndex { cell: 0, .. })
        ));
    }

    #[test]
    fn test_too_many_blocks_rejected() {
        let serialized = SerializedChunk {
            blocks: vec![block(1), block(2), block(3)],
            indices: vec![0, 1],
        };
        assert_eq!(
            serialized.resolve::<2>().unwrap_err(),
            ChunkFormatError::TooManyBlocks { max: 2, actual: 3 }
        );
    }

    #[test]
    fn test_failed_load_leaves_target_untouched() {
        let (mut chunk, _) = sample();
        let before = chunk.clone();

        let mut de = serde_json::Deserializer::from_str("[[[1,[1,1,1]]],[0,0,0,0,0,0,0,5]]");
        assert!(chunk.load_from(&mut de).is_err());
        assert!(chunk.same_instances(&before));

        let mut de = serde_json::Deserializer::from_str("[[[1,[1,1,1]]]]");
        assert!(chunk.load_from(&mut de).is_err());
        assert!(chunk.same_instances(&before));
    }

    #[test]
    fn test_successful_load_replaces_contents() {
        let (source, _) = sample();
        let json = serde_json::to_string(&source).unwrap();

        let mut target = ChunkBlocks::<8>::filled(block(0));
        let mut de = serde_json::Deserializer::from_str(&json);
        target.load_from(&mut de).unwrap();
        assert_eq!(identity_pattern(&target), vec![0, 1, 0, 0, 2, 1, 0, 2]);
        assert_eq!(target.get(4).unwrap().kind, VoxelTypeId(3));
    }
}
