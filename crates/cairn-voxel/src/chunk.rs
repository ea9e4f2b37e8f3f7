//! Fixed-size block storage for one chunk.
//!
//! A [`ChunkBlocks`] holds exactly `N` [`BlockRef`]s, one per voxel, and is
//! never partially initialized: every constructor fills every cell. Cells
//! are addressed by a flat index; [`local_index`] defines the linearization
//! shared by the read, write and serialization paths.

use rustc_hash::FxHashSet;

use crate::block::BlockRef;

/// Side length of a chunk in voxels.
pub const CHUNK_SIZE: usize = 16;

/// Total number of voxels in a chunk (16³).
pub const CHUNK_BLOCK_COUNT: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Chunk storage at the engine's chunk size.
pub type ChunkBlockData = ChunkBlocks<CHUNK_BLOCK_COUNT>;

/// Errors raised by chunk cell access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// Cell index outside `0..len`.
    #[error("cell index {index} out of range for chunk of {len} cells")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of cells in the chunk.
        len: usize,
    },
    /// Local coordinate outside `0..CHUNK_SIZE` on some axis.
    #[error("coordinate ({x}, {y}, {z}) out of range for chunk size {}", CHUNK_SIZE)]
    CoordinateOutOfRange {
        /// X coordinate.
        x: usize,
        /// Y coordinate.
        y: usize,
        /// Z coordinate.
        z: usize,
    },
    /// Initial block list does not have one entry per cell.
    #[error("expected {expected} blocks, got {actual}")]
    WrongLength {
        /// Number of cells in the chunk.
        expected: usize,
        /// Number of blocks supplied.
        actual: usize,
    },
}

/// Converts `(x, y, z)` to a cell index (x fastest, then z, then y).
///
/// Each coordinate must be in `0..CHUNK_SIZE`.
#[inline]
pub const fn local_index(x: usize, y: usize, z: usize) -> usize {
    x + z * CHUNK_SIZE + y * CHUNK_SIZE * CHUNK_SIZE
}

/// A fully populated grid of `N` block references.
///
/// Capacity is fixed for the lifetime of the value; there is no resizing
/// operation.
#[derive(Clone, Debug)]
pub struct ChunkBlocks<const N: usize = CHUNK_BLOCK_COUNT> {
    cells: Box<[BlockRef]>,
}

impl<const N: usize> ChunkBlocks<N> {
    /// Creates a chunk where every cell aliases `block`.
    pub fn filled(block: BlockRef) -> Self {
        Self {
            cells: vec![block; N].into_boxed_slice(),
        }
    }

    /// Creates a chunk from one block per cell, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::WrongLength`] unless `blocks.len() == N`.
    pub fn from_blocks(blocks: Vec<BlockRef>) -> Result<Self, ChunkError> {
        if blocks.len() != N {
            return Err(ChunkError::WrongLength {
                expected: N,
                actual: blocks.len(),
            });
        }
        Ok(Self {
            cells: blocks.into_boxed_slice(),
        })
    }

    /// Returns the block at cell `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::OutOfRange`] if `index >= N`.
    pub fn get(&self, index: usize) -> Result<&BlockRef, ChunkError> {
        self.cells
            .get(index)
            .ok_or(ChunkError::OutOfRange { index, len: N })
    }

    /// Replaces the block at cell `index` and returns the previous one.
    ///
    /// The block's content is not validated.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::OutOfRange`] if `index >= N`.
    pub fn set(&mut self, index: usize, block: BlockRef) -> Result<BlockRef, ChunkError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(ChunkError::OutOfRange { index, len: N })?;
        Ok(std::mem::replace(cell, block))
    }

    /// Points every cell at `block`.
    pub fn fill(&mut self, block: &BlockRef) {
        self.cells.fill(block.clone());
    }

    /// Number of cells, always `N`.
    pub const fn len(&self) -> usize {
        N
    }

    /// `true` only for a zero-sized chunk.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Iterates cells in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, BlockRef> {
        self.cells.iter()
    }

    /// All cells in index order.
    pub fn as_slice(&self) -> &[BlockRef] {
        &self.cells
    }

    /// Number of distinct block allocations referenced by this chunk.
    pub fn unique_count(&self) -> usize {
        self.cells
            .iter()
            .map(BlockRef::identity)
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Returns `true` if every cell of `self` aliases the same allocation as
    /// the corresponding cell of `other`.
    pub fn same_instances(&self, other: &Self) -> bool {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .all(|(a, b)| BlockRef::ptr_eq(a, b))
    }
}

impl ChunkBlocks<CHUNK_BLOCK_COUNT> {
    /// Returns the block at `(x, y, z)`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::CoordinateOutOfRange`] if any coordinate is
    /// `>= CHUNK_SIZE`.
    pub fn get_xyz(&self, x: usize, y: usize, z: usize) -> Result<&BlockRef, ChunkError> {
        self.get(Self::checked_index(x, y, z)?)
    }

    /// Replaces the block at `(x, y, z)` and returns the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::CoordinateOutOfRange`] if any coordinate is
    /// `>= CHUNK_SIZE`.
    pub fn set_xyz(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        block: BlockRef,
    ) -> Result<BlockRef, ChunkError> {
        self.set(Self::checked_index(x, y, z)?, block)
    }

    fn checked_index(x: usize, y: usize, z: usize) -> Result<usize, ChunkError> {
        if x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE {
            Ok(local_index(x, y, z))
        } else {
            tracing::warn!("chunk coordinate out of bounds: ({}, {}, {})", x, y, z);
            Err(ChunkError::CoordinateOutOfRange { x, y, z })
        }
    }
}

impl<'a, const N: usize> IntoIterator for &'a ChunkBlocks<N> {
    type Item = &'a BlockRef;
    type IntoIter = std::slice::Iter<'a, BlockRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::color::Color;
    use crate::registry::VoxelTypeId;

    fn block(kind: u16) -> BlockRef {
        BlockRef::new(Block::new(VoxelTypeId(kind), Color::splat(kind as u8)))
    }

    #[test]
    fn test_filled_chunk_aliases_one_block() {
        let air = block(0);
        let chunk = ChunkBlockData::filled(air.clone());
        assert_eq!(chunk.len(), CHUNK_BLOCK_COUNT);
        assert_eq!(chunk.unique_count(), 1);
        assert!(chunk.iter().all(|b| BlockRef::ptr_eq(b, &air)));
    }

    #[test]
    fn test_set_then_get() {
        let mut chunk = ChunkBlocks::<8>::filled(block(0));
        let stone = block(1);
        let previous = chunk.set(3, stone.clone()).unwrap();
        assert_eq!(previous.kind, VoxelTypeId(0));
        assert!(BlockRef::ptr_eq(chunk.get(3).unwrap(), &stone));
        assert_eq!(chunk.get(2).unwrap().kind, VoxelTypeId(0));
        assert_eq!(chunk.unique_count(), 2);
    }

    #[test]
    fn test_out_of_range_access_fails() {
        let mut chunk = ChunkBlocks::<8>::filled(block(0));
        assert_eq!(
            chunk.get(8).unwrap_err(),
            ChunkError::OutOfRange { index: 8, len: 8 }
        );
        assert!(chunk.set(100, block(1)).is_err());
        // Failed write leaves the chunk untouched.
        assert_eq!(chunk.unique_count(), 1);
    }

    #[test]
    fn test_from_blocks_requires_exact_length() {
        let blocks = vec![block(0); 7];
        assert_eq!(
            ChunkBlocks::<8>::from_blocks(blocks).unwrap_err(),
            ChunkError::WrongLength {
                expected: 8,
                actual: 7
            }
        );
        assert!(ChunkBlocks::<8>::from_blocks(vec![block(0); 8]).is_ok());
    }

    #[test]
    fn test_xyz_matches_linear_index() {
        let mut chunk = ChunkBlockData::filled(block(0));
        let marker = block(5);
        chunk.set_xyz(1, 2, 3, marker.clone()).unwrap();
        assert!(BlockRef::ptr_eq(
            chunk.get(local_index(1, 2, 3)).unwrap(),
            &marker
        ));
        assert!(BlockRef::ptr_eq(chunk.get_xyz(1, 2, 3).unwrap(), &marker));
        assert_eq!(local_index(1, 0, 0), 1);
        assert_eq!(local_index(0, 0, 1), CHUNK_SIZE);
        assert_eq!(local_index(0, 1, 0), CHUNK_SIZE * CHUNK_SIZE);
    }

    #[test]
    fn test_xyz_out_of_bounds_fails() {
        let mut chunk = ChunkBlockData::filled(block(0));
        assert_eq!(
            chunk.get_xyz(16, 0, 0).unwrap_err(),
            ChunkError::CoordinateOutOfRange { x: 16, y: 0, z: 0 }
        );
        assert!(chunk.set_xyz(0, 0, 200, block(1)).is_err());
        assert_eq!(chunk.unique_count(), 1);
    }

    #[test]
    fn test_fill_replaces_all_cells() {
        let mut chunk = ChunkBlocks::<8>::filled(block(0));
        chunk.set(0, block(1)).unwrap();
        let water = block(9);
        chunk.fill(&water);
        assert_eq!(chunk.unique_count(), 1);
        assert!(chunk.same_instances(&ChunkBlocks::<8>::filled(water)));
    }
}
