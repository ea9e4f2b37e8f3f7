//! Block instances and the shared handles chunks store per voxel.
//!
//! A [`Block`] is one configured instance of a voxel type. Chunks never own
//! blocks directly; each cell holds a [`BlockRef`], and many cells (across
//! many chunks) may alias the same allocation. Aliasing is what the chunk
//! serializer deduplicates, so identity and value equality are kept apart:
//! [`BlockRef::ptr_eq`] answers "same allocation", `==` answers "same
//! content".

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::color::Color;
use crate::registry::VoxelTypeId;

/// One configured block instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Voxel type from the [`BlockRegistry`](crate::registry::BlockRegistry).
    pub kind: VoxelTypeId,
    /// Tint applied when shading this block.
    pub color: Color,
}

impl Block {
    /// Creates a block of the given type and tint.
    pub const fn new(kind: VoxelTypeId, color: Color) -> Self {
        Self { kind, color }
    }
}

// Encoded as the record `[kind, color]`.
impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.kind, self.color).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (kind, color) = <(VoxelTypeId, Color)>::deserialize(deserializer)?;
        Ok(Self { kind, color })
    }
}

/// Address of a block allocation. Stable for as long as any [`BlockRef`] to
/// it is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockIdentity(usize);

/// Shared handle to a [`Block`].
///
/// Cloning a `BlockRef` aliases the same allocation. The block lives until
/// the last handle referencing it is dropped.
#[derive(Clone)]
pub struct BlockRef(Arc<Block>);

impl BlockRef {
    /// Allocates a new, unaliased block.
    pub fn new(block: Block) -> Self {
        Self(Arc::new(block))
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Identity of the pointee, usable as a hash key.
    pub fn identity(&self) -> BlockIdentity {
        BlockIdentity(Arc::as_ptr(&self.0) as usize)
    }

    /// Number of live handles to this block.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl From<Block> for BlockRef {
    fn from(block: Block) -> Self {
        Self::new(block)
    }
}

impl Deref for BlockRef {
    type Target = Block;

    fn deref(&self) -> &Block {
        &self.0
    }
}

/// Value equality. Use [`BlockRef::ptr_eq`] for identity.
impl PartialEq for BlockRef {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for BlockRef {}

impl fmt::Debug for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockRef")
            .field(&format_args!("{:#x}", self.identity().0))
            .field(&*self.0)
            .finish()
    }
}

impl Serialize for BlockRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Every decoded reference is a fresh allocation; aliasing is restored by
/// the chunk serializer, not here.
impl<'de> Deserialize<'de> for BlockRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Block::deserialize(deserializer).map(Self::new)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
