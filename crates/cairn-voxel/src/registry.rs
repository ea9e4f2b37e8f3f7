//! Block type registry: maps compact [`VoxelTypeId`] values to [`VoxelTypeDef`]
//! metadata and owns one shared default [`BlockRef`] per type.
//!
//! Air is always ID 0. Handing out the registry's shared default instance is
//! what lets a freshly generated chunk alias a single allocation across all
//! of its cells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{Block, BlockRef};
use crate::color::Color;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier of a voxel type (2 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelTypeId(pub u16);

impl VoxelTypeId {
    /// The empty block.
    pub const AIR: VoxelTypeId = VoxelTypeId(0);
}

/// Transparency mode for a voxel type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Fully blocks light and visibility.
    Opaque,
    /// Partially transparent (e.g. water, stained glass).
    SemiTransparent,
    /// Completely transparent (e.g. air).
    FullyTransparent,
}

/// Descriptor for a voxel type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelTypeDef {
    /// Human-readable name (e.g. "stone", "grass", "water").
    pub name: String,
    /// Whether entities collide with this voxel.
    pub solid: bool,
    /// Transparency mode.
    pub transparency: Transparency,
    /// Tint of the shared default instance.
    pub default_color: Color,
}

/// Errors that can occur during block type registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A type with the same name has already been registered.
    #[error("duplicate voxel type name: {0}")]
    DuplicateName(String),
    /// Every `u16` ID has been assigned.
    #[error("block registry is full (max 65536 types)")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`VoxelTypeId`] → [`VoxelTypeDef`] with O(1) lookup by index and by
/// name, plus a shared default block per type.
pub struct BlockRegistry {
    /// Dense array where `index == VoxelTypeId.0`.
    types: Vec<VoxelTypeDef>,
    /// Shared default instance for each type, same indexing as `types`.
    defaults: Vec<BlockRef>,
    /// Reverse lookup: name → ID.
    name_to_id: HashMap<String, VoxelTypeId>,
}

impl BlockRegistry {
    /// Creates a new registry with Air pre-registered as ID 0.
    pub fn new() -> Self {
        let air = VoxelTypeDef {
            name: "air".to_string(),
            solid: false,
            transparency: Transparency::FullyTransparent,
            default_color: Color::BLACK,
        };

        let mut name_to_id = HashMap::new();
        name_to_id.insert(air.name.clone(), VoxelTypeId::AIR);

        Self {
            defaults: vec![BlockRef::new(Block::new(VoxelTypeId::AIR, air.default_color))],
            types: vec![air],
            name_to_id,
        }
    }

    /// Registers a new block type and returns its assigned ID.
    ///
    /// IDs are assigned sequentially starting from 1 (0 is Air).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if a type with the same name
    /// already exists, or [`RegistryError::RegistryFull`] if all 65 536 IDs
    /// are consumed.
    pub fn register(&mut self, def: VoxelTypeDef) -> Result<VoxelTypeId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        let id = u16::try_from(self.types.len())
            .map(VoxelTypeId)
            .map_err(|_| RegistryError::RegistryFull)?;

        tracing::debug!(name = %def.name, id = id.0, "registered block type");
        self.name_to_id.insert(def.name.clone(), id);
        self.defaults.push(BlockRef::new(Block::new(id, def.default_color)));
        self.types.push(def);
        Ok(id)
    }

    /// Returns the definition for a given ID, or `None` if unregistered.
    pub fn get(&self, id: VoxelTypeId) -> Option<&VoxelTypeDef> {
        self.types.get(id.0 as usize)
    }

    /// Returns a handle to the shared default instance of `id`.
    ///
    /// Every call for the same ID aliases one allocation.
    pub fn shared_block(&self, id: VoxelTypeId) -> Option<BlockRef> {
        self.defaults.get(id.0 as usize).cloned()
    }

    /// Shared default air block.
    pub fn air(&self) -> BlockRef {
        self.defaults[0].clone()
    }

    /// Returns the ID for a named block type, or `None` if not found.
    pub fn lookup_by_name(&self, name: &str) -> Option<VoxelTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of registered types (including Air).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if only Air is registered.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// Returns `true` if the given type is transparent (fully or semi).
    ///
    /// Unknown IDs are treated like air.
    pub fn is_transparent(&self, id: VoxelTypeId) -> bool {
        match self.get(id) {
            Some(def) => def.transparency != Transparency::Opaque,
            None => true,
        }
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
