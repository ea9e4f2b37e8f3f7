//! End-to-end persistence through the world store.

use cairn_voxel::{
    BlockRef, BlockRegistry, ChunkAddress, ChunkBlockData, Color, CompressionConfig, Transparency,
    VoxelTypeDef, WorldState, WorldStore, local_index,
};

fn registry() -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    for (name, color) in [
        ("stone", Color::splat(120)),
        ("dirt", Color::new(90, 60, 30)),
        ("glass", Color::new(200, 220, 255)),
    ] {
        registry
            .register(VoxelTypeDef {
                name: name.to_string(),
                solid: true,
                transparency: Transparency::Opaque,
                default_color: color,
            })
            .unwrap();
    }
    registry
}

#[test]
fn test_generated_chunk_survives_reload() {
    let registry = registry();
    let stone = registry.shared_block(registry.lookup_by_name("stone").unwrap()).unwrap();
    let dirt = registry.shared_block(registry.lookup_by_name("dirt").unwrap()).unwrap();
    let glass_id = registry.lookup_by_name("glass").unwrap();

    let mut chunk = ChunkBlockData::filled(registry.air());
    for x in 0..16 {
        for z in 0..16 {
            chunk.set_xyz(x, 0, z, stone.clone()).unwrap();
            chunk.set_xyz(x, 1, z, dirt.clone()).unwrap();
        }
    }
    // Two independently tinted glass blocks.
    let red_glass = BlockRef::new(cairn_voxel::Block::new(glass_id, Color::new(255, 0, 0)));
    let blue_glass = BlockRef::new(cairn_voxel::Block::new(glass_id, Color::new(0, 0, 255)));
    chunk.set_xyz(4, 5, 6, red_glass.clone()).unwrap();
    chunk.set_xyz(7, 5, 6, blue_glass).unwrap();
    chunk.set_xyz(8, 5, 6, red_glass).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = WorldStore::open(dir.path(), CompressionConfig::default()).unwrap();
    let addr = ChunkAddress::new(0, -1, 2);
    store.save_chunk(addr, &chunk).unwrap();

    let mut state = WorldState::default();
    state.advance();
    store.save_world(&state).unwrap();

    // Reopen as a fresh process would.
    let store = WorldStore::open(dir.path(), CompressionConfig::default()).unwrap();
    let loaded: ChunkBlockData = store.load_chunk(addr).unwrap().unwrap();
    assert_eq!(store.load_world().unwrap(), Some(WorldState::new(1)));

    assert_eq!(loaded.unique_count(), chunk.unique_count());
    assert_eq!(loaded.unique_count(), 5);
    assert_eq!(loaded.to_serialized().indices, chunk.to_serialized().indices);

    let cells = loaded.as_slice();
    let red_a = &cells[local_index(4, 5, 6)];
    let blue = &cells[local_index(7, 5, 6)];
    let red_b = &cells[local_index(8, 5, 6)];
    assert!(BlockRef::ptr_eq(red_a, red_b));
    assert!(!BlockRef::ptr_eq(red_a, blue));
    assert_eq!(red_a.color, Color::new(255, 0, 0));
    assert_eq!(blue.color, Color::new(0, 0, 255));
    assert_eq!(loaded.get_xyz(3, 1, 3).unwrap().kind, dirt.kind);
}
