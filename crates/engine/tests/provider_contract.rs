//! Contract tests shared by the providers that ship with the engine: the
//! null provider must never report data, the in-memory provider must
//! round-trip everything it is given.

use uuid::Uuid;
use voxelstore_engine::nbt::{NbtCompound, NbtValue};
use voxelstore_engine::provider::{MemoryProvider, NoIoProvider, Provider};
use voxelstore_engine::world::block::BlockId;
use voxelstore_engine::world::chunk::Chunk;
use voxelstore_engine::world::entity::SaveableEntity;
use voxelstore_engine::world::position::{ChunkPos, LocalBlockPos};
use voxelstore_engine::world::settings::{Difficulty, Settings};

fn sample_chunk() -> Chunk {
    let mut chunk = Chunk::new();
    for x in 0..16u8 {
        chunk.set_block(LocalBlockPos { x, y: 60, z: 3 }, BlockId(85));
        chunk.set_block(LocalBlockPos { x, y: -5, z: x }, BlockId(1));
    }
    chunk
}

fn entity(n: u128, x: f64, z: f64) -> SaveableEntity {
    let mut e = SaveableEntity::new("minecraft:item", Uuid::from_u128(n), [x, 64.0, z]);
    e.data.insert("Age".into(), NbtValue::Short(12));
    e
}

fn chest_nbt(x: i32) -> NbtCompound {
    let mut item = NbtCompound::new();
    item.insert("id".into(), "minecraft:diamond".into());
    item.insert("Count".into(), NbtValue::Byte(3));

    let mut nbt = NbtCompound::new();
    nbt.insert("id".into(), "minecraft:chest".into());
    nbt.insert("x".into(), x.into());
    nbt.insert("Items".into(), NbtValue::List(vec![item.into()]));
    nbt
}

// ---------------------------------------------------------------------------
// Null provider
// ---------------------------------------------------------------------------

#[test]
fn noio_reports_nothing_for_unsaved_coordinates() {
    let provider = NoIoProvider;
    for pos in [ChunkPos::new(0, 0), ChunkPos::new(-40, 17), ChunkPos::new(i32::MAX, i32::MIN)] {
        assert!(provider.load_chunk(pos).unwrap().is_none());
        assert!(provider.load_entities(pos).unwrap().is_empty());
        assert!(provider.load_block_nbt(pos).unwrap().is_empty());
    }
}

#[test]
fn noio_discards_chunk_writes() {
    let provider = NoIoProvider;
    let origin = ChunkPos::new(0, 0);

    assert!(provider.load_chunk(origin).unwrap().is_none());
    provider.save_chunk(origin, &sample_chunk()).unwrap();
    assert!(provider.load_chunk(origin).unwrap().is_none());
}

#[test]
fn noio_discards_entity_and_block_nbt_writes() {
    let provider = NoIoProvider;
    let pos = ChunkPos::new(3, -2);

    provider.save_entities(pos, &[entity(1, 50.0, -30.0)]).unwrap();
    provider.save_block_nbt(pos, &[chest_nbt(50)]).unwrap();
    assert!(provider.load_entities(pos).unwrap().is_empty());
    assert!(provider.load_block_nbt(pos).unwrap().is_empty());
}

#[test]
fn noio_settings_are_a_fixed_default() {
    let provider = NoIoProvider;
    let first = provider.settings();
    assert_eq!(first, Settings::default());

    let mut changed = first.clone();
    changed.difficulty = Difficulty::Hard;
    provider.save_settings(&changed);

    assert_eq!(provider.settings(), first);
    assert_eq!(provider.settings(), provider.settings());
}

#[test]
fn noio_close_without_prior_operations() {
    let mut provider = NoIoProvider;
    assert!(provider.close().is_ok());
}

#[test]
fn noio_works_behind_a_trait_object() {
    let mut provider: Box<dyn Provider> = Box::new(NoIoProvider);
    provider.save_chunk(ChunkPos::new(1, 1), &sample_chunk()).unwrap();
    assert!(provider.load_chunk(ChunkPos::new(1, 1)).unwrap().is_none());
    provider.close().unwrap();
}

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

#[test]
fn memory_unsaved_coordinates_are_absent() {
    let provider = MemoryProvider::new();
    let pos = ChunkPos::new(9, 9);
    assert!(provider.load_chunk(pos).unwrap().is_none());
    assert!(provider.load_entities(pos).unwrap().is_empty());
    assert!(provider.load_block_nbt(pos).unwrap().is_empty());
}

#[test]
fn memory_chunk_round_trip() {
    let provider = MemoryProvider::new();
    let pos = ChunkPos::new(-1, 4);
    let chunk = sample_chunk();

    provider.save_chunk(pos, &chunk).unwrap();
    assert_eq!(provider.load_chunk(pos).unwrap(), Some(chunk));
    // Neighbors are untouched.
    assert!(provider.load_chunk(ChunkPos::new(-1, 5)).unwrap().is_none());
}

#[test]
fn memory_entities_round_trip_and_clear() {
    let provider = MemoryProvider::new();
    let pos = ChunkPos::new(3, -2);
    let saved = vec![entity(1, 50.0, -30.0), entity(2, 51.5, -29.0)];

    provider.save_entities(pos, &saved).unwrap();
    let loaded = provider.load_entities(pos).unwrap();
    assert_eq!(loaded.len(), 2);
    for e in &saved {
        assert!(loaded.contains(e));
    }

    provider.save_entities(pos, &[]).unwrap();
    assert!(provider.load_entities(pos).unwrap().is_empty());
}

#[test]
fn memory_chunk_scoped_data_is_independent() {
    let provider = MemoryProvider::new();
    let pos = ChunkPos::new(0, 0);

    provider.save_block_nbt(pos, &[chest_nbt(1), chest_nbt(2)]).unwrap();
    assert!(provider.load_chunk(pos).unwrap().is_none());
    assert!(provider.load_entities(pos).unwrap().is_empty());
    assert_eq!(provider.load_block_nbt(pos).unwrap(), vec![chest_nbt(1), chest_nbt(2)]);

    provider.save_block_nbt(pos, &[]).unwrap();
    assert!(provider.load_block_nbt(pos).unwrap().is_empty());
}

#[test]
fn memory_concurrent_saves_on_distinct_coordinates() {
    let provider = MemoryProvider::new();
    let chunk = sample_chunk();

    std::thread::scope(|s| {
        for t in 0..4 {
            let provider = &provider;
            let chunk = &chunk;
            s.spawn(move || {
                for i in 0..32 {
                    provider.save_chunk(ChunkPos::new(t, i), chunk).unwrap();
                }
            });
        }
    });

    assert_eq!(provider.chunk_count(), 4 * 32);
    assert_eq!(provider.load_chunk(ChunkPos::new(3, 31)).unwrap(), Some(chunk));
}
