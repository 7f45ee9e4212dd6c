pub mod block;
pub mod chunk;
pub mod entity;
pub mod position;
pub mod settings;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use block::BlockId;
use chunk::Chunk;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use entity::SaveableEntity;
use position::{BlockPos, ChunkPos};
use rayon::prelude::*;
use settings::Settings;

use crate::generator::Generator;
use crate::nbt::NbtCompound;
use crate::provider::{Provider, ProviderError, ProviderResult};

/// Where a chunk came from when [`World::load_chunk`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOrigin {
    /// It was already loaded.
    Resident,
    /// The provider had it saved.
    Loaded,
    /// The provider had nothing saved, so the generator produced it.
    Generated,
}

/// The block world of one open save, backed by a single [`Provider`].
///
/// Thread-safe and lock-sharded by chunk. Settings are read from the provider
/// once on open. Chunk-scoped data (blocks, entities, block NBT) is loaded on
/// demand and written back for chunks marked dirty. The provider is closed
/// exactly once: by [`World::close`], or on drop if that was never called.
pub struct World {
    chunks: DashMap<ChunkPos, Chunk>,
    entities: DashMap<ChunkPos, Vec<SaveableEntity>>,
    block_nbt: DashMap<ChunkPos, Vec<NbtCompound>>,
    /// Chunks whose data changed since the last save.
    dirty: DashSet<ChunkPos>,
    settings: RwLock<Settings>,
    provider: Box<dyn Provider>,
    generator: Box<dyn Generator>,
    closed: bool,
}

impl World {
    pub fn open(provider: Box<dyn Provider>, generator: Box<dyn Generator>) -> Self {
        let settings = provider.settings();
        tracing::info!(
            "Opened world '{}' (spawn {:?}, tick {})",
            settings.name,
            settings.spawn,
            settings.current_tick
        );
        Self {
            chunks: DashMap::new(),
            entities: DashMap::new(),
            block_nbt: DashMap::new(),
            dirty: DashSet::new(),
            settings: RwLock::new(settings),
            provider,
            generator,
            closed: false,
        }
    }

    // ── Settings ────────────────────────────────────────────────────────

    pub fn settings(&self) -> Settings {
        self.read_settings().clone()
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut Settings)) {
        let mut settings = self.write_settings();
        f(&mut *settings);
    }

    // A poisoned lock still holds a fully written `Settings`.
    fn read_settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_settings(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(|e| e.into_inner())
    }

    // ── Chunk lifecycle ─────────────────────────────────────────────────

    /// Make the chunk at `pos` resident, along with its entities and block NBT.
    ///
    /// If the provider has nothing saved, the generator fills a new chunk,
    /// which is marked dirty. If the provider reports corrupt data the error
    /// is returned and nothing is generated in its place.
    pub fn load_chunk(&self, pos: ChunkPos) -> ProviderResult<ChunkOrigin> {
        if self.chunks.contains_key(&pos) {
            return Ok(ChunkOrigin::Resident);
        }

        let (chunk, origin) = match self.provider.load_chunk(pos)? {
            Some(chunk) => (chunk, ChunkOrigin::Loaded),
            None => {
                let mut chunk = Chunk::new();
                self.generator.generate(pos, &mut chunk);
                (chunk, ChunkOrigin::Generated)
            }
        };
        let entities = self.provider.load_entities(pos)?;
        let block_nbt = self.provider.load_block_nbt(pos)?;

        // The chunk's shard stays locked until its companion data is in place.
        match self.chunks.entry(pos) {
            // Another thread finished loading it first; keep theirs.
            Entry::Occupied(_) => return Ok(ChunkOrigin::Resident),
            Entry::Vacant(slot) => {
                if !entities.is_empty() {
                    self.entities.insert(pos, entities);
                }
                if !block_nbt.is_empty() {
                    self.block_nbt.insert(pos, block_nbt);
                }
                if origin == ChunkOrigin::Generated {
                    self.dirty.insert(pos);
                }
                slot.insert(chunk);
            }
        }

        tracing::debug!("Chunk {} resident ({:?})", pos, origin);
        Ok(origin)
    }

    /// Save the chunk at `pos` if dirty, then drop it from memory.
    ///
    /// Returns whether the chunk was dropped: false if it was not loaded, or
    /// if it was modified while being saved (it then stays loaded and dirty).
    /// On a failed save the chunk stays loaded and dirty.
    pub fn unload_chunk(&self, pos: ChunkPos) -> ProviderResult<bool> {
        if !self.chunks.contains_key(&pos) {
            return Ok(false);
        }
        if self.dirty.remove(&pos).is_some() {
            if let Err(e) = self.save_chunk_data(pos) {
                self.dirty.insert(pos);
                return Err(e);
            }
        }

        // Every writer marks the chunk dirty while holding its shard, so this
        // check and the removal cannot interleave with an edit.
        match self.chunks.entry(pos) {
            Entry::Occupied(slot) if !self.dirty.contains(&pos) => {
                self.entities.remove(&pos);
                self.block_nbt.remove(&pos);
                slot.remove();
                Ok(true)
            }
            Entry::Occupied(_) => {
                tracing::debug!("Chunk {} changed during unload, keeping it loaded", pos);
                Ok(false)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    pub fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    // ── Blocks ──────────────────────────────────────────────────────────

    /// Read a block at an absolute position. Returns AIR for unloaded chunks
    /// and for positions outside every chunk.
    pub fn get_block(&self, pos: BlockPos) -> BlockId {
        pos.chunk()
            .and_then(|chunk_pos| self.chunks.get(&chunk_pos))
            .map_or(BlockId::AIR, |chunk| chunk.get_block(pos.local()))
    }

    /// Write a block and mark its chunk dirty. Returns false (and writes
    /// nothing) if the chunk is not loaded or the position is outside every
    /// chunk.
    ///
    /// Takes `&self` because `DashMap` provides interior mutability via
    /// per-shard locking.
    pub fn set_block(&self, pos: BlockPos, block: BlockId) -> bool {
        let Some(chunk_pos) = pos.chunk() else {
            return false;
        };
        let Some(mut chunk) = self.chunks.get_mut(&chunk_pos) else {
            return false;
        };
        chunk.set_block(pos.local(), block);
        self.dirty.insert(chunk_pos);
        true
    }

    // ── Entities and block NBT ──────────────────────────────────────────

    pub fn entities(&self, pos: ChunkPos) -> Vec<SaveableEntity> {
        self.entities.get(&pos).map(|e| e.clone()).unwrap_or_default()
    }

    /// Replace the entities stored under a loaded chunk. Returns false if the
    /// chunk is not loaded.
    pub fn set_entities(&self, pos: ChunkPos, entities: Vec<SaveableEntity>) -> bool {
        let Some(_chunk) = self.chunks.get(&pos) else {
            return false;
        };
        if entities.is_empty() {
            self.entities.remove(&pos);
        } else {
            self.entities.insert(pos, entities);
        }
        self.dirty.insert(pos);
        true
    }

    /// Add an entity to the chunk containing its position. Returns false if
    /// that chunk is not loaded or the position is outside every chunk.
    pub fn add_entity(&self, entity: SaveableEntity) -> bool {
        let Some(pos) = entity.chunk() else {
            return false;
        };
        let Some(_chunk) = self.chunks.get(&pos) else {
            return false;
        };
        self.entities.entry(pos).or_default().push(entity);
        self.dirty.insert(pos);
        true
    }

    pub fn block_nbt(&self, pos: ChunkPos) -> Vec<NbtCompound> {
        self.block_nbt.get(&pos).map(|b| b.clone()).unwrap_or_default()
    }

    /// Replace the block entities of a loaded chunk. Returns false if the
    /// chunk is not loaded.
    pub fn set_block_nbt(&self, pos: ChunkPos, data: Vec<NbtCompound>) -> bool {
        let Some(_chunk) = self.chunks.get(&pos) else {
            return false;
        };
        if data.is_empty() {
            self.block_nbt.remove(&pos);
        } else {
            self.block_nbt.insert(pos, data);
        }
        self.dirty.insert(pos);
        true
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Number of chunks currently marked dirty.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Persist settings and every dirty chunk. Chunks are written in
    /// parallel; the provider decides how much of that it serializes.
    ///
    /// Returns the number of chunks written. Chunks that failed stay dirty
    /// and the first failure is returned.
    pub fn save(&self) -> ProviderResult<usize> {
        self.provider.save_settings(&self.read_settings());

        let dirty = self.take_dirty_chunks();
        if dirty.is_empty() {
            tracing::debug!("World save: nothing to save (no dirty chunks)");
            return Ok(0);
        }

        let start = Instant::now();
        let failures: Vec<(ChunkPos, ProviderError)> = dirty
            .par_iter()
            .filter_map(|&pos| self.save_chunk_data(pos).err().map(|e| (pos, e)))
            .collect();

        for (pos, _) in &failures {
            self.dirty.insert(*pos);
        }
        let saved = dirty.len() - failures.len();
        let mut failures = failures.into_iter();
        if let Some((_, first)) = failures.next() {
            for (pos, e) in failures {
                tracing::warn!("Chunk {} not saved: {}", pos, e);
            }
            return Err(first);
        }

        tracing::info!("World saved: {} chunks ({:.2?})", saved, start.elapsed());
        Ok(saved)
    }

    /// Final save, then release the provider. Dropping the world does the
    /// same thing, but only this reports failures to the caller.
    pub fn close(mut self) -> ProviderResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> ProviderResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let saved = self.save();
        let closed = self.provider.close();
        match (saved, closed) {
            (Ok(n), Ok(())) => {
                tracing::info!("World closed ({} chunks written on close)", n);
                Ok(())
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Err(save_err), Err(close_err)) => {
                tracing::error!("Provider close failed after a failed save: {}", close_err);
                Err(save_err)
            }
        }
    }

    fn save_chunk_data(&self, pos: ChunkPos) -> ProviderResult<()> {
        // Unloaded between dirty-mark and save.
        let Some(chunk) = self.chunks.get(&pos) else {
            return Ok(());
        };
        self.provider.save_chunk(pos, &chunk)?;
        drop(chunk);

        let entities = self.entities(pos);
        self.provider.save_entities(pos, &entities)?;
        let block_nbt = self.block_nbt(pos);
        self.provider.save_block_nbt(pos, &block_nbt)
    }

    /// Drain and return all chunk positions marked dirty. After this returns,
    /// the dirty set is empty.
    fn take_dirty_chunks(&self) -> Vec<ChunkPos> {
        // Collect then remove; a chunk dirtied in between is simply saved
        // again next time.
        let dirty: Vec<ChunkPos> = self.dirty.iter().map(|entry| *entry).collect();
        for pos in &dirty {
            self.dirty.remove(pos);
        }
        dirty
    }
}

impl Drop for World {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("Closing world on drop failed: {}", e);
        }
    }
}
