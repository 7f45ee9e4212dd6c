use std::sync::RwLock;

use dashmap::DashMap;

use super::{Provider, ProviderResult};
use crate::nbt::NbtCompound;
use crate::world::chunk::Chunk;
use crate::world::entity::SaveableEntity;
use crate::world::position::ChunkPos;
use crate::world::settings::Settings;

/// A provider that keeps everything in memory for the life of the process.
///
/// Saved data round-trips exactly until [`Provider::close`], which drops it.
/// Lock-sharded by coordinate, so any coordinates may be read and written
/// concurrently. Closing twice is harmless.
#[derive(Default)]
pub struct MemoryProvider {
    settings: RwLock<Option<Settings>>,
    chunks: DashMap<ChunkPos, Chunk>,
    entities: DashMap<ChunkPos, Vec<SaveableEntity>>,
    block_nbt: DashMap<ChunkPos, Vec<NbtCompound>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that already holds `settings`, as if a previous session
    /// had saved them.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(Some(settings)),
            ..Self::default()
        }
    }

    /// Number of coordinates with a stored chunk.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl Provider for MemoryProvider {
    fn settings(&self) -> Settings {
        // A poisoned lock still holds a fully written value.
        let guard = self.settings.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().unwrap_or_default()
    }

    fn save_settings(&self, settings: &Settings) {
        let mut guard = self.settings.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(settings.clone());
    }

    fn load_chunk(&self, pos: ChunkPos) -> ProviderResult<Option<Chunk>> {
        Ok(self.chunks.get(&pos).map(|c| c.clone()))
    }

    fn save_chunk(&self, pos: ChunkPos, chunk: &Chunk) -> ProviderResult<()> {
        self.chunks.insert(pos, chunk.clone());
        Ok(())
    }

    fn load_entities(&self, pos: ChunkPos) -> ProviderResult<Vec<SaveableEntity>> {
        Ok(self.entities.get(&pos).map(|e| e.clone()).unwrap_or_default())
    }

    fn save_entities(&self, pos: ChunkPos, entities: &[SaveableEntity]) -> ProviderResult<()> {
        if entities.is_empty() {
            self.entities.remove(&pos);
        } else {
            self.entities.insert(pos, entities.to_vec());
        }
        Ok(())
    }

    fn load_block_nbt(&self, pos: ChunkPos) -> ProviderResult<Vec<NbtCompound>> {
        Ok(self.block_nbt.get(&pos).map(|b| b.clone()).unwrap_or_default())
    }

    fn save_block_nbt(&self, pos: ChunkPos, data: &[NbtCompound]) -> ProviderResult<()> {
        if data.is_empty() {
            self.block_nbt.remove(&pos);
        } else {
            self.block_nbt.insert(pos, data.to_vec());
        }
        Ok(())
    }

    fn close(&mut self) -> ProviderResult<()> {
        tracing::debug!(
            "Closing in-memory provider, dropping {} chunks",
            self.chunks.len()
        );
        self.chunks.clear();
        self.entities.clear();
        self.block_nbt.clear();
        *self.settings.get_mut().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::block::BlockId;
    use crate::world::position::LocalBlockPos;

    #[test]
    fn saved_settings_replace_default() {
        let provider = MemoryProvider::new();
        assert_eq!(provider.settings(), Settings::default());

        let mut settings = Settings::default();
        settings.name = "Saved".into();
        provider.save_settings(&settings);
        assert_eq!(provider.settings().name, "Saved");
    }

    #[test]
    fn close_forgets_everything() {
        let mut provider = MemoryProvider::with_settings(Settings {
            tick_range: 2,
            ..Settings::default()
        });
        let mut chunk = Chunk::new();
        chunk.set_block(LocalBlockPos { x: 0, y: 0, z: 0 }, BlockId(1));
        provider.save_chunk(ChunkPos::new(0, 0), &chunk).unwrap();
        assert_eq!(provider.chunk_count(), 1);

        provider.close().unwrap();
        provider.close().unwrap();
        assert_eq!(provider.chunk_count(), 0);
        assert_eq!(provider.settings(), Settings::default());
    }
}
