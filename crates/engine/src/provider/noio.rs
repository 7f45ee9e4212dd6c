use super::{Provider, ProviderResult};
use crate::nbt::NbtCompound;
use crate::world::chunk::Chunk;
use crate::world::entity::SaveableEntity;
use crate::world::position::ChunkPos;
use crate::world::settings::Settings;

/// A provider that performs no I/O at all.
///
/// Every read reports "nothing saved" and every write is discarded, so each
/// chunk goes through the world's generation path every time it is loaded.
/// Useful for ephemeral or purely generated worlds. Never returns an error;
/// safe for concurrent use and callable after `close`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIoProvider;

impl Provider for NoIoProvider {
    fn settings(&self) -> Settings {
        Settings::default()
    }

    fn save_settings(&self, _: &Settings) {}

    fn load_chunk(&self, _: ChunkPos) -> ProviderResult<Option<Chunk>> {
        Ok(None)
    }

    fn save_chunk(&self, _: ChunkPos, _: &Chunk) -> ProviderResult<()> {
        Ok(())
    }

    fn load_entities(&self, _: ChunkPos) -> ProviderResult<Vec<SaveableEntity>> {
        Ok(Vec::new())
    }

    fn save_entities(&self, _: ChunkPos, _: &[SaveableEntity]) -> ProviderResult<()> {
        Ok(())
    }

    fn load_block_nbt(&self, _: ChunkPos) -> ProviderResult<Vec<NbtCompound>> {
        Ok(Vec::new())
    }

    fn save_block_nbt(&self, _: ChunkPos, _: &[NbtCompound]) -> ProviderResult<()> {
        Ok(())
    }

    fn close(&mut self) -> ProviderResult<()> {
        Ok(())
    }
}
