//! A [`Provider`] backed by Minecraft Anvil region files.
//!
//! Layout inside the world directory:
//! ```text
//! level.dat              - gzip NBT world settings
//! region/r.X.Z.mca       - chunk block data
//! entities/r.X.Z.mca     - entities per chunk
//! block_entities/r.X.Z.mca - block entity NBT per chunk
//! ```
//! Chunk files are compatible with vanilla tools for the block data they
//! carry; the entity and block-entity files use this provider's own layout.

mod chunk;
mod entity;
mod level;
mod region;
mod value;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use voxelstore_engine::nbt::NbtCompound;
use voxelstore_engine::provider::{BoxError, DataKind, Provider, ProviderError, ProviderResult};
use voxelstore_engine::world::chunk::Chunk;
use voxelstore_engine::world::entity::SaveableEntity;
use voxelstore_engine::world::position::ChunkPos;
use voxelstore_engine::world::settings::Settings;

use region::RegionDir;

/// DataVersion tag written into every payload. MC 1.21.11 = 4189.
const DATA_VERSION: i32 = 4189;

const LEVEL_DAT: &str = "level.dat";

/// Stores one world in a directory of Anvil region files.
///
/// Reads and writes may be issued from several threads: calls touching the
/// same region file are serialized, calls on different region files run
/// concurrently. Settings are written to `level.dat` on every
/// `save_settings`, one writer at a time; if that fails, the error is logged
/// and returned from `close`. After `close`, every fallible operation returns
/// [`ProviderError::Closed`]; closing again is a no-op.
pub struct AnvilProvider {
    dir: PathBuf,
    settings: RwLock<Settings>,
    /// Last settings write failure not yet superseded by a successful write.
    settings_error: Mutex<Option<BoxError>>,
    chunks: RegionDir,
    entities: RegionDir,
    block_entities: RegionDir,
    closed: bool,
}

impl AnvilProvider {
    /// Open the world stored in `dir`, creating the directory if needed.
    ///
    /// A missing `level.dat` means a fresh world with default settings; an
    /// unreadable one is reported as [`ProviderError::CorruptSettings`].
    pub fn open(dir: impl AsRef<Path>) -> ProviderResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| ProviderError::Open(e.into()))?;

        let stored = level::read(&dir.join(LEVEL_DAT)).map_err(ProviderError::CorruptSettings)?;
        let settings = match stored {
            Some(settings) => settings,
            None => {
                tracing::info!("No {} in {}, using default settings", LEVEL_DAT, dir.display());
                Settings::default()
            }
        };

        let provider = Self {
            settings: RwLock::new(settings),
            settings_error: Mutex::new(None),
            chunks: RegionDir::new(dir.join("region")),
            entities: RegionDir::new(dir.join("entities")),
            block_entities: RegionDir::new(dir.join("block_entities")),
            dir,
            closed: false,
        };
        tracing::debug!(
            "Anvil provider ready: chunks in {}, entities in {}, block entities in {}",
            provider.chunks.path().display(),
            provider.entities.path().display(),
            provider.block_entities.path().display(),
        );
        Ok(provider)
    }

    fn ensure_open(&self) -> ProviderResult<()> {
        if self.closed {
            Err(ProviderError::Closed)
        } else {
            Ok(())
        }
    }

    fn read(
        &self,
        store: &RegionDir,
        pos: ChunkPos,
        kind: DataKind,
    ) -> ProviderResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        store
            .read(pos)
            .map_err(|e| ProviderError::corrupt(pos, kind, e))
    }

    fn write(
        &self,
        store: &RegionDir,
        pos: ChunkPos,
        kind: DataKind,
        payload: Result<Vec<u8>, BoxError>,
    ) -> ProviderResult<()> {
        self.ensure_open()?;
        let payload = payload.map_err(|e| ProviderError::write(pos, kind, e))?;
        store
            .write(pos, &payload)
            .map_err(|e| ProviderError::write(pos, kind, e))?;
        tracing::debug!("Wrote {} data for chunk {} ({} bytes)", kind, pos, payload.len());
        Ok(())
    }
}

impl Provider for AnvilProvider {
    fn settings(&self) -> Settings {
        self.settings.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save_settings(&self, settings: &Settings) {
        if self.closed {
            tracing::warn!("Ignoring settings save on a closed provider");
            return;
        }
        // Held across the file write so memory and level.dat change together.
        let mut current = self.settings.write().unwrap_or_else(|e| e.into_inner());
        *current = settings.clone();

        let result = level::write(&self.dir.join(LEVEL_DAT), settings);
        let mut pending = self.settings_error.lock().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(()) => *pending = None,
            Err(e) => {
                tracing::warn!("Failed to write {}: {} (reported on close)", LEVEL_DAT, e);
                *pending = Some(e);
            }
        }
    }

    fn load_chunk(&self, pos: ChunkPos) -> ProviderResult<Option<Chunk>> {
        let Some(bytes) = self.read(&self.chunks, pos, DataKind::Chunk)? else {
            return Ok(None);
        };
        chunk::decode(pos, &bytes)
            .map(Some)
            .map_err(|e| ProviderError::corrupt(pos, DataKind::Chunk, e))
    }

    fn save_chunk(&self, pos: ChunkPos, chunk: &Chunk) -> ProviderResult<()> {
        self.write(&self.chunks, pos, DataKind::Chunk, chunk::encode(pos, chunk))
    }

    fn load_entities(&self, pos: ChunkPos) -> ProviderResult<Vec<SaveableEntity>> {
        let Some(bytes) = self.read(&self.entities, pos, DataKind::Entities)? else {
            return Ok(Vec::new());
        };
        entity::decode_entities(pos, &bytes)
            .map_err(|e| ProviderError::corrupt(pos, DataKind::Entities, e))
    }

    fn save_entities(&self, pos: ChunkPos, entities: &[SaveableEntity]) -> ProviderResult<()> {
        self.write(
            &self.entities,
            pos,
            DataKind::Entities,
            entity::encode_entities(pos, entities),
        )
    }

    fn load_block_nbt(&self, pos: ChunkPos) -> ProviderResult<Vec<NbtCompound>> {
        let Some(bytes) = self.read(&self.block_entities, pos, DataKind::BlockNbt)? else {
            return Ok(Vec::new());
        };
        entity::decode_block_entities(pos, &bytes)
            .map_err(|e| ProviderError::corrupt(pos, DataKind::BlockNbt, e))
    }

    fn save_block_nbt(&self, pos: ChunkPos, data: &[NbtCompound]) -> ProviderResult<()> {
        self.write(
            &self.block_entities,
            pos,
            DataKind::BlockNbt,
            entity::encode_block_entities(pos, data),
        )
    }

    fn close(&mut self) -> ProviderResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::info!("Closed Anvil world at {}", self.dir.display());

        let pending = self.settings_error.get_mut().unwrap_or_else(|e| e.into_inner());
        match pending.take() {
            Some(e) => Err(ProviderError::SettingsWrite(e)),
            None => Ok(()),
        }
    }
}
