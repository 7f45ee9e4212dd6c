//! The persistence contract between a world and its storage backend.
//!
//! A world holds exactly one [`Provider`] for its lifetime. It reads
//! [`Settings`] once on open, loads and saves chunk-scoped data (chunk,
//! entities, block NBT) keyed by [`ChunkPos`], and calls [`Provider::close`]
//! exactly once on teardown.
//!
//! Every load separates "nothing was ever saved here" (`Ok(None)` or an empty
//! `Vec`) from "something is here but it can't be read" (`Err`). Callers
//! generate fresh data in the first case and must not in the second.

mod memory;
mod noio;

pub use memory::MemoryProvider;
pub use noio::NoIoProvider;

use std::fmt;

use crate::nbt::NbtCompound;
use crate::world::chunk::Chunk;
use crate::world::entity::SaveableEntity;
use crate::world::position::ChunkPos;
use crate::world::settings::Settings;

/// Boxed source error carried by [`ProviderError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Alias for `Result<T, ProviderError>`.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Which piece of chunk-scoped data an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Chunk,
    Entities,
    BlockNbt,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataKind::Chunk => "chunk",
            DataKind::Entities => "entity",
            DataKind::BlockNbt => "block NBT",
        })
    }
}

/// Failures a provider reports. Absence of data is never one of them.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The backing store could not be opened or created.
    #[error("failed to open world storage: {0}")]
    Open(#[source] BoxError),

    /// Data exists at `pos` but could not be read or decoded.
    #[error("corrupt {kind} data at chunk {pos}: {source}")]
    Corrupt {
        pos: ChunkPos,
        kind: DataKind,
        #[source]
        source: BoxError,
    },

    /// Persisted world settings exist but could not be read or decoded.
    #[error("corrupt world settings: {0}")]
    CorruptSettings(#[source] BoxError),

    /// Writing data at `pos` failed.
    #[error("failed to write {kind} data at chunk {pos}: {source}")]
    Write {
        pos: ChunkPos,
        kind: DataKind,
        #[source]
        source: BoxError,
    },

    /// An earlier `save_settings` call could not persist the settings.
    #[error("failed to persist world settings: {0}")]
    SettingsWrite(#[source] BoxError),

    /// Releasing the provider's resources failed.
    #[error("failed to close provider: {0}")]
    Close(#[source] BoxError),

    /// The provider was already closed.
    #[error("provider is closed")]
    Closed,
}

impl ProviderError {
    pub fn corrupt(pos: ChunkPos, kind: DataKind, source: impl Into<BoxError>) -> Self {
        ProviderError::Corrupt {
            pos,
            kind,
            source: source.into(),
        }
    }

    pub fn write(pos: ChunkPos, kind: DataKind, source: impl Into<BoxError>) -> Self {
        ProviderError::Write {
            pos,
            kind,
            source: source.into(),
        }
    }

    /// True when stored data is present but unusable. Callers must not
    /// silently regenerate over it.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            ProviderError::Corrupt { .. } | ProviderError::CorruptSettings(_)
        )
    }
}

/// A storage backend for one world.
///
/// Reads and writes take `&self`, so a backend may be shared across threads
/// and serve different coordinates concurrently. Whether it actually does so
/// is backend-defined and documented on each implementation; a backend that
/// is not concurrency-safe must serialize internally. `close` takes
/// `&mut self`, so it can never overlap another call on the same instance.
///
/// None of the operations retry internally or time out; blocking on disk or
/// network is an implementation detail.
pub trait Provider: Send + Sync {
    /// Current world settings. Never fails: a backend with nothing persisted
    /// returns [`Settings::default`].
    fn settings(&self) -> Settings;

    /// Persist (or update) world settings.
    ///
    /// There is no error return. A backend that can fail to persist keeps the
    /// failure and reports it from [`Provider::close`].
    fn save_settings(&self, settings: &Settings);

    /// Load the chunk at `pos`.
    ///
    /// - `Ok(Some(chunk))`: data found and valid.
    /// - `Ok(None)`: nothing was ever saved here; the world generates a chunk.
    /// - `Err(_)`: data was found but could not be read.
    fn load_chunk(&self, pos: ChunkPos) -> ProviderResult<Option<Chunk>>;

    /// Persist a chunk at `pos`, replacing any previous one.
    fn save_chunk(&self, pos: ChunkPos, chunk: &Chunk) -> ProviderResult<()>;

    /// All entities saved at `pos`; empty if none were ever saved. Order is
    /// backend-defined.
    fn load_entities(&self, pos: ChunkPos) -> ProviderResult<Vec<SaveableEntity>>;

    /// Replace the entity set at `pos`. An empty slice clears it.
    fn save_entities(&self, pos: ChunkPos, entities: &[SaveableEntity]) -> ProviderResult<()>;

    /// All block entities saved at `pos`; empty if none were ever saved.
    fn load_block_nbt(&self, pos: ChunkPos) -> ProviderResult<Vec<NbtCompound>>;

    /// Replace the block entities at `pos`. An empty slice clears them.
    fn save_block_nbt(&self, pos: ChunkPos, data: &[NbtCompound]) -> ProviderResult<()>;

    /// Release every resource the provider holds. Called once when the world
    /// is done with the provider; behavior of later calls is backend-defined.
    fn close(&mut self) -> ProviderResult<()>;
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn settings(&self) -> Settings {
        (**self).settings()
    }

    fn save_settings(&self, settings: &Settings) {
        (**self).save_settings(settings)
    }

    fn load_chunk(&self, pos: ChunkPos) -> ProviderResult<Option<Chunk>> {
        (**self).load_chunk(pos)
    }

    fn save_chunk(&self, pos: ChunkPos, chunk: &Chunk) -> ProviderResult<()> {
        (**self).save_chunk(pos, chunk)
    }

    fn load_entities(&self, pos: ChunkPos) -> ProviderResult<Vec<SaveableEntity>> {
        (**self).load_entities(pos)
    }

    fn save_entities(&self, pos: ChunkPos, entities: &[SaveableEntity]) -> ProviderResult<()> {
        (**self).save_entities(pos, entities)
    }

    fn load_block_nbt(&self, pos: ChunkPos) -> ProviderResult<Vec<NbtCompound>> {
        (**self).load_block_nbt(pos)
    }

    fn save_block_nbt(&self, pos: ChunkPos, data: &[NbtCompound]) -> ProviderResult<()> {
        (**self).save_block_nbt(pos, data)
    }

    fn close(&mut self) -> ProviderResult<()> {
        (**self).close()
    }
}
