//! One directory of Anvil region files (`r.<rx>.<rz>.mca`), each holding up
//! to 32x32 chunk payloads.

use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use voxelstore_engine::provider::BoxError;
use voxelstore_engine::world::position::ChunkPos;

/// Reads and writes raw (uncompressed NBT) chunk payloads in one region
/// directory.
///
/// Access to a single region file is serialized by a per-file lock; distinct
/// region files can be read and written concurrently.
pub(crate) struct RegionDir {
    dir: PathBuf,
    locks: DashMap<(i32, i32), Arc<Mutex<()>>>,
}

impl RegionDir {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            locks: DashMap::new(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.dir
    }

    fn region_path(&self, (rx, rz): (i32, i32)) -> PathBuf {
        self.dir.join(format!("r.{}.{}.mca", rx, rz))
    }

    fn lock_for(&self, region: (i32, i32)) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(region).or_default().value())
    }

    /// The payload stored for `pos`, or `None` if the region file or the
    /// chunk slot inside it does not exist.
    pub(crate) fn read(&self, pos: ChunkPos) -> Result<Option<Vec<u8>>, BoxError> {
        let region = pos.region();
        let lock = self.lock_for(region);
        let _guard = lock.lock().map_err(|_| "region lock poisoned")?;

        let path = self.region_path(region);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut region = fastanvil::Region::from_stream(file)?;
        let (x, z) = pos.region_local();
        Ok(region.read_chunk(x, z)?)
    }

    /// Store `payload` for `pos`, creating the region file if needed.
    ///
    /// The region is rebuilt in memory and swapped in through a temporary
    /// file, so a failed write leaves the previous file intact.
    pub(crate) fn write(&self, pos: ChunkPos, payload: &[u8]) -> Result<(), BoxError> {
        let region = pos.region();
        let lock = self.lock_for(region);
        let _guard = lock.lock().map_err(|_| "region lock poisoned")?;

        let path = self.region_path(region);
        let mut region = match fs::read(&path) {
            Ok(bytes) => fastanvil::Region::from_stream(Cursor::new(bytes))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir)?;
                fastanvil::Region::new(Cursor::new(Vec::new()))?
            }
            Err(e) => return Err(e.into()),
        };

        let (x, z) = pos.region_local();
        region.write_chunk(x, z, payload)?;
        let data = region.into_inner()?.into_inner();

        let tmp = path.with_extension("mca.tmp");
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
