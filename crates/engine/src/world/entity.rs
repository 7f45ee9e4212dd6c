use uuid::Uuid;

use super::position::ChunkPos;
use crate::nbt::NbtCompound;

/// The serializable projection of a live entity: enough to rebuild it after a
/// restart. Entities are persisted per chunk; the chunk is the one containing
/// `position` at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveableEntity {
    /// Namespaced type identifier, e.g. `minecraft:item`.
    pub identifier: String,
    pub uuid: Uuid,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    /// Yaw and pitch in degrees.
    pub rotation: [f32; 2],
    /// Type-specific state the simulation wants back.
    pub data: NbtCompound,
}

impl SaveableEntity {
    pub fn new(identifier: impl Into<String>, uuid: Uuid, position: [f64; 3]) -> Self {
        Self {
            identifier: identifier.into(),
            uuid,
            position,
            velocity: [0.0; 3],
            rotation: [0.0; 2],
            data: NbtCompound::new(),
        }
    }

    /// The chunk this entity is stored under, or `None` if its position is
    /// outside every chunk.
    pub fn chunk(&self) -> Option<ChunkPos> {
        ChunkPos::containing(self.position[0], self.position[2])
    }
}
