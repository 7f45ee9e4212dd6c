//! Entities and block entities as Anvil-style NBT payloads.

use std::collections::HashMap;

use fastnbt::{IntArray, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voxelstore_engine::nbt::NbtCompound;
use voxelstore_engine::provider::BoxError;
use voxelstore_engine::world::entity::SaveableEntity;
use voxelstore_engine::world::position::ChunkPos;

use super::DATA_VERSION;
use super::value::{from_compound, to_compound};

#[derive(Serialize, Deserialize, Debug)]
struct EntityChunkNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    /// `[x, z]` of the chunk.
    #[serde(rename = "Position")]
    position: IntArray,
    #[serde(rename = "Entities")]
    entities: Vec<EntityNbt>,
}

#[derive(Serialize, Deserialize, Debug)]
struct EntityNbt {
    id: String,
    #[serde(rename = "UUID")]
    uuid: IntArray,
    #[serde(rename = "Pos")]
    pos: Vec<f64>,
    #[serde(rename = "Motion")]
    motion: Vec<f64>,
    #[serde(rename = "Rotation")]
    rotation: Vec<f32>,
    #[serde(rename = "Data", default)]
    data: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug)]
struct BlockEntityChunkNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "xPos")]
    x_pos: i32,
    #[serde(rename = "zPos")]
    z_pos: i32,
    block_entities: Vec<HashMap<String, Value>>,
}

/// UUID as four big-endian ints, most significant first.
fn uuid_to_ints(uuid: Uuid) -> [i32; 4] {
    let v = uuid.as_u128();
    [(v >> 96) as i32, (v >> 64) as i32, (v >> 32) as i32, v as i32]
}

fn uuid_from_ints(ints: &[i32]) -> Option<Uuid> {
    let [a, b, c, d]: [i32; 4] = ints.try_into().ok()?;
    let v = ((a as u32 as u128) << 96)
        | ((b as u32 as u128) << 64)
        | ((c as u32 as u128) << 32)
        | (d as u32 as u128);
    Some(Uuid::from_u128(v))
}

fn check_position(pos: ChunkPos, x: i32, z: i32) -> Result<(), BoxError> {
    if (x, z) != (pos.x, pos.z) {
        return Err(format!("payload records chunk ({}, {})", x, z).into());
    }
    Ok(())
}

pub(crate) fn encode_entities(pos: ChunkPos, entities: &[SaveableEntity]) -> Result<Vec<u8>, BoxError> {
    let nbt = EntityChunkNbt {
        data_version: DATA_VERSION,
        position: IntArray::new(vec![pos.x, pos.z]),
        entities: entities
            .iter()
            .map(|e| EntityNbt {
                id: e.identifier.clone(),
                uuid: IntArray::new(uuid_to_ints(e.uuid).to_vec()),
                pos: e.position.to_vec(),
                motion: e.velocity.to_vec(),
                rotation: e.rotation.to_vec(),
                data: to_compound(&e.data),
            })
            .collect(),
    };
    Ok(fastnbt::to_bytes(&nbt)?)
}

pub(crate) fn decode_entities(pos: ChunkPos, bytes: &[u8]) -> Result<Vec<SaveableEntity>, BoxError> {
    let nbt: EntityChunkNbt = fastnbt::from_bytes(bytes)?;
    let position: Vec<i32> = nbt.position.iter().copied().collect();
    let [x, z]: [i32; 2] = position
        .try_into()
        .map_err(|_| "entity chunk Position must hold two ints")?;
    check_position(pos, x, z)?;

    nbt.entities
        .into_iter()
        .map(|e| -> Result<SaveableEntity, BoxError> {
            let uuid_ints: Vec<i32> = e.uuid.iter().copied().collect();
            let uuid = uuid_from_ints(&uuid_ints)
                .ok_or_else(|| format!("entity {} has a malformed UUID", e.id))?;
            let position: [f64; 3] = e
                .pos
                .try_into()
                .map_err(|_| format!("entity {} Pos must hold three doubles", uuid))?;
            let velocity: [f64; 3] = e
                .motion
                .try_into()
                .map_err(|_| format!("entity {} Motion must hold three doubles", uuid))?;
            let rotation: [f32; 2] = e
                .rotation
                .try_into()
                .map_err(|_| format!("entity {} Rotation must hold two floats", uuid))?;
            Ok(SaveableEntity {
                identifier: e.id,
                uuid,
                position,
                velocity,
                rotation,
                data: from_compound(e.data),
            })
        })
        .collect()
}

pub(crate) fn encode_block_entities(pos: ChunkPos, data: &[NbtCompound]) -> Result<Vec<u8>, BoxError> {
    let nbt = BlockEntityChunkNbt {
        data_version: DATA_VERSION,
        x_pos: pos.x,
        z_pos: pos.z,
        block_entities: data.iter().map(to_compound).collect(),
    };
    Ok(fastnbt::to_bytes(&nbt)?)
}

pub(crate) fn decode_block_entities(pos: ChunkPos, bytes: &[u8]) -> Result<Vec<NbtCompound>, BoxError> {
    let nbt: BlockEntityChunkNbt = fastnbt::from_bytes(bytes)?;
    check_position(pos, nbt.x_pos, nbt.z_pos)?;
    Ok(nbt.block_entities.into_iter().map(from_compound).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelstore_engine::nbt::NbtValue;

    #[test]
    fn uuid_int_layout_matches_vanilla() {
        let uuid = Uuid::from_u128(0x0000_0001_0000_0002_0000_0003_ffff_fffe);
        let ints = uuid_to_ints(uuid);
        assert_eq!(ints, [1, 2, 3, -2]);
        assert_eq!(uuid_from_ints(&ints), Some(uuid));
        assert_eq!(uuid_from_ints(&ints[..3]), None);
    }

    #[test]
    fn entities_keep_their_fields() {
        let pos = ChunkPos::new(3, -2);
        let mut item = SaveableEntity::new("minecraft:item", Uuid::from_u128(99), [50.25, 64.0, -30.75]);
        item.velocity = [0.0, -0.08, 0.0];
        item.rotation = [90.0, -12.5];
        item.data.insert("PickupDelay".into(), NbtValue::Short(10));

        let bytes = encode_entities(pos, std::slice::from_ref(&item)).unwrap();
        assert_eq!(decode_entities(pos, &bytes).unwrap(), vec![item]);
        assert!(decode_entities(ChunkPos::new(3, -1), &bytes).is_err());
    }

    #[test]
    fn empty_sets_encode() {
        let pos = ChunkPos::new(0, 0);
        let bytes = encode_entities(pos, &[]).unwrap();
        assert!(decode_entities(pos, &bytes).unwrap().is_empty());

        let bytes = encode_block_entities(pos, &[]).unwrap();
        assert!(decode_block_entities(pos, &bytes).unwrap().is_empty());
    }
}
