//! Chunk <-> Anvil chunk NBT (block-state palettes with bit-packed indices).

use std::collections::HashMap;
use std::sync::LazyLock;

use azalea_block::{BlockState, BlockTrait};
use serde::{Deserialize, Serialize};
use voxelstore_engine::provider::BoxError;
use voxelstore_engine::world::block::BlockId;
use voxelstore_engine::world::chunk::{Chunk, ChunkSection, SECTION_VOLUME};
use voxelstore_engine::world::position::ChunkPos;

use super::DATA_VERSION;

// ── Reverse lookup table: (name, properties) → BlockState ID ─────────────────

/// Key for the reverse block lookup: `("stone", {})` or `("oak_stairs", {"facing": "north", ...})`.
type BlockLookupKey = (String, Vec<(String, String)>);

/// Lazily-built reverse lookup table: `(name, sorted_properties) → state_id`.
static BLOCK_LOOKUP: LazyLock<HashMap<BlockLookupKey, u16>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for id in 0..=BlockState::MAX_STATE {
        let Ok(state) = BlockState::try_from(id as u32) else {
            continue;
        };
        let block: Box<dyn BlockTrait> = Box::<dyn BlockTrait>::from(state);
        let mut props: Vec<(String, String)> = block
            .property_map()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        props.sort();
        map.insert((block.id().to_string(), props), id);
    }
    map
});

fn palette_entry_to_block_id(entry: &PaletteEntry) -> BlockId {
    let name = entry
        .name
        .strip_prefix("minecraft:")
        .unwrap_or(&entry.name);
    let mut props: Vec<(String, String)> = entry
        .properties
        .as_ref()
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    props.sort();

    match BLOCK_LOOKUP.get(&(name.to_string(), props)) {
        Some(&id) => BlockId(id),
        None => {
            tracing::warn!("Unknown block in save file: {}, defaulting to air", entry.name);
            BlockId::AIR
        }
    }
}

/// Fails for ids outside the block-state table; they have no Anvil name.
fn block_id_to_palette_entry(id: BlockId) -> Result<PaletteEntry, String> {
    if id.is_air() {
        return Ok(PaletteEntry {
            name: "minecraft:air".into(),
            properties: None,
        });
    }
    let state = BlockState::try_from(id.0 as u32)
        .map_err(|_| format!("block id {} is not a known block state", id.0))?;
    let block: Box<dyn BlockTrait> = Box::<dyn BlockTrait>::from(state);
    let prop_map = block.property_map();
    let properties = if prop_map.is_empty() {
        None
    } else {
        Some(
            prop_map
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    };
    Ok(PaletteEntry {
        name: format!("minecraft:{}", block.id()),
        properties,
    })
}

// ── Chunk NBT structs (serde) ────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug)]
struct ChunkNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "xPos")]
    x_pos: i32,
    #[serde(rename = "zPos")]
    z_pos: i32,
    #[serde(rename = "yPos")]
    y_pos: i32,
    sections: Vec<SectionNbt>,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct SectionNbt {
    #[serde(rename = "Y")]
    y: i8,
    block_states: BlockStatesNbt,
}

#[derive(Serialize, Deserialize, Debug)]
struct BlockStatesNbt {
    palette: Vec<PaletteEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Vec<i64>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct PaletteEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties")]
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<HashMap<String, String>>,
}

// ── Bit-packing helpers ──────────────────────────────────────────────────────

/// Pack 4096 palette indices into longs. Entries never span two longs.
fn pack_indices(indices: &[u16; SECTION_VOLUME], palette_len: usize) -> Option<Vec<i64>> {
    if palette_len <= 1 {
        return None; // single-block section, no data array needed
    }

    let bits = bits_per_entry(palette_len);
    let entries_per_long = 64 / bits;
    let num_longs = SECTION_VOLUME.div_ceil(entries_per_long);
    let mask = (1u64 << bits) - 1;

    let mut longs = vec![0i64; num_longs];
    for (i, &idx) in indices.iter().enumerate() {
        let long_idx = i / entries_per_long;
        let bit_offset = (i % entries_per_long) * bits;
        longs[long_idx] |= ((idx as u64 & mask) << bit_offset) as i64;
    }
    Some(longs)
}

/// Inverse of [`pack_indices`]. Fails if `data` is too short for the palette.
fn unpack_indices(data: &[i64], palette_len: usize) -> Result<[u16; SECTION_VOLUME], String> {
    let bits = bits_per_entry(palette_len);
    let entries_per_long = 64 / bits;
    let expected = SECTION_VOLUME.div_ceil(entries_per_long);
    if data.len() < expected {
        return Err(format!(
            "block state data has {} longs, expected {} for a palette of {}",
            data.len(),
            expected,
            palette_len
        ));
    }
    let mask = (1u64 << bits) - 1;

    let mut indices = [0u16; SECTION_VOLUME];
    for (i, idx) in indices.iter_mut().enumerate() {
        let long_idx = i / entries_per_long;
        let bit_offset = (i % entries_per_long) * bits;
        *idx = ((data[long_idx] as u64 >> bit_offset) & mask) as u16;
    }
    Ok(indices)
}

/// Bits per palette entry (minimum 4, as Anvil requires).
fn bits_per_entry(palette_len: usize) -> usize {
    let raw = if palette_len <= 1 {
        0
    } else {
        (usize::BITS - (palette_len - 1).leading_zeros()) as usize
    };
    raw.max(4)
}

// ── Encode ───────────────────────────────────────────────────────────────────

pub(crate) fn encode(pos: ChunkPos, chunk: &Chunk) -> Result<Vec<u8>, BoxError> {
    let sections: Vec<SectionNbt> = chunk
        .sections()
        .map(|(idx, section)| section_to_nbt(idx, section))
        .collect::<Result<_, _>>()?;

    // yPos = lowest section index in this chunk.
    let y_pos = sections.first().map(|s| s.y as i32).unwrap_or(0);

    let nbt = ChunkNbt {
        data_version: DATA_VERSION,
        x_pos: pos.x,
        z_pos: pos.z,
        y_pos,
        sections,
        status: "minecraft:full".into(),
    };
    Ok(fastnbt::to_bytes(&nbt)?)
}

fn section_to_nbt(section_idx: i32, section: &ChunkSection) -> Result<SectionNbt, String> {
    let y = i8::try_from(section_idx)
        .map_err(|_| format!("section index {} does not fit Anvil's section Y", section_idx))?;

    // Engine and Anvil both index sections as y*256 + z*16 + x.
    let mut palette_map: HashMap<BlockId, u16> = HashMap::new();
    let mut palette_entries: Vec<PaletteEntry> = Vec::new();
    let mut indices = [0u16; SECTION_VOLUME];

    for (i, &block_id) in section.blocks().iter().enumerate() {
        indices[i] = match palette_map.get(&block_id) {
            Some(&idx) => idx,
            None => {
                palette_entries.push(block_id_to_palette_entry(block_id)?);
                let idx = (palette_entries.len() - 1) as u16;
                palette_map.insert(block_id, idx);
                idx
            }
        };
    }

    let data = pack_indices(&indices, palette_entries.len());
    Ok(SectionNbt {
        y,
        block_states: BlockStatesNbt {
            palette: palette_entries,
            data,
        },
    })
}

// ── Decode ───────────────────────────────────────────────────────────────────

/// Decode a chunk payload. `pos` is where the payload was found; a payload
/// recording another position is rejected.
pub(crate) fn decode(pos: ChunkPos, bytes: &[u8]) -> Result<Chunk, BoxError> {
    let nbt: ChunkNbt = fastnbt::from_bytes(bytes)?;
    if (nbt.x_pos, nbt.z_pos) != (pos.x, pos.z) {
        return Err(format!(
            "payload records chunk ({}, {})",
            nbt.x_pos, nbt.z_pos
        )
        .into());
    }

    let mut chunk = Chunk::new();
    for section_nbt in &nbt.sections {
        let palette = &section_nbt.block_states.palette;
        let Some(first) = palette.first() else {
            continue;
        };

        let resolved: Vec<BlockId> = palette.iter().map(palette_entry_to_block_id).collect();
        let blocks = match &section_nbt.block_states.data {
            Some(data) if palette.len() > 1 => {
                let indices = unpack_indices(data, palette.len())?;
                let mut blocks = [BlockId::AIR; SECTION_VOLUME];
                for (block, &idx) in blocks.iter_mut().zip(indices.iter()) {
                    *block = *resolved.get(idx as usize).ok_or_else(|| {
                        format!(
                            "palette index {} out of range in section {}",
                            idx, section_nbt.y
                        )
                    })?;
                }
                blocks
            }
            // Single-entry palette: the whole section is that block.
            _ => [palette_entry_to_block_id(first); SECTION_VOLUME],
        };

        chunk.insert_section(section_nbt.y as i32, ChunkSection::from_blocks(blocks));
    }
    Ok(chunk)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block;
    use voxelstore_engine::world::position::LocalBlockPos;

    #[test]
    fn test_bits_per_entry() {
        assert_eq!(bits_per_entry(1), 4);
        assert_eq!(bits_per_entry(2), 4);
        assert_eq!(bits_per_entry(16), 4);
        assert_eq!(bits_per_entry(17), 5);
        assert_eq!(bits_per_entry(256), 8);
    }

    #[test]
    fn test_pack_unpack_seven_entry_palette() {
        let mut indices = [0u16; SECTION_VOLUME];
        for (i, idx) in indices.iter_mut().enumerate() {
            *idx = (i % 7) as u16;
        }
        let packed = pack_indices(&indices, 7).unwrap();
        assert_eq!(packed.len(), 256); // 4 bits -> 16 per long
        assert_eq!(unpack_indices(&packed, 7).unwrap(), indices);
    }

    #[test]
    fn test_single_block_section_has_no_data() {
        assert!(pack_indices(&[0u16; SECTION_VOLUME], 1).is_none());
    }

    #[test]
    fn test_short_data_is_rejected() {
        assert!(unpack_indices(&[0i64; 10], 20).is_err());
    }

    #[test]
    fn test_palette_entry_stone_and_air() {
        let entry = block_id_to_palette_entry(block::STONE).unwrap();
        assert_eq!(entry.name, "minecraft:stone");
        assert!(entry.properties.is_none());
        assert_eq!(palette_entry_to_block_id(&entry), block::STONE);

        let air = block_id_to_palette_entry(BlockId::AIR).unwrap();
        assert_eq!(air.name, "minecraft:air");
        assert_eq!(palette_entry_to_block_id(&air), BlockId::AIR);
    }

    #[test]
    fn test_unknown_block_id_is_not_encoded() {
        let mut chunk = Chunk::new();
        chunk.set_block(LocalBlockPos { x: 1, y: 5, z: 1 }, BlockId(60000));
        let err = encode(ChunkPos::new(0, 0), &chunk).unwrap_err();
        assert!(err.to_string().contains("60000"), "{err}");
    }

    #[test]
    fn test_unknown_block_decodes_as_air() {
        let entry = PaletteEntry {
            name: "othermod:widget".into(),
            properties: None,
        };
        assert_eq!(palette_entry_to_block_id(&entry), BlockId::AIR);
    }

    #[test]
    fn test_chunk_codec_preserves_blocks() {
        let pos = ChunkPos::new(-3, 40);
        let mut chunk = Chunk::new();
        for x in 0..16u8 {
            for z in 0..16u8 {
                chunk.set_block(LocalBlockPos { x, y: 60, z }, block::BEDROCK);
                chunk.set_block(LocalBlockPos { x, y: -64, z }, block::STONE);
            }
        }
        chunk.set_block(LocalBlockPos { x: 2, y: 61, z: 9 }, block::SAND);
        chunk.set_block(LocalBlockPos { x: 2, y: 62, z: 9 }, block::OAK_LOG);

        let bytes = encode(pos, &chunk).unwrap();
        let decoded = decode(pos, &bytes).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_position_mismatch_is_rejected() {
        let bytes = encode(ChunkPos::new(1, 1), &Chunk::new()).unwrap();
        assert!(decode(ChunkPos::new(1, 2), &bytes).is_err());
        assert!(decode(ChunkPos::new(1, 1), b"not nbt").is_err());
    }
}
