use super::block::BlockId;
use super::position::LocalBlockPos;
use std::collections::BTreeMap;

/// Number of blocks along each axis of a chunk section.
pub const SECTION_SIZE: usize = 16;
/// Total block count in one section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// A 16x16x16 cube of blocks.
///
/// Stored as a flat array in YZX order (x varies fastest), which is also the
/// order Anvil uses for its packed block-state indices.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkSection {
    blocks: Box<[BlockId; SECTION_VOLUME]>,
}

impl ChunkSection {
    pub fn new_filled(block: BlockId) -> Self {
        Self {
            blocks: Box::new([block; SECTION_VOLUME]),
        }
    }

    pub fn new_empty() -> Self {
        Self::new_filled(BlockId::AIR)
    }

    pub fn from_blocks(blocks: [BlockId; SECTION_VOLUME]) -> Self {
        Self {
            blocks: Box::new(blocks),
        }
    }

    #[inline]
    const fn index(x: u8, y: u8, z: u8) -> usize {
        (y as usize) * SECTION_SIZE * SECTION_SIZE + (z as usize) * SECTION_SIZE + (x as usize)
    }

    #[inline]
    pub fn get(&self, x: u8, y: u8, z: u8) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: u8, y: u8, z: u8, block: BlockId) {
        self.blocks[Self::index(x, y, z)] = block;
    }

    /// All blocks in storage order.
    pub fn blocks(&self) -> &[BlockId; SECTION_VOLUME] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.is_air())
    }
}

impl std::fmt::Debug for ChunkSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self.blocks.iter().filter(|b| !b.is_air()).count();
        f.debug_struct("ChunkSection").field("solid", &solid).finish()
    }
}

/// A column of chunk sections, keyed by section index (y >> 4).
///
/// Only non-empty sections are stored (sparse). Providers treat a chunk as an
/// opaque, already-decoded unit: they receive it by reference and hand back
/// owned copies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    sections: BTreeMap<i32, ChunkSection>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_block(&self, pos: LocalBlockPos) -> BlockId {
        let section_idx = pos.section_index();
        match self.sections.get(&section_idx) {
            Some(section) => section.get(pos.x, pos.section_local_y(), pos.z),
            None => BlockId::AIR,
        }
    }

    pub fn set_block(&mut self, pos: LocalBlockPos, block: BlockId) {
        let section_idx = pos.section_index();

        if block.is_air() {
            if let Some(section) = self.sections.get_mut(&section_idx) {
                section.set(pos.x, pos.section_local_y(), pos.z, block);
                if section.is_empty() {
                    self.sections.remove(&section_idx);
                }
            }
        } else {
            let section = self
                .sections
                .entry(section_idx)
                .or_insert_with(ChunkSection::new_empty);
            section.set(pos.x, pos.section_local_y(), pos.z, block);
        }
    }

    /// Non-empty sections in ascending section index order.
    pub fn sections(&self) -> impl Iterator<Item = (i32, &ChunkSection)> {
        self.sections.iter().map(|(idx, section)| (*idx, section))
    }

    /// Insert a whole section, replacing any existing one. Empty sections are
    /// dropped so the sparse invariant holds.
    pub fn insert_section(&mut self, index: i32, section: ChunkSection) {
        if section.is_empty() {
            self.sections.remove(&index);
        } else {
            self.sections.insert(index, section);
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
