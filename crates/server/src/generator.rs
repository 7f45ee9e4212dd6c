use voxelstore_engine::generator::Generator;
use voxelstore_engine::world::block::BlockId;
use voxelstore_engine::world::chunk::{Chunk, SECTION_SIZE};
use voxelstore_engine::world::position::{ChunkPos, LocalBlockPos};

use crate::block;

/// Superflat terrain: one layer per entry of `layers`, bottom-up from
/// `base_y`. The same for every chunk.
pub struct FlatGenerator {
    base_y: i64,
    layers: Vec<BlockId>,
}

impl FlatGenerator {
    pub fn new(base_y: i64, layers: Vec<BlockId>) -> Self {
        Self { base_y, layers }
    }

    /// Y of the first air block above the terrain.
    pub fn surface_y(&self) -> i64 {
        self.base_y + self.layers.len() as i64
    }
}

impl Default for FlatGenerator {
    /// Bedrock at y=60, stone y=61-63, dirt y=64-78, grass at y=79. Players
    /// spawn at y=80.
    fn default() -> Self {
        let mut layers = vec![block::BEDROCK, block::STONE, block::STONE, block::STONE];
        layers.extend(std::iter::repeat_n(block::DIRT, 15));
        layers.push(block::GRASS_BLOCK);
        Self::new(60, layers)
    }
}

impl Generator for FlatGenerator {
    fn generate(&self, _: ChunkPos, chunk: &mut Chunk) {
        for (i, &layer) in self.layers.iter().enumerate() {
            let y = self.base_y + i as i64;
            for x in 0..SECTION_SIZE as u8 {
                for z in 0..SECTION_SIZE as u8 {
                    chunk.set_block(LocalBlockPos { x, y, z }, layer);
                }
            }
        }
    }
}
