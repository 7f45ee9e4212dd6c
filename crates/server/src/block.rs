//! Minecraft block-state IDs used by the world host.
//!
//! BlockId values are MC block state IDs (from azalea-block for MC 1.21.11),
//! so the Anvil codec can name them without a mapping layer.

use voxelstore_engine::world::block::BlockId;

pub const AIR: BlockId = BlockId(0);
pub const STONE: BlockId = BlockId(1);
pub const GRASS_BLOCK: BlockId = BlockId(9); // snowy=false
pub const DIRT: BlockId = BlockId(10);
pub const BEDROCK: BlockId = BlockId(85);
pub const SAND: BlockId = BlockId(118);
pub const OAK_LOG: BlockId = BlockId(137); // axis=y
