//! Disk storage and hosting for voxelstore worlds.
//!
//! [`anvil::AnvilProvider`] implements the engine's storage contract on top of
//! Minecraft Anvil region files; [`generator::FlatGenerator`] fills chunks the
//! provider has never seen.

pub mod anvil;
pub mod block;
pub mod generator;
