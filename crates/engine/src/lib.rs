//! Storage provider contract for voxel worlds.
//!
//! [`provider::Provider`] is the seam between a [`world::World`] and whatever
//! stores it: disk, database, memory, or nothing at all
//! ([`provider::NoIoProvider`]). The world never branches on which one it has.

pub mod generator;
pub mod nbt;
pub mod provider;
pub mod world;
