//! Clipmap terrain: tile geometry, instance layout, per-frame placement.

pub mod config;
pub mod manager;
pub mod ring;
pub mod schedule;
pub mod tiles;
pub mod tracker;

pub use config::ClipmapConfig;
pub use manager::TerrainManager;
pub use ring::TransformRing;
pub use schedule::{InstanceSchedule, InstanceSlot, KindRanges, schedule_instances};
pub use tiles::{TileGeometry, TileMeshBuilder};
pub use tracker::ClipmapTracker;
