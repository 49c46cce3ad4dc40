pub mod config;
pub mod faction;
pub mod logging;
pub mod materialize;
pub mod spatial;
pub mod store;
pub mod web;
pub mod world;
pub mod worldgen;

pub use config::{Config, WorldConfig};
pub use materialize::{populate_world, Population};
pub use store::{JsonFileStore, MemoryStore, StoreError, WorldStore};
pub use worldgen::{generate, GenerationError, WorldGenerator};
