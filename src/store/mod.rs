//! Tile and faction storage.
//!
//! Generated tiles are loaded in two phases: batches are staged as they are
//! produced and only become visible on commit, so a load that dies halfway
//! leaves the world empty rather than half-built.

mod json;
mod memory;

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{StorageConfig, StoreBackend};
use crate::world::{Faction, FactionId, NewFaction, Tile, TileId, TileRecord};

pub use json::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode or decode stored world: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("tile {} does not exist", .0.raw())]
    UnknownTile(TileId),
}

pub trait WorldStore: Send {
    /// Number of committed tiles.
    fn tile_count(&self) -> Result<u64, StoreError>;

    /// Append a batch to the staging area. Staged tiles are invisible until committed.
    fn stage_tiles(&mut self, batch: &[TileRecord]) -> Result<(), StoreError>;

    /// Publish every staged tile at once, assigning ids in staging order.
    /// Returns how many tiles were published.
    fn commit_tiles(&mut self) -> Result<u64, StoreError>;

    /// Drop anything staged since the last commit.
    fn discard_staged(&mut self) -> Result<(), StoreError>;

    fn tiles(&self) -> Result<Vec<Tile>, StoreError>;

    fn tile(&self, id: TileId) -> Result<Option<Tile>, StoreError>;

    fn factions(&self) -> Result<Vec<Faction>, StoreError>;

    fn faction_by_name(&self, name: &str) -> Result<Option<Faction>, StoreError>;

    fn insert_faction(&mut self, faction: NewFaction) -> Result<Faction, StoreError>;

    fn set_owner(
        &mut self,
        id: TileId,
        owner: Option<FactionId>,
        capture: u8,
        population: u32,
    ) -> Result<Tile, StoreError>;

    /// Remove all tiles and factions and restart id sequences.
    fn reset(&mut self) -> Result<(), StoreError>;
}

/// Open the backend selected by `config`.
pub fn open(config: &StorageConfig) -> Result<Box<dyn WorldStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
        StoreBackend::Json => Ok(Box::new(JsonFileStore::open(&config.path)?)),
    }
}

/// Committed rows shared by the store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    tiles: Vec<Tile>,
    factions: Vec<Faction>,
}

impl Tables {
    fn tile_count(&self) -> u64 {
        self.tiles.len() as u64
    }

    /// Ids run 1.. in insertion order and rows are never deleted individually.
    fn tile_index(&self, id: TileId) -> Option<usize> {
        let index = usize::try_from(id.raw()).ok()?.checked_sub(1)?;
        self.tiles
            .get(index)
            .filter(|tile| tile.id == id)
            .map(|_| index)
    }

    fn append_tiles(&mut self, records: impl IntoIterator<Item = TileRecord>) -> u64 {
        let before = self.tiles.len();
        for record in records {
            let id = TileId::new(self.tiles.len() as u64 + 1);
            self.tiles.push(Tile::from_record(id, record));
        }
        (self.tiles.len() - before) as u64
    }

    fn truncate_tiles(&mut self, len: usize) {
        self.tiles.truncate(len);
    }

    fn tile(&self, id: TileId) -> Option<Tile> {
        self.tile_index(id).map(|i| self.tiles[i].clone())
    }

    fn faction_by_name(&self, name: &str) -> Option<Faction> {
        self.factions.iter().find(|f| f.name == name).cloned()
    }

    fn insert_faction(&mut self, faction: NewFaction) -> Faction {
        let next = self.factions.iter().map(|f| f.id.raw()).max().unwrap_or(0) + 1;
        let faction = Faction {
            id: FactionId::new(next),
            name: faction.name,
            color: faction.color,
            flag_url: faction.flag_url,
            capital_tile_id: faction.capital_tile_id,
            created_at: Utc::now(),
        };
        self.factions.push(faction.clone());
        faction
    }

    fn set_owner(
        &mut self,
        id: TileId,
        owner: Option<FactionId>,
        capture: u8,
        population: u32,
    ) -> Result<Tile, StoreError> {
        let index = self.tile_index(id).ok_or(StoreError::UnknownTile(id))?;
        let tile = &mut self.tiles[index];
        tile.owner_faction_id = owner;
        tile.capture = capture.min(100);
        tile.population = population;
        Ok(tile.clone())
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.factions.clear();
    }
}
