#![allow(dead_code)]

use territory::store::{MemoryStore, StoreError, WorldStore};
use territory::world::{Faction, FactionId, NewFaction, Tile, TileId, TileRecord};

/// Memory store that records every staging write.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub batch_sizes: Vec<usize>,
    pub commits: usize,
}

impl CountingStore {
    pub fn rows_written(&self) -> usize {
        self.batch_sizes.iter().sum()
    }
}

impl WorldStore for CountingStore {
    fn tile_count(&self) -> Result<u64, StoreError> {
        self.inner.tile_count()
    }

    fn stage_tiles(&mut self, batch: &[TileRecord]) -> Result<(), StoreError> {
        self.batch_sizes.push(batch.len());
        self.inner.stage_tiles(batch)
    }

    fn commit_tiles(&mut self) -> Result<u64, StoreError> {
        self.commits += 1;
        self.inner.commit_tiles()
    }

    fn discard_staged(&mut self) -> Result<(), StoreError> {
        self.inner.discard_staged()
    }

    fn tiles(&self) -> Result<Vec<Tile>, StoreError> {
        self.inner.tiles()
    }

    fn tile(&self, id: TileId) -> Result<Option<Tile>, StoreError> {
        self.inner.tile(id)
    }

    fn factions(&self) -> Result<Vec<Faction>, StoreError> {
        self.inner.factions()
    }

    fn faction_by_name(&self, name: &str) -> Result<Option<Faction>, StoreError> {
        self.inner.faction_by_name(name)
    }

    fn insert_faction(&mut self, faction: NewFaction) -> Result<Faction, StoreError> {
        self.inner.insert_faction(faction)
    }

    fn set_owner(
        &mut self,
        id: TileId,
        owner: Option<FactionId>,
        capture: u8,
        population: u32,
    ) -> Result<Tile, StoreError> {
        self.inner.set_owner(id, owner, capture, population)
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.inner.reset()
    }
}
