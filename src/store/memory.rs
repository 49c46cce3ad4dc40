use crate::world::{Faction, FactionId, NewFaction, Tile, TileId, TileRecord};

use super::{StoreError, Tables, WorldStore};

/// Process-local store; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    staged: Vec<TileRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

impl WorldStore for MemoryStore {
    fn tile_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables.tile_count())
    }

    fn stage_tiles(&mut self, batch: &[TileRecord]) -> Result<(), StoreError> {
        self.staged.extend_from_slice(batch);
        Ok(())
    }

    fn commit_tiles(&mut self) -> Result<u64, StoreError> {
        let staged = std::mem::take(&mut self.staged);
        Ok(self.tables.append_tiles(staged))
    }

    fn discard_staged(&mut self) -> Result<(), StoreError> {
        self.staged.clear();
        Ok(())
    }

    fn tiles(&self) -> Result<Vec<Tile>, StoreError> {
        Ok(self.tables.tiles.clone())
    }

    fn tile(&self, id: TileId) -> Result<Option<Tile>, StoreError> {
        Ok(self.tables.tile(id))
    }

    fn factions(&self) -> Result<Vec<Faction>, StoreError> {
        Ok(self.tables.factions.clone())
    }

    fn faction_by_name(&self, name: &str) -> Result<Option<Faction>, StoreError> {
        Ok(self.tables.faction_by_name(name))
    }

    fn insert_faction(&mut self, faction: NewFaction) -> Result<Faction, StoreError> {
        Ok(self.tables.insert_faction(faction))
    }

    fn set_owner(
        &mut self,
        id: TileId,
        owner: Option<FactionId>,
        capture: u8,
        population: u32,
    ) -> Result<Tile, StoreError> {
        self.tables.set_owner(id, owner, capture, population)
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.tables.clear();
        self.staged.clear();
        Ok(())
    }
}
