use crate::config::WorldConfig;
use crate::store::WorldStore;
use crate::worldgen::{GenerationError, WorldGenerator};

pub const DEFAULT_BATCH_SIZE: usize = 2000;

const PROGRESS_EVERY: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    /// The store already held a world; nothing was written.
    Skipped {
        existing: u64,
    },
    Generated {
        tiles: u64,
    },
}

/// Generate the configured world into `store` unless it already holds tiles.
///
/// Tiles are staged in batches of `batch_size` rows, row-major, and committed
/// together once the last batch is staged. On any failure the staged rows are
/// discarded and the store is left as it was.
pub fn populate_world(
    store: &mut dyn WorldStore,
    world: &WorldConfig,
    batch_size: usize,
) -> Result<Population, GenerationError> {
    if world.width == 0 || world.height == 0 {
        return Err(GenerationError::InvalidDimensions {
            width: world.width,
            height: world.height,
        });
    }

    let existing = store.tile_count()?;
    if existing > 0 {
        tracing::info!(existing, "world already populated, skipping generation");
        return Ok(Population::Skipped { existing });
    }

    tracing::info!(
        width = world.width,
        height = world.height,
        seed = world.seed,
        "generating world"
    );
    let generator = WorldGenerator::new(world.width, world.height, world.seed)?;

    let loaded = stage_all(store, &generator, batch_size.max(1))
        .and_then(|()| store.commit_tiles().map_err(GenerationError::from));
    match loaded {
        Ok(tiles) => {
            tracing::info!(tiles, "world generated");
            Ok(Population::Generated { tiles })
        }
        Err(err) => {
            if let Err(discard) = store.discard_staged() {
                tracing::warn!(error = %discard, "failed to discard staged tiles");
            }
            Err(err)
        }
    }
}

fn stage_all(
    store: &mut dyn WorldStore,
    generator: &WorldGenerator,
    batch_size: usize,
) -> Result<(), GenerationError> {
    let mut batch = Vec::with_capacity(batch_size);
    let mut staged = 0_u64;
    for record in generator.tiles() {
        batch.push(record);
        if batch.len() >= batch_size {
            store.stage_tiles(&batch)?;
            staged += batch.len() as u64;
            batch.clear();
            if staged % PROGRESS_EVERY < batch_size as u64 {
                tracing::debug!(staged, "staging tiles");
            }
        }
    }
    if !batch.is_empty() {
        store.stage_tiles(&batch)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use crate::world::{Faction, FactionId, NewFaction, Tile, TileId, TileRecord};

    /// Delegates to a memory store and fails the n-th staged batch.
    struct FlakyStore {
        inner: MemoryStore,
        fail_on_batch: usize,
        batches: usize,
    }

    impl WorldStore for FlakyStore {
        fn tile_count(&self) -> Result<u64, StoreError> {
            self.inner.tile_count()
        }

        fn stage_tiles(&mut self, batch: &[TileRecord]) -> Result<(), StoreError> {
            self.batches += 1;
            if self.batches == self.fail_on_batch {
                return Err(StoreError::Io {
                    path: "flaky".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.stage_tiles(batch)
        }

        fn commit_tiles(&mut self) -> Result<u64, StoreError> {
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

    fn world(width: u32, height: u32) -> WorldConfig {
        WorldConfig {
            width,
            height,
            seed: 1337,
        }
    }

    #[test]
    fn generates_every_cell_once() {
        let mut store = MemoryStore::new();
        let outcome = populate_world(&mut store, &world(30, 20), 64).unwrap();
        assert_eq!(outcome, Population::Generated { tiles: 600 });
        assert_eq!(store.tile_count().unwrap(), 600);
    }

    #[test]
    fn second_run_is_skipped() {
        let mut store = MemoryStore::new();
        populate_world(&mut store, &world(10, 10), 16).unwrap();
        let outcome = populate_world(&mut store, &world(10, 10), 16).unwrap();
        assert_eq!(outcome, Population::Skipped { existing: 100 });
    }

    #[test]
    fn failed_batch_leaves_store_empty() {
        let mut store = FlakyStore {
            inner: MemoryStore::new(),
            fail_on_batch: 3,
            batches: 0,
        };
        let err = populate_world(&mut store, &world(20, 10), 25).unwrap_err();
        assert!(matches!(err, GenerationError::Store(StoreError::Io { .. })));
        assert_eq!(store.tile_count().unwrap(), 0);
        assert_eq!(store.inner.staged_len(), 0);

        // Nothing committed, so a retry is not skipped.
        store.fail_on_batch = 0;
        let outcome = populate_world(&mut store, &world(20, 10), 25).unwrap();
        assert_eq!(outcome, Population::Generated { tiles: 200 });
    }

    #[test]
    fn invalid_dimensions_write_nothing() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            populate_world(&mut store, &world(0, 5), 10),
            Err(GenerationError::InvalidDimensions { .. })
        ));
        assert_eq!(store.tile_count().unwrap(), 0);
    }

    #[test]
    fn invalid_dimensions_fail_even_when_populated() {
        let mut store = MemoryStore::new();
        populate_world(&mut store, &world(10, 10), 16).unwrap();
        assert!(matches!(
            populate_world(&mut store, &world(0, 0), 16),
            Err(GenerationError::InvalidDimensions {
                width: 0,
                height: 0
            })
        ));
        assert_eq!(store.tile_count().unwrap(), 100);
    }
}
