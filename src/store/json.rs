use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::world::{Faction, FactionId, NewFaction, Tile, TileId, TileRecord};

use super::{StoreError, Tables, WorldStore};

const WORLD_FILE: &str = "world.json";
const STAGING_FILE: &str = "tiles.staging.jsonl";

/// Directory-backed store.
///
/// Committed state lives in `world.json`, replaced wholesale through a rename.
/// Staged batches are appended to `tiles.staging.jsonl`, one record per line.
pub struct JsonFileStore {
    dir: PathBuf,
    tables: Tables,
}

impl JsonFileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let staging = dir.join(STAGING_FILE);
        if staging.exists() {
            tracing::warn!(
                path = %staging.display(),
                "discarding tiles staged by an interrupted load"
            );
            fs::remove_file(&staging).map_err(io_error(&staging))?;
        }

        let world = dir.join(WORLD_FILE);
        let tables = match fs::read_to_string(&world) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Tables::default(),
            Err(err) => return Err(io_error(&world)(err)),
        };
        tracing::debug!(
            dir = %dir.display(),
            tiles = tables.tile_count(),
            "opened json store"
        );
        Ok(Self { dir, tables })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn staging_path(&self) -> PathBuf {
        self.dir.join(STAGING_FILE)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let target = self.dir.join(WORLD_FILE);
        let tmp = self.dir.join(format!("{WORLD_FILE}.tmp"));
        {
            let file = File::create(&tmp).map_err(io_error(&tmp))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &self.tables)?;
            writer.flush().map_err(io_error(&tmp))?;
        }
        fs::rename(&tmp, &target).map_err(io_error(&target))
    }

    fn read_staged(&self) -> Result<Vec<TileRecord>, StoreError> {
        let path = self.staging_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&path)(err)),
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(io_error(&path))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    fn remove_staging(&self) -> Result<(), StoreError> {
        let path = self.staging_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path)(err)),
        }
    }

    /// The tiles are already durable here, so a staging file that won't go away
    /// is only worth a warning; `open` clears it next time.
    fn finish_commit(&self, published: u64) -> u64 {
        if let Err(err) = self.remove_staging() {
            tracing::warn!(error = %err, "committed tiles but could not remove staging file");
        }
        published
    }

    /// Apply a mutation and persist it, restoring the previous tables if the write fails.
    fn write_through<T>(
        &mut self,
        mutate: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let previous = self.tables.clone();
        let value = mutate(&mut self.tables)?;
        if let Err(err) = self.persist() {
            self.tables = previous;
            return Err(err);
        }
        Ok(value)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl WorldStore for JsonFileStore {
    fn tile_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables.tile_count())
    }

    fn stage_tiles(&mut self, batch: &[TileRecord]) -> Result<(), StoreError> {
        let path = self.staging_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let mut writer = BufWriter::new(file);
        for record in batch {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n").map_err(io_error(&path))?;
        }
        writer.flush().map_err(io_error(&path))
    }

    fn commit_tiles(&mut self) -> Result<u64, StoreError> {
        let staged = self.read_staged()?;
        let before = self.tables.tiles.len();
        let published = self.tables.append_tiles(staged);
        if let Err(err) = self.persist() {
            self.tables.truncate_tiles(before);
            return Err(err);
        }
        Ok(self.finish_commit(published))
    }

    fn discard_staged(&mut self) -> Result<(), StoreError> {
        self.remove_staging()
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
        self.write_through(|tables| Ok(tables.insert_faction(faction)))
    }

    fn set_owner(
        &mut self,
        id: TileId,
        owner: Option<FactionId>,
        capture: u8,
        population: u32,
    ) -> Result<Tile, StoreError> {
        self.write_through(|tables| tables.set_owner(id, owner, capture, population))
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.remove_staging()?;
        self.write_through(|tables| {
            tables.clear();
            Ok(())
        })
    }
}
