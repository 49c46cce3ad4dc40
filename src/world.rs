use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub(crate) u64);

impl TileId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionId(pub(crate) u64);

impl FactionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Terrain tier: 1 (best land) to 6 (worst land), or 7 for sea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Terrain(u8);

impl Terrain {
    pub const LAND_TIERS: u8 = 6;
    pub const SEA: Terrain = Terrain(7);

    /// Land tier, clamped into `1..=6`.
    pub fn land(tier: u8) -> Self {
        Self(tier.clamp(1, Self::LAND_TIERS))
    }

    pub fn tier(self) -> u8 {
        self.0
    }

    pub fn is_sea(self) -> bool {
        self == Self::SEA
    }
}

impl TryFrom<u8> for Terrain {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=7).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("terrain tier {value} outside 1..=7"))
        }
    }
}

impl From<Terrain> for u8 {
    fn from(value: Terrain) -> Self {
        value.0
    }
}

/// A tile as emitted by world generation, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub x: u32,
    pub y: u32,
    pub terrain: Terrain,
    pub resource: f64,
    pub owner_faction_id: Option<FactionId>,
    pub population: u32,
    pub capture: u8,
}

impl TileRecord {
    pub fn unclaimed(x: u32, y: u32, terrain: Terrain, resource: f64) -> Self {
        Self {
            x,
            y,
            terrain,
            resource,
            owner_faction_id: None,
            population: 0,
            capture: 0,
        }
    }
}

/// A stored tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub x: u32,
    pub y: u32,
    pub terrain: Terrain,
    pub resource: f64,
    pub owner_faction_id: Option<FactionId>,
    pub population: u32,
    pub capture: u8,
}

impl Tile {
    pub fn from_record(id: TileId, record: TileRecord) -> Self {
        Self {
            id,
            x: record.x,
            y: record.y,
            terrain: record.terrain,
            resource: record.resource,
            owner_faction_id: record.owner_faction_id,
            population: record.population,
            capture: record.capture,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub color: String,
    pub flag_url: Option<String>,
    pub capital_tile_id: TileId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFaction {
    pub name: String,
    pub color: String,
    pub flag_url: Option<String>,
    pub capital_tile_id: TileId,
}

/// Ownership change pushed to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDiff {
    pub tile_id: TileId,
    pub owner_faction_id: Option<FactionId>,
    pub capture: u8,
}

/// Events fanned out to every connected viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Update(Vec<TileDiff>),
    Reset,
}

impl WorldEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorldEvent::Update(_) => "world:update",
            WorldEvent::Reset => "world:reset",
        }
    }

    pub fn payload(&self) -> serde_json::Result<String> {
        match self {
            WorldEvent::Update(diffs) => serde_json::to_string(diffs),
            WorldEvent::Reset => Ok("{}".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMeta {
    pub w: u32,
    pub h: u32,
    pub n: u64,
}

impl WorldMeta {
    /// Extent is derived from the tiles themselves; an empty world is 0×0.
    pub fn of(tiles: &[Tile]) -> Self {
        let w = tiles.iter().map(|t| t.x + 1).max().unwrap_or(0);
        let h = tiles.iter().map(|t| t.y + 1).max().unwrap_or(0);
        Self {
            w,
            h,
            n: tiles.len() as u64,
        }
    }
}

/// Full world view served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub tiles: Vec<Tile>,
    pub factions: Vec<Faction>,
    pub meta: WorldMeta,
}

impl WorldState {
    pub fn new(tiles: Vec<Tile>, factions: Vec<Faction>) -> Self {
        let meta = WorldMeta::of(&tiles);
        Self {
            tiles,
            factions,
            meta,
        }
    }
}
