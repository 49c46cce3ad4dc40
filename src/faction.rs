use serde::Deserialize;
use thiserror::Error;

use crate::store::{StoreError, WorldStore};
use crate::world::{Faction, NewFaction, TileDiff, TileId};

/// Capture progress and garrison given to a freshly founded capital.
pub const CAPITAL_CAPTURE: u8 = 100;
pub const CAPITAL_POPULATION: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoundFaction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub tile_id: Option<TileId>,
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("name, color and tile_id are required")]
    MissingFields,
    #[error("tile {} does not exist", .0.raw())]
    TileNotFound(TileId),
    #[error("tile {} is sea", .0.raw())]
    SeaNotAllowed(TileId),
    #[error("tile {} is already owned", .0.raw())]
    TileAlreadyOwned(TileId),
    #[error("faction name {0:?} is taken")]
    NameTaken(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClaimError {
    /// Stable identifier sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::MissingFields => "missing_fields",
            ClaimError::TileNotFound(_) => "tile_not_found",
            ClaimError::SeaNotAllowed(_) => "sea_not_allowed",
            ClaimError::TileAlreadyOwned(_) => "tile_already_owned",
            ClaimError::NameTaken(_) => "name_taken",
            ClaimError::Store(_) => "create_failed",
        }
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Found a faction with `tile_id` as its capital.
///
/// The capital must be unowned land and the name unused. The returned diff is
/// what viewers need to repaint the tile.
pub fn found_faction(
    store: &mut dyn WorldStore,
    request: FoundFaction,
) -> Result<(Faction, TileDiff), ClaimError> {
    let (Some(name), Some(color), Some(tile_id)) = (
        required(request.name),
        required(request.color),
        request.tile_id,
    ) else {
        return Err(ClaimError::MissingFields);
    };

    let tile = store
        .tile(tile_id)?
        .ok_or(ClaimError::TileNotFound(tile_id))?;
    if tile.terrain.is_sea() {
        return Err(ClaimError::SeaNotAllowed(tile_id));
    }
    if tile.owner_faction_id.is_some() {
        return Err(ClaimError::TileAlreadyOwned(tile_id));
    }
    if store.faction_by_name(&name)?.is_some() {
        return Err(ClaimError::NameTaken(name));
    }

    let faction = store.insert_faction(NewFaction {
        name,
        color,
        flag_url: required(request.flag_url),
        capital_tile_id: tile_id,
    })?;
    let tile = store.set_owner(
        tile_id,
        Some(faction.id),
        CAPITAL_CAPTURE,
        CAPITAL_POPULATION,
    )?;
    tracing::info!(
        faction = faction.id.raw(),
        name = %faction.name,
        tile = tile_id.raw(),
        "faction founded"
    );

    Ok((
        faction,
        TileDiff {
            tile_id,
            owner_faction_id: tile.owner_faction_id,
            capture: tile.capture,
        },
    ))
}
