//! Snapshots and save files.
//!
//! A [`Snapshot`] is the complete persistent image of a [`Game`]:
//! clock, player, visited locations, generated NPCs, scene (stack
//! included) and settings. Content is never embedded; live state
//! references definitions by id and re-resolves them on load, so a
//! content update applies to old saves as long as ids stay stable.
//!
//! Snapshots carry a format version. Loading tolerates every older
//! version by migrating the raw document before typed parsing, and
//! refuses newer ones outright. Transient fields (derived stats, the
//! present-NPC index, the RNG, the action timestamp) are rebuilt after
//! load rather than stored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::engine::errors::EngineError;
use crate::engine::scene::Scene;
use crate::engine::script::Content;
use crate::engine::state::{Game, Player};
use crate::engine::world::{LocationState, Npc};

/// Current snapshot format version.
pub const SAVE_VERSION: u32 = 2;

/// Persistent image of a game in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub player: Player,
    #[serde(default)]
    pub locations: BTreeMap<String, LocationState>,
    #[serde(default)]
    pub npcs: BTreeMap<String, Npc>,
    pub location: String,
    #[serde(default)]
    pub clock: i64,
    #[serde(default)]
    pub scene: Scene,
    #[serde(default)]
    pub settings: BTreeMap<String, bool>,
}

/// On-disk envelope around a snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveFile {
    pub saved_at: DateTime<Utc>,
    pub snapshot: Snapshot,
}

/// Brings a raw snapshot document up to [`SAVE_VERSION`] in place.
/// Returns the version the document arrived with.
pub fn migrate_snapshot(doc: &mut JsonValue) -> Result<u32, EngineError> {
    let version = doc
        .get("version")
        .and_then(JsonValue::as_u64)
        .unwrap_or(1) as u32;
    if version > SAVE_VERSION {
        return Err(EngineError::BadSave(format!(
            "save version {version} is newer than supported {SAVE_VERSION}"
        )));
    }
    if version < 2 {
        migrate_v1(doc);
        log::info!("migrated save from version {} to {}", version, SAVE_VERSION);
    }
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("version".to_string(), JsonValue::from(SAVE_VERSION));
    }
    Ok(version)
}

/// Version 1 kept the scene's pending instructions as a flat `pages`
/// list. Wrap a non-empty list in a single stack frame. Option labels
/// under the old `text` key and instructions stored as `[name, params]`
/// pairs are absorbed by the deserializers themselves.
fn migrate_v1(doc: &mut JsonValue) {
    let Some(scene) = doc.get_mut("scene").and_then(JsonValue::as_object_mut) else {
        return;
    };
    let Some(pages) = scene.remove("pages") else {
        return;
    };
    let already_framed = scene
        .get("stack")
        .and_then(JsonValue::as_array)
        .is_some_and(|stack| !stack.is_empty());
    if already_framed {
        return;
    }
    if let JsonValue::Array(pages) = pages {
        if !pages.is_empty() {
            scene.insert(
                "stack".to_string(),
                serde_json::json!([{ "pages": pages }]),
            );
        }
    }
}

/// Writes the game to `path` as a pretty-printed save file.
pub fn save_to_path(game: &Game, path: &Path) -> Result<(), EngineError> {
    let file = SaveFile {
        saved_at: Utc::now(),
        snapshot: game.snapshot(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json)?;
    log::info!("saved game to {}", path.display());
    Ok(())
}

/// Reads a save file, migrating older formats. Accepts both the
/// enveloped form and a bare snapshot document.
pub fn load_from_path(content: Arc<Content>, path: &Path) -> Result<Game, EngineError> {
    let raw = fs::read_to_string(path)?;
    let mut doc: JsonValue = serde_json::from_str(&raw)?;
    let mut snap_doc = if doc.get("snapshot").is_some() {
        doc["snapshot"].take()
    } else {
        doc
    };
    migrate_snapshot(&mut snap_doc)?;
    let snapshot: Snapshot = serde_json::from_value(snap_doc)?;
    log::info!("loaded game from {}", path.display());
    Game::from_snapshot(content, snapshot)
}

impl Game {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SAVE_VERSION,
            score: self.score,
            player: self.player.clone(),
            locations: self.locations.clone(),
            npcs: self.npcs.clone(),
            location: self.location.clone(),
            clock: self.clock,
            scene: self.scene.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Rebuilds a live game around shared content. Presence and
    /// derived stats are recomputed rather than trusted from the
    /// snapshot.
    pub fn from_snapshot(content: Arc<Content>, snapshot: Snapshot) -> Result<Game, EngineError> {
        if snapshot.version > SAVE_VERSION {
            return Err(EngineError::BadSave(format!(
                "save version {} is newer than supported {SAVE_VERSION}",
                snapshot.version
            )));
        }
        let mut game = Game::new(content, snapshot.location);
        game.score = snapshot.score;
        game.player = snapshot.player;
        game.locations = snapshot.locations;
        game.npcs = snapshot.npcs;
        game.clock = snapshot.clock;
        game.scene = snapshot.scene;
        game.settings = snapshot.settings;
        game.refresh_presence();
        game.recompute_stats()?;
        Ok(game)
    }
}
