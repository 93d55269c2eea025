//! Ferrytown, the bundled story.
//!
//! A small river town over one autumn evening: a rented room, Ferry
//! Lane, the Driftwood tavern and the night market. Content registers
//! through the same builder API any external story would use; nothing
//! here is known to the engine.

pub mod cards;
pub mod locations;
pub mod npcs;

use std::sync::Arc;

use crate::engine::clock::HOUR;
use crate::engine::errors::EngineError;
use crate::engine::script::{Content, ContentBuilder};
use crate::engine::state::Game;

pub const START_LOCATION: &str = "room";

/// Clock value a fresh game opens at: evening of day one.
pub const START_CLOCK: i64 = 18 * HOUR;

/// Assembles the full Ferrytown registry.
pub fn content() -> Result<Arc<Content>, EngineError> {
    let mut builder = ContentBuilder::new();
    locations::register(&mut builder)?;
    npcs::register(&mut builder)?;
    cards::register(&mut builder)?;
    builder.on_tick(fatigue_tick);
    Ok(builder.build())
}

/// Starts a fresh game: stats and pocket money set, clock at evening,
/// and the opening scene produced by arriving at the room.
pub fn new_game() -> Result<Game, EngineError> {
    let mut game = Game::new(content()?, START_LOCATION);
    start(&mut game)?;
    Ok(game)
}

/// Seeded variant for reproducible runs.
pub fn new_seeded_game(seed: u64) -> Result<Game, EngineError> {
    let mut game = Game::new(content()?, START_LOCATION).with_rng_seed(seed);
    start(&mut game)?;
    Ok(game)
}

fn start(game: &mut Game) -> Result<(), EngineError> {
    game.clock = START_CLOCK;
    game.player.base.insert("poise".to_string(), 50.0);
    game.player.base.insert("vigor".to_string(), 50.0);
    game.player.base.insert("charm".to_string(), 10.0);
    game.player.set_flag("coins", 12);
    // Wake the cast so schedules and visits run from the first minute.
    game.npc_mut("mara")?;
    game.npc_mut("tomas")?;
    game.travel(START_LOCATION)?;
    game.recompute_stats()?;
    Ok(())
}

/// Fatigue rises with the clock, one point per hour; sleep clears it.
fn fatigue_tick(game: &mut Game, elapsed: i64) -> Result<(), EngineError> {
    game.player
        .bump_flag("fatigue", elapsed as f64 / HOUR as f64);
    Ok(())
}
