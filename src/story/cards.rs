//! Ferrytown's cards.
//!
//! The drink pair shows replacement and subsumption working together:
//! `drunk` replaces `tipsy` outright, and since `tipsy` names `drunk`
//! as its subsumer, no misleading "sobered up" notice fires during the
//! upgrade. Both wear off through time hooks; `drunk` steps back down
//! to `tipsy` instead of ending cold.

use crate::engine::card::{Card, CardDef, CardKind};
use crate::engine::clock::{HOUR, MINUTE};
use crate::engine::errors::EngineError;
use crate::engine::script::{ContentBuilder, Params};
use crate::engine::state::Game;

pub fn register(builder: &mut ContentBuilder) -> Result<(), EngineError> {
    builder
        .card(
            CardDef::new("meet_the_lane", CardKind::Task, "Find your footing")
                .with_description("Step out and find Ferry Lane.")
                .with_update(meet_the_lane_update)
                .with_reminders(meet_the_lane_reminders),
        )?
        .card(
            CardDef::new("errand", CardKind::Quest, "Mara's Errand")
                .with_description("A waxed parcel for the spice merchant at the night market.")
                .with_reminders(errand_reminders),
        )?
        .card(
            CardDef::new("tipsy", CardKind::Effect, "Tipsy")
                .with_description("The floor is further away than usual.")
                .with_subsumed_by(["drunk"])
                .with_time(tipsy_decay)
                .with_stats(tipsy_stats),
        )?
        .card(
            CardDef::new("drunk", CardKind::Effect, "Drunk")
                .with_description("The river sounds like it is singing.")
                .with_replaces(["tipsy"])
                .with_time(drunk_decay)
                .with_stats(drunk_stats),
        )?
        .card(
            CardDef::new("rested", CardKind::Effect, "Rested")
                .with_description("A full night behind you for once.")
                .with_time(rested_expiry)
                .with_stats(rested_stats),
        )?
        .card(
            CardDef::new("regular", CardKind::Trait, "Driftwood Regular")
                .with_description("Mara pours before you ask.")
                .with_stats(regular_stats),
        )?;
    Ok(())
}

// ----------------------------------------------------------------------
// Task: find the lane
// ----------------------------------------------------------------------

fn meet_the_lane_update(game: &mut Game, id: &str) -> Result<(), EngineError> {
    let open = game
        .player
        .card(id)
        .map(|card| !card.completed())
        .unwrap_or(false);
    if open && game.location == "lane" {
        game.complete_quest(id)?;
        game.add_score(5);
    }
    Ok(())
}

fn meet_the_lane_reminders(_game: &Game, card: &Card) -> Vec<String> {
    if card.completed() {
        Vec::new()
    } else {
        vec!["Step out and find Ferry Lane.".to_string()]
    }
}

// ----------------------------------------------------------------------
// Quest: Mara's errand
// ----------------------------------------------------------------------

fn errand_reminders(_game: &Game, card: &Card) -> Vec<String> {
    if card.completed() {
        Vec::new()
    } else {
        vec!["Deliver Mara's parcel to the spice merchant at the night market.".to_string()]
    }
}

// ----------------------------------------------------------------------
// Effects: drink, sleep
// ----------------------------------------------------------------------

fn level_of(game: &Game, id: &str) -> f64 {
    game.player
        .card(id)
        .and_then(|card| card.field("level"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// Wears off half a level per half hour.
fn tipsy_decay(game: &mut Game, id: &str, elapsed: i64) -> Result<(), EngineError> {
    let ticks = game.calc_ticks(elapsed, 30 * MINUTE)?;
    if ticks == 0 {
        return Ok(());
    }
    let level = level_of(game, id) - 0.5 * ticks as f64;
    if let Some(card) = game.player.card_mut(id) {
        card.set_field("level", level);
    }
    if level <= 0.0 {
        game.remove_card(id, false)?;
    }
    Ok(())
}

fn tipsy_stats(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.adjust_stat("poise", -10.0);
    Ok(())
}

/// Sobers by one level an hour, stepping down to tipsy at the end
/// rather than cutting straight to clear-headed.
fn drunk_decay(game: &mut Game, id: &str, elapsed: i64) -> Result<(), EngineError> {
    let ticks = game.calc_ticks(elapsed, HOUR)?;
    if ticks == 0 {
        return Ok(());
    }
    let level = {
        let Some(card) = game.player.card_mut(id) else {
            return Ok(());
        };
        let next = card.field("level").and_then(|v| v.as_f64()).unwrap_or(3.0) - ticks as f64;
        card.set_field("level", next);
        next
    };
    if level <= 0.0 {
        game.remove_card(id, true)?;
        let mut fields = Params::new();
        fields.insert("level".to_string(), serde_json::Value::from(1.0));
        game.add_card("tipsy", fields, true)?;
        game.add("Your head begins to clear, one slow bell at a time.");
    }
    Ok(())
}

fn drunk_stats(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.adjust_stat("poise", -25.0);
    Ok(())
}

fn rested_expiry(game: &mut Game, id: &str, _elapsed: i64) -> Result<(), EngineError> {
    let expired = game
        .player
        .card(id)
        .and_then(|card| card.field("until"))
        .and_then(|v| v.as_i64())
        .map(|until| game.clock >= until)
        .unwrap_or(true);
    if expired {
        game.remove_card(id, false)?;
    }
    Ok(())
}

fn rested_stats(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.adjust_stat("vigor", 10.0);
    Ok(())
}

// ----------------------------------------------------------------------
// Trait: tavern regular
// ----------------------------------------------------------------------

fn regular_stats(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.adjust_stat("charm", 2.0);
    Ok(())
}
