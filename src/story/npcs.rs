//! Ferrytown's people.
//!
//! Both NPCs keep hourly schedules through their movement hook and use
//! the wait-time hooks to reach for the player: Mara works the room at
//! the Driftwood, Tomas turns up at the door when an errand is left
//! hanging. Dialogue reached through `npc(<id>):<name>` chains arrives
//! with the owner pre-bound under the `npc` parameter.

use crate::engine::card::CardKind;
use crate::engine::clock::hour_of;
use crate::engine::errors::EngineError;
use crate::engine::scene::Choice;
use crate::engine::script::{Action, ContentBuilder, Params, ParamsExt, Value};
use crate::engine::state::Game;
use crate::engine::world::NpcDef;

pub fn register(builder: &mut ContentBuilder) -> Result<(), EngineError> {
    builder
        .npc(
            NpcDef::new("mara", "Mara", "driftwood_back")
                .with_title("keeper of the Driftwood")
                .with_script("talk", mara_talk)
                .with_script("gossip", mara_gossip)
                .with_move(mara_schedule)
                .with_approach(mara_approach)
                .with_ambient(mara_ambient),
        )?
        .npc(
            NpcDef::new("tomas", "Tomas", "boathouse")
                .with_title("ferry hand")
                .with_script("talk", tomas_talk)
                .with_move(tomas_schedule)
                .with_ambient(tomas_ambient)
                .with_visit(tomas_visit),
        )?;

    builder
        .script("ask_work", ask_work)?
        .script("ignore_knock", ignore_knock)?;
    Ok(())
}

// ----------------------------------------------------------------------
// Mara
// ----------------------------------------------------------------------

/// Behind the bar from late afternoon until the small hours.
fn mara_schedule(game: &mut Game, id: &str) -> Result<(), EngineError> {
    let hour = hour_of(game.clock);
    let post = if hour >= 16 || hour < 2 {
        "tavern"
    } else {
        "driftwood_back"
    };
    game.npc_mut(id)?.location = post.to_string();
    Ok(())
}

fn mara_approach(game: &mut Game, id: &str) -> Result<(), EngineError> {
    if !game.chance(0.2)? {
        return Ok(());
    }
    game.scene.npc = Some(id.to_string());
    game.speech("Mara", "Long night? You have the look of someone owed one.");
    game.add_choice(Action::expr(format!("npc({id}):gossip")), "Hear her out");
    game.add_choice("exit_scene", "Just raise your glass");
    Ok(())
}

fn mara_ambient(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    if game.chance(0.15)? {
        game.add("Mara works the taps without ever seeming to hurry.");
    }
    Ok(())
}

fn mara_talk(game: &mut Game, params: &Params) -> Result<Value, EngineError> {
    let id = params.text("npc").unwrap_or("mara").to_string();
    game.scene.npc = Some(id.clone());
    game.speech("Mara", "Evening. Rooms upstairs are quieter than my bar, I promise.");
    let mut work = Choice::new("ask_work", "Ask about work");
    if game.player.has_card("errand") {
        work = work.disabled();
    }
    game.add(work);
    game.add_choice(Action::expr(format!("npc({id}):gossip")), "Trade gossip");
    game.add_choice("exit_scene", "Leave her to the taps");
    Ok(Value::null())
}

fn mara_gossip(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    let lines = [
        "The night market runs till the lanterns drown. Nobody remembers deciding that.",
        "Tomas naps in the boathouse and calls it watching the ropes.",
        "Third visit makes you a regular here. House rule older than the house.",
    ];
    let line = game.pick(&lines).copied().unwrap_or(lines[0]);
    game.speech("Mara", line);
    Ok(Value::null())
}

/// Hands out the delivery errand. Offered by the bar menu and by
/// Mara's dialogue; both disable it once the card is held.
fn ask_work(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    if game.player.has_card("errand") {
        game.speech("Mara", "One parcel at a time. I run a bar, not a courier house.");
        return Ok(Value::null());
    }
    game.scene.npc = Some("mara".to_string());
    game.speech(
        "Mara",
        "As it happens. A parcel for the spice merchant at the night market, \
         and my thanks with coin behind it.",
    );
    game.add("She slides a waxed parcel across the bar before you can answer.");
    game.gain_card("errand")?;
    Ok(Value::null())
}

// ----------------------------------------------------------------------
// Tomas
// ----------------------------------------------------------------------

/// Days on the lane, evenings at the market, nights in the boathouse.
fn tomas_schedule(game: &mut Game, id: &str) -> Result<(), EngineError> {
    let hour = hour_of(game.clock);
    let post = if (6..18).contains(&hour) {
        "lane"
    } else if (18..22).contains(&hour) {
        "market"
    } else {
        "boathouse"
    };
    game.npc_mut(id)?.location = post.to_string();
    Ok(())
}

fn tomas_ambient(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    if game.chance(0.15)? {
        game.add("Tomas coils rope nearby with the patience of a man paid by the hour.");
    }
    Ok(())
}

/// A hanging errand brings a knock at the door in the evening.
fn tomas_visit(game: &mut Game, id: &str) -> Result<(), EngineError> {
    if game.location != "room" {
        return Ok(());
    }
    let hour = hour_of(game.clock);
    if !(19..23).contains(&hour) {
        return Ok(());
    }
    let errand_open = game
        .player
        .card("errand")
        .map(|card| !card.completed())
        .unwrap_or(false);
    if !errand_open || !game.chance(0.35)? {
        return Ok(());
    }

    game.npc_mut(id)?.location = game.location.clone();
    game.refresh_presence();
    game.scene.npc = Some(id.to_string());
    game.add("A knock, twice, at the loft door.");
    game.speech("Tomas", "Mara's asking after her parcel. Market won't glow all night.");
    game.add_choice(Action::expr(format!("npc({id}):talk")), "Answer properly");
    game.add_choice("ignore_knock", "Ignore the knocking");
    Ok(())
}

fn tomas_talk(game: &mut Game, params: &Params) -> Result<Value, EngineError> {
    let id = params.text("npc").unwrap_or("tomas").to_string();
    game.scene.npc = Some(id);
    let errand_open = game
        .player
        .card("errand")
        .map(|card| !card.completed())
        .unwrap_or(false);
    if errand_open {
        game.speech(
            "Tomas",
            "Spice merchant keeps the far corner of the market. Follow the \
             cinnamon, not the lanterns.",
        );
    } else {
        game.speech("Tomas", "Tide's kind tomorrow. Say nothing or it turns.");
    }
    Ok(Value::null())
}

fn ignore_knock(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.add("The knocking stops. Boots on the stair, and the night closes over again.");
    game.notice(CardKind::Quest, "Mara will remember the wait");
    game.player.set_flag("kept_mara_waiting", true);
    Ok(Value::null())
}
