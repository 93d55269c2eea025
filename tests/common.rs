//! Test utilities & fixtures.
//! Builds a small instrumented world: every hook bumps a counter flag on
//! the player, so tests can assert exactly which hooks fired and how often.

use std::sync::Arc;

use taleloom::engine::{
    hour_of, Card, CardDef, CardKind, Content, ContentBuilder, EngineError, Game, Instruction,
    LocationDef, NativeFn, NpcDef, Params, ParamsExt, Value, HOUR, MINUTE,
};

/// Integer view of a numeric counter flag.
#[allow(dead_code)] // Not every test binary reads counters; silenced to keep builds clean.
pub fn counter(game: &Game, key: &str) -> i64 {
    game.player.num_flag(key) as i64
}

/// Registry for the testbed world. Exposed separately so save tests can
/// hand the same content to `load_from_path`.
pub fn testbed_content() -> Arc<Content> {
    let mut builder = ContentBuilder::new();

    builder
        .location(
            LocationDef::new("yard", "The Drill Yard")
                .with_description("Packed earth and a leaning rack of practice staves.")
                .with_link("Through the arch", "gatehouse")
                .with_activity("Run a drill", Instruction::new("drill"))
                .with_arrive(yard_arrive)
                .with_tick(yard_tick)
                .with_wait(yard_wait),
        )
        .expect("yard");
    builder
        .location(
            LocationDef::new("gatehouse", "The Gatehouse")
                .with_description("Cold stone, a dying brazier, the smell of lamp oil.")
                .with_link("Back to the yard", "yard")
                .with_first_arrive(gatehouse_first)
                .with_arrive(gatehouse_arrive),
        )
        .expect("gatehouse");

    builder
        .npc(
            NpcDef::new("warden", "Brant", "gatehouse")
                .with_title("warden of the walls")
                .with_script("talk", warden_talk)
                .with_move(warden_schedule)
                .with_approach(warden_approach)
                .with_ambient(warden_ambient)
                .with_visit(warden_visit),
        )
        .expect("warden");

    builder
        .card(
            CardDef::new("lamplit", CardKind::Effect, "Lamplit")
                .with_subsumed_by(["blazing"])
                .with_stats(lamplit_stats),
        )
        .expect("lamplit");
    builder
        .card(
            CardDef::new("blazing", CardKind::Effect, "Blazing")
                .with_replaces(["lamplit"])
                .with_stats(blazing_stats),
        )
        .expect("blazing");
    builder
        .card(
            CardDef::new("patrol", CardKind::Quest, "The Night Patrol")
                .with_description("Walk the circuit before the brazier dies.")
                .with_update(patrol_update)
                .with_reminders(patrol_reminders),
        )
        .expect("patrol");
    builder
        .card(CardDef::new("hourglass", CardKind::Effect, "Hourglass").with_time(hourglass_time))
        .expect("hourglass");

    let scripts: [(&str, NativeFn); 9] = [
        ("menu", gate_menu),
        ("pause_here", pause_here),
        ("wave", wave),
        ("drill", drill),
        ("runaway", runaway),
        ("fail_midway", fail_midway),
        ("trace_a", trace_a),
        ("trace_b", trace_b),
        ("trace_c", trace_c),
    ];
    for (name, f) in scripts {
        builder.script(name, f).expect("script");
    }
    builder.on_tick(world_tick);
    builder.build()
}

/// A fresh game in the yard at 20:00, seeded for deterministic rolls.
/// No travel has happened yet, so arrival counters start at zero.
pub fn testbed() -> Game {
    let mut game = Game::new(testbed_content(), "yard").with_rng_seed(5);
    game.clock = 20 * HOUR;
    game
}

fn world_tick(game: &mut Game, _elapsed: i64) -> Result<(), EngineError> {
    game.player.bump_flag("world_ticks", 1.0);
    Ok(())
}

// ----------------------------------------------------------------------
// Location hooks
// ----------------------------------------------------------------------

fn yard_arrive(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("yard_arrivals", 1.0);
    Ok(())
}

fn yard_tick(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("yard_ticks", 1.0);
    Ok(())
}

fn yard_wait(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("yard_waits", 1.0);
    Ok(())
}

fn gatehouse_first(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("gatehouse_first", 1.0);
    Ok(())
}

fn gatehouse_arrive(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("gatehouse_arrivals", 1.0);
    Ok(())
}

// ----------------------------------------------------------------------
// The warden
// ----------------------------------------------------------------------

/// On the walls through the evening, down in the yard from 22:00.
fn warden_schedule(game: &mut Game, id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("warden_moves", 1.0);
    let post = if hour_of(game.clock) >= 22 {
        "yard"
    } else {
        "gatehouse"
    };
    game.npc_mut(id)?.location = post.to_string();
    Ok(())
}

/// Records who was addressed and in what mood, so tests can check which
/// parameters actually reached the script.
fn warden_talk(game: &mut Game, params: &Params) -> Result<Value, EngineError> {
    let id = params.text("npc").unwrap_or("?").to_string();
    let mood = params.text("mood").unwrap_or("level").to_string();
    game.player.set_flag("talked_to", id.as_str());
    game.player.set_flag("talk_mood", mood.as_str());
    Ok(Value::null())
}

fn warden_approach(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("warden_approaches", 1.0);
    Ok(())
}

/// Counts chances to speak; set `ambush_at_ambient` to engage the scene
/// on exactly that call.
fn warden_ambient(game: &mut Game, id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("warden_ambients", 1.0);
    let at = game.player.num_flag("ambush_at_ambient");
    if at > 0.0 && game.player.num_flag("warden_ambients") >= at {
        game.scene.npc = Some(id.to_string());
        game.add("Brant plants himself squarely in your path.");
        game.add_choice("wave", "Hear him out");
    }
    Ok(())
}

/// An absent warden comes knocking on the configured chunk.
fn warden_visit(game: &mut Game, id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("warden_visits", 1.0);
    let at = game.player.num_flag("knock_at_visit");
    if at > 0.0 && game.player.num_flag("warden_visits") >= at {
        let here = game.location.clone();
        game.npc_mut(id)?.location = here;
        game.refresh_presence();
        game.add("A fist bangs the timber twice.");
        game.add_choice("wave", "Answer it");
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Card hooks
// ----------------------------------------------------------------------

fn lamplit_stats(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.adjust_stat("nerve", 5.0);
    Ok(())
}

fn blazing_stats(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.adjust_stat("nerve", 15.0);
    Ok(())
}

/// Completes the patrol once the `circuit_done` flag goes up.
fn patrol_update(game: &mut Game, id: &str) -> Result<(), EngineError> {
    game.player.bump_flag("patrol_updates", 1.0);
    let open = game
        .player
        .card(id)
        .map(|card| !card.completed())
        .unwrap_or(false);
    if open && game.player.bool_flag("circuit_done") {
        game.complete_quest(id)?;
    }
    Ok(())
}

fn patrol_reminders(_game: &Game, card: &Card) -> Vec<String> {
    if card.completed() {
        Vec::new()
    } else {
        vec!["Walk the circuit before the brazier dies.".to_string()]
    }
}

/// Counts half-hour boundaries the clock crosses while held.
fn hourglass_time(game: &mut Game, _id: &str, elapsed: i64) -> Result<(), EngineError> {
    let ticks = game.calc_ticks(elapsed, 30 * MINUTE)?;
    game.player.bump_flag("half_hours", ticks as f64);
    Ok(())
}

// ----------------------------------------------------------------------
// Scripts
// ----------------------------------------------------------------------

/// Self-renewing menu frame. Only `exit_scene` ends it.
fn gate_menu(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.scene
        .top_frame()
        .pages
        .push_back(Instruction::new("menu"));
    game.add("The gate stands shut against the night.");
    game.add_choice("wave", "Wave up at the walk");
    game.add_choice("exit_scene", "Step away");
    Ok(Value::null())
}

/// One-shot pause: presents a single option without renewing itself.
fn pause_here(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.add_choice("wave", "Go on");
    Ok(Value::null())
}

fn wave(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.player.bump_flag("waves", 1.0);
    Ok(Value::null())
}

fn drill(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.player.bump_flag("drills", 1.0);
    game.add("Stave up, step, turn. The old pattern.");
    Ok(Value::null())
}

/// Queues itself forever without ever asking for input.
fn runaway(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.scene
        .top_frame()
        .pages
        .push_back(Instruction::new("runaway"));
    Ok(Value::null())
}

/// Produces some narration, then fails.
fn fail_midway(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.add("The hinge shrieks and gives way.");
    Err(EngineError::invalid("the bolt jams"))
}

fn append_trace(game: &mut Game, letter: char) {
    let mut trail = game
        .player
        .flag("trace")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    trail.push(letter);
    game.player.set_flag("trace", trail.as_str());
}

fn trace_a(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    append_trace(game, 'a');
    Ok(Value::null())
}

fn trace_b(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    append_trace(game, 'b');
    Ok(Value::null())
}

fn trace_c(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    append_trace(game, 'c');
    Ok(Value::null())
}
