//! Built-in scripts, pre-registered by every [`ContentBuilder`].
//!
//! Navigation and scene plumbing (`look`, `goto`, `wait`,
//! `exit_scene`) plus the accessor entries (`location`, `npc`, `card`,
//! `time`) that expression chaining hangs off, e.g. `npc(mara):talk`
//! or `{time:hour}` in a template.

use std::collections::HashMap;

use crate::engine::accessor::{split_args, split_fragment, Accessor};
use crate::engine::clock::{day_of, format_clock, hour_of, minute_of};
use crate::engine::errors::EngineError;
use crate::engine::script::{Action, Instruction, NativeFn, Params, ParamsExt, Script, Value};
use crate::engine::state::Game;

pub(crate) fn install(scripts: &mut HashMap<String, NativeFn>) {
    scripts.insert("look".to_string(), look as NativeFn);
    scripts.insert("goto".to_string(), goto as NativeFn);
    scripts.insert("wait".to_string(), wait as NativeFn);
    scripts.insert("exit_scene".to_string(), exit_scene as NativeFn);
    scripts.insert("location".to_string(), location as NativeFn);
    scripts.insert("npc".to_string(), npc as NativeFn);
    scripts.insert("card".to_string(), card as NativeFn);
    scripts.insert("time".to_string(), time as NativeFn);
}

/// Presents the current location: description, travel links,
/// activities, and a talk option for each present NPC that offers one.
fn look(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    let here = game.location.clone();
    let def = game.content().location_def(&here)?.clone();

    if !def.description.is_empty() {
        game.add(def.description.as_str());
    }
    for link in &def.links {
        game.add_choice(
            Instruction::new("goto").with_param("location", link.to.as_str()),
            link.label.as_str(),
        );
    }
    for activity in &def.activities {
        game.add_choice(activity.action.clone(), activity.label.as_str());
    }
    for npc_id in game.present.clone() {
        let ndef = game.content().npc_def(&npc_id)?;
        let offers_talk = ndef.scripts.contains_key("talk");
        let name = ndef.name.clone();
        if offers_talk {
            game.add_choice(
                Action::expr(format!("npc({npc_id}):talk")),
                format!("Talk to {name}"),
            );
        }
    }
    Ok(Value::null())
}

/// Moves the player, then shows the destination unless an arrival hook
/// already engaged the scene.
fn goto(game: &mut Game, params: &Params) -> Result<Value, EngineError> {
    let Some(dest) = params.text("location") else {
        return Err(EngineError::invalid("goto requires a 'location' parameter"));
    };
    let dest = dest.to_string();
    game.travel(&dest)?;
    if !game.scene.in_scene() {
        look(game, &Params::new())?;
    }
    Ok(Value::null())
}

/// Waits out `minutes`, optionally running a `then` action when the
/// wait completes undisturbed. Falls back to the location view when
/// nothing interrupted.
fn wait(game: &mut Game, params: &Params) -> Result<Value, EngineError> {
    let Some(minutes) = params.integer("minutes") else {
        return Err(EngineError::invalid("wait requires a 'minutes' parameter"));
    };
    let followup = params.action("then");
    let completed = game.wait(minutes, followup.as_ref())?;
    if !game.scene.in_scene() {
        look(game, &Params::new())?;
    }
    Ok(Value::from(completed))
}

/// The one sanctioned way out of a self-renewing menu: drops every
/// pending frame.
fn exit_scene(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.scene.stack.clear();
    Ok(Value::null())
}

// ----------------------------------------------------------------------
// location accessor
// ----------------------------------------------------------------------

struct LocationAccessor;

fn location(_game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    Ok(Value::accessor(LocationAccessor))
}

impl Accessor for LocationAccessor {
    fn default(&self, game: &mut Game) -> Result<Value, EngineError> {
        let here = game.location.clone();
        Ok(Value::from(game.content().location_def(&here)?.name.as_str()))
    }

    fn resolve(&self, game: &mut Game, rest: &str) -> Result<Value, EngineError> {
        if let Some((args, tail)) = split_args(rest) {
            location_field(game, args.trim(), tail)
        } else {
            let here = game.location.clone();
            location_field(game, &here, rest)
        }
    }
}

fn location_field(game: &mut Game, id: &str, rest: &str) -> Result<Value, EngineError> {
    let def = game.content().location_def(id)?.clone();
    let (head, tail) = split_fragment(rest);
    match head {
        "" | "name" => Ok(Value::from(def.name.as_str())),
        "id" => Ok(Value::from(id)),
        "description" => Ok(Value::from(game.interpolate(&def.description))),
        "visits" => Ok(Value::from(game.location_state(id).visits as i64)),
        "discovered" => Ok(Value::from(game.location_state(id).discovered)),
        "link" => {
            let link = def
                .links
                .iter()
                .find(|l| l.label.eq_ignore_ascii_case(tail))
                .ok_or_else(|| {
                    EngineError::invalid(format!("location '{id}' has no link '{tail}'"))
                })?;
            Ok(Value::from(link.to.as_str()))
        }
        other => Err(EngineError::invalid(format!(
            "location '{id}' has no selector '{other}'"
        ))),
    }
}

// ----------------------------------------------------------------------
// npc accessor
// ----------------------------------------------------------------------

struct NpcAccessor;

fn npc(_game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    Ok(Value::accessor(NpcAccessor))
}

impl Accessor for NpcAccessor {
    /// Bare `npc` stands for whoever fronts the scene.
    fn default(&self, game: &mut Game) -> Result<Value, EngineError> {
        match game.scene.npc.clone() {
            Some(id) => Ok(Value::from(game.content().npc_def(&id)?.name.as_str())),
            None => Ok(Value::null()),
        }
    }

    fn resolve(&self, game: &mut Game, rest: &str) -> Result<Value, EngineError> {
        if let Some((args, tail)) = split_args(rest) {
            let id = args.trim().to_string();
            npc_field(game, &id, tail)
        } else if let Some(active) = game.scene.npc.clone() {
            npc_field(game, &active, rest)
        } else {
            Err(EngineError::invalid(
                "npc expression needs (id) or an active scene npc",
            ))
        }
    }
}

fn npc_field(game: &mut Game, id: &str, rest: &str) -> Result<Value, EngineError> {
    let def = game.content().npc_def(id)?.clone();
    // Touching an NPC generates it.
    game.npc_mut(id)?;
    let (head, tail) = split_fragment(rest);
    match head {
        "" | "name" => Ok(Value::from(def.name.as_str())),
        "title" => Ok(Value::from(def.title.as_str())),
        "location" => {
            let at = game.npc_mut(id)?.location.clone();
            Ok(Value::from(at))
        }
        "present" => Ok(Value::from(game.npc_present(id))),
        "field" => {
            let value = game
                .npc_mut(id)?
                .field(tail)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            Ok(Value::Data(value))
        }
        other => match def.scripts.get(other) {
            Some(f) if tail.is_empty() => {
                let mut bound = Params::new();
                bound.insert("npc".to_string(), serde_json::Value::from(id));
                Ok(Value::Script(Script::bound(*f, bound)))
            }
            _ => Err(EngineError::invalid(format!(
                "npc '{id}' has no selector '{other}'"
            ))),
        },
    }
}

// ----------------------------------------------------------------------
// card accessor
// ----------------------------------------------------------------------

struct CardAccessor;

fn card(_game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    Ok(Value::accessor(CardAccessor))
}

impl Accessor for CardAccessor {
    fn default(&self, _game: &mut Game) -> Result<Value, EngineError> {
        Ok(Value::null())
    }

    fn resolve(&self, game: &mut Game, rest: &str) -> Result<Value, EngineError> {
        let Some((args, tail)) = split_args(rest) else {
            return Err(EngineError::invalid("card expression needs (id)"));
        };
        let id = args.trim();
        let def = game.content().card_def(id)?.clone();
        let (head, field_key) = split_fragment(tail);
        match head {
            "" | "name" => Ok(Value::from(def.name.as_str())),
            "description" => Ok(Value::from(game.interpolate(&def.description))),
            "kind" => Ok(Value::from(def.kind.label())),
            "held" => Ok(Value::from(game.player.has_card(id))),
            "completed" => Ok(Value::from(
                game.player.card(id).map(|c| c.completed()).unwrap_or(false),
            )),
            "field" => {
                let value = game
                    .player
                    .card(id)
                    .and_then(|c| c.field(field_key))
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                Ok(Value::Data(value))
            }
            other => Err(EngineError::invalid(format!(
                "card '{id}' has no selector '{other}'"
            ))),
        }
    }
}

// ----------------------------------------------------------------------
// time accessor
// ----------------------------------------------------------------------

struct TimeAccessor;

fn time(_game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    Ok(Value::accessor(TimeAccessor))
}

impl Accessor for TimeAccessor {
    fn default(&self, game: &mut Game) -> Result<Value, EngineError> {
        Ok(Value::from(format_clock(game.clock)))
    }

    fn resolve(&self, game: &mut Game, rest: &str) -> Result<Value, EngineError> {
        match rest {
            "clock" => Ok(Value::from(game.clock)),
            "day" => Ok(Value::from(day_of(game.clock))),
            "hour" => Ok(Value::from(hour_of(game.clock))),
            "minute" => Ok(Value::from(minute_of(game.clock))),
            "text" => Ok(Value::from(format_clock(game.clock))),
            other => Err(EngineError::invalid(format!(
                "time has no selector '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::HOUR;
    use crate::engine::script::ContentBuilder;
    use crate::engine::world::{LocationDef, NpcDef};

    fn greet(game: &mut Game, params: &Params) -> Result<Value, EngineError> {
        let id = params.text("npc").unwrap_or("?").to_string();
        game.speech("Mara", "Evening.");
        game.player.set_flag("greeted_by", id.as_str());
        Ok(Value::null())
    }

    fn game() -> Game {
        let mut builder = ContentBuilder::new();
        builder
            .location(
                LocationDef::new("lane", "Ferry Lane")
                    .with_description("Mud and lamplight at {time:text}.")
                    .with_link("The tavern", "tavern"),
            )
            .expect("location");
        builder
            .location(LocationDef::new("tavern", "The Driftwood"))
            .expect("location");
        builder
            .npc(
                NpcDef::new("mara", "Mara", "lane")
                    .with_title("keeper of the Driftwood")
                    .with_script("talk", greet),
            )
            .expect("npc");
        let mut game = Game::new(builder.build(), "lane");
        game.clock = 20 * HOUR;
        game
    }

    #[test]
    fn time_accessor_reads_the_clock() {
        let mut game = game();
        assert_eq!(game.eval("time:hour").expect("eval").as_i64(), Some(20));
        assert_eq!(game.eval("time:day").expect("eval").as_i64(), Some(1));
        assert_eq!(
            game.eval("time").expect("eval").as_str(),
            Some("Day 1, 20:00")
        );
        assert!(game.eval("time:fortnight").is_err());
    }

    #[test]
    fn location_accessor_reads_current_and_named() {
        let mut game = game();
        assert_eq!(
            game.eval("location").expect("eval").as_str(),
            Some("Ferry Lane")
        );
        assert_eq!(
            game.eval("location:link:The tavern").expect("eval").as_str(),
            Some("tavern")
        );
        assert_eq!(
            game.eval("location(tavern):name").expect("eval").as_str(),
            Some("The Driftwood")
        );
        assert_eq!(
            game.eval("location:visits").expect("eval").as_i64(),
            Some(0)
        );
    }

    #[test]
    fn npc_accessor_generates_and_binds() {
        let mut game = game();
        assert_eq!(
            game.eval("npc(mara):title").expect("eval").as_str(),
            Some("keeper of the Driftwood")
        );
        assert!(game.npcs.contains_key("mara"));

        // Sub-script routed through the chain knows its owner.
        game.eval("npc(mara):talk").expect("eval");
        assert_eq!(
            game.player.flag("greeted_by").and_then(|v| v.as_str()),
            Some("mara")
        );
        assert!(game.eval("npc(mara):backflip").is_err());
    }

    #[test]
    fn card_accessor_reads_template_and_instance() {
        use crate::engine::card::{CardDef, CardKind};

        let mut builder = ContentBuilder::new();
        builder
            .location(LocationDef::new("lane", "Ferry Lane"))
            .expect("location");
        builder
            .card(CardDef::new("errand", CardKind::Quest, "Mara's Errand"))
            .expect("card");
        let mut game = Game::new(builder.build(), "lane");

        assert_eq!(
            game.eval("card(errand):name").expect("eval").as_str(),
            Some("Mara's Errand")
        );
        assert_eq!(
            game.eval("card(errand):held").expect("eval").as_bool(),
            Some(false)
        );
        game.gain_card("errand").expect("gain");
        assert_eq!(
            game.eval("card(errand):held").expect("eval").as_bool(),
            Some(true)
        );
        assert!(game.eval("card(unwritten):name").is_err());
    }

    #[test]
    fn look_offers_links_and_talk() {
        let mut game = game();
        // Generate Mara so she shows up as present on the lane.
        game.npc_mut("mara").expect("npc");
        game.before_action().expect("before");
        game.take_action(&Action::expr("look"));

        let labels: Vec<&str> = game.scene.options.iter().map(|o| o.label.as_str()).collect();
        assert!(labels.contains(&"The tavern"));
        assert!(labels.contains(&"Talk to Mara"));
        assert!(!game.scene.content.is_empty());
    }

    #[test]
    fn goto_travels_and_presents() {
        let mut game = game();
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "tavern"),
        ));
        assert_eq!(game.location, "tavern");
        assert_eq!(game.location_state("tavern").visits, 1);
    }

    #[test]
    fn template_interpolation_reaches_accessors() {
        let mut game = game();
        game.take_action(&Action::expr("look"));
        let Some(crate::engine::scene::Block::Paragraph { text }) = game.scene.content.first()
        else {
            panic!("expected description paragraph");
        };
        assert_eq!(text, "Mud and lamplight at Day 1, 20:00.");
    }
}
