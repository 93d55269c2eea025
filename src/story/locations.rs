//! Ferrytown's places and the scripts they offer.
//!
//! The tavern bar is the worked example of a self-renewing menu frame:
//! every pass through `tavern_menu` queues one copy of itself, so
//! whatever a choice runs, the menu comes back until `exit_scene`
//! drops the stack. The market stalls show the shop pattern instead:
//! each purchase re-opens the stall screen by calling the opener again.

use crate::engine::clock::{seconds_until_hour, HOUR, MINUTE};
use crate::engine::errors::EngineError;
use crate::engine::scene::{Choice, ShopRef};
use crate::engine::script::{ContentBuilder, Instruction, Params, Script, Value};
use crate::engine::state::Game;
use crate::engine::world::LocationDef;

pub fn register(builder: &mut ContentBuilder) -> Result<(), EngineError> {
    builder
        .location(
            LocationDef::new("room", "The Loft Room")
                .with_description(
                    "Your narrow room above the ferry office. A lamp, a cot, and the \
                     river mumbling beyond the shutter. It is {time:text}.",
                )
                .with_link("Down to Ferry Lane", "lane")
                .with_activity("Sleep until morning", Instruction::new("sleep"))
                .with_activity(
                    "Wait an hour",
                    Instruction::new("wait").with_param("minutes", 60),
                )
                .with_activity("Latch the shutter", Instruction::new("toggle_quiet"))
                .with_first_arrive(room_first_arrive)
                .with_wait(room_ambient),
        )?
        .location(
            LocationDef::new("lane", "Ferry Lane")
                .with_description(
                    "Ferry Lane runs from the landing stairs up toward the market \
                     square, slick with river mist.",
                )
                .with_link("Up to your room", "room")
                .with_link("The Driftwood tavern", "tavern")
                .with_link("The night market", "market")
                .with_first_arrive(lane_first_arrive)
                .with_wait(lane_ambient),
        )?
        .location(
            LocationDef::new("tavern", "The Driftwood")
                .with_description(
                    "The Driftwood's long room is warm with peat smoke and wet wool.",
                )
                .with_link("Back to the lane", "lane")
                .with_activity("Approach the bar", Instruction::new("tavern_menu"))
                .with_activity(
                    "Nurse a drink in a corner",
                    Instruction::new("wait").with_param("minutes", 30),
                )
                .with_arrive(tavern_arrive),
        )?
        .location(
            LocationDef::new("market", "The Night Market")
                .with_description(
                    "Lantern-lit stalls crowd the square. You carry {coins} coins.",
                )
                .with_link("Back to the lane", "lane")
                .with_activity("Browse the stalls", Instruction::new("open_stalls"))
                .with_activity(
                    "Look for the spice merchant",
                    Instruction::new("spice_merchant"),
                )
                .with_wait(market_ambient),
        )?;

    builder
        .script("coins", coins)?
        .script("sleep", sleep)?
        .script("wake", wake)?
        .script("toggle_quiet", toggle_quiet)?
        .script("tavern_menu", tavern_menu)?
        .script("drink", drink)?
        .script("listen", listen)?
        .script("open_stalls", open_stalls)?
        .script("buy_snack", buy_snack)?
        .script("buy_lantern", buy_lantern)?
        .script("close_stalls", close_stalls)?
        .script("spice_merchant", spice_merchant)?;
    Ok(())
}

// ----------------------------------------------------------------------
// Location hooks
// ----------------------------------------------------------------------

fn room_first_arrive(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.highlight("Ferrytown, first night of autumn.");
    game.add(
        "You came upriver with one bag and a week's rent. The ferry office \
         below has gone quiet; the town outside has not.",
    );
    game.add_card("meet_the_lane", Params::new(), false)?;
    Ok(())
}

fn lane_first_arrive(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    game.add("Gulls argue over the landing stairs even at this hour.");
    Ok(())
}

fn tavern_arrive(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    if game.location_state("tavern").visits >= 3 {
        game.gain_card("regular")?;
    }
    Ok(())
}

fn room_ambient(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    if !game.setting("quiet_nights") && game.chance(0.4)? {
        game.add("Rain ticks on the shutter for a while, then gives up.");
    }
    Ok(())
}

fn lane_ambient(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    if game.setting("quiet_nights") {
        return Ok(());
    }
    if game.chance(0.3)? {
        let lines = [
            "A dray rattles past, trailing the smell of onions.",
            "Two ferry hands argue about tomorrow's tide.",
            "Somewhere uphill, a door slams twice.",
        ];
        if let Some(line) = game.pick(&lines).copied() {
            game.add(line);
        }
    }
    Ok(())
}

fn market_ambient(game: &mut Game, _id: &str) -> Result<(), EngineError> {
    if game.chance(0.3)? {
        game.add("A lantern gutters; its stallholder swears at it fondly.");
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Room scripts
// ----------------------------------------------------------------------

fn coins(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    Ok(Value::from(game.player.num_flag("coins") as i64))
}

/// Sleeps through to 08:00. The long wait runs in the usual chunks, so
/// a late knock at the door can still cut the night short.
fn sleep(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.add("You bank the lamp and stretch out on the cot.");
    let minutes = seconds_until_hour(game.clock, 8)? / MINUTE;
    let inst = Instruction::new("wait")
        .with_param("minutes", minutes)
        .with_param("then", "wake");
    game.run(&Script::Call(inst), &Params::new())
}

fn wake(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.player.set_flag("fatigue", 0.0);
    let mut fields = Params::new();
    fields.insert(
        "until".to_string(),
        serde_json::Value::from(game.clock + 16 * HOUR),
    );
    game.add_card("rested", fields, false)?;
    game.add("Morning light needles through the shutter slats.");
    Ok(Value::null())
}

fn toggle_quiet(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    let quiet = !game.setting("quiet_nights");
    game.set_setting("quiet_nights", quiet);
    if quiet {
        game.add("You latch the shutter. The lane's noise drops to a murmur.");
    } else {
        game.add("You unlatch the shutter and let the town back in.");
    }
    Ok(Value::null())
}

// ----------------------------------------------------------------------
// Tavern scripts
// ----------------------------------------------------------------------

/// The bar menu. Re-queues itself each pass; only `exit_scene` ends it.
fn tavern_menu(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.scene
        .top_frame()
        .pages
        .push_back(Instruction::new("tavern_menu"));

    let mara_here = game.npc_present("mara");
    if mara_here {
        game.scene.npc = Some("mara".to_string());
        game.speech("Mara", "What'll it be?");
    } else {
        game.add("A bored day-lad minds the taps, elbow deep in a tankard rag.");
    }

    game.add_choice(Instruction::new("drink"), "Order a pint (1 coin)");
    let mut ask = Choice::new("ask_work", "Ask about work");
    if !mara_here || game.player.has_card("errand") {
        ask = ask.disabled();
    }
    game.add(ask);
    game.add_choice(Instruction::new("listen"), "Just listen a while");
    game.add_choice(Instruction::new("exit_scene"), "Back to your table");
    Ok(Value::null())
}

fn drink(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    if game.player.num_flag("coins") < 1.0 {
        game.speech("Mara", "Coin first. The river teaches credit hard lessons.");
        return Ok(Value::null());
    }
    if game.player.has_card("drunk") {
        game.speech("Mara", "Not another. The river takes enough of you lot as it is.");
        return Ok(Value::null());
    }
    game.player.bump_flag("coins", -1.0);
    game.add("The ale is dark and tastes faintly of smoke.");
    game.time_lapse_minutes(15)?;

    if game.player.has_card("tipsy") {
        let level = {
            let Some(card) = game.player.card_mut("tipsy") else {
                return Ok(Value::null());
            };
            let next = card.field("level").and_then(|v| v.as_f64()).unwrap_or(0.0) + 1.0;
            card.set_field("level", next);
            next
        };
        if level >= 3.0 {
            game.gain_card("drunk")?;
        }
    } else {
        let mut fields = Params::new();
        fields.insert("level".to_string(), serde_json::Value::from(1.0));
        game.add_card("tipsy", fields, false)?;
    }
    Ok(Value::null())
}

fn listen(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    let rumors = [
        "Someone swears the upriver ferry ran empty on Sunday, oars moving on their own.",
        "The spice merchant pays in coin and never haggles after dark.",
        "Word is the market bell cracked last frost and nobody has dared ring it since.",
    ];
    let line = game.pick(&rumors).copied().unwrap_or(rumors[0]);
    game.add(line);
    game.time_lapse_minutes(10)?;
    Ok(Value::null())
}

// ----------------------------------------------------------------------
// Market scripts
// ----------------------------------------------------------------------

fn open_stalls(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    let npc = game.npc_present("tomas").then(|| "tomas".to_string());
    game.scene.shop = Some(ShopRef {
        id: "night_stalls".to_string(),
        npc,
    });
    game.add("Trays of sweets, cheap lanterns, river charms on red thread.");
    game.add_choice(Instruction::new("buy_snack"), "Buy a honey twist (2 coins)");
    game.add_choice(Instruction::new("buy_lantern"), "Buy a storm lantern (5 coins)");
    game.add_choice(Instruction::new("close_stalls"), "Step back");
    Ok(Value::null())
}

fn buy_snack(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    if game.player.num_flag("coins") < 2.0 {
        game.add("The sweet-seller reads your pockets at a glance and moves on.");
    } else {
        game.player.bump_flag("coins", -2.0);
        game.player.bump_flag("fatigue", -1.0);
        game.add("The honey twist is still warm. The night improves.");
    }
    open_stalls(game, &Params::new())
}

fn buy_lantern(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    if game.player.bool_flag("has_lantern") {
        game.add("One storm lantern is enough for anyone.");
    } else if game.player.num_flag("coins") < 5.0 {
        game.add("You count your coins twice. The lantern stays where it is.");
    } else {
        game.player.bump_flag("coins", -5.0);
        game.player.set_flag("has_lantern", true);
        game.add_score(5);
        game.add("A squat tin lantern with good glass. It feels like foresight.");
    }
    open_stalls(game, &Params::new())
}

fn close_stalls(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    game.add("You step back from the stalls before your coins get ideas.");
    Ok(Value::null())
}

/// Goal of Mara's errand. Works whenever the market is open, which at
/// night is always.
fn spice_merchant(game: &mut Game, _params: &Params) -> Result<Value, EngineError> {
    let errand = game.player.card("errand");
    match errand {
        Some(card) if !card.completed() => {
            game.speech(
                "Spice merchant",
                "From Mara? Then the week improves. Tell her the cinnamon held.",
            );
            game.complete_quest("errand")?;
            game.player.bump_flag("coins", 3.0);
            game.add_score(25);
            game.add("Three coins, pressed into your hand with ceremony.");
        }
        Some(_) => {
            game.add("The spice merchant nods at you, parcel already shelved away.");
        }
        None => {
            game.add("The spice stall is shuttered to strangers without business.");
        }
    }
    Ok(Value::null())
}

// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::script::Action;
    use crate::story;

    #[test]
    fn tavern_menu_renews_until_exited() {
        let mut game = story::new_seeded_game(3).expect("game");
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "lane"),
        ));
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "tavern"),
        ));
        game.take_action(&Action::call(Instruction::new("tavern_menu")));
        assert!(game.scene.in_scene());
        assert_eq!(game.scene.stack.len(), 1);

        // Listening produces content, then the menu comes straight back.
        game.take_action(&Action::call(Instruction::new("listen")));
        assert!(game
            .scene
            .options
            .iter()
            .any(|o| o.label.starts_with("Order a pint")));
        assert_eq!(game.scene.stack[0].pages.len(), 1);

        game.take_action(&Action::call(Instruction::new("exit_scene")));
        game.after_action().expect("after");
        assert!(!game.scene.in_scene());
        assert!(game.scene.stack.is_empty());
    }

    #[test]
    fn stalls_stay_open_across_purchases() {
        let mut game = story::new_seeded_game(3).expect("game");
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "lane"),
        ));
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "market"),
        ));
        game.take_action(&Action::call(Instruction::new("open_stalls")));
        assert!(game.scene.shop.is_some());

        game.take_action(&Action::call(Instruction::new("buy_snack")));
        assert!(game.scene.shop.is_some());
        assert_eq!(game.player.num_flag("coins"), 10.0);

        game.take_action(&Action::call(Instruction::new("close_stalls")));
        game.after_action().expect("after");
        assert!(game.scene.shop.is_none());
        assert!(!game.scene.in_scene());
    }

    #[test]
    fn drinking_stacks_into_drunk() {
        let mut game = story::new_seeded_game(3).expect("game");
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "lane"),
        ));
        game.take_action(&Action::call(
            Instruction::new("goto").with_param("location", "tavern"),
        ));
        // Five rounds outpace the half-hourly decay comfortably.
        for _ in 0..5 {
            game.take_action(&Action::call(Instruction::new("drink")));
        }
        assert!(game.player.has_card("drunk"));
        assert!(!game.player.has_card("tipsy"));
    }
}
