//! Card lifecycle rules: subsumption, replacement, one-shot completion,
//! reminder surfacing and stat recomputation.

mod common;

use common::{counter, testbed};
use taleloom::engine::{Action, Block, Card, CardKind};

fn notice_count(game: &taleloom::engine::Game) -> usize {
    game.scene
        .content
        .iter()
        .filter(|block| matches!(block, Block::Notice { .. }))
        .count()
}

#[test]
fn a_subsumed_card_never_lands() {
    let mut game = testbed();
    assert!(game.gain_card("blazing").expect("gain"));
    let before = game.scene.content.len();

    // The held subsumer makes this a silent no-op.
    assert!(!game.gain_card("lamplit").expect("gain"));
    assert!(!game.player.has_card("lamplit"));
    assert_eq!(game.scene.content.len(), before, "no notice may appear");
}

#[test]
fn replacement_swaps_silently_and_restats() {
    let mut game = testbed();
    assert!(game.gain_card("lamplit").expect("gain"));
    game.recompute_stats().expect("stats");
    assert_eq!(game.player.stat("nerve"), 5.0);

    game.scene.clear();
    assert!(game.gain_card("blazing").expect("gain"));
    assert!(!game.player.has_card("lamplit"));
    assert!(game.player.has_card("blazing"));
    // Exactly one notice: the arrival. The replaced card leaves quietly.
    assert_eq!(notice_count(&game), 1);
    game.recompute_stats().expect("stats");
    assert_eq!(game.player.stat("nerve"), 15.0);
}

#[test]
fn duplicates_are_refused() {
    let mut game = testbed();
    assert!(game.gain_card("lamplit").expect("gain"));
    assert!(!game.gain_card("lamplit").expect("gain"));
    assert_eq!(game.player.cards.len(), 1);
}

#[test]
fn removal_stays_quiet_while_the_subsumer_holds() {
    let mut game = testbed();
    game.gain_card("blazing").expect("gain");
    game.player.cards.push(Card::new("lamplit", CardKind::Effect));
    game.scene.clear();

    assert!(game.remove_card("lamplit", false).expect("remove"));
    assert!(
        game.scene.content.is_empty(),
        "the stronger card already tells the story"
    );
    game.recompute_stats().expect("stats");
    assert_eq!(game.player.stat("nerve"), 15.0);
}

#[test]
fn quests_complete_exactly_once() {
    let mut game = testbed();
    game.gain_card("patrol").expect("gain");
    game.scene.clear();

    assert!(game.complete_quest("patrol").expect("complete"));
    assert!(!game.complete_quest("patrol").expect("complete"));
    assert_eq!(notice_count(&game), 1);
    assert!(game.player.card("patrol").expect("patrol").completed());
}

#[test]
fn after_update_hooks_drive_completion() {
    let mut game = testbed();
    game.gain_card("patrol").expect("gain");

    game.before_action().expect("before");
    game.take_action(&Action::expr("drill"));
    game.after_action().expect("after");
    assert_eq!(counter(&game, "patrol_updates"), 1);
    assert!(!game.player.card("patrol").expect("patrol").completed());

    game.player.set_flag("circuit_done", true);
    game.before_action().expect("before");
    game.take_action(&Action::expr("drill"));
    game.after_action().expect("after");
    assert!(game.player.card("patrol").expect("patrol").completed());
}

#[test]
fn reminders_follow_completion() {
    let mut game = testbed();
    game.gain_card("patrol").expect("gain");
    assert_eq!(game.reminders().expect("reminders").len(), 1);

    game.complete_quest("patrol").expect("complete");
    assert!(game.reminders().expect("reminders").is_empty());
}
