//! The outer phases of the action loop: setup that tolerates repeat
//! calls, and failures surfacing as in-scene diagnostics instead of
//! tearing down the session.

mod common;

use common::{counter, testbed};
use taleloom::engine::{Action, Block};

#[test]
fn the_setup_phase_is_idempotent() {
    let mut game = testbed();
    game.npc_mut("warden").expect("warden");
    game.npcs.get_mut("warden").expect("warden").location = "yard".to_string();
    game.gain_card("lamplit").expect("card");

    game.before_action().expect("before");
    let present = game.present.clone();
    let derived = game.player.derived.clone();

    game.before_action().expect("before");
    assert_eq!(game.present, present);
    assert_eq!(game.player.derived, derived);
    assert_eq!(game.present, vec!["warden".to_string()]);
    assert_eq!(game.player.stat("nerve"), 5.0);
}

#[test]
fn unknown_scripts_report_in_scene() {
    let mut game = testbed();
    game.before_action().expect("before");
    game.take_action(&Action::expr("polish_the_moat"));
    game.after_action().expect("after");

    assert_eq!(game.scene.content.len(), 1);
    match &game.scene.content[0] {
        Block::Error { text } => assert!(text.contains("polish_the_moat"), "got: {text}"),
        other => panic!("expected a diagnostic, got {other:?}"),
    }
}

#[test]
fn partial_narration_survives_a_failure() {
    let mut game = testbed();
    game.before_action().expect("before");
    game.take_action(&Action::expr("fail_midway"));
    game.after_action().expect("after");

    assert_eq!(game.scene.content.len(), 2);
    assert!(
        matches!(&game.scene.content[0], Block::Paragraph { text } if text.contains("hinge"))
    );
    assert!(
        matches!(&game.scene.content[1], Block::Error { text } if text.contains("bolt jams"))
    );
}

#[test]
fn the_loop_recovers_on_the_next_action() {
    let mut game = testbed();
    game.before_action().expect("before");
    game.take_action(&Action::expr("fail_midway"));
    game.after_action().expect("after");

    game.before_action().expect("before");
    game.take_action(&Action::expr("drill"));
    game.after_action().expect("after");
    assert_eq!(counter(&game, "drills"), 1);
    assert!(game
        .scene
        .content
        .iter()
        .all(|block| !matches!(block, Block::Error { .. })));
}
