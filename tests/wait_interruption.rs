//! The clock in motion: chunked waiting, interception mid-wait,
//! boundary-exact interval ticks and hourly schedule movement.

mod common;

use common::{counter, testbed};
use taleloom::engine::{Action, Instruction, Params, HOUR, MINUTE};

#[test]
fn undisturbed_waits_reach_location_hooks_once() {
    let mut game = testbed();
    game.npc_mut("warden").expect("warden");
    let start = game.clock;

    let done = game.wait(25, Some(&Action::expr("wave"))).expect("wait");
    assert!(done);
    assert_eq!(game.clock, start + 25 * MINUTE);
    // Three chunks of watching, one location pass at the end.
    assert_eq!(counter(&game, "world_ticks"), 3);
    assert_eq!(counter(&game, "warden_visits"), 3);
    assert_eq!(counter(&game, "yard_ticks"), 1);
    assert_eq!(counter(&game, "yard_waits"), 1);
    assert_eq!(counter(&game, "waves"), 1);
}

#[test]
fn an_interrupted_wait_keeps_only_the_chunks_waited() {
    let mut game = testbed();
    game.npc_mut("warden").expect("warden");
    game.player.set_flag("knock_at_visit", 2.0);
    let start = game.clock;

    let done = game.wait(60, Some(&Action::expr("wave"))).expect("wait");
    assert!(!done);
    // Two chunks elapsed, then the knock cut the wait short.
    assert_eq!(game.clock, start + 20 * MINUTE);
    assert_eq!(counter(&game, "warden_visits"), 2);
    assert!(game.scene.in_scene());
    assert!(game.npc_present("warden"));
    // The cut-off wait never reaches the location hooks or the
    // follow-up.
    assert_eq!(counter(&game, "yard_ticks"), 0);
    assert_eq!(counter(&game, "yard_waits"), 0);
    assert_eq!(counter(&game, "waves"), 0);
}

#[test]
fn colocated_npcs_get_contact_before_ambience() {
    let mut game = testbed();
    game.npc_mut("warden").expect("warden");
    game.npc_mut("warden").expect("warden").location = "yard".to_string();
    game.refresh_presence();
    game.player.set_flag("ambush_at_ambient", 2.0);

    let done = game.wait(60, None).expect("wait");
    assert!(!done);
    assert_eq!(counter(&game, "warden_approaches"), 2);
    assert_eq!(counter(&game, "warden_ambients"), 2);
    assert_eq!(counter(&game, "warden_visits"), 0);
    assert_eq!(game.scene.npc.as_deref(), Some("warden"));
}

#[test]
fn interval_ticks_are_boundary_exact() {
    let mut game = testbed();
    game.add_card("hourglass", Params::new(), true).expect("add");

    game.time_lapse_minutes(29).expect("lapse");
    assert_eq!(counter(&game, "half_hours"), 0);
    // Landing exactly on 20:30 counts the boundary.
    game.time_lapse_minutes(1).expect("lapse");
    assert_eq!(counter(&game, "half_hours"), 1);
    // 21:00, 21:30 and 22:00 over the next ninety minutes.
    game.time_lapse_minutes(90).expect("lapse");
    assert_eq!(counter(&game, "half_hours"), 4);
}

#[test]
fn hourly_schedules_move_npcs_between_posts() {
    let mut game = testbed();
    game.npc_mut("warden").expect("warden");
    assert_eq!(game.npcs["warden"].location, "gatehouse");

    // Crossing 22:00 reposts the warden down into the yard.
    game.time_lapse(2 * HOUR + 5 * MINUTE).expect("lapse");
    assert_eq!(game.npcs["warden"].location, "yard");
    assert!(game.npc_present("warden"));
    assert_eq!(counter(&game, "warden_moves"), 2);
}

#[test]
fn engaged_scenes_freeze_schedules() {
    let mut game = testbed();
    game.npc_mut("warden").expect("warden");
    game.add_choice("wave", "Wave");

    game.time_lapse(3 * HOUR).expect("lapse");
    assert_eq!(game.npcs["warden"].location, "gatehouse");
    assert_eq!(counter(&game, "warden_moves"), 1, "generation only");
}

#[test]
fn the_wait_script_reports_back_through_look() {
    let mut game = testbed();
    game.before_action().expect("before");
    game.take_action(&Action::call(
        Instruction::new("wait")
            .with_param("minutes", 10)
            .with_param("then", "wave"),
    ));
    game.after_action().expect("after");

    assert_eq!(counter(&game, "waves"), 1);
    // Nothing interrupted, so the yard view is back on screen.
    assert!(game
        .scene
        .options
        .iter()
        .any(|choice| choice.label == "Through the arch"));
    assert!(game
        .scene
        .options
        .iter()
        .any(|choice| choice.label == "Run a drill"));
}

#[test]
fn negative_durations_are_authoring_errors() {
    let mut game = testbed();
    assert!(game.wait(-5, None).is_err());
    assert!(game.time_lapse(-1).is_err());
}
