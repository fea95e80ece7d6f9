//! Diagnostic overlay text rendered from coordinator snapshots.

use glam::Vec3;
use legwork::FlatGround;
use rstest::rstest;
use test_utils::body::ScriptedBody;
use test_utils::rigs::{self, DT, RIDE_HEIGHT};
use test_utils::{assert_all_absent, assert_all_present};

#[rstest]
fn resting_rig_shows_no_priority_or_movement() {
    let ground = FlatGround::new(0.0);
    let mut coordinator = rigs::coordinator(&rigs::quadruped(2, 2));
    coordinator.tick(&ScriptedBody::at(Vec3::Y * RIDE_HEIGHT), &ground, DT);

    let text = coordinator.snapshot().to_string();
    assert_all_present(
        &text,
        &[
            "Group Priority:",
            "Most Urgent Leg Group: diag_a",
            "Grounded Legs: 4",
            "Leg front_left (0.000)",
            "Status: Idle",
        ],
    );
    assert_all_absent(&text, &["PRIORITY", "Status: Moving"]);
}

#[rstest]
fn displaced_rig_flags_priority_and_lifted_legs() {
    let ground = FlatGround::new(0.0);
    let mut coordinator = rigs::coordinator(&rigs::quadruped(2, 2));
    coordinator.tick(&ScriptedBody::at(Vec3::new(0.0, RIDE_HEIGHT, 3.0)), &ground, DT);

    let text = coordinator.snapshot().to_string();
    assert_all_present(
        &text,
        &[
            "Group diag_a: PRIORITY",
            "Group diag_b: PRIORITY",
            "Grounded Legs: 2",
            "Status: Moving",
            "Gate: open (2 slot(s))",
        ],
    );
    assert_all_absent(&text, &["Grounded Legs: 4", "held:"]);
}
