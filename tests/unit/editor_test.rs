//! Unit tests for workout edit operations.

use uuid::Uuid;
use workout_editor::metrics::pace::PaceIndex;
use workout_editor::metrics::zones::Zone;
use workout_editor::workouts::{
    AnnotationDeletion, Block, IntervalsParams, MoveDirection, RampParams, SportType,
    SteadyParams, Workout, WorkoutTag,
};

fn steady(power: f64, duration_seconds: u32) -> SteadyParams {
    SteadyParams {
        duration_seconds,
        ..SteadyParams::new(power)
    }
}

#[test]
fn test_add_segments_in_order() {
    let mut workout = Workout::default();
    let a = workout.add_steady(steady(0.6, 60));
    let b = workout.add_ramp(RampParams::new(0.5, 0.9));
    let c = workout.add_intervals(IntervalsParams::default());
    let d = workout.add_free_ride(600);

    let ids: Vec<Uuid> = workout.segments.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, b, c, d]);
}

#[test]
fn test_add_steady_in_zone_uses_zone_floor() {
    let mut workout = Workout::default();
    let id = workout.add_steady_in_zone(Zone::Z3);

    match workout.segment(id).map(|s| &s.block) {
        Some(Block::Steady {
            power,
            duration_seconds,
            ..
        }) => {
            assert!((power - 0.763).abs() < 1e-9);
            assert_eq!(*duration_seconds, 300);
        }
        other => panic!("Expected steady block, got {:?}", other),
    }
}

#[test]
fn test_z1_steady_starts_at_half_ftp() {
    let mut workout = Workout::default();
    let z1 = workout.add_steady_in_zone(Zone::Z1);
    let z2 = workout.add_steady_in_zone(Zone::Z2);

    let power = |id| match workout.segment(id).map(|s| &s.block) {
        Some(Block::Steady { power, .. }) => *power,
        other => panic!("Expected steady block, got {:?}", other),
    };
    assert_eq!(power(z1), 0.5);
    assert_eq!(power(z2), Zone::Z2.min());
}

#[test]
fn test_remove_segment() {
    let mut workout = Workout::default();
    let a = workout.add_steady(steady(0.6, 60));
    let b = workout.add_steady(steady(0.7, 60));

    assert!(workout.remove_segment(a));
    assert_eq!(workout.segments.len(), 1);
    assert_eq!(workout.segments[0].id, b);
    assert!(!workout.remove_segment(a));
}

#[test]
fn test_move_segment_is_noop_at_edges() {
    let mut workout = Workout::default();
    let a = workout.add_steady(steady(0.6, 60));
    let b = workout.add_steady(steady(0.7, 60));

    workout.move_segment(a, MoveDirection::Earlier);
    workout.move_segment(b, MoveDirection::Later);
    assert_eq!(workout.segments[0].id, a);
    assert_eq!(workout.segments[1].id, b);

    workout.move_segment(a, MoveDirection::Later);
    assert_eq!(workout.segments[0].id, b);
    assert_eq!(workout.segments[1].id, a);
}

#[test]
fn test_duplicate_copies_to_end() {
    let mut workout = Workout::default();
    let a = workout.add_steady(steady(0.6, 60));
    workout.add_free_ride(120);

    let copy = workout.duplicate_segment(a).unwrap();
    assert_ne!(copy, a);
    assert_eq!(workout.segments.last().unwrap().id, copy);
    assert_eq!(workout.segments[2].block, workout.segments[0].block);
}

#[test]
fn test_bike_duration_floor_is_five_seconds() {
    let mut workout = Workout::default();
    let id = workout.add_steady(steady(0.6, 20));

    workout.adjust_duration(id, -10);
    assert_eq!(workout.segments[0].duration_seconds(), 10);
    workout.adjust_duration(id, -10);
    assert_eq!(workout.segments[0].duration_seconds(), 5);
    workout.adjust_duration(id, 30);
    assert_eq!(workout.segments[0].duration_seconds(), 35);
}

#[test]
fn test_interval_duration_adjusts_on_part() {
    let mut workout = Workout::default();
    let id = workout.add_intervals(IntervalsParams::default());
    workout.adjust_duration(id, 10);

    match &workout.segments[0].block {
        Block::Intervals {
            on_duration_seconds,
            off_duration_seconds,
            ..
        } => {
            assert_eq!(*on_duration_seconds, 40);
            assert_eq!(*off_duration_seconds, 120);
        }
        other => panic!("Expected intervals, got {:?}", other),
    }
}

#[test]
fn test_run_length_steps_by_200_meters() {
    let mut workout = Workout::default();
    workout.set_sport_type(SportType::Run);
    let id = workout.add_ramp(RampParams::new(0.6, 0.8));
    assert_eq!(workout.segments[0].length_meters(), 1000);

    workout.adjust_duration(id, 15);
    assert_eq!(workout.segments[0].length_meters(), 1200);

    for _ in 0..10 {
        workout.adjust_duration(id, -1);
    }
    assert_eq!(workout.segments[0].length_meters(), 200);
}

#[test]
fn test_adjust_power_rounds_to_three_decimals() {
    let mut workout = Workout::default();
    assert_eq!(workout.athlete.ftp_watts, 200);
    let id = workout.add_steady(steady(0.75, 60));

    workout.adjust_power(id, 1);
    match workout.segments[0].block {
        Block::Steady { power, .. } => assert_eq!(power, 0.755),
        _ => unreachable!(),
    }

    workout.adjust_power(id, -1);
    match workout.segments[0].block {
        Block::Steady { power, .. } => assert_eq!(power, 0.75),
        _ => unreachable!(),
    }
}

#[test]
fn test_adjust_power_never_drops_below_floor() {
    let mut workout = Workout::default();
    let id = workout.add_steady(steady(0.1, 60));

    workout.adjust_power(id, -5);
    match workout.segments[0].block {
        Block::Steady { power, .. } => assert_eq!(power, 0.1),
        _ => unreachable!(),
    }
}

#[test]
fn test_adjust_power_ignores_ramps() {
    let mut workout = Workout::default();
    let id = workout.add_ramp(RampParams::new(0.5, 0.7));
    let before = workout.segments[0].block.clone();

    workout.adjust_power(id, 10);
    assert_eq!(workout.segments[0].block, before);
}

#[test]
fn test_unknown_ids_are_ignored() {
    let mut workout = Workout::default();
    workout.add_steady(steady(0.6, 60));
    let before = workout.segments.clone();
    let stale = Uuid::new_v4();

    workout.adjust_duration(stale, 10);
    workout.adjust_power(stale, 10);
    workout.set_cadence(stale, 90);
    workout.move_segment(stale, MoveDirection::Later);
    assert_eq!(workout.segments, before);
}

#[test]
fn test_cadence_and_pace() {
    let mut workout = Workout::default();
    let id = workout.add_steady(steady(0.8, 60));
    workout.set_cadence(id, 95);
    workout.set_pace(id, PaceIndex::HalfMarathon);

    assert_eq!(workout.segments[0].cadence, 95);
    assert_eq!(workout.segments[0].pace, PaceIndex::HalfMarathon);
}

#[test]
fn test_annotation_lifecycle() {
    let mut workout = Workout::default();
    let id = workout.add_annotation("Spin up", 30);
    assert_eq!(workout.annotation(id).unwrap().time_seconds, 30);

    workout.edit_annotation(id, "Spin faster", 45);
    let annotation = workout.annotation(id).unwrap();
    assert_eq!(annotation.text, "Spin faster");
    assert_eq!(annotation.time_seconds, 45);

    assert_eq!(
        workout.delete_annotation(id, false),
        AnnotationDeletion::NeedsConfirmation
    );
    assert_eq!(workout.delete_annotation(id, true), AnnotationDeletion::Deleted);
    assert_eq!(workout.delete_annotation(id, true), AnnotationDeletion::NotFound);
}

#[test]
fn test_empty_annotation_deletes_without_confirmation() {
    let mut workout = Workout::default();
    let id = workout.add_annotation("", 10);
    assert_eq!(workout.delete_annotation(id, false), AnnotationDeletion::Deleted);
    assert!(workout.annotations.is_empty());
}

#[test]
fn test_run_annotation_position_is_distance() {
    let mut workout = Workout::default();
    workout.set_sport_type(SportType::Run);
    let id = workout.add_annotation("Hill", 800);

    let annotation = workout.annotation(id).unwrap();
    assert_eq!(annotation.distance_meters, 800);
    assert_eq!(annotation.time_seconds, 0);
}

#[test]
fn test_toggle_tag_keeps_selection_order() {
    let mut workout = Workout::default();
    workout.toggle_tag(WorkoutTag::Ftp);
    workout.toggle_tag(WorkoutTag::Recovery);
    assert_eq!(workout.tags, vec![WorkoutTag::Ftp, WorkoutTag::Recovery]);

    workout.toggle_tag(WorkoutTag::Ftp);
    assert_eq!(workout.tags, vec![WorkoutTag::Recovery]);
}

#[test]
fn test_athlete_validation() {
    let mut workout = Workout::default();
    assert!(workout.set_ftp(250).is_ok());
    assert!(workout.set_ftp(20).is_err());
    assert_eq!(workout.athlete.ftp_watts, 250);

    assert!(workout.set_weight(68.5).is_ok());
    assert!(workout.set_weight(500.0).is_err());
    assert_eq!(workout.athlete.weight_kg, 68.5);
}

#[test]
fn test_reset_keeps_athlete_and_sport() {
    let mut workout = Workout::default();
    workout.set_sport_type(SportType::Run);
    workout.set_ftp(280).unwrap();
    workout.name = "Long run".to_string();
    workout.add_steady(steady(0.7, 60));
    let old_id = workout.id.clone();

    workout.reset();
    assert_ne!(workout.id, old_id);
    assert!(workout.segments.is_empty());
    assert!(workout.name.is_empty());
    assert_eq!(workout.sport_type, SportType::Run);
    assert_eq!(workout.athlete.ftp_watts, 280);
}
