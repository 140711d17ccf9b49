//! Unit tests for .zwo reading and writing.

use workout_editor::metrics::pace::PaceIndex;
use workout_editor::workouts::{
    parse_zwo, parse_zwo_file, write_zwo, write_zwo_to_file, Block, IntervalsParams,
    RampParams, SegmentType, SportType, SteadyParams, Workout, WorkoutParseError, WorkoutTag,
};

fn steady(power: f64, duration_seconds: u32) -> SteadyParams {
    SteadyParams {
        duration_seconds,
        ..SteadyParams::new(power)
    }
}

#[test]
fn test_cadence_written_only_when_set() {
    let mut workout = Workout::default();
    let plain = workout.add_steady(steady(0.7, 60));
    let xml = write_zwo(&workout).unwrap();
    assert!(!xml.contains("Cadence"));

    workout.set_cadence(plain, 90);
    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains(r#"Cadence="90""#));
}

#[test]
fn test_ramps_are_named_by_position() {
    let mut workout = Workout::default();
    workout.add_ramp(RampParams::new(0.4, 0.7));
    workout.add_ramp(RampParams::new(0.7, 0.9));
    workout.add_ramp(RampParams::new(0.8, 0.4));

    let xml = write_zwo(&workout).unwrap();
    let warmup = xml.find("<Warmup").expect("warmup written");
    let ramp = xml.find("<Ramp").expect("ramp written");
    let cooldown = xml.find("<Cooldown").expect("cooldown written");
    assert!(warmup < ramp && ramp < cooldown);
}

#[test]
fn test_lone_ramp_is_cooldown() {
    let mut workout = Workout::default();
    workout.add_ramp(RampParams::new(0.75, 0.25));

    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains("<Cooldown"));
    assert!(!xml.contains("<Warmup"));
}

#[test]
fn test_descending_ramp_keeps_start_as_power_low() {
    let mut workout = Workout::default();
    workout.add_steady(steady(0.6, 60));
    workout.add_ramp(RampParams::new(0.8, 0.4));

    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains(r#"PowerLow="0.8""#));
    assert!(xml.contains(r#"PowerHigh="0.4""#));
}

#[test]
fn test_annotation_offset_is_relative_to_segment() {
    let mut workout = Workout::default();
    workout.add_steady(steady(0.6, 30));
    workout.add_steady(steady(0.8, 60));
    workout.add_annotation("Go", 45);

    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains(r#"timeoffset="15""#), "{}", xml);
    assert!(xml.contains(r#"message="Go""#));
    assert!(xml.contains("</SteadyState>"));
}

#[test]
fn test_annotation_on_segment_boundary_goes_to_next() {
    let mut workout = Workout::default();
    workout.add_steady(steady(0.6, 30));
    workout.add_steady(steady(0.8, 60));
    workout.add_annotation("Boundary", 30);

    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains(r#"timeoffset="0""#));

    let file = parse_zwo(&xml).unwrap();
    assert_eq!(file.annotations.len(), 1);
    assert_eq!(file.annotations[0].time_seconds, 30);
}

#[test]
fn test_run_workout_writes_meters() {
    let mut workout = Workout::default();
    workout.set_sport_type(SportType::Run);
    workout.add_steady(SteadyParams {
        length_meters: 800,
        pace: PaceIndex::TenKm,
        ..SteadyParams::new(0.9)
    });

    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains("<sportType>run</sportType>"));
    assert!(xml.contains(r#"Duration="800""#));
    assert!(xml.contains(r#"pace="2""#));
}

#[test]
fn test_tags_written_as_names() {
    let mut workout = Workout::default();
    workout.toggle_tag(WorkoutTag::Recovery);
    workout.toggle_tag(WorkoutTag::Tt);

    let xml = write_zwo(&workout).unwrap();
    assert!(xml.contains(r#"<tag name="Recovery"/>"#));
    assert!(xml.contains(r#"<tag name="TT"/>"#));
}

#[test]
fn test_capitalized_pace_attribute() {
    let xml = r#"<workout_file>
        <sportType>run</sportType>
        <workout>
            <SteadyState Duration="400" Power="0.9" Pace="4"/>
        </workout>
    </workout_file>"#;

    let file = parse_zwo(xml).unwrap();
    assert_eq!(file.segments[0].pace, PaceIndex::Marathon);
    assert_eq!(file.segments[0].length_meters(), 400);
}

#[test]
fn test_pace_out_of_range_defaults() {
    let xml = r#"<workout_file><workout>
        <SteadyState Duration="60" Power="0.9" pace="9"/>
    </workout></workout_file>"#;

    let file = parse_zwo(xml).unwrap();
    assert_eq!(file.segments[0].pace, PaceIndex::OneMile);
}

#[test]
fn test_missing_sport_type_reads_as_bike() {
    let xml = r#"<workout_file><workout>
        <SteadyState Duration="120" Power="0.5"/>
    </workout></workout_file>"#;

    let file = parse_zwo(xml).unwrap();
    assert_eq!(file.sport_type, SportType::Bike);
    assert_eq!(file.segments[0].duration_seconds(), 120);
}

#[test]
fn test_steady_falls_back_to_power_low() {
    let xml = r#"<workout_file><workout>
        <SteadyState Duration="120" PowerLow="0.65"/>
    </workout></workout_file>"#;

    let file = parse_zwo(xml).unwrap();
    match file.segments[0].block {
        Block::Steady { power, .. } => assert_eq!(power, 0.65),
        ref other => panic!("Expected steady, got {:?}", other),
    }
}

#[test]
fn test_missing_required_attribute() {
    let xml = r#"<workout_file><workout>
        <Warmup Duration="300" PowerLow="0.4"/>
    </workout></workout_file>"#;

    match parse_zwo(xml) {
        Err(WorkoutParseError::MissingField(field)) => assert_eq!(field, "PowerHigh"),
        other => panic!("Expected missing field, got {:?}", other),
    }
}

#[test]
fn test_wrong_root_is_rejected() {
    let xml = r#"<workout><SteadyState Duration="60" Power="1"/></workout>"#;
    assert!(matches!(
        parse_zwo(xml),
        Err(WorkoutParseError::UnexpectedRoot(ref root)) if root == "workout"
    ));
}

#[test]
fn test_free_ride_and_intervals_parse() {
    let xml = r#"<workout_file><workout>
        <FreeRide Duration="900"/>
        <IntervalsT Repeat="5" OnDuration="30" OffDuration="30" OnPower="1.5" OffPower="0.4"/>
    </workout></workout_file>"#;

    let file = parse_zwo(xml).unwrap();
    assert_eq!(file.segments[0].kind(), SegmentType::FreeRide);
    assert_eq!(file.segments[0].duration_seconds(), 900);
    assert_eq!(file.segments[1].kind(), SegmentType::Intervals);
    assert_eq!(file.segments[1].duration_seconds(), 300);
}

#[test]
fn test_file_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intervals.zwo");

    let mut workout = Workout::default();
    workout.name = "File".to_string();
    workout.add_intervals(IntervalsParams::default());
    write_zwo_to_file(&workout, &path).unwrap();

    let file = parse_zwo_file(&path).unwrap();
    assert_eq!(file.name.as_deref(), Some("File"));
    assert_eq!(file.segments.len(), 1);

    match parse_zwo_file(&dir.path().join("missing.zwo")) {
        Err(WorkoutParseError::IoError(_)) => {}
        other => panic!("Expected IO error, got {:?}", other),
    }
}
