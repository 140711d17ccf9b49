//! Unit tests for workout metrics, zones and running paces.

use workout_editor::metrics::calculator::{
    estimated_run_workout_duration, pace_to_speed, power_watts, summarize,
};
use workout_editor::metrics::{
    estimate_running_times, format_duration, total_distance, total_duration,
    training_stress_score, PaceIndex, RaceTimes, Zone,
};
use workout_editor::workouts::{
    Block, IntervalsParams, RampParams, SportType, SteadyParams, Workout,
};

fn steady(power: f64, duration_seconds: u32) -> SteadyParams {
    SteadyParams {
        duration_seconds,
        ..SteadyParams::new(power)
    }
}

#[test]
fn test_tss_hour_at_threshold() {
    let mut workout = Workout::default();
    workout.add_steady(steady(1.0, 3600));

    let tss = training_stress_score(&workout, workout.athlete.ftp_watts);
    assert!((tss - 100.0).abs() < 1e-9, "TSS was {}", tss);
}

#[test]
fn test_tss_half_hour_at_threshold_split() {
    let mut workout = Workout::default();
    workout.add_steady(steady(1.0, 900));
    workout.add_steady(steady(1.0, 900));

    let tss = training_stress_score(&workout, 200);
    assert!((tss - 50.0).abs() < 1e-9);
}

#[test]
fn test_tss_intervals() {
    let mut workout = Workout::default();
    workout.add_intervals(IntervalsParams {
        repeat: 4,
        on_duration_seconds: 360,
        off_duration_seconds: 360,
        on_power: 1.0,
        off_power: 0.5,
        ..IntervalsParams::default()
    });

    // 4 * (360 * 1.0 + 360 * 0.25) / 36
    let tss = training_stress_score(&workout, 250);
    assert!((tss - 50.0).abs() < 1e-9);
}

#[test]
fn test_free_ride_adds_time_not_stress() {
    let mut workout = Workout::default();
    workout.add_steady(steady(0.5, 600));
    let before = training_stress_score(&workout, 200);

    workout.add_free_ride(600);
    assert_eq!(training_stress_score(&workout, 200), before);
    assert_eq!(total_duration(&workout), 1200);
}

#[test]
fn test_duration_is_sum_of_segments() {
    let mut workout = Workout::default();
    workout.add_steady(steady(0.6, 120));
    workout.add_ramp(RampParams {
        duration_seconds: 240,
        ..RampParams::new(0.5, 0.8)
    });
    workout.add_intervals(IntervalsParams::default());

    assert_eq!(total_duration(&workout), 120 + 240 + 450);
    assert_eq!(total_distance(&workout), 200 + 1000 + 1200);

    let summary = summarize(&workout);
    assert_eq!(summary.duration_seconds, total_duration(&workout));
    assert_eq!(summary.distance_meters, total_distance(&workout));
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0), "00:00");
    assert_eq!(format_duration(59), "00:59");
    assert_eq!(format_duration(3600), "01:00:00");
}

#[test]
fn test_power_watts() {
    assert_eq!(power_watts(0.75, 200), 150);
    assert_eq!(power_watts(1.053, 250), 263);
}

#[test]
fn test_zone_boundaries() {
    assert_eq!(Zone::for_power(0.5), Zone::Z1);
    assert_eq!(Zone::for_power(0.605), Zone::Z2);
    assert_eq!(Zone::for_power(0.9), Zone::Z3);
    assert_eq!(Zone::for_power(1.0), Zone::Z4);
    assert_eq!(Zone::for_power(1.1), Zone::Z5);
    assert_eq!(Zone::for_power(1.5), Zone::Z6);
    assert_eq!(Zone::for_power(3.0), Zone::Z6);
}

#[test]
fn test_zone_defaults_land_in_their_zone() {
    let mut workout = Workout::default();
    for zone in Zone::ALL {
        workout.add_steady_in_zone(zone);
    }

    let zones: Vec<Zone> = workout
        .segments
        .iter()
        .map(|segment| match segment.block {
            Block::Steady { power, .. } => Zone::for_power(power),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(zones, Zone::ALL.to_vec());
    assert_eq!(Zone::Z5.name(), "VO2max");
}

#[test]
fn test_estimate_keeps_provided_times() {
    let times = RaceTimes {
        five_km: Some(20 * 60),
        marathon: Some(3 * 3600 + 30 * 60),
        ..Default::default()
    };
    let estimated = estimate_running_times(&times);

    assert!(estimated.is_complete());
    assert_eq!(estimated.five_km, Some(1200));
    assert_eq!(estimated.marathon, Some(12600));
    assert!(estimated.ten_km.unwrap() > 1200);
    assert!(estimated.ten_km.unwrap() < estimated.half_marathon.unwrap());
}

#[test]
fn test_estimate_from_five_km_only() {
    let times = RaceTimes {
        five_km: Some(22 * 60),
        ..Default::default()
    };
    let estimated = estimate_running_times(&times);

    assert_eq!(estimated.five_km, Some(1320));
    for pace in [
        PaceIndex::OneMile,
        PaceIndex::TenKm,
        PaceIndex::HalfMarathon,
        PaceIndex::Marathon,
    ] {
        assert!(estimated.get(pace).is_some_and(|t| t > 0), "{:?} missing", pace);
    }
    assert!(estimated.one_mile.unwrap() < 1320);
    assert!(estimated.ten_km.unwrap() > 1320);
    assert!(estimated.ten_km.unwrap() < estimated.half_marathon.unwrap());
    assert!(estimated.half_marathon.unwrap() < estimated.marathon.unwrap());
}

#[test]
fn test_estimate_on_workout_fills_gaps() {
    let mut workout = Workout::default();
    workout.set_race_time(PaceIndex::TenKm, Some(45 * 60));
    workout.estimate_race_times();

    let times = workout.athlete.race_times;
    assert_eq!(times.ten_km, Some(2700));
    assert!(times.is_complete());
}

#[test]
fn test_pace_to_speed() {
    let mut workout = Workout::default();
    workout.set_race_time(PaceIndex::TenKm, Some(2500));
    assert!((pace_to_speed(&workout, PaceIndex::TenKm) - 4.0).abs() < 1e-9);
    assert_eq!(pace_to_speed(&workout, PaceIndex::Marathon), 0.0);
}

#[test]
fn test_run_workout_duration_estimate() {
    let mut workout = Workout::default();
    workout.set_sport_type(SportType::Run);
    workout.set_race_time(PaceIndex::FiveKm, Some(1250));
    workout.add_steady(SteadyParams {
        length_meters: 2000,
        pace: PaceIndex::FiveKm,
        ..SteadyParams::new(1.0)
    });
    workout.add_steady(SteadyParams {
        length_meters: 1000,
        pace: PaceIndex::FiveKm,
        ..SteadyParams::new(0.5)
    });

    // 2000 m at 4 m/s, then 1000 m at 2 m/s
    assert_eq!(estimated_run_workout_duration(&workout), 500 + 500);
}
