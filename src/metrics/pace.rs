//! Running pace references.
//!
//! Run workouts express effort as a fraction of one of five personal-best
//! race paces. Missing personal bests are extrapolated with a power-law
//! (Riegel-style) fit: `t = a * d^b`, fitted in log-log space.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::workouts::types::AthleteProfile;

/// Race distances in kilometers, indexed by [`PaceIndex`].
pub const RACE_DISTANCES_KM: [f64; 5] = [1.60934, 5.0, 10.0, 21.0975, 42.195];

/// Reference effort always included in the fit: 11:20 over one mile.
const REFERENCE_DISTANCE_KM: f64 = 1.60934;
const REFERENCE_TIME_SECONDS: f64 = 680.0;

/// Riegel's fatigue exponent, used when the data cannot determine one.
const RIEGEL_EXPONENT: f64 = 1.06;

/// Fitted exponents are kept in this range so predictions stay monotonic.
const MIN_EXPONENT: f64 = 1.0;
const MAX_EXPONENT: f64 = 1.2;

/// One of the five personal-best race efforts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PaceIndex {
    #[default]
    OneMile,
    FiveKm,
    TenKm,
    HalfMarathon,
    Marathon,
}

impl PaceIndex {
    pub const ALL: [PaceIndex; 5] = [
        PaceIndex::OneMile,
        PaceIndex::FiveKm,
        PaceIndex::TenKm,
        PaceIndex::HalfMarathon,
        PaceIndex::Marathon,
    ];

    /// Position in the pace table (0-4).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a pace by table position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn distance_km(self) -> f64 {
        RACE_DISTANCES_KM[self.index()]
    }

    /// Short label shown next to run targets.
    pub fn label(self) -> &'static str {
        match self {
            PaceIndex::OneMile => "1M",
            PaceIndex::FiveKm => "5K",
            PaceIndex::TenKm => "10K",
            PaceIndex::HalfMarathon => "HM",
            PaceIndex::Marathon => "M",
        }
    }
}

impl From<PaceIndex> for u8 {
    fn from(pace: PaceIndex) -> Self {
        pace as u8
    }
}

impl TryFrom<u8> for PaceIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PaceIndex::from_index(value as usize).ok_or_else(|| format!("pace index out of range: {}", value))
    }
}

/// Personal-best race times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaceTimes {
    pub one_mile: Option<u32>,
    pub five_km: Option<u32>,
    pub ten_km: Option<u32>,
    pub half_marathon: Option<u32>,
    pub marathon: Option<u32>,
}

impl RaceTimes {
    pub fn get(&self, pace: PaceIndex) -> Option<u32> {
        match pace {
            PaceIndex::OneMile => self.one_mile,
            PaceIndex::FiveKm => self.five_km,
            PaceIndex::TenKm => self.ten_km,
            PaceIndex::HalfMarathon => self.half_marathon,
            PaceIndex::Marathon => self.marathon,
        }
    }

    pub fn set(&mut self, pace: PaceIndex, seconds: Option<u32>) {
        let slot = match pace {
            PaceIndex::OneMile => &mut self.one_mile,
            PaceIndex::FiveKm => &mut self.five_km,
            PaceIndex::TenKm => &mut self.ten_km,
            PaceIndex::HalfMarathon => &mut self.half_marathon,
            PaceIndex::Marathon => &mut self.marathon,
        };
        *slot = seconds;
    }

    /// True when every entry holds a positive time.
    pub fn is_complete(&self) -> bool {
        PaceIndex::ALL
            .iter()
            .all(|pace| self.get(*pace).is_some_and(|t| t > 0))
    }
}

/// Fill missing race times from the ones present.
///
/// Provided (non-zero) times are returned unchanged. The fit always includes
/// the fixed 11:20 mile reference, so an athlete with no times at all still
/// gets a full table.
pub fn estimate_running_times(times: &RaceTimes) -> RaceTimes {
    let mut points: Vec<(f64, f64)> = PaceIndex::ALL
        .iter()
        .filter_map(|pace| {
            times
                .get(*pace)
                .filter(|t| *t > 0)
                .map(|t| (pace.distance_km().ln(), (t as f64).ln()))
        })
        .collect();
    points.push((REFERENCE_DISTANCE_KM.ln(), REFERENCE_TIME_SECONDS.ln()));

    let (intercept, exponent) = fit_power_law(&points);
    tracing::debug!(exponent, points = points.len(), "Estimated race time curve");

    let mut estimated = *times;
    for pace in PaceIndex::ALL {
        if times.get(pace).is_some_and(|t| t > 0) {
            continue;
        }
        let seconds = (intercept + exponent * pace.distance_km().ln()).exp();
        estimated.set(pace, Some(seconds.round() as u32));
    }
    estimated
}

/// Least-squares line through log-log points, returning `(ln a, b)`.
fn fit_power_law(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let variance: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let covariance: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let exponent = if variance > f64::EPSILON {
        (covariance / variance).clamp(MIN_EXPONENT, MAX_EXPONENT)
    } else {
        RIEGEL_EXPONENT
    };

    // Intercept for the (possibly clamped) exponent.
    let intercept = mean_y - exponent * mean_x;
    (intercept, exponent)
}

/// Speed in meters per second for the athlete's personal best at `pace`.
///
/// Returns `0.0` when the time is missing or zero.
pub fn speed_for_pace(athlete: &AthleteProfile, pace: PaceIndex) -> f64 {
    match athlete.race_times.get(pace) {
        Some(seconds) if seconds > 0 => pace.distance_km() * 1000.0 / seconds as f64,
        _ => 0.0,
    }
}

/// Parse a race time written as `hh:mm:ss` or `mm:ss`.
pub fn parse_race_time(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&format!("00:{}", value), "%H:%M:%S"))
        .ok()
        .map(|time| time.num_seconds_from_midnight())
}

/// Format a race time as `hh:mm:ss`.
pub fn format_race_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
