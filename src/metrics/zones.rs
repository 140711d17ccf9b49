//! Training zones used by the editor.
//!
//! Six zones expressed as fractions of FTP. The Z1 floor is also the lowest
//! power an edit may set.

use serde::{Deserialize, Serialize};

/// RGB color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hex notation (`#rrggbb`).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Lowest power (fraction of FTP) any segment may hold.
pub const MIN_POWER: f64 = 0.1;

/// A power training zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Z1,
    Z2,
    Z3,
    Z4,
    Z5,
    Z6,
}

impl Zone {
    pub const ALL: [Zone; 6] = [Zone::Z1, Zone::Z2, Zone::Z3, Zone::Z4, Zone::Z5, Zone::Z6];

    /// Lower bound as a fraction of FTP.
    pub fn min(self) -> f64 {
        match self {
            Zone::Z1 => MIN_POWER,
            Zone::Z2 => 0.605,
            Zone::Z3 => 0.763,
            Zone::Z4 => 0.901,
            Zone::Z5 => 1.053,
            Zone::Z6 => 1.194,
        }
    }

    /// Upper bound as a fraction of FTP.
    pub fn max(self) -> f64 {
        match self {
            Zone::Z1 => 0.605,
            Zone::Z2 => 0.763,
            Zone::Z3 => 0.901,
            Zone::Z4 => 1.053,
            Zone::Z5 => 1.194,
            Zone::Z6 => 2.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Zone::Z1 => "Recovery",
            Zone::Z2 => "Endurance",
            Zone::Z3 => "Tempo",
            Zone::Z4 => "Threshold",
            Zone::Z5 => "VO2max",
            Zone::Z6 => "Anaerobic",
        }
    }

    pub fn color(self) -> Color {
        POWER_ZONE_COLORS[self as usize]
    }

    /// Zone containing `power`. Values past either end fall into Z1 or Z6.
    pub fn for_power(power: f64) -> Zone {
        Self::ALL
            .into_iter()
            .find(|zone| power < zone.max())
            .unwrap_or(Zone::Z6)
    }

    /// Zone bounds in watts for the given FTP.
    pub fn watts_range(self, ftp: u16) -> (u16, u16) {
        let ftp = ftp as f64;
        (
            (ftp * self.min()).round() as u16,
            (ftp * self.max()).round() as u16,
        )
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Z{}", *self as usize + 1)
    }
}

/// Zone colors, gray through red.
pub const POWER_ZONE_COLORS: [Color; 6] = [
    Color::new(128, 128, 128),
    Color::new(51, 141, 255),
    Color::new(90, 190, 90),
    Color::new(255, 204, 63),
    Color::new(255, 102, 57),
    Color::new(255, 51, 12),
];
