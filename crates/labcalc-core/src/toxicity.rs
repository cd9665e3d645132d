//! Acute toxicity classification from LD50

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered toxicity classes, most toxic first
///
/// The derived `Ord` follows declaration order, so a larger LD50 never maps
/// to a smaller (more toxic) class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToxicityClass {
    ExtremelyToxic,
    HighlyToxic,
    ModeratelyToxic,
    SlightlyToxic,
    PracticallyNonToxic,
}

/// Upper LD50 bound (mg/kg, inclusive) of each class except the last
const THRESHOLDS: [(f64, ToxicityClass); 4] = [
    (1.0, ToxicityClass::ExtremelyToxic),
    (50.0, ToxicityClass::HighlyToxic),
    (500.0, ToxicityClass::ModeratelyToxic),
    (5000.0, ToxicityClass::SlightlyToxic),
];

impl ToxicityClass {
    /// Classify an LD50 given in mg/kg
    pub fn from_ld50(ld50_mg_per_kg: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(upper, _)| ld50_mg_per_kg <= *upper)
            .map(|&(_, class)| class)
            .unwrap_or(ToxicityClass::PracticallyNonToxic)
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            ToxicityClass::ExtremelyToxic => "EXTREMELY TOXIC",
            ToxicityClass::HighlyToxic => "HIGHLY TOXIC",
            ToxicityClass::ModeratelyToxic => "MODERATELY TOXIC",
            ToxicityClass::SlightlyToxic => "SLIGHTLY TOXIC",
            ToxicityClass::PracticallyNonToxic => "PRACTICALLY NON-TOXIC",
        }
    }

    /// Ordinal rank, 0 for the most toxic class
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ToxicityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
