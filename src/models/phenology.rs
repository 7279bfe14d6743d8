use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the accumulated growing-degree total was obtained.
///
/// The daily history is built from the first forecast sample of each
/// refresh, so "recorded" temperatures are forecast readings rather than
/// station measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GdaMode {
    /// Every elapsed day has a recorded temperature
    Measured,
    /// Recorded days plus the recorded daily mean for the missing days,
    /// once enough days are recorded
    Extrapolated,
    /// Recorded days (possibly none) plus a fixed average daily accumulation
    /// for every missing day
    Approximated,
}

impl GdaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GdaMode::Measured => "Measured",
            GdaMode::Extrapolated => "Extrapolated",
            GdaMode::Approximated => "Approximated",
        }
    }
}

impl std::fmt::Display for GdaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A day's representative temperature, as kept in the local history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub date: NaiveDate,
    pub temp_c: f64,
}

impl TemperatureSample {
    pub fn new(date: NaiveDate, temp_c: f64) -> Self {
        Self { date, temp_c }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenologyState {
    pub reference_date: NaiveDate,
    pub evaluated_on: NaiveDate,
    pub elapsed_days: u32,
    pub accumulated_gda: f64,
    pub mode: GdaMode,
    pub measured_days: u32,
    pub target_gda: f64,
    /// Progress to harvest, 0-100 %, one decimal
    pub harvest_progress: f64,
}

impl PhenologyState {
    pub fn remaining_gda(&self) -> f64 {
        (self.target_gda - self.accumulated_gda).max(0.0)
    }

    pub fn harvest_ready(&self) -> bool {
        self.harvest_progress >= 100.0
    }
}
