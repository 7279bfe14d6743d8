use super::physics::round_to;
use crate::error::{CropOpsError, Result};
use crate::models::{CropProfile, GdaMode, PhenologyState, TemperatureSample};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Whole days from the reference (planting/pruning) date to `today`.
/// Negative when the reference date lies in the future.
pub fn elapsed_days(reference: NaiveDate, today: NaiveDate) -> i64 {
    (today - reference).num_days()
}

/// Harvest progress in percent, one decimal, clamped to [0, 100]
pub fn harvest_progress(accumulated_gda: f64, target_gda: f64) -> f64 {
    if target_gda <= 0.0 {
        return 100.0;
    }
    round_to(100.0 * accumulated_gda / target_gda, 1).clamp(0.0, 100.0)
}

/// Recorded days needed before their mean may stand in for missing days
const MIN_EXTRAPOLATION_DAYS: u32 = 7;

/// ... and the share of elapsed days they must cover, in percent
const MIN_EXTRAPOLATION_COVERAGE_PCT: u32 = 20;

/// Growing-degree accumulation towards a crop's thermal target.
///
/// With a full daily temperature history the total is
/// `Σ max(0, T − base)` over the elapsed days. Once the history is broad
/// enough, missing days are filled with the mean of the recorded days.
/// Below that, missing days count at `average_daily_gda`, which is only an
/// approximation of the real accumulation; with no history at all this is
/// `elapsed_days × average_daily_gda`.
#[derive(Debug, Clone, Copy)]
pub struct PhenologyAccumulator {
    base_temp_c: f64,
    target_gda: f64,
    average_daily_gda: f64,
}

impl PhenologyAccumulator {
    pub fn new(base_temp_c: f64, target_gda: f64, average_daily_gda: f64) -> Self {
        Self {
            base_temp_c,
            target_gda,
            average_daily_gda,
        }
    }

    pub fn for_crop(crop: &CropProfile) -> Self {
        Self::new(crop.base_temp_c, crop.target_gda, crop.average_daily_gda)
    }

    pub fn with_target(mut self, target_gda: f64) -> Self {
        self.target_gda = target_gda;
        self
    }

    pub fn with_average_daily_gda(mut self, average_daily_gda: f64) -> Self {
        self.average_daily_gda = average_daily_gda;
        self
    }

    pub fn daily_gda(&self, temp_c: f64) -> f64 {
        (temp_c - self.base_temp_c).max(0.0)
    }

    pub fn accumulate(
        &self,
        reference: NaiveDate,
        today: NaiveDate,
        history: &[TemperatureSample],
    ) -> Result<PhenologyState> {
        let elapsed = elapsed_days(reference, today);
        if elapsed < 0 {
            return Err(CropOpsError::InvalidData(format!(
                "reference date {} is after {}",
                reference, today
            )));
        }
        let elapsed = u32::try_from(elapsed)
            .map_err(|_| CropOpsError::InvalidData("reference date too far in the past".into()))?;

        // Only days in [reference, today) count; a later sample for the same
        // date replaces an earlier one.
        let window: BTreeMap<NaiveDate, f64> = history
            .iter()
            .filter(|s| s.date >= reference && s.date < today)
            .map(|s| (s.date, s.temp_c))
            .collect();

        let measured_days = window.len() as u32;
        let measured_gda: f64 = window.values().map(|t| self.daily_gda(*t)).sum();

        let missing = f64::from(elapsed.saturating_sub(measured_days));
        let (accumulated_gda, mode) = if measured_days >= elapsed {
            (measured_gda, GdaMode::Measured)
        } else if can_extrapolate(measured_days, elapsed) {
            let mean = measured_gda / f64::from(measured_days);
            (measured_gda + missing * mean, GdaMode::Extrapolated)
        } else {
            // A recorded day only ever adds to the daily-average baseline
            (
                measured_gda + missing * self.average_daily_gda,
                GdaMode::Approximated,
            )
        };

        let accumulated_gda = round_to(accumulated_gda, 1);

        Ok(PhenologyState {
            reference_date: reference,
            evaluated_on: today,
            elapsed_days: elapsed,
            accumulated_gda,
            mode,
            measured_days,
            target_gda: self.target_gda,
            harvest_progress: harvest_progress(accumulated_gda, self.target_gda),
        })
    }
}

/// Whether `measured` recorded days are a fair sample of `elapsed`
fn can_extrapolate(measured: u32, elapsed: u32) -> bool {
    measured >= MIN_EXTRAPOLATION_DAYS
        && u64::from(measured) * 100 >= u64::from(elapsed) * u64::from(MIN_EXTRAPOLATION_COVERAGE_PCT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(reference: NaiveDate, days: i64, temp_c: f64) -> Vec<TemperatureSample> {
        (0..days)
            .map(|i| TemperatureSample::new(reference + Duration::days(i), temp_c))
            .collect()
    }

    #[test]
    fn elapsed_days_counts_whole_days() {
        assert_eq!(elapsed_days(date(2026, 1, 1), date(2026, 2, 20)), 50);
        assert_eq!(elapsed_days(date(2026, 1, 1), date(2026, 1, 1)), 0);
        assert_eq!(elapsed_days(date(2026, 1, 10), date(2026, 1, 1)), -9);
    }

    #[test]
    fn partial_history_extrapolates_to_600() {
        let reference = date(2026, 1, 1);
        let today = reference + Duration::days(50);
        let acc = PhenologyAccumulator::new(10.0, 1200.0, 8.0);

        let state = acc
            .accumulate(reference, today, &history(reference, 20, 22.0))
            .unwrap();

        assert_eq!(state.elapsed_days, 50);
        assert_eq!(state.measured_days, 20);
        assert_eq!(state.mode, GdaMode::Extrapolated);
        assert_eq!(state.accumulated_gda, 600.0);
        assert_eq!(state.harvest_progress, 50.0);
    }

    #[test]
    fn full_history_is_measured_sum() {
        let reference = date(2026, 1, 1);
        let today = reference + Duration::days(3);
        let samples = vec![
            TemperatureSample::new(reference, 12.0),
            TemperatureSample::new(reference + Duration::days(1), 8.0),
            TemperatureSample::new(reference + Duration::days(2), 25.5),
        ];

        let state = PhenologyAccumulator::new(10.0, 1000.0, 9.0)
            .accumulate(reference, today, &samples)
            .unwrap();

        assert_eq!(state.mode, GdaMode::Measured);
        // 2 + 0 + 15.5
        assert_eq!(state.accumulated_gda, 17.5);
    }

    #[test]
    fn no_history_uses_daily_average() {
        let reference = date(2026, 1, 1);
        let today = reference + Duration::days(40);
        let state = PhenologyAccumulator::new(10.0, 1600.0, 11.0)
            .accumulate(reference, today, &[])
            .unwrap();

        assert_eq!(state.mode, GdaMode::Approximated);
        assert_eq!(state.accumulated_gda, 440.0);
        assert_eq!(state.harvest_progress, 27.5);
    }

    #[test]
    fn samples_outside_window_are_ignored() {
        let reference = date(2026, 1, 10);
        let today = reference + Duration::days(2);
        let samples = vec![
            TemperatureSample::new(date(2026, 1, 9), 40.0),
            TemperatureSample::new(reference, 20.0),
            TemperatureSample::new(reference + Duration::days(1), 20.0),
            TemperatureSample::new(today, 40.0),
        ];

        let state = PhenologyAccumulator::new(10.0, 100.0, 0.0)
            .accumulate(reference, today, &samples)
            .unwrap();
        assert_eq!(state.accumulated_gda, 20.0);
        assert_eq!(state.mode, GdaMode::Measured);
    }

    #[test]
    fn duplicate_dates_keep_last_sample() {
        let reference = date(2026, 1, 1);
        let today = reference + Duration::days(1);
        let samples = vec![
            TemperatureSample::new(reference, 30.0),
            TemperatureSample::new(reference, 14.0),
        ];
        let state = PhenologyAccumulator::new(10.0, 100.0, 0.0)
            .accumulate(reference, today, &samples)
            .unwrap();
        assert_eq!(state.accumulated_gda, 4.0);
    }

    #[test]
    fn future_reference_date_is_rejected() {
        let result = PhenologyAccumulator::new(10.0, 100.0, 5.0).accumulate(
            date(2026, 5, 1),
            date(2026, 4, 1),
            &[],
        );
        assert!(matches!(result, Err(CropOpsError::InvalidData(_))));
    }

    #[test]
    fn progress_never_exceeds_100() {
        assert_eq!(harvest_progress(5000.0, 1200.0), 100.0);
        assert_eq!(harvest_progress(0.0, 1200.0), 0.0);
        assert_eq!(harvest_progress(123.0, 1000.0), 12.3);
    }

    #[test]
    fn progress_is_monotonic_in_elapsed_days() {
        let reference = date(2026, 1, 1);
        let samples = history(reference, 30, 18.0);
        let acc = PhenologyAccumulator::new(10.0, 900.0, 6.0);

        let mut previous = 0.0;
        for days in 0..200 {
            let state = acc
                .accumulate(reference, reference + Duration::days(days), &samples)
                .unwrap();
            assert!(state.harvest_progress >= previous);
            assert!(state.harvest_progress <= 100.0);
            previous = state.harvest_progress;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn sparse_history_keeps_daily_average() {
        let reference = date(2026, 1, 1);
        let today = reference + Duration::days(100);
        let samples = history(reference + Duration::days(90), 6, 12.0);

        let state = PhenologyAccumulator::new(10.0, 1600.0, 11.0)
            .accumulate(reference, today, &samples)
            .unwrap();

        assert_eq!(state.mode, GdaMode::Approximated);
        assert_eq!(state.measured_days, 6);
        // 6 × 2 recorded + 94 × 11
        assert_eq!(state.accumulated_gda, 1046.0);
    }

    #[test]
    fn daily_recording_never_sets_progress_back() {
        let reference = date(2025, 9, 1);
        let acc = PhenologyAccumulator::new(10.0, 1600.0, 11.0);
        let mut samples = Vec::new();

        let mut today = date(2025, 12, 10);
        let mut previous = acc.accumulate(reference, today, &samples).unwrap();
        assert_eq!(previous.mode, GdaMode::Approximated);

        for _ in 0..10 {
            // A cool day is recorded, well below the crop's average
            samples.push(TemperatureSample::new(today, 12.0));
            today += Duration::days(1);
            let state = acc.accumulate(reference, today, &samples).unwrap();
            assert!(state.harvest_progress >= previous.harvest_progress);
            assert!(state.accumulated_gda >= previous.accumulated_gda);
            previous = state;
        }
        assert_eq!(previous.measured_days, 10);
        assert_eq!(previous.mode, GdaMode::Approximated);
    }

    #[test]
    fn extrapolation_needs_enough_days() {
        assert!(!can_extrapolate(1, 3));
        assert!(!can_extrapolate(6, 10));
        assert!(can_extrapolate(7, 35));
        assert!(!can_extrapolate(7, 36));
        assert!(can_extrapolate(20, 50));
    }

    #[test]
    fn temperatures_below_base_add_nothing() {
        let acc = PhenologyAccumulator::new(10.0, 100.0, 0.0);
        assert_eq!(acc.daily_gda(4.0), 0.0);
        assert_eq!(acc.daily_gda(13.5), 3.5);
    }
}
