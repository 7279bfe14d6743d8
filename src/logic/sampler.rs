use super::physics::{
    crop_evapotranspiration, reference_evapotranspiration, round_to, vapor_pressure_deficit,
};
use crate::error::Result;
use crate::models::{DailyObservation, DailyRecord, WeatherForecast};
use tracing::{debug, warn};

/// Samples per day in the 3-hourly feed
pub const SAMPLES_PER_DAY: usize = 8;

/// Days covered by the forecast feed
pub const MAX_FORECAST_DAYS: usize = 5;

/// Reduces a 3-hourly forecast to one record per day.
///
/// The first observation of each block of eight stands in for the whole day
/// (it is not a daily mean); rainfall is the sum of the block.
#[derive(Debug, Clone, Copy)]
pub struct ForecastSampler {
    crop_coefficient: f64,
}

impl ForecastSampler {
    pub fn new(crop_coefficient: f64) -> Self {
        Self { crop_coefficient }
    }

    pub fn sample(&self, observations: &[DailyObservation]) -> Vec<DailyRecord> {
        observations
            .chunks(SAMPLES_PER_DAY)
            .take(MAX_FORECAST_DAYS)
            .filter_map(|block| self.daily_record(block))
            .collect()
    }

    /// Sample the outcome of a forecast fetch. A failed fetch yields no days,
    /// which callers must read as "forecast unavailable".
    pub fn sample_fetched(&self, fetched: Result<WeatherForecast>) -> Vec<DailyRecord> {
        match fetched {
            Ok(forecast) => {
                let days = self.sample(&forecast.observations);
                debug!(
                    location = %forecast.location.name,
                    samples = forecast.observations.len(),
                    days = days.len(),
                    "Forecast sampled"
                );
                days
            }
            Err(e) => {
                warn!("Forecast unavailable: {}", e);
                Vec::new()
            }
        }
    }

    fn daily_record(&self, block: &[DailyObservation]) -> Option<DailyRecord> {
        let representative = block.first()?;
        let rainfall_mm: f64 = block.iter().map(DailyObservation::rainfall_mm).sum();

        let (vpd_kpa, delta_t_c) =
            vapor_pressure_deficit(representative.temp_c, representative.humidity_percent);

        let et0_mm = match reference_evapotranspiration(representative.temp_c) {
            Ok(et0) => Some(round_to(et0, 2)),
            Err(e) => {
                debug!("{}", e);
                None
            }
        };
        let etc_mm = et0_mm.map(|et0| round_to(crop_evapotranspiration(et0, self.crop_coefficient), 2));

        Some(DailyRecord {
            date: representative.timestamp.date_naive(),
            temp_c: representative.temp_c,
            humidity_percent: representative.humidity_percent,
            wind_speed_ms: representative.wind_speed_ms,
            vpd_kpa,
            delta_t_c,
            rainfall_mm: round_to(rainfall_mm, 2),
            et0_mm,
            etc_mm,
            condition: representative.condition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CropOpsError;
    use crate::models::{ForecastLocation, WeatherCondition};
    use chrono::{Duration, TimeZone, Utc};

    fn feed(count: usize) -> Vec<DailyObservation> {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| DailyObservation {
                timestamp: start + Duration::hours(3 * i as i64),
                temp_c: 15.0 + i as f64,
                humidity_percent: 50.0 + (i % 8) as f64,
                wind_speed_ms: 1.5,
                rain_3h_mm: if i % 3 == 0 { Some(0.25 * i as f64) } else { None },
                condition: WeatherCondition::Clouds,
            })
            .collect()
    }

    #[test]
    fn forty_samples_make_five_days_with_block_rain_sums() {
        let observations = feed(40);
        let days = ForecastSampler::new(0.8).sample(&observations);
        assert_eq!(days.len(), 5);

        for (day, block) in days.iter().zip(observations.chunks(8)) {
            let expected: f64 = block.iter().map(|o| o.rain_3h_mm.unwrap_or(0.0)).sum();
            assert!(
                (day.rainfall_mm - expected).abs() < 1e-9,
                "{} vs {}",
                day.rainfall_mm,
                expected
            );
        }
    }

    #[test]
    fn first_sample_of_block_is_representative() {
        let observations = feed(16);
        let days = ForecastSampler::new(1.0).sample(&observations);
        assert_eq!(days[0].temp_c, 15.0);
        assert_eq!(days[0].humidity_percent, 50.0);
        assert_eq!(days[1].temp_c, 23.0);
        assert_eq!(days[1].date, observations[8].timestamp.date_naive());
    }

    #[test]
    fn output_is_capped_at_five_days() {
        assert_eq!(ForecastSampler::new(1.0).sample(&feed(56)).len(), 5);
    }

    #[test]
    fn trailing_partial_block_still_counts() {
        let days = ForecastSampler::new(1.0).sample(&feed(12));
        assert_eq!(days.len(), 2);
        // samples 8..12 carry rain at i = 9 only
        assert!((days[1].rainfall_mm - 2.25).abs() < 1e-9);
    }

    #[test]
    fn derived_fields_follow_physics() {
        let mut observations = feed(8);
        observations[0].temp_c = 25.0;
        observations[0].humidity_percent = 60.0;

        let day = &ForecastSampler::new(0.5).sample(&observations)[0];
        assert_eq!(day.vpd_kpa, 1.27);
        assert_eq!(day.delta_t_c, 5.5);
        assert_eq!(day.et0_mm, Some(0.2));
        assert_eq!(day.etc_mm, Some(0.1));
    }

    #[test]
    fn freezing_sample_has_no_evapotranspiration() {
        let mut observations = feed(8);
        observations[0].temp_c = -4.0;

        let day = &ForecastSampler::new(1.0).sample(&observations)[0];
        assert!(day.et0_mm.is_none());
        assert!(day.etc_mm.is_none());
    }

    #[test]
    fn empty_feed_yields_no_days() {
        assert!(ForecastSampler::new(1.0).sample(&[]).is_empty());
    }

    #[test]
    fn failed_fetch_yields_no_days() {
        let sampler = ForecastSampler::new(1.0);
        let failed = Err(CropOpsError::DataSourceUnavailable("timeout".into()));
        assert!(sampler.sample_fetched(failed).is_empty());

        let ok = Ok(WeatherForecast {
            fetched_at: Utc::now(),
            location: ForecastLocation::default(),
            observations: feed(40),
        });
        assert_eq!(sampler.sample_fetched(ok).len(), 5);
    }
}
