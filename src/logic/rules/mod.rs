pub mod crop_stage;
pub mod disease_pressure;
pub mod engine;
pub mod nutrition;
pub mod spray_window;
pub mod transpiration;
pub mod water_balance;

pub use engine::RulesEngine;

use crate::models::{
    CropProfile, Cultivar, PhenologyState, Recommendation, Stage, WeatherAssessment,
};

/// Everything a rule may look at for one advisory run
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    /// `None` when the forecast could not be fetched
    pub weather: Option<&'a WeatherAssessment>,
    pub phenology: &'a PhenologyState,
    pub crop: &'a CropProfile,
    pub cultivar: &'a Cultivar,
    /// Stage the grower reports the crop to be in
    pub stage: &'a Stage,
}

/// Trait for agronomic rules
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate the rule and return a recommendation if it has something to say
    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::logic::phenology::PhenologyAccumulator;
    use crate::models::{CropId, CropRegistry, DailyRecord};
    use chrono::{Duration, NaiveDate};

    pub struct Scenario {
        pub crop: CropProfile,
        pub weather: Option<WeatherAssessment>,
        pub phenology: PhenologyState,
        pub stage: String,
    }

    impl Scenario {
        pub fn new(days: &[DailyRecord], elapsed_days: i64) -> Self {
            let registry = CropRegistry::builtin().unwrap();
            let crop = registry.get(CropId::Grape).unwrap().clone();
            let reference = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
            let phenology = PhenologyAccumulator::for_crop(&crop)
                .accumulate(reference, reference + Duration::days(elapsed_days), &[])
                .unwrap();
            let stage = crop
                .stage_for_progress(phenology.harvest_progress)
                .name
                .clone();
            Self {
                crop,
                weather: WeatherAssessment::new(days),
                phenology,
                stage,
            }
        }

        pub fn with_stage(mut self, stage: &str) -> Self {
            self.stage = stage.to_string();
            self
        }

        pub fn context(&self) -> AdvisoryContext<'_> {
            AdvisoryContext {
                weather: self.weather.as_ref(),
                phenology: &self.phenology,
                crop: &self.crop,
                cultivar: self.crop.default_cultivar(),
                stage: self.crop.stage(&self.stage).unwrap(),
            }
        }
    }
}
