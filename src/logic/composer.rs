use super::rules::{AdvisoryContext, RulesEngine};
use crate::advisors::AdvisoryProvider;
use crate::models::{
    AdvisoryReport, Consultation, CropProfile, Cultivar, DailyRecord, NutrientFocus,
    PhenologyState, Recommendation, Stage, WeatherAssessment,
};
use chrono::{DateTime, Local};
use std::fmt::Write;

/// Inputs for one advisory run
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryInput<'a> {
    pub crop: &'a CropProfile,
    pub cultivar: &'a Cultivar,
    /// Stage reported by the grower; the thermal estimate is used when absent
    pub stage: Option<&'a Stage>,
    /// Sampled forecast, today first; empty when the forecast is unavailable
    pub records: &'a [DailyRecord],
    pub phenology: &'a PhenologyState,
    pub note: &'a str,
}

/// Everything in a report except the consultation
#[derive(Debug, Clone)]
pub struct AdvisoryDraft {
    pub generated_at: DateTime<Local>,
    pub crop: String,
    pub cultivar: String,
    pub crop_coefficient: f64,
    pub stage: Stage,
    pub expected_stage: String,
    pub weather: Option<WeatherAssessment>,
    pub phenology: PhenologyState,
    pub nutrient_focus: NutrientFocus,
    pub recommendations: Vec<Recommendation>,
    pub note: String,
}

impl AdvisoryDraft {
    /// Prompt for the advisory provider, embedding the day's indicators
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();
        let _ = writeln!(
            prompt,
            "Crop: {} (cultivar {}, Kc {:.2}), stage {}.",
            self.crop, self.cultivar, self.crop_coefficient, self.stage.name
        );
        let _ = writeln!(prompt, "Stage management: {}", self.stage.management);
        let _ = writeln!(
            prompt,
            "Phenology: {} days since {}, {:.0} of {:.0} growing degree-days ({}), harvest progress {:.1}%.",
            self.phenology.elapsed_days,
            self.phenology.reference_date,
            self.phenology.accumulated_gda,
            self.phenology.target_gda,
            self.phenology.mode.as_str().to_lowercase(),
            self.phenology.harvest_progress
        );

        match &self.weather {
            Some(w) => {
                let _ = writeln!(
                    prompt,
                    "Today: {:.1} °C, humidity {:.0}%, wind {:.1} m/s, rain {:.1} mm.",
                    w.today.temp_c, w.today.humidity_percent, w.today.wind_speed_ms, w.today.rainfall_mm
                );
                let _ = writeln!(
                    prompt,
                    "VPD {:.2} kPa ({}), Delta T {:.1} °C (spraying {}), disease risk {}.",
                    w.today.vpd_kpa,
                    w.vpd_band.description(),
                    w.today.delta_t_c,
                    w.spray_window.as_str().to_lowercase(),
                    w.disease_risk.as_str().to_lowercase()
                );
                let _ = writeln!(prompt, "Water balance: {}", w.water_balance.summary());
            }
            None => {
                let _ = writeln!(prompt, "Weather forecast unavailable today.");
            }
        }

        let _ = writeln!(
            prompt,
            "Nutrient focus: {}. {}",
            self.nutrient_focus,
            self.nutrient_focus.rationale()
        );

        if self.note.trim().is_empty() {
            let _ = writeln!(prompt, "Grower note: none.");
        } else {
            let _ = writeln!(prompt, "Grower note: {}", self.note.trim());
        }
        prompt.push_str("What should the grower do today?");
        prompt
    }

    pub fn finish(self, consultation: Consultation) -> AdvisoryReport {
        AdvisoryReport {
            generated_at: self.generated_at,
            crop: self.crop,
            cultivar: self.cultivar,
            crop_coefficient: self.crop_coefficient,
            stage: self.stage.name,
            expected_stage: self.expected_stage,
            weather: self.weather,
            phenology: self.phenology,
            nutrient_focus: self.nutrient_focus,
            recommendations: self.recommendations,
            note: self.note,
            consultation,
        }
    }
}

/// Turns sampled weather and phenology into an advisory report
pub struct AdvisoryComposer {
    engine: RulesEngine,
}

impl AdvisoryComposer {
    pub fn new() -> Self {
        Self {
            engine: RulesEngine::new(),
        }
    }

    /// Classify conditions and run the rules; no I/O
    pub fn assess(&self, input: &AdvisoryInput<'_>) -> AdvisoryDraft {
        let weather = WeatherAssessment::new(input.records);
        let expected = input.crop.stage_for_progress(input.phenology.harvest_progress);
        let stage = input.stage.unwrap_or(expected);

        let ctx = AdvisoryContext {
            weather: weather.as_ref(),
            phenology: input.phenology,
            crop: input.crop,
            cultivar: input.cultivar,
            stage,
        };
        let recommendations = self.engine.evaluate(&ctx);

        AdvisoryDraft {
            generated_at: Local::now(),
            crop: input.crop.name().to_string(),
            cultivar: input.cultivar.name.clone(),
            crop_coefficient: input.cultivar.crop_coefficient,
            stage: stage.clone(),
            expected_stage: expected.name.clone(),
            weather,
            phenology: input.phenology.clone(),
            nutrient_focus: NutrientFocus::from_elapsed_days(input.phenology.elapsed_days),
            recommendations,
            note: input.note.trim().to_string(),
        }
    }

    pub async fn compose(
        &self,
        input: &AdvisoryInput<'_>,
        provider: &AdvisoryProvider,
    ) -> AdvisoryReport {
        let draft = self.assess(input);
        let prompt = draft.prompt();
        tracing::debug!(source = %provider.source(), "Consulting advisor");
        let consultation = provider.consult(&prompt, &draft.note).await;
        draft.finish(consultation)
    }
}

impl Default for AdvisoryComposer {
    fn default() -> Self {
        Self::new()
    }
}
