use super::{AdvisoryContext, Rule};
use crate::models::{
    DiseaseRisk, Recommendation, RecommendationCategory, Severity, WeatherAssessment,
};

/// Disease pressure rule - fungal infection risk from leaf wetness proxies
///
/// Risk factors (per day):
/// - Relative humidity above 85%
/// - More than 2 mm of rain
///
/// Severity levels:
/// - Info: today is low risk (protectant products are enough)
/// - Warning: today is high risk
/// - Critical: today is high risk and so are at least two more forecast days
pub struct DiseasePressureRule;

const SUSTAINED_RISK_DAYS: usize = 3;

impl Rule for DiseasePressureRule {
    fn id(&self) -> &'static str {
        "disease_pressure"
    }

    fn name(&self) -> &'static str {
        "Disease Pressure"
    }

    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation> {
        let weather = ctx.weather?;
        let risk_days = self.high_risk_days(weather);

        let severity = match weather.disease_risk {
            DiseaseRisk::Low => Severity::Info,
            DiseaseRisk::High if risk_days >= SUSTAINED_RISK_DAYS => Severity::Critical,
            DiseaseRisk::High => Severity::Warning,
        };

        Some(self.build_recommendation(severity, weather, risk_days, &ctx.stage.chemical_control))
    }
}

impl DiseasePressureRule {
    fn high_risk_days(&self, weather: &WeatherAssessment) -> usize {
        weather
            .outlook
            .iter()
            .filter(|d| DiseaseRisk::classify(d.humidity_percent, d.rainfall_mm) == DiseaseRisk::High)
            .count()
    }

    fn build_recommendation(
        &self,
        severity: Severity,
        weather: &WeatherAssessment,
        risk_days: usize,
        chemical_control: &str,
    ) -> Recommendation {
        let today = &weather.today;

        let title = match severity {
            Severity::Critical => "Sustained Disease Pressure",
            Severity::Warning => "High Disease Pressure",
            _ => "Low Disease Pressure",
        };

        let action = match weather.disease_risk {
            DiseaseRisk::High => format!(
                "Prefer systemic products. Stage programme: {}",
                chemical_control
            ),
            DiseaseRisk::Low => format!(
                "Protectant (contact) products are sufficient. Stage programme: {}",
                chemical_control
            ),
        };

        Recommendation::new(
            self.id(),
            RecommendationCategory::DiseasePressure,
            severity,
            title,
            format!(
                "Disease risk is {}: {}.",
                weather.disease_risk.as_str().to_lowercase(),
                weather.disease_risk.description()
            ),
        )
        .with_explanation(
            "Fungal spores germinate on wet leaf tissue. Humidity above 85% or more \
             than 2 mm of rain keeps leaves wet long enough for infection, and \
             protectant films are washed off.",
        )
        .with_data_point("Humidity", format!("{:.0}%", today.humidity_percent))
        .with_data_point("Rain", format!("{:.1} mm", today.rainfall_mm))
        .with_data_point(
            "High-risk days",
            format!("{} of {}", risk_days, weather.outlook.len()),
        )
        .with_action(action)
    }
}
