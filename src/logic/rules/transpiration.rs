use super::{AdvisoryContext, Rule};
use crate::models::{
    DailyRecord, Recommendation, RecommendationCategory, Severity, VpdBand,
};

/// Transpiration rule - reads atmospheric demand from the vapour pressure deficit
///
/// Bands:
/// - Saturated: VPD < 0.4 kPa, leaves cannot shed water, uptake of calcium slows
/// - Ideal: 0.4-1.3 kPa
/// - Dry: VPD > 1.3 kPa, stomata close to save water and photosynthesis drops
///
/// Severity:
/// - Info: ideal band
/// - Advisory: saturated air
/// - Warning: dry air
/// - Critical: VPD above 2.0 kPa, or a negative VPD from a bad humidity reading
pub struct TranspirationRule;

const SEVERE_VPD_KPA: f64 = 2.0;

impl Rule for TranspirationRule {
    fn id(&self) -> &'static str {
        "transpiration"
    }

    fn name(&self) -> &'static str {
        "Transpiration (VPD)"
    }

    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation> {
        let weather = ctx.weather?;
        let today = &weather.today;

        if today.vpd_suspect() {
            return Some(self.suspect_reading(today));
        }

        let severity = match weather.vpd_band {
            VpdBand::Ideal => Severity::Info,
            VpdBand::Saturated => Severity::Advisory,
            VpdBand::Dry if today.vpd_kpa > SEVERE_VPD_KPA => Severity::Critical,
            VpdBand::Dry => Severity::Warning,
        };

        Some(self.build_recommendation(weather.vpd_band, severity, today))
    }
}

impl TranspirationRule {
    fn build_recommendation(
        &self,
        band: VpdBand,
        severity: Severity,
        today: &DailyRecord,
    ) -> Recommendation {
        let (title, action) = match band {
            VpdBand::Ideal => (
                "Ideal Transpiration",
                "No intervention needed. Good conditions for foliar feeding.",
            ),
            VpdBand::Saturated => (
                "Saturated Air",
                "Improve canopy ventilation (leaf removal, wider row airflow). \
                 Avoid overhead irrigation until the air dries.",
            ),
            VpdBand::Dry => (
                "Dry Air - Stomatal Closure",
                "Irrigate early in the morning. Postpone foliar applications to \
                 the cooler part of the day.",
            ),
        };

        Recommendation::new(
            self.id(),
            RecommendationCategory::Transpiration,
            severity,
            title,
            format!(
                "VPD is {:.2} kPa: {}.",
                today.vpd_kpa,
                band.description()
            ),
        )
        .with_explanation(
            "The vapour pressure deficit is the drying power of the air. Between 0.4 \
             and 1.3 kPa the plant transpires freely and keeps nutrient flow moving. \
             Below that the leaf cannot lose water; above it the stomata close.",
        )
        .with_data_point("VPD", format!("{:.2} kPa", today.vpd_kpa))
        .with_data_point("Temperature", format!("{:.1} °C", today.temp_c))
        .with_data_point("Humidity", format!("{:.0}%", today.humidity_percent))
        .with_action(action)
    }

    fn suspect_reading(&self, today: &DailyRecord) -> Recommendation {
        Recommendation::new(
            self.id(),
            RecommendationCategory::Transpiration,
            Severity::Critical,
            "Suspect Humidity Reading",
            format!(
                "Forecast humidity of {:.0}% gives a negative VPD ({:.2} kPa).",
                today.humidity_percent, today.vpd_kpa
            ),
        )
        .with_explanation(
            "Relative humidity above 100% is not physical, so the transpiration \
             reading for today cannot be trusted.",
        )
        .with_data_point("VPD", format!("{:.2} kPa", today.vpd_kpa))
        .with_data_point("Humidity", format!("{:.0}%", today.humidity_percent))
        .with_action("Check the forecast source before acting on today's indicators.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::fixtures::Scenario;
    use crate::models::daily::fixtures::record;

    fn evaluate(temp_c: f64, humidity: f64) -> Recommendation {
        let scenario = Scenario::new(&[record(temp_c, humidity, 0.0)], 30);
        TranspirationRule.evaluate(&scenario.context()).unwrap()
    }

    #[test]
    fn ideal_band_is_informational() {
        let rec = evaluate(25.0, 60.0);
        assert_eq!(rec.severity, Severity::Info);
        assert!(rec.summary.contains("1.27 kPa"));
    }

    #[test]
    fn saturated_air_is_advisory() {
        let rec = evaluate(18.0, 95.0);
        assert_eq!(rec.severity, Severity::Advisory);
        assert!(rec.summary.contains("saturated air"));
    }

    #[test]
    fn dry_air_escalates_with_deficit() {
        // 30 °C / 50% -> 2.12 kPa
        assert_eq!(evaluate(30.0, 50.0).severity, Severity::Critical);
        // 25 °C / 55% -> 1.43 kPa
        assert_eq!(evaluate(25.0, 55.0).severity, Severity::Warning);
    }

    #[test]
    fn negative_vpd_is_flagged() {
        let rec = evaluate(20.0, 104.0);
        assert_eq!(rec.title, "Suspect Humidity Reading");
    }

    #[test]
    fn silent_without_forecast() {
        let scenario = Scenario::new(&[], 30);
        assert!(TranspirationRule.evaluate(&scenario.context()).is_none());
    }
}
