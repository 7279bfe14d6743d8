use super::{AdvisoryContext, Rule};
use crate::models::{
    BalanceStatus, Recommendation, RecommendationCategory, Severity, WaterBalance,
};

/// Water balance rule - forecast rainfall against crop water use (ETc)
///
/// Severity:
/// - Info: balanced horizon, or a small surplus
/// - Advisory: deficit up to 10 mm, or a surplus above 20 mm (waterlogging)
/// - Warning: deficit beyond 10 mm over the horizon
pub struct WaterBalanceRule;

const LARGE_DEFICIT_MM: f64 = 10.0;
const LARGE_SURPLUS_MM: f64 = 20.0;

impl Rule for WaterBalanceRule {
    fn id(&self) -> &'static str {
        "water_balance"
    }

    fn name(&self) -> &'static str {
        "Water Balance"
    }

    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation> {
        let balance = &ctx.weather?.water_balance;
        let horizon = balance.horizon_balance_mm();
        let status = balance.horizon_status();

        let (severity, title, action) = match status {
            BalanceStatus::Deficit if horizon < -LARGE_DEFICIT_MM => (
                Severity::Warning,
                "Water Deficit",
                format!(
                    "Plan irrigation of about {:.0} mm over the next {} days.",
                    -horizon, balance.horizon_days
                ),
            ),
            BalanceStatus::Deficit => (
                Severity::Advisory,
                "Slight Water Deficit",
                format!(
                    "Top up {:.1} mm by irrigation or watch soil moisture.",
                    -horizon
                ),
            ),
            BalanceStatus::Surplus if horizon > LARGE_SURPLUS_MM => (
                Severity::Advisory,
                "Water Surplus",
                "Suspend irrigation and check drainage in low spots.".to_string(),
            ),
            BalanceStatus::Surplus => (
                Severity::Info,
                "Rain Covers Crop Demand",
                "Suspend irrigation while the rain lasts.".to_string(),
            ),
            BalanceStatus::Balanced => (
                Severity::Info,
                "Water Balanced",
                "Keep the current irrigation schedule.".to_string(),
            ),
        };

        Some(self.build_recommendation(severity, title, action, balance, ctx))
    }
}

impl WaterBalanceRule {
    fn build_recommendation(
        &self,
        severity: Severity,
        title: &str,
        action: String,
        balance: &WaterBalance,
        ctx: &AdvisoryContext<'_>,
    ) -> Recommendation {
        let mut rec = Recommendation::new(
            self.id(),
            RecommendationCategory::WaterBalance,
            severity,
            title,
            balance.summary(),
        )
        .with_explanation(format!(
            "Crop water use is reference evapotranspiration scaled by the crop \
             coefficient of {} (Kc {:.2}). Rainfall minus that use gives the \
             water left for the soil profile.",
            ctx.cultivar.name, ctx.cultivar.crop_coefficient
        ))
        .with_data_point("Rain", format!("{:.1} mm", balance.horizon_rain_mm))
        .with_data_point("ETc", format!("{:.2} mm", balance.horizon_etc_mm))
        .with_data_point("Balance", format!("{:+.2} mm", balance.horizon_balance_mm()));

        if balance.today_etc_mm.is_none() {
            rec = rec.with_data_point("Today ETc", "out of domain");
        }

        rec.with_action(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::fixtures::Scenario;
    use crate::models::daily::fixtures::record;

    fn evaluate(days: &[crate::models::DailyRecord]) -> Recommendation {
        let scenario = Scenario::new(days, 60);
        WaterBalanceRule.evaluate(&scenario.context()).unwrap()
    }

    #[test]
    fn dry_week_is_a_deficit() {
        let mut day = record(30.0, 40.0, 0.0);
        day.etc_mm = Some(3.0);
        let rec = evaluate(&vec![day; 5]);
        assert_eq!(rec.severity, Severity::Warning);
        assert!(rec.action.unwrap().contains("15 mm"));
    }

    #[test]
    fn small_deficit_is_advisory() {
        let rec = evaluate(&[record(25.0, 60.0, 0.0)]);
        assert_eq!(rec.severity, Severity::Advisory);
        assert_eq!(rec.title, "Slight Water Deficit");
    }

    #[test]
    fn heavy_rain_is_a_surplus() {
        let rec = evaluate(&[record(20.0, 90.0, 15.0), record(20.0, 90.0, 12.0)]);
        assert_eq!(rec.title, "Water Surplus");
    }

    #[test]
    fn freezing_day_marks_etc_out_of_domain() {
        let rec = evaluate(&[record(-2.0, 80.0, 0.0)]);
        assert_eq!(rec.title, "Water Balanced");
        assert!(rec
            .data_points
            .iter()
            .any(|dp| dp.value == "out of domain"));
    }
}
