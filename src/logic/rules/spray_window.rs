use super::{AdvisoryContext, Rule};
use crate::models::{
    DailyRecord, Recommendation, RecommendationCategory, Severity, SprayWindow,
};

/// Spray window rule - judges today's spraying conditions from Delta T
///
/// Delta T (dry bulb minus wet bulb) tracks how fast a droplet evaporates:
/// - below 2 °C droplets stay wet, run off the leaf and drift far
/// - 2-8 °C is the accepted application window
/// - above 8 °C droplets shrink before reaching the target
///
/// When today is outside the window the rule names the next forecast day
/// that falls inside it, or warns when none does.
pub struct SprayWindowRule;

impl Rule for SprayWindowRule {
    fn id(&self) -> &'static str {
        "spray_window"
    }

    fn name(&self) -> &'static str {
        "Spray Window (Delta T)"
    }

    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation> {
        let weather = ctx.weather?;
        let today = &weather.today;

        if weather.spray_window.is_favorable() {
            return Some(self.open_window(today, &ctx.stage.chemical_control));
        }

        Some(self.closed_window(today, weather.next_spray_day()))
    }
}

impl SprayWindowRule {
    fn open_window(&self, today: &DailyRecord, chemical_control: &str) -> Recommendation {
        Recommendation::new(
            self.id(),
            RecommendationCategory::Spraying,
            Severity::Info,
            "Spray Window Open",
            format!(
                "Delta T of {:.1} °C is inside the {:.0}-{:.0} °C window.",
                today.delta_t_c,
                SprayWindow::MIN_DELTA_T,
                SprayWindow::MAX_DELTA_T
            ),
        )
        .with_explanation(
            "Droplets dry at a rate that lets the product settle and be absorbed \
             without running off or evaporating in flight.",
        )
        .with_data_point("Delta T", format!("{:.1} °C", today.delta_t_c))
        .with_data_point("Wind", format!("{:.1} m/s", today.wind_speed_ms))
        .with_action(format!(
            "Suitable for applications planned for this stage: {}",
            chemical_control
        ))
    }

    fn closed_window(&self, today: &DailyRecord, next: Option<&DailyRecord>) -> Recommendation {
        let reason = if today.delta_t_c < SprayWindow::MIN_DELTA_T {
            "air too humid, droplets run off and drift"
        } else {
            "air too dry, droplets evaporate before reaching the leaf"
        };

        let (severity, title, action) = match next {
            Some(day) => (
                Severity::Advisory,
                "Spray Window Closed Today".to_string(),
                format!(
                    "Hold chemical applications. Next favourable day: {} (Delta T {:.1} °C).",
                    day.label(),
                    day.delta_t_c
                ),
            ),
            None => (
                Severity::Warning,
                "No Spray Window in Forecast".to_string(),
                "Hold chemical applications. If treatment cannot wait, spray at dawn \
                 or dusk when Delta T is closest to the window."
                    .to_string(),
            ),
        };

        let mut rec = Recommendation::new(
            self.id(),
            RecommendationCategory::Spraying,
            severity,
            title,
            format!(
                "Delta T of {:.1} °C is unfavorable for chemical applications: {}.",
                today.delta_t_c, reason
            ),
        )
        .with_explanation(
            "Outside a Delta T of 2-8 °C product efficacy drops and off-target \
             losses rise.",
        )
        .with_data_point("Delta T", format!("{:.1} °C", today.delta_t_c));

        if let Some(day) = next {
            rec = rec.with_data_point("Next window", day.label());
        }

        rec.with_action(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::fixtures::Scenario;
    use crate::models::daily::fixtures::record;
    use chrono::Duration;

    #[test]
    fn favourable_today_is_info() {
        let scenario = Scenario::new(&[record(25.0, 60.0, 0.0)], 30);
        let rec = SprayWindowRule.evaluate(&scenario.context()).unwrap();
        assert_eq!(rec.severity, Severity::Info);
        assert!(rec.action.unwrap().contains(&scenario.context().stage.chemical_control));
    }

    #[test]
    fn closed_today_names_next_day() {
        let mut days = vec![
            record(20.0, 97.0, 0.0),
            record(35.0, 20.0, 0.0),
            record(22.0, 70.0, 0.0),
        ];
        for (i, day) in days.iter_mut().enumerate() {
            day.date += Duration::days(i as i64);
        }
        let scenario = Scenario::new(&days, 30);
        let rec = SprayWindowRule.evaluate(&scenario.context()).unwrap();

        assert_eq!(rec.severity, Severity::Advisory);
        assert!(rec.summary.contains("too humid"));
        assert!(rec.action.unwrap().contains("17/01"));
    }

    #[test]
    fn no_window_in_forecast_warns() {
        let scenario = Scenario::new(&[record(35.0, 20.0, 0.0), record(20.0, 97.0, 0.0)], 30);
        let rec = SprayWindowRule.evaluate(&scenario.context()).unwrap();
        assert_eq!(rec.severity, Severity::Warning);
        assert!(rec.summary.contains("too dry"));
    }
}
