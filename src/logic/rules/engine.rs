use super::{
    crop_stage::CropStageRule, disease_pressure::DiseasePressureRule, nutrition::NutritionRule,
    spray_window::SprayWindowRule, transpiration::TranspirationRule,
    water_balance::WaterBalanceRule, AdvisoryContext, Rule,
};
use crate::models::Recommendation;

pub struct RulesEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(TranspirationRule),
            Box::new(SprayWindowRule),
            Box::new(DiseasePressureRule),
            Box::new(WaterBalanceRule),
            Box::new(NutritionRule),
            Box::new(CropStageRule),
        ];

        Self { rules }
    }

    /// All recommendations for the context, most severe first
    pub fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(ctx))
            .collect();
        // Stable, so rules of equal severity keep registration order
        recommendations.sort_by(|a, b| b.severity.cmp(&a.severity));
        recommendations
    }

    /// `(id, name)` of every registered rule, in evaluation order
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::fixtures::Scenario;
    use crate::models::daily::fixtures::record;

    #[test]
    fn every_rule_reports_with_weather() {
        let scenario = Scenario::new(&[record(25.0, 60.0, 0.0), record(22.0, 70.0, 1.0)], 40);
        let recs = RulesEngine::new().evaluate(&scenario.context());
        assert_eq!(recs.len(), 6);
        assert!(recs.windows(2).all(|w| w[0].severity >= w[1].severity));
    }

    #[test]
    fn weather_rules_stay_silent_without_forecast() {
        let scenario = Scenario::new(&[], 40);
        let recs = RulesEngine::new().evaluate(&scenario.context());
        let ids: Vec<&str> = recs.iter().map(|r| r.rule_id.as_str()).collect();
        assert!(ids.contains(&"nutrition"));
        assert!(ids.contains(&"crop_stage"));
        assert!(!ids.contains(&"transpiration"));
        assert!(!ids.contains(&"spray_window"));
    }

    #[test]
    fn rules_are_listed_in_order() {
        let rules = RulesEngine::new().list_rules();
        assert_eq!(rules.len(), 6);
        assert_eq!(rules[0].0, "transpiration");
        assert_eq!(rules[5].0, "crop_stage");
    }
}
