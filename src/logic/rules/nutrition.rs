use super::{AdvisoryContext, Rule};
use crate::models::{
    NutrientFocus, Recommendation, RecommendationCategory, Severity, VpdBand,
};

/// Nutrition rule - nutrient emphasis by days since planting/pruning
///
/// - under 90 days: phosphorus + calcium
/// - 90-179 days: nitrogen + magnesium
/// - 180 days on: potassium + boron
pub struct NutritionRule;

impl Rule for NutritionRule {
    fn id(&self) -> &'static str {
        "nutrition"
    }

    fn name(&self) -> &'static str {
        "Nutrient Focus"
    }

    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation> {
        let elapsed = ctx.phenology.elapsed_days;
        let focus = NutrientFocus::from_elapsed_days(elapsed);

        // Foliar uptake is poor when the leaf can't transpire
        let foliar_ok = ctx
            .weather
            .map(|w| w.vpd_band == VpdBand::Ideal);

        let action = match foliar_ok {
            Some(true) => format!("Apply {} as planned; foliar uptake is good today.", focus),
            Some(false) => format!(
                "Apply {} through the soil or fertigation; foliar uptake is poor today.",
                focus
            ),
            None => format!("Apply {} as planned.", focus),
        };

        Some(
            Recommendation::new(
                self.id(),
                RecommendationCategory::Nutrition,
                Severity::Info,
                format!("Focus: {}", focus),
                focus.rationale(),
            )
            .with_explanation(format!(
                "Nutrient demand follows the cycle of {}. {} days have passed since \
                 the reference date.",
                ctx.crop.name().to_lowercase(),
                elapsed
            ))
            .with_data_point("Days elapsed", elapsed)
            .with_action(action),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::fixtures::Scenario;
    use crate::models::daily::fixtures::record;

    #[test]
    fn focus_follows_elapsed_days() {
        let early = Scenario::new(&[], 30);
        let rec = NutritionRule.evaluate(&early.context()).unwrap();
        assert_eq!(rec.title, "Focus: Phosphorus + Calcium");

        let late = Scenario::new(&[], 200);
        let rec = NutritionRule.evaluate(&late.context()).unwrap();
        assert_eq!(rec.title, "Focus: Potassium + Boron");
    }

    #[test]
    fn dry_air_moves_feeding_to_soil() {
        let scenario = Scenario::new(&[record(30.0, 50.0, 0.0)], 120);
        let rec = NutritionRule.evaluate(&scenario.context()).unwrap();
        assert!(rec.action.unwrap().contains("fertigation"));
    }
}
