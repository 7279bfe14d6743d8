use super::{AdvisoryContext, Rule};
use crate::models::{Recommendation, RecommendationCategory, Severity};

/// Crop stage rule - management notes for the current phenological stage
///
/// Compares the stage the grower reports with the one the thermal
/// accumulation predicts. A mismatch is worth flagging: either the reference
/// date is off, or the season runs warmer or cooler than the crop average.
pub struct CropStageRule;

impl Rule for CropStageRule {
    fn id(&self) -> &'static str {
        "crop_stage"
    }

    fn name(&self) -> &'static str {
        "Crop Stage"
    }

    fn evaluate(&self, ctx: &AdvisoryContext<'_>) -> Option<Recommendation> {
        let phenology = ctx.phenology;
        let stage = ctx.stage;
        let expected = ctx.crop.stage_for_progress(phenology.harvest_progress);

        let (severity, title) = if phenology.harvest_ready() {
            (Severity::Advisory, "Thermal Target Reached".to_string())
        } else if expected.name != stage.name {
            (
                Severity::Advisory,
                format!("{} Reported, {} Expected", stage.name, expected.name),
            )
        } else {
            (Severity::Info, stage.name.clone())
        };

        let summary = if phenology.harvest_ready() {
            format!(
                "{:.0} °C·day accumulated against a target of {:.0}; the crop should be ready to harvest.",
                phenology.accumulated_gda, phenology.target_gda
            )
        } else {
            format!("{} {}", stage.description, stage.physiology)
        };

        let mut rec = Recommendation::new(
            self.id(),
            RecommendationCategory::CropStage,
            severity,
            title,
            summary,
        )
        .with_explanation(format!(
            "Growing degrees above the {:.0} °C base temperature of {} drive \
             development. Progress is {} from {} recorded days.",
            ctx.crop.base_temp_c,
            ctx.crop.name().to_lowercase(),
            phenology.mode.as_str().to_lowercase(),
            phenology.measured_days
        ))
        .with_data_point("GDA", format!("{:.0} °C·day", phenology.accumulated_gda))
        .with_data_point("Progress", format!("{:.1}%", phenology.harvest_progress))
        .with_data_point("Expected stage", &expected.name);

        if phenology.remaining_gda() > 0.0 {
            rec = rec.with_data_point(
                "Remaining",
                format!("{:.0} °C·day", phenology.remaining_gda()),
            );
        }

        Some(rec.with_action(stage.management.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::fixtures::Scenario;

    #[test]
    fn matching_stage_is_informational() {
        // 40 days × 11 °C·day = 27.5% of the grape target
        let scenario = Scenario::new(&[], 40);
        let rec = CropStageRule.evaluate(&scenario.context()).unwrap();
        assert_eq!(rec.severity, Severity::Info);
        assert_eq!(rec.title, "Flowering");
    }

    #[test]
    fn mismatched_stage_is_flagged() {
        let scenario = Scenario::new(&[], 40).with_stage("Veraison");
        let rec = CropStageRule.evaluate(&scenario.context()).unwrap();
        assert_eq!(rec.severity, Severity::Advisory);
        assert_eq!(rec.title, "Veraison Reported, Flowering Expected");
    }

    #[test]
    fn harvest_ready_when_target_reached() {
        let scenario = Scenario::new(&[], 200);
        let rec = CropStageRule.evaluate(&scenario.context()).unwrap();
        assert_eq!(rec.title, "Thermal Target Reached");
        assert!(!rec.data_points.iter().any(|dp| dp.label == "Remaining"));
    }
}
