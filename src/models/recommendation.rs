use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Transpiration,
    Spraying,
    DiseasePressure,
    Nutrition,
    WaterBalance,
    CropStage,
}

impl RecommendationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Transpiration => "Transpiration",
            RecommendationCategory::Spraying => "Spraying",
            RecommendationCategory::DiseasePressure => "Disease Pressure",
            RecommendationCategory::Nutrition => "Nutrition",
            RecommendationCategory::WaterBalance => "Water Balance",
            RecommendationCategory::CropStage => "Crop Stage",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            RecommendationCategory::Transpiration => Color::Cyan,
            RecommendationCategory::Spraying => Color::Yellow,
            RecommendationCategory::DiseasePressure => Color::Magenta,
            RecommendationCategory::Nutrition => Color::Green,
            RecommendationCategory::WaterBalance => Color::Blue,
            RecommendationCategory::CropStage => Color::LightGreen,
        }
    }
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Advisory,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Advisory => "Advisory",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            Severity::Info => Color::Gray,
            Severity::Advisory => Color::Blue,
            Severity::Warning => Color::Yellow,
            Severity::Critical => Color::Red,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ",
            Severity::Advisory => "→",
            Severity::Warning => "⚠",
            Severity::Critical => "!",
        }
    }

    /// Plain-text marker for mail reports, where glyphs may not survive
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "[info]",
            Severity::Advisory => "[advisory]",
            Severity::Warning => "[WARNING]",
            Severity::Critical => "[CRITICAL]",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A labelled figure backing a recommendation, e.g. "VPD = 1.42 kPa"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
}

impl DataPoint {
    pub fn new(label: &str, value: impl std::fmt::Display) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub rule_id: String,
    pub category: RecommendationCategory,
    pub severity: Severity,
    pub title: String,
    pub summary: String,
    pub explanation: String,
    pub data_points: Vec<DataPoint>,
    pub action: Option<String>,
    /// Set from the dashboard once the grower has read it
    pub acknowledged: bool,
}

impl Recommendation {
    pub fn new(
        rule_id: impl Into<String>,
        category: RecommendationCategory,
        severity: Severity,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            category,
            severity,
            title: title.into(),
            summary: summary.into(),
            explanation: String::new(),
            data_points: Vec::new(),
            action: None,
            acknowledged: false,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_data_point(mut self, label: &str, value: impl std::fmt::Display) -> Self {
        self.data_points.push(DataPoint::new(label, value));
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Multi-line plain-text block used by the mail report
    pub fn to_plain_text(&self) -> String {
        let mut out = format!(
            "{} {} - {}\n  {}\n",
            self.severity.tag(),
            self.category,
            self.title,
            self.summary
        );
        if !self.data_points.is_empty() {
            let figures: Vec<String> = self
                .data_points
                .iter()
                .map(|dp| format!("{}: {}", dp.label, dp.value))
                .collect();
            out.push_str(&format!("  ({})\n", figures.join("; ")));
        }
        if let Some(ref action) = self.action {
            out.push_str(&format!("  Action: {}\n", action));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Advisory);
        assert!(Severity::Advisory > Severity::Info);
    }

    #[test]
    fn plain_text_includes_figures_and_action() {
        let rec = Recommendation::new(
            "transpiration",
            RecommendationCategory::Transpiration,
            Severity::Warning,
            "Dry Air",
            "Stomata are closing.",
        )
        .with_data_point("VPD", "1.52 kPa")
        .with_data_point("Humidity", "38%")
        .with_action("Irrigate early in the morning.");

        let text = rec.to_plain_text();
        assert!(text.starts_with("[WARNING] Transpiration - Dry Air"));
        assert!(text.contains("(VPD: 1.52 kPa; Humidity: 38%)"));
        assert!(text.contains("Action: Irrigate early in the morning."));
    }

    #[test]
    fn plain_text_without_extras_is_two_lines() {
        let rec = Recommendation::new(
            "nutrition",
            RecommendationCategory::Nutrition,
            Severity::Info,
            "Nutrient Focus",
            "Phosphorus and calcium.",
        );
        assert_eq!(rec.to_plain_text().lines().count(), 2);
    }
}
