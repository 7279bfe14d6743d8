use crate::models::{BalanceStatus, DiseaseRisk, SprayWindow, VpdBand};
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const DIM: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Green;
    pub const HIGHLIGHT: Color = Color::Cyan;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Weather colors, temperatures in °C
    pub const TEMP_COLD: Color = Color::LightBlue;
    pub const TEMP_COOL: Color = Color::Cyan;
    pub const TEMP_WARM: Color = Color::Yellow;
    pub const TEMP_HOT: Color = Color::Red;
    pub const WET: Color = Color::LightBlue;

    // Styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Self::FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn temp_color(temp_c: f64) -> Color {
        if temp_c < 5.0 {
            Self::TEMP_COLD
        } else if temp_c < 15.0 {
            Self::TEMP_COOL
        } else if temp_c < 28.0 {
            Self::TEMP_WARM
        } else {
            Self::TEMP_HOT
        }
    }

    pub fn vpd_color(band: VpdBand) -> Color {
        match band {
            VpdBand::Saturated => Self::WET,
            VpdBand::Ideal => Self::SUCCESS,
            VpdBand::Dry => Self::WARNING,
        }
    }

    pub fn spray_color(window: SprayWindow) -> Color {
        if window.is_favorable() {
            Self::SUCCESS
        } else {
            Self::WARNING
        }
    }

    pub fn disease_color(risk: DiseaseRisk) -> Color {
        match risk {
            DiseaseRisk::Low => Self::SUCCESS,
            DiseaseRisk::High => Self::ERROR,
        }
    }

    pub fn balance_color(status: BalanceStatus) -> Color {
        match status {
            BalanceStatus::Deficit => Self::WARNING,
            BalanceStatus::Balanced => Self::SUCCESS,
            BalanceStatus::Surplus => Self::WET,
        }
    }

    pub fn nav_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_label() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_bands() {
        assert_eq!(Theme::temp_color(-2.0), Theme::TEMP_COLD);
        assert_eq!(Theme::temp_color(22.0), Theme::TEMP_WARM);
        assert_eq!(Theme::temp_color(35.0), Theme::TEMP_HOT);
    }

    #[test]
    fn condition_colors() {
        assert_eq!(Theme::vpd_color(VpdBand::Dry), Theme::WARNING);
        assert_eq!(Theme::disease_color(DiseaseRisk::High), Theme::ERROR);
        assert_eq!(Theme::balance_color(BalanceStatus::Surplus), Theme::WET);
    }
}
