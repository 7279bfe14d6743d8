use crate::models::{DiseaseRisk, SprayWindow, VpdBand};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// A boxed reading with a proportional bar underneath
pub struct GaugeWidget<'a> {
    title: &'a str,
    value: Option<f64>,
    unit: &'a str,
    min: f64,
    max: f64,
    color: fn(f64) -> Color,
    precision: usize,
}

impl<'a> GaugeWidget<'a> {
    pub fn new(title: &'a str, value: Option<f64>, unit: &'a str) -> Self {
        Self {
            title,
            value,
            unit,
            min: 0.0,
            max: 100.0,
            color: |_| Theme::FG,
            precision: 1,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Colour of the reading and bar for a given value
    pub fn color(mut self, color: fn(f64) -> Color) -> Self {
        self.color = color;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    fn color_for(&self, value: f64) -> Color {
        (self.color)(value)
    }

    fn ratio(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

impl Widget for GaugeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(value) = self.value else {
            Paragraph::new(Span::styled("N/A", Theme::dim())).render(inner, buf);
            return;
        };

        let color = self.color_for(value);
        let text = format!("{:.prec$}{}", value, self.unit, prec = self.precision);
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .render(inner, buf);

        if inner.height < 2 {
            return;
        }
        let y = inner.y + 1;
        let filled = (inner.width as f64 * self.ratio(value)) as u16;
        for x in inner.x..inner.x + inner.width {
            let ch = if x < inner.x + filled { '█' } else { '░' };
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }
}

pub fn temperature_gauge(title: &str, value: Option<f64>) -> GaugeWidget<'_> {
    GaugeWidget::new(title, value, "°C")
        .range(-5.0, 45.0)
        .color(Theme::temp_color)
}

/// Red once humidity alone means high disease pressure
pub fn humidity_gauge(title: &str, value: Option<f64>) -> GaugeWidget<'_> {
    GaugeWidget::new(title, value, "%")
        .range(0.0, 100.0)
        .precision(0)
        .color(|h| Theme::disease_color(DiseaseRisk::classify(h, 0.0)))
}

pub fn vpd_gauge(title: &str, value: Option<f64>) -> GaugeWidget<'_> {
    GaugeWidget::new(title, value, " kPa")
        .range(0.0, 3.0)
        .precision(2)
        .color(|v| Theme::vpd_color(VpdBand::classify(v)))
}

/// Green inside the spray window
pub fn delta_t_gauge(title: &str, value: Option<f64>) -> GaugeWidget<'_> {
    GaugeWidget::new(title, value, "°C")
        .range(0.0, 12.0)
        .color(|dt| Theme::spray_color(SprayWindow::classify(dt)))
}

pub fn progress_gauge(title: &str, value: Option<f64>) -> GaugeWidget<'_> {
    GaugeWidget::new(title, value, "%")
        .range(0.0, 100.0)
        .color(|p| if p >= 100.0 { Theme::SUCCESS } else { Theme::HIGHLIGHT })
}
