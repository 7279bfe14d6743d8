use crate::models::{DailyRecord, DiseaseRisk, SprayWindow, VpdBand, WeatherAssessment};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

/// Five-day outlook with the per-day bands
pub struct ForecastScreen<'a> {
    pub weather: Option<&'a WeatherAssessment>,
    pub selected_index: usize,
}

impl<'a> ForecastScreen<'a> {
    pub fn new(weather: Option<&'a WeatherAssessment>) -> Self {
        Self {
            weather,
            selected_index: 0,
        }
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }
}

impl Widget for ForecastScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(8),    // Table
                Constraint::Length(6), // Water balance
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Forecast", Theme::title()),
            Span::styled(" - representative sample per day", Theme::dim()),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        match self.weather {
            Some(w) => {
                self.render_table(w, chunks[1], buf);
                render_balance(w, chunks[2], buf);
            }
            None => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border());
                Paragraph::new(Span::styled(
                    "Forecast unavailable. Check the OpenWeatherMap settings and press r.",
                    Theme::warning(),
                ))
                .block(block)
                .render(chunks[1], buf);
            }
        }

        let nav = Line::from(vec![
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Navigate ", Theme::nav_label()),
            Span::styled("[r]", Theme::nav_key()),
            Span::styled("Refresh ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl ForecastScreen<'_> {
    fn render_table(&self, weather: &WeatherAssessment, area: Rect, buf: &mut Buffer) {
        let header = Row::new(
            [
                "Day", "Sky", "Temp", "RH", "Wind", "Rain", "VPD", "ΔT", "ET0", "ETc", "Spray",
                "Disease",
            ]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header())),
        );

        let rows: Vec<Row> = weather.outlook.iter().map(day_row).collect();

        let widths = [
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Min(7),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        state.select(Some(self.selected_index));
        StatefulWidget::render(table, area, buf, &mut state);
    }
}

fn day_row(day: &DailyRecord) -> Row<'static> {
    let band = VpdBand::classify(day.vpd_kpa);
    let spray = SprayWindow::classify(day.delta_t_c);
    let risk = DiseaseRisk::classify(day.humidity_percent, day.rainfall_mm);

    let vpd_text = if day.vpd_suspect() {
        format!("{:.2}?", day.vpd_kpa)
    } else {
        format!("{:.2}", day.vpd_kpa)
    };

    Row::new(vec![
        Cell::from(day.label()),
        Cell::from(day.condition.symbol()),
        Cell::from(format!("{:.1}°C", day.temp_c))
            .style(Style::default().fg(Theme::temp_color(day.temp_c))),
        Cell::from(format!("{:.0}%", day.humidity_percent)),
        Cell::from(format!("{:.1}m/s", day.wind_speed_ms)),
        Cell::from(format!("{:.1}mm", day.rainfall_mm)),
        Cell::from(vpd_text).style(Style::default().fg(Theme::vpd_color(band))),
        Cell::from(format!("{:.1}", day.delta_t_c))
            .style(Style::default().fg(Theme::spray_color(spray))),
        Cell::from(day.et0_display()),
        Cell::from(day.etc_display()),
        Cell::from(if spray.is_favorable() { "yes" } else { "no" })
            .style(Style::default().fg(Theme::spray_color(spray))),
        Cell::from(risk.as_str()).style(Style::default().fg(Theme::disease_color(risk))),
    ])
}

fn render_balance(weather: &WeatherAssessment, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .title("Water Balance")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let wb = &weather.water_balance;
    let today = match wb.today_balance_mm() {
        Some(b) => format!("{:+.1} mm", b),
        None => "out of domain".to_string(),
    };
    let status = wb.horizon_status();

    let lines = vec![
        Line::from(vec![
            Span::styled("Today (rain - ETc): ", Theme::dim()),
            Span::styled(today, Theme::normal()),
        ]),
        Line::from(vec![
            Span::styled(format!("Next {} days: ", wb.horizon_days), Theme::dim()),
            Span::styled(
                format!(
                    "{:.1} mm rain, {:.1} mm ETc, {:+.1} mm ",
                    wb.horizon_rain_mm,
                    wb.horizon_etc_mm,
                    wb.horizon_balance_mm()
                ),
                Theme::normal(),
            ),
            Span::styled(
                status.as_str(),
                Style::default().fg(Theme::balance_color(status)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Next spray day: ", Theme::dim()),
            Span::styled(
                weather
                    .next_spray_day()
                    .map(|d| d.label())
                    .unwrap_or_else(|| "none in forecast".to_string()),
                Theme::highlight(),
            ),
        ]),
    ];

    Paragraph::new(lines).block(block).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::daily::fixtures::record;

    #[test]
    fn renders_outlook_rows() {
        let records = vec![record(25.0, 60.0, 0.0), record(-3.0, 80.0, 4.0)];
        let weather = WeatherAssessment::new(&records).unwrap();

        let area = Rect::new(0, 0, 120, 20);
        let mut buf = Buffer::empty(area);
        ForecastScreen::new(Some(&weather)).render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("1.27"));
        assert!(text.contains("out of domain"));
    }

    #[test]
    fn renders_unavailable_notice() {
        let area = Rect::new(0, 0, 100, 20);
        let mut buf = Buffer::empty(area);
        ForecastScreen::new(None).render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Forecast unavailable"));
    }
}
