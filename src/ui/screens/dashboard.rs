use crate::models::{AdvisoryReport, Recommendation};
use crate::ui::components::{
    delta_t_gauge, humidity_gauge, progress_gauge, temperature_gauge, vpd_gauge,
};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};

pub struct DashboardScreen<'a> {
    pub farm_name: &'a str,
    pub report: Option<&'a AdvisoryReport>,
    pub status_message: Option<&'a str>,
}

impl<'a> DashboardScreen<'a> {
    pub fn new(farm_name: &'a str, report: Option<&'a AdvisoryReport>) -> Self {
        Self {
            farm_name,
            report,
            status_message: None,
        }
    }

    pub fn with_status(mut self, status: Option<&'a str>) -> Self {
        self.status_message = status;
        self
    }
}

impl Widget for DashboardScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(5), // Gauges row
                Constraint::Min(8),    // Conditions and alerts
                Constraint::Length(1), // Status message
                Constraint::Length(1), // Nav bar
            ])
            .split(area);

        self.render_header(chunks[0], buf);
        self.render_gauges(chunks[1], buf);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        self.render_conditions(middle[0], buf);
        self.render_alerts(middle[1], buf);
        self.render_status_message(chunks[3], buf);
        render_nav(chunks[4], buf);
    }
}

impl DashboardScreen<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let title = match self.report {
            Some(r) => format!(
                "CropOps - {} ({} {}, {})",
                self.farm_name, r.crop, r.cultivar, r.stage
            ),
            None => format!("CropOps - {}", self.farm_name),
        };

        let block = Block::default()
            .title(Span::styled(title, Theme::title()))
            .borders(Borders::BOTTOM)
            .border_style(Theme::border());

        let info = match self.report {
            Some(r) => format!(
                "Last updated: {}  |  Advisor: {}",
                r.generated_at.format("%Y-%m-%d %H:%M"),
                r.consultation.source
            ),
            None => "Last updated: Never".to_string(),
        };
        Paragraph::new(Span::styled(info, Theme::dim()))
            .block(block)
            .render(area, buf);
    }

    fn render_gauges(&self, area: Rect, buf: &mut Buffer) {
        let gauge_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(20); 5])
            .split(area);

        let today = self.report.and_then(|r| r.weather.as_ref()).map(|w| &w.today);

        temperature_gauge("Temperature", today.map(|d| d.temp_c)).render(gauge_chunks[0], buf);
        humidity_gauge("Humidity", today.map(|d| d.humidity_percent))
            .render(gauge_chunks[1], buf);
        vpd_gauge("VPD", today.map(|d| d.vpd_kpa)).render(gauge_chunks[2], buf);
        delta_t_gauge("Delta T", today.map(|d| d.delta_t_c)).render(gauge_chunks[3], buf);

        let progress = self.report.map(|r| r.phenology.harvest_progress);
        progress_gauge("Harvest", progress).render(gauge_chunks[4], buf);
    }

    fn render_conditions(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Conditions", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(report) = self.report else {
            Paragraph::new(Span::styled("No advisory yet, press r", Theme::dim()))
                .render(inner, buf);
            return;
        };

        let mut lines = Vec::new();
        match report.weather {
            Some(ref w) => {
                lines.push(labelled(
                    "VPD band: ",
                    w.vpd_band.description(),
                    Theme::vpd_color(w.vpd_band),
                ));
                lines.push(labelled(
                    "Spraying: ",
                    w.spray_window.as_str(),
                    Theme::spray_color(w.spray_window),
                ));
                lines.push(labelled(
                    "Disease: ",
                    w.disease_risk.description(),
                    Theme::disease_color(w.disease_risk),
                ));
                lines.push(labelled(
                    "Water: ",
                    &w.water_balance.summary(),
                    Theme::balance_color(w.water_balance.horizon_status()),
                ));
            }
            None => lines.push(Line::from(Span::styled(
                "Forecast unavailable",
                Theme::warning(),
            ))),
        }

        let p = &report.phenology;
        lines.push(Line::from(vec![
            Span::styled("GDA: ", Theme::dim()),
            Span::styled(
                format!("{:.0} / {:.0} °C·day", p.accumulated_gda, p.target_gda),
                Theme::highlight(),
            ),
            Span::styled(
                format!(" ({}, day {})", p.mode.as_str().to_lowercase(), p.elapsed_days),
                Theme::dim(),
            ),
        ]));
        lines.push(labelled(
            "Nutrients: ",
            report.nutrient_focus.as_str(),
            Theme::ACCENT,
        ));

        Paragraph::new(lines).render(inner, buf);
    }

    fn render_alerts(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Active Alerts", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        // Each alert takes two lines
        let active: Vec<&Recommendation> = self
            .report
            .map(|r| r.active_recommendations().take(3).collect())
            .unwrap_or_default();

        if active.is_empty() {
            Paragraph::new(Span::styled("No active alerts", Theme::dim())).render(inner, buf);
            return;
        }

        let items: Vec<ListItem> = active
            .iter()
            .map(|r| {
                let severity_style = Style::default().fg(r.severity.color());
                let title_line = Line::from(vec![
                    Span::styled(format!("{} ", r.severity.symbol()), severity_style),
                    Span::styled(r.title.as_str(), severity_style),
                ]);
                let summary_line = Line::from(vec![
                    Span::raw("  "),
                    Span::styled(r.summary.as_str(), Theme::dim()),
                ]);
                ListItem::new(vec![title_line, summary_line])
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_status_message(&self, area: Rect, buf: &mut Buffer) {
        if let Some(msg) = self.status_message {
            let style = if msg.contains("unavailable") || msg.contains("failed") {
                Theme::warning()
            } else {
                Theme::success()
            };
            Paragraph::new(Span::styled(msg, style)).render(area, buf);
        }
    }
}

fn labelled<'a>(label: &'a str, value: &str, color: ratatui::style::Color) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Theme::dim()),
        Span::styled(value.to_string(), Style::default().fg(color)),
    ])
}

fn render_nav(area: Rect, buf: &mut Buffer) {
    let nav = Line::from(vec![
        Span::styled("[1]", Theme::nav_key()),
        Span::styled("Dashboard ", Theme::nav_label()),
        Span::styled("[2]", Theme::nav_key()),
        Span::styled("Forecast ", Theme::nav_label()),
        Span::styled("[3]", Theme::nav_key()),
        Span::styled("Advisory ", Theme::nav_label()),
        Span::styled("[4]", Theme::nav_key()),
        Span::styled("Crop ", Theme::nav_label()),
        Span::styled("[5]", Theme::nav_key()),
        Span::styled("History ", Theme::nav_label()),
        Span::styled("[r]", Theme::nav_key()),
        Span::styled("Refresh ", Theme::nav_label()),
        Span::styled("[q]", Theme::nav_key()),
        Span::styled("Quit", Theme::nav_label()),
    ]);
    Paragraph::new(nav).render(area, buf);
}
