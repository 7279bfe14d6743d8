use crate::models::{AdvisoryReport, Recommendation};
use crate::ui::components::InputWidget;
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget, Wrap},
};

pub struct AdvisoryScreen<'a> {
    pub report: Option<&'a AdvisoryReport>,
    pub selected_index: usize,
    pub note: &'a str,
    pub editing: bool,
}

impl<'a> AdvisoryScreen<'a> {
    pub fn new(report: Option<&'a AdvisoryReport>, note: &'a str) -> Self {
        Self {
            report,
            selected_index: 0,
            note,
            editing: false,
        }
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    /// While editing, `buffer` replaces the saved note
    pub fn editing(mut self, editing: bool, buffer: &'a str) -> Self {
        self.editing = editing;
        if editing {
            self.note = buffer;
        }
        self
    }

    fn active(&self) -> Vec<&'a Recommendation> {
        self.report
            .map(|r| r.active_recommendations().collect())
            .unwrap_or_default()
    }
}

impl Widget for AdvisoryScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(10),   // Recommendations
                Constraint::Length(7), // Consultation
                Constraint::Length(3), // Note
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Advisory", Theme::title()),
            Span::styled(format!(" ({} active)", self.active().len()), Theme::dim()),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        self.render_list(content[0], buf);
        self.render_details(content[1], buf);
        self.render_consultation(chunks[2], buf);

        InputWidget::new("Grower Note", self.note)
            .placeholder("press n to write a field note")
            .focused(self.editing)
            .render(chunks[3], buf);

        let nav = if self.editing {
            Line::from(vec![
                Span::styled("[Enter]", Theme::nav_key()),
                Span::styled("Save & Consult ", Theme::nav_label()),
                Span::styled("[Esc]", Theme::nav_key()),
                Span::styled("Cancel", Theme::nav_label()),
            ])
        } else {
            Line::from(vec![
                Span::styled("[↑↓]", Theme::nav_key()),
                Span::styled("Navigate ", Theme::nav_label()),
                Span::styled("[Enter]", Theme::nav_key()),
                Span::styled("Acknowledge ", Theme::nav_label()),
                Span::styled("[n]", Theme::nav_key()),
                Span::styled("Note ", Theme::nav_label()),
                Span::styled("[c]", Theme::nav_key()),
                Span::styled("Consult ", Theme::nav_label()),
                Span::styled("[Esc]", Theme::nav_key()),
                Span::styled("Back", Theme::nav_label()),
            ])
        };
        Paragraph::new(nav).render(chunks[4], buf);
    }
}

impl AdvisoryScreen<'_> {
    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Recommendations")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let active = self.active();
        if active.is_empty() {
            Paragraph::new(Span::styled("No active recommendations", Theme::dim()))
                .render(inner, buf);
            return;
        }

        let items: Vec<ListItem> = active
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let style = if i == self.selected_index {
                    Theme::selected()
                } else {
                    Style::default()
                };
                let line = Line::from(vec![
                    Span::styled(
                        format!("{} ", rec.severity.symbol()),
                        Style::default().fg(rec.severity.color()),
                    ),
                    Span::styled(
                        format!("{}: ", rec.category),
                        Style::default().fg(rec.category.color()),
                    ),
                    Span::raw(rec.title.as_str()),
                ]);
                ListItem::new(line).style(style)
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(rec) = self.active().get(self.selected_index).copied() else {
            Paragraph::new(Span::styled(
                "Select a recommendation to view details",
                Theme::dim(),
            ))
            .render(inner, buf);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(rec.title.as_str(), Theme::header())),
            Line::from(vec![
                Span::styled("Severity: ", Theme::dim()),
                Span::styled(
                    rec.severity.as_str(),
                    Style::default().fg(rec.severity.color()),
                ),
                Span::styled("  Category: ", Theme::dim()),
                Span::styled(
                    rec.category.as_str(),
                    Style::default().fg(rec.category.color()),
                ),
            ]),
            Line::default(),
            Line::from(Span::styled(rec.summary.as_str(), Theme::normal())),
            Line::default(),
        ];

        if !rec.data_points.is_empty() {
            lines.push(Line::from(Span::styled("Data Points:", Theme::dim())));
            for dp in &rec.data_points {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {}: ", dp.label), Theme::dim()),
                    Span::styled(dp.value.as_str(), Theme::highlight()),
                ]));
            }
            lines.push(Line::default());
        }

        if !rec.explanation.is_empty() {
            lines.push(Line::from(Span::styled("Why:", Theme::dim())));
            lines.push(Line::from(Span::styled(
                rec.explanation.as_str(),
                Theme::normal(),
            )));
            lines.push(Line::default());
        }

        if let Some(ref action) = rec.action {
            lines.push(Line::from(Span::styled("Action:", Theme::dim())));
            lines.push(Line::from(Span::styled(action.as_str(), Theme::success())));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }

    fn render_consultation(&self, area: Rect, buf: &mut Buffer) {
        let title = match self.report {
            Some(r) => format!("Consultation ({})", r.consultation.source),
            None => "Consultation".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let text = self
            .report
            .map(|r| r.consultation.text.as_str())
            .unwrap_or("No consultation yet");

        Paragraph::new(text)
            .style(Theme::normal())
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisors::AdvisoryProvider;
    use crate::logic::phenology::PhenologyAccumulator;
    use crate::logic::{AdvisoryComposer, AdvisoryInput};
    use crate::models::daily::fixtures::record;
    use crate::models::{CropId, CropRegistry};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn shows_selected_recommendation_and_consultation() {
        let registry = CropRegistry::builtin().unwrap();
        let crop = registry.get(CropId::Grape).unwrap();
        let reference = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let phenology = PhenologyAccumulator::for_crop(crop)
            .accumulate(reference, reference + chrono::Duration::days(30), &[])
            .unwrap();
        let records = vec![record(30.0, 30.0, 0.0)];
        let report = AdvisoryComposer::new()
            .compose(
                &AdvisoryInput {
                    crop,
                    cultivar: crop.default_cultivar(),
                    stage: None,
                    records: &records,
                    phenology: &phenology,
                    note: "",
                },
                &AdvisoryProvider::offline(),
            )
            .await;

        let area = Rect::new(0, 0, 120, 40);
        let mut buf = Buffer::empty(area);
        AdvisoryScreen::new(Some(&report), "").render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains(report.recommendations[0].title.as_str()));
        assert!(text.contains("Consultation (Offline keyword advisor)"));
        assert!(text.contains("press n to write a field note"));
    }
}
