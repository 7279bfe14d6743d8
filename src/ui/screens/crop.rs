use crate::app::CropPane;
use crate::models::CropProfile;
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget, Wrap},
};

/// Stage and cultivar browser for the configured crop
pub struct CropScreen<'a> {
    pub crop: &'a CropProfile,
    pub cultivar: &'a str,
    pub reported_stage: Option<&'a str>,
    pub expected_stage: Option<&'a str>,
    pub pane: CropPane,
    pub stage_index: usize,
    pub cultivar_index: usize,
}

impl<'a> CropScreen<'a> {
    pub fn new(crop: &'a CropProfile, cultivar: &'a str) -> Self {
        Self {
            crop,
            cultivar,
            reported_stage: None,
            expected_stage: None,
            pane: CropPane::Stages,
            stage_index: 0,
            cultivar_index: 0,
        }
    }

    pub fn with_stages(mut self, reported: Option<&'a str>, expected: Option<&'a str>) -> Self {
        self.reported_stage = reported;
        self.expected_stage = expected;
        self
    }

    pub fn with_selection(mut self, pane: CropPane, stage_index: usize, cultivar_index: usize) -> Self {
        self.pane = pane;
        self.stage_index = stage_index;
        self.cultivar_index = cultivar_index;
        self
    }
}

impl Widget for CropScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(9), // Lists
                Constraint::Min(6),    // Details
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled(self.crop.name(), Theme::title()),
            Span::styled(
                format!(
                    " - base {:.0} °C, target {:.0} °C·day",
                    self.crop.base_temp_c, self.crop.target_gda
                ),
                Theme::dim(),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        let lists = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.render_stages(lists[0], buf);
        self.render_cultivars(lists[1], buf);
        self.render_details(chunks[2], buf);

        let nav = Line::from(vec![
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Navigate ", Theme::nav_label()),
            Span::styled("[Tab]", Theme::nav_key()),
            Span::styled("Switch ", Theme::nav_label()),
            Span::styled("[Enter]", Theme::nav_key()),
            Span::styled("Select ", Theme::nav_label()),
            Span::styled("[a]", Theme::nav_key()),
            Span::styled("Auto Stage ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl CropScreen<'_> {
    fn pane_block(&self, title: &'static str, pane: CropPane) -> Block<'static> {
        let border = if self.pane == pane {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border)
    }

    fn render_stages(&self, area: Rect, buf: &mut Buffer) {
        let block = self.pane_block("Stages", CropPane::Stages);
        let inner = block.inner(area);
        block.render(area, buf);

        let items: Vec<ListItem> = self
            .crop
            .stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let marker = if Some(stage.name.as_str()) == self.reported_stage {
                    Span::styled("● ", Theme::success())
                } else if Some(stage.name.as_str()) == self.expected_stage {
                    Span::styled("○ ", Theme::dim())
                } else {
                    Span::raw("  ")
                };
                let style = if self.pane == CropPane::Stages && i == self.stage_index {
                    Theme::selected()
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(format!("{:>3.0}% ", stage.progress_start), Theme::dim()),
                    Span::raw(stage.name.as_str()),
                ]))
                .style(style)
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_cultivars(&self, area: Rect, buf: &mut Buffer) {
        let block = self.pane_block("Cultivars", CropPane::Cultivars);
        let inner = block.inner(area);
        block.render(area, buf);

        let items: Vec<ListItem> = self
            .crop
            .cultivars
            .iter()
            .enumerate()
            .map(|(i, cultivar)| {
                let marker = if cultivar.name == self.cultivar {
                    Span::styled("● ", Theme::success())
                } else {
                    Span::raw("  ")
                };
                let style = if self.pane == CropPane::Cultivars && i == self.cultivar_index {
                    Theme::selected()
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::raw(cultivar.name.as_str()),
                    Span::styled(format!("  Kc {:.2}", cultivar.crop_coefficient), Theme::dim()),
                ]))
                .style(style)
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let field = |label: &'static str, value: &str| {
            vec![
                Line::from(Span::styled(label, Theme::dim())),
                Line::from(Span::styled(value.to_string(), Theme::normal())),
            ]
        };

        let lines: Vec<Line> = match self.pane {
            CropPane::Stages => match self.crop.stages.get(self.stage_index) {
                Some(stage) => [
                    vec![Line::from(Span::styled(stage.name.clone(), Theme::header()))],
                    field("Description:", &stage.description),
                    field("Physiology:", &stage.physiology),
                    field("Management:", &stage.management),
                    field("Chemical control:", &stage.chemical_control),
                ]
                .concat(),
                None => Vec::new(),
            },
            CropPane::Cultivars => match self.crop.cultivars.get(self.cultivar_index) {
                Some(cultivar) => [
                    vec![Line::from(Span::styled(cultivar.name.clone(), Theme::header()))],
                    field(
                        "Crop coefficient:",
                        &format!("{:.2}", cultivar.crop_coefficient),
                    ),
                    field("Notes:", &cultivar.notes),
                ]
                .concat(),
                None => Vec::new(),
            },
        };

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CropId, CropRegistry};

    #[test]
    fn highlighted_stage_details_are_shown() {
        let registry = CropRegistry::builtin().unwrap();
        let crop = registry.get(CropId::Grape).unwrap();

        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        CropScreen::new(crop, "Niagara Rosada")
            .with_stages(Some("Veraison"), Some("Flowering"))
            .with_selection(CropPane::Stages, 3, 0)
            .render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Management:"));
        assert!(text.contains("Kc 0.70"));
    }
}
