use crate::models::RunLogEntry;
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget, Wrap},
};

/// Run log written by the report job, newest first
pub struct HistoryScreen<'a> {
    pub entries: &'a [RunLogEntry],
    pub selected_index: usize,
}

impl<'a> HistoryScreen<'a> {
    pub fn new(entries: &'a [RunLogEntry]) -> Self {
        Self {
            entries,
            selected_index: 0,
        }
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }
}

impl Widget for HistoryScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(8),    // Table
                Constraint::Length(7), // Selected advisory
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Run Log", Theme::title()),
            Span::styled(format!(" ({} runs)", self.entries.len()), Theme::dim()),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        self.render_table(chunks[1], buf);
        self.render_advisory(chunks[2], buf);

        let nav = Line::from(vec![
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Navigate ", Theme::nav_label()),
            Span::styled("[l]", Theme::nav_key()),
            Span::styled("Reload ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl HistoryScreen<'_> {
    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border());

        if self.entries.is_empty() {
            Paragraph::new(Span::styled(
                "No runs logged yet. Schedule `cropops report` to build one daily.",
                Theme::dim(),
            ))
            .block(block)
            .render(area, buf);
            return;
        }

        let header = Row::new(
            ["Date", "Temp", "VPD", "Note", "Advisory"]
                .iter()
                .map(|h| Cell::from(*h).style(Theme::header())),
        );

        let rows: Vec<Row> = self
            .entries
            .iter()
            .map(|e| {
                Row::new(vec![
                    Cell::from(e.run_date.format("%Y-%m-%d").to_string()),
                    Cell::from(
                        e.temp_c
                            .map(|t| format!("{:.1}°C", t))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::from(
                        e.vpd_kpa
                            .map(|v| format!("{:.2}", v))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::from(truncate(&e.note, 24)),
                    Cell::from(e.advisory.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(26),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        state.select(Some(self.selected_index));
        StatefulWidget::render(table, area, buf, &mut state);
    }

    fn render_advisory(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Advisory")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let lines: Vec<Line> = match self.entries.get(self.selected_index) {
            Some(entry) => entry
                .advisory
                .split(RunLogEntry::LINE_DELIMITER)
                .map(|part| Line::from(Span::styled(part, Theme::normal())))
                .collect(),
            None => vec![Line::from(Span::styled("-", Theme::dim()))],
        };

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

/// Shorten to `max_chars` characters, never splitting a UTF-8 sequence
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("choveu", 10), "choveu");
        assert_eq!(truncate("adubação de cobertura feita", 10), "adubaçã...");
    }

    #[test]
    fn selected_advisory_is_unflattened() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let entries = vec![RunLogEntry::new(date, Some(24.0), Some(1.1), "", "First | Second")];

        let area = Rect::new(0, 0, 100, 20);
        let mut buf = Buffer::empty(area);
        HistoryScreen::new(&entries).render(area, &mut buf);

        // Second line of the advisory box starts one row below the first
        let row = |y: u16| -> String { (1u16..7).map(|x| buf[(x, y)].symbol().to_string()).collect() };
        let first_row = (0u16..20).find(|&y| row(y) == "First ").unwrap();
        assert_eq!(row(first_row + 1), "Second");
    }
}
