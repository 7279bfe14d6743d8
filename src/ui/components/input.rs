use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Single-field text box for the grower's note.
///
/// The cursor sits at the end of the text; notes are short and edited by
/// appending or backspacing.
pub struct InputWidget<'a> {
    label: &'a str,
    value: &'a str,
    placeholder: &'a str,
    focused: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(label: &'a str, value: &'a str) -> Self {
        Self {
            label,
            value,
            placeholder: "",
            focused: false,
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn line(&self) -> Line<'a> {
        if self.focused {
            Line::from(vec![
                Span::styled(self.value, Theme::normal()),
                Span::styled(" ", Theme::selected()),
            ])
        } else if self.value.is_empty() {
            Line::from(Span::styled(self.placeholder, Theme::dim()))
        } else {
            Line::from(Span::styled(self.value, Theme::normal()))
        }
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        let block = Block::default()
            .title(self.label)
            .borders(Borders::ALL)
            .border_style(border_style);

        Paragraph::new(self.line())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_only_when_idle_and_empty() {
        let idle = InputWidget::new("Note", "").placeholder("press n");
        assert_eq!(idle.line().spans[0].content, "press n");

        let editing = InputWidget::new("Note", "").placeholder("press n").focused(true);
        assert_eq!(editing.line().spans.len(), 2);
    }

    #[test]
    fn multibyte_note_renders() {
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        InputWidget::new("Note", "adubação feita")
            .focused(true)
            .render(area, &mut buf);
        assert_eq!(buf[(1u16, 1u16)].symbol(), "a");
    }
}
