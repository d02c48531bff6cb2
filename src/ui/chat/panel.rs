use crate::assistant::ChatView;
use crate::ui::chat::{ChatHistory, Composer};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub const TITLE: &str = "Logistics Assistant";
pub const LAUNCHER_HINT: &str = "Ctrl+O to chat with our assistant";

/// The whole chat widget: launcher when closed, full panel when open
pub struct ChatPanel<'a> {
    view: ChatView<'a>,
    cursor: usize,
    tick: u64,
}

impl<'a> ChatPanel<'a> {
    pub fn new(view: ChatView<'a>, cursor: usize, tick: u64) -> Self {
        Self { view, cursor, tick }
    }
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        if !self.view.is_open {
            let launcher = Line::from(vec![
                Span::styled(" 🤖 ", Style::default().fg(Color::Black).bg(Color::Green)),
                Span::styled(format!(" {LAUNCHER_HINT}"), Style::default().fg(Color::Gray)),
            ]);
            buf.set_line(area.x, area.bottom() - 1, &launcher, area.width);
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(Span::styled(
                format!(" 🤖 {TITLE} "),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // History
                Constraint::Length(3), // Composer
            ])
            .split(inner);

        ChatHistory::new(self.view.messages, self.view.typing, self.tick).render(chunks[0], buf);
        Composer::new(self.view.draft, self.cursor, self.view.typing).render(chunks[1], buf);
    }
}
