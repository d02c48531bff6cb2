use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Widget,
    },
};

pub const PLACEHOLDER: &str = "Ask a question...";

/// What a key press asks the assistant to do
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerAction {
    /// Replace the draft with this text
    Edit(String),
    Submit,
    None,
}

/// Cursor state for the draft input. The draft itself lives in the assistant.
#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    /// Cursor position in characters
    cursor: usize,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Translate a key press against the current draft.
    pub fn handle_key(&mut self, key: KeyEvent, draft: &str) -> ComposerAction {
        if key.kind != KeyEventKind::Press {
            return ComposerAction::None;
        }

        let mut chars: Vec<char> = draft.chars().collect();
        self.cursor = self.cursor.min(chars.len());

        match key.code {
            KeyCode::Enter => {
                if draft.trim().is_empty() {
                    return ComposerAction::None;
                }
                ComposerAction::Submit
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                chars.insert(self.cursor, c);
                self.cursor += 1;
                ComposerAction::Edit(chars.into_iter().collect())
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return ComposerAction::None;
                }
                self.cursor -= 1;
                chars.remove(self.cursor);
                ComposerAction::Edit(chars.into_iter().collect())
            }
            KeyCode::Delete => {
                if self.cursor >= chars.len() {
                    return ComposerAction::None;
                }
                chars.remove(self.cursor);
                ComposerAction::Edit(chars.into_iter().collect())
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                ComposerAction::None
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(chars.len());
                ComposerAction::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                ComposerAction::None
            }
            KeyCode::End => {
                self.cursor = chars.len();
                ComposerAction::None
            }
            _ => ComposerAction::None,
        }
    }

    /// Called once the assistant accepted a submission and cleared the draft.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Input line with a send hint
pub struct Composer<'a> {
    draft: &'a str,
    cursor: usize,
    awaiting: bool,
}

impl<'a> Composer<'a> {
    pub fn new(draft: &'a str, cursor: usize, awaiting: bool) -> Self {
        Self {
            draft,
            cursor,
            awaiting,
        }
    }
}

impl Widget for Composer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Send is disabled while a reply is pending.
        let hint = if self.awaiting {
            Span::styled(" ⏎ send ", Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM))
        } else {
            Span::styled(" ⏎ send ", Style::default().fg(Color::Green))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(Title::from(hint).position(Position::Bottom).alignment(Alignment::Right));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let line = if self.draft.is_empty() {
            Line::from(vec![
                Span::styled("▌", Style::default().fg(Color::Green)),
                Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            let mut content: String = self.draft.chars().take(self.cursor).collect();
            content.push('▌');
            content.extend(self.draft.chars().skip(self.cursor));
            Line::from(Span::raw(content))
        };
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
