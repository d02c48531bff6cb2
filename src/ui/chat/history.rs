//! Transcript display with the typing indicator

use crate::transcript::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ASSISTANT_NAME: &str = "Sanda";

/// Renders messages oldest-first, pinned to the bottom of the area
pub struct ChatHistory<'a> {
    messages: &'a [Message],
    typing: bool,
    tick: u64,
}

impl<'a> ChatHistory<'a> {
    pub fn new(messages: &'a [Message], typing: bool, tick: u64) -> Self {
        Self {
            messages,
            typing,
            tick,
        }
    }
}

impl Widget for ChatHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let lines = chat_lines(self.messages, self.typing, area.width, self.tick);

        // Keep the newest lines visible.
        let height = area.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, line) in lines[start..].iter().enumerate() {
            let row = Rect {
                x: area.x,
                y: area.y + i as u16,
                width: area.width,
                height: 1,
            };
            Paragraph::new(line.clone()).render(row, buf);
        }
    }
}

/// Lay out the transcript as display lines. User messages are right-aligned,
/// assistant messages left-aligned, and the typing indicator (when active)
/// always comes last.
pub fn chat_lines(messages: &[Message], typing: bool, width: u16, tick: u64) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let wrap_width = (width as usize * 4 / 5).max(1);

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(header_line(message));
        for chunk in wrap_text(message.text(), wrap_width) {
            lines.push(
                Line::from(Span::styled(chunk, content_style(message.role())))
                    .alignment(alignment(message.role())),
            );
        }
    }

    if typing {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(typing_line(tick));
    }

    lines
}

fn header_line(message: &Message) -> Line<'static> {
    let who = match message.role() {
        Role::User => "You",
        Role::Assistant => ASSISTANT_NAME,
    };
    let stamp = message.sent_at().format("%H:%M").to_string();
    Line::from(vec![
        Span::styled(who, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" · {stamp}"), Style::default().fg(Color::DarkGray)),
    ])
    .alignment(alignment(message.role()))
}

fn typing_line(tick: u64) -> Line<'static> {
    let dots = match tick % 4 {
        0 => "●○○",
        1 => "○●○",
        2 => "○○●",
        _ => "○○○",
    };
    Line::from(vec![
        Span::styled(format!("{ASSISTANT_NAME} is typing "), Style::default().fg(Color::DarkGray)),
        Span::styled(dots, Style::default().fg(Color::Green)),
    ])
    .alignment(Alignment::Left)
}

fn alignment(role: Role) -> Alignment {
    match role {
        Role::User => Alignment::Right,
        Role::Assistant => Alignment::Left,
    }
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Black).bg(Color::Green),
        Role::Assistant => Style::default().fg(Color::White),
    }
}

/// Greedy word wrap by display width. Runs of spaces are kept, words wider
/// than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let before = lines.len();
        let mut current = String::new();
        let mut current_width = 0;
        let mut started = false;

        for word in paragraph.split(' ') {
            let mut word = word;
            let mut split = false;
            while word.width() > width {
                if started {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                    started = false;
                }
                let (head, rest) = split_at_width(word, width);
                lines.push(head.to_string());
                word = rest;
                split = true;
            }
            if split && word.is_empty() {
                continue;
            }

            let word_width = word.width();
            if started && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
                started = false;
            }
            if started {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            started = true;
        }

        if started || lines.len() == before {
            lines.push(current);
        }
    }

    lines
}

/// Longest prefix that fits in `width` columns, at least one character.
fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (idx, c) in word.char_indices() {
        let w = c.width().unwrap_or(0);
        if idx > 0 && used + w > width {
            return word.split_at(idx);
        }
        used += w;
    }
    (word, "")
}
