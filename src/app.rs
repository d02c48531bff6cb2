use crate::events::{EventHandler, TuiEvent};
use crate::session::Session;
use crate::tui::Tui;
use crate::ui::chat::{ChatPanel, ComposerAction, ComposerState};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use std::time::Duration;
use tracing::info;

/// Interactive chat front end
pub struct App {
    session: Session,
    composer: ComposerState,
    tick: u64,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            composer: ComposerState::new(),
            tick: 0,
            should_quit: false,
        }
    }

    pub async fn run(mut self, terminal: &mut Tui, tick_rate: Duration) -> Result<()> {
        let mut events = EventHandler::new(tick_rate);
        info!("chat session started");

        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                event = events.next() => match event {
                    Some(TuiEvent::Key(key)) => self.handle_key(key),
                    Some(TuiEvent::Tick) => self.on_tick(),
                    Some(TuiEvent::Resize(_, _)) => {}
                    None => self.should_quit = true,
                },
                // Redraw as soon as the reply lands instead of on the next tick.
                () = self.session.replied() => {}
            }
        }

        info!(
            messages = self.session.assistant().transcript().len(),
            "chat session ended"
        );
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let assistant = self.session.assistant();
        let panel = ChatPanel::new(assistant.view(), self.composer.cursor(), self.tick);
        frame.render_widget(panel, frame.size());
    }

    fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('o') => self.session.toggle(),
                _ => {}
            }
            return;
        }

        if !self.session.assistant().is_open() {
            if key.code == KeyCode::Enter {
                self.session.open();
            }
            return;
        }

        if key.code == KeyCode::Esc {
            self.session.close();
            return;
        }

        let draft = self.session.assistant().draft().to_string();
        match self.composer.handle_key(key, &draft) {
            ComposerAction::Edit(text) => self.session.update_draft(text),
            ComposerAction::Submit => {
                if self.session.submit() {
                    self.composer.reset();
                }
            }
            ComposerAction::None => {}
        }
    }

    #[allow(dead_code)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[allow(dead_code)]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
