//! Chat widget components

pub mod composer;
pub mod history;
pub mod panel;

pub use composer::{Composer, ComposerAction, ComposerState};
pub use history::ChatHistory;
pub use panel::ChatPanel;
