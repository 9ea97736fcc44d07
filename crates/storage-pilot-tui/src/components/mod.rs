//! UI components

pub mod forms;
pub mod wizard;

pub use wizard::WizardComponent;

use crate::action::Action;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

/// A piece of UI that handles its own input and drawing
pub trait Component {
    /// Handle a key press, optionally returning an action for the app
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let _ = key;
        Ok(None)
    }

    /// React to an action forwarded by the app
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let _ = action;
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;
}
