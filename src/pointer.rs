//! Mouse synthesis behind a trait seam
//!
//! The grid session only needs absolute positioning and left/right button
//! events; everything OS-specific lives in the enigo-backed implementation
//! so tests can substitute a recording fake.

use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use std::fmt;
use std::thread;
use std::time::Duration;

/// Trailing action applied once a selection resolves to coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerAction {
    /// Leave the cursor in place
    #[default]
    Move,
    Click,
    DoubleClick,
    RightClick,
}

impl PointerAction {
    /// Match a spoken action phrase ("click", "double click", ...)
    pub fn from_spoken(words: &str) -> Option<Self> {
        match words {
            "" | "move" => Some(PointerAction::Move),
            "click" => Some(PointerAction::Click),
            "double click" | "double" => Some(PointerAction::DoubleClick),
            "right click" | "right" => Some(PointerAction::RightClick),
            _ => None,
        }
    }
}

/// Error type for pointer synthesis
#[derive(Debug, Clone)]
pub struct PointerError(pub String);

impl fmt::Display for PointerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer error: {}", self.0)
    }
}

impl std::error::Error for PointerError {}

/// Mouse event synthesis
pub trait PointerInput {
    /// Primary display size in pixels
    fn screen_size(&mut self) -> Result<(i32, i32), PointerError>;

    /// Position the cursor at absolute screen coordinates
    fn set_position(&mut self, x: i32, y: i32) -> Result<(), PointerError>;

    /// Left button down
    fn press(&mut self) -> Result<(), PointerError>;

    /// Left button up
    fn release(&mut self) -> Result<(), PointerError>;

    fn click(&mut self) -> Result<(), PointerError>;

    fn double_click(&mut self) -> Result<(), PointerError>;

    fn right_click(&mut self) -> Result<(), PointerError>;

    /// Apply a trailing action at the current cursor position
    fn perform(&mut self, action: PointerAction) -> Result<(), PointerError> {
        match action {
            PointerAction::Move => Ok(()),
            PointerAction::Click => self.click(),
            PointerAction::DoubleClick => self.double_click(),
            PointerAction::RightClick => self.right_click(),
        }
    }
}

/// Pointer backend using enigo
pub struct EnigoPointer {
    enigo: Enigo,
    /// Gap between the two clicks of a double click
    double_click_gap: Duration,
}

impl EnigoPointer {
    pub fn new() -> Result<Self, PointerError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PointerError(format!("failed to initialize enigo: {}", e)))?;
        Ok(Self {
            enigo,
            double_click_gap: Duration::from_millis(50),
        })
    }

    fn button(&mut self, button: Button, direction: Direction) -> Result<(), PointerError> {
        self.enigo
            .button(button, direction)
            .map_err(|e| PointerError(format!("button event failed: {}", e)))
    }
}

impl PointerInput for EnigoPointer {
    fn screen_size(&mut self) -> Result<(i32, i32), PointerError> {
        self.enigo
            .main_display()
            .map_err(|e| PointerError(format!("could not query display size: {}", e)))
    }

    fn set_position(&mut self, x: i32, y: i32) -> Result<(), PointerError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| PointerError(format!("cursor move failed: {}", e)))
    }

    fn press(&mut self) -> Result<(), PointerError> {
        self.button(Button::Left, Direction::Press)
    }

    fn release(&mut self) -> Result<(), PointerError> {
        self.button(Button::Left, Direction::Release)
    }

    fn click(&mut self) -> Result<(), PointerError> {
        self.button(Button::Left, Direction::Click)
    }

    fn double_click(&mut self) -> Result<(), PointerError> {
        self.button(Button::Left, Direction::Click)?;
        thread::sleep(self.double_click_gap);
        self.button(Button::Left, Direction::Click)
    }

    fn right_click(&mut self) -> Result<(), PointerError> {
        self.button(Button::Right, Direction::Click)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_spoken() {
        assert_eq!(PointerAction::from_spoken(""), Some(PointerAction::Move));
        assert_eq!(PointerAction::from_spoken("move"), Some(PointerAction::Move));
        assert_eq!(PointerAction::from_spoken("click"), Some(PointerAction::Click));
        assert_eq!(
            PointerAction::from_spoken("double click"),
            Some(PointerAction::DoubleClick)
        );
        assert_eq!(
            PointerAction::from_spoken("right click"),
            Some(PointerAction::RightClick)
        );
        assert_eq!(PointerAction::from_spoken("scroll"), None);
    }
}
