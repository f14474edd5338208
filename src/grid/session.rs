//! Grid overlay session lifecycle
//!
//! A session owns one overlay window from launch to confirmed teardown and
//! provides the move/drag operations on top of it. The overlay must be
//! gone before any button event is synthesized, otherwise the overlay
//! window itself would receive the click.

use std::fmt;
use std::thread;

use crate::config::TimingConfig;
use crate::grid::geometry::{CellSelection, Grid, OutOfRangeError};
use crate::overlay::{OverlayControl, OverlayError};
use crate::pointer::{PointerAction, PointerError, PointerInput};
use crate::wait::{self, TimeoutError};

/// Lifecycle of a grid session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Visible,
    ActionPending,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::Visible => "visible",
            SessionState::ActionPending => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Failures surfaced by session operations. Nothing here is retried; the
/// dispatcher reports the failure and abandons the command.
#[derive(Debug)]
pub enum SessionError {
    OutOfRange(OutOfRangeError),
    Timeout(TimeoutError),
    Pointer(PointerError),
    Overlay(OverlayError),
    WrongState {
        op: &'static str,
        state: SessionState,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::OutOfRange(e) => e.fmt(f),
            SessionError::Timeout(e) => e.fmt(f),
            SessionError::Pointer(e) => e.fmt(f),
            SessionError::Overlay(e) => e.fmt(f),
            SessionError::WrongState { op, state } => {
                write!(f, "cannot {} while grid session is {}", op, state)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<OutOfRangeError> for SessionError {
    fn from(e: OutOfRangeError) -> Self {
        SessionError::OutOfRange(e)
    }
}
impl From<TimeoutError> for SessionError {
    fn from(e: TimeoutError) -> Self {
        SessionError::Timeout(e)
    }
}
impl From<PointerError> for SessionError {
    fn from(e: PointerError) -> Self {
        SessionError::Pointer(e)
    }
}
impl From<OverlayError> for SessionError {
    fn from(e: OverlayError) -> Self {
        SessionError::Overlay(e)
    }
}

/// One overlay window plus the grid geometry projected onto it
pub struct GridSession<O> {
    grid: Grid,
    overlay: O,
    timing: TimingConfig,
    state: SessionState,
}

impl<O: OverlayControl> GridSession<O> {
    pub fn new(grid: Grid, overlay: O, timing: TimingConfig) -> Self {
        Self {
            grid,
            overlay,
            timing,
            state: SessionState::Created,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Launch the overlay and wait for it to come on screen.
    pub fn show(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Created {
            return Err(SessionError::WrongState {
                op: "show overlay",
                state: self.state,
            });
        }
        self.overlay.show()?;
        wait::poll_until(
            "overlay appearance",
            self.timing.poll_interval(),
            self.timing.show_timeout(),
            || self.overlay.is_visible(),
        )?;
        self.state = SessionState::Visible;
        log::debug!("overlay {} visible", self.overlay.title());
        Ok(())
    }

    /// Position the cursor on a cell. Valid only while the overlay is
    /// visible; returns the resolved point.
    pub fn move_to<P: PointerInput>(
        &mut self,
        pointer: &mut P,
        selection: CellSelection,
    ) -> Result<(i32, i32), SessionError> {
        if self.state != SessionState::Visible {
            return Err(SessionError::WrongState {
                op: "move cursor",
                state: self.state,
            });
        }
        let (x, y) = self.grid.resolve(selection)?;
        pointer.set_position(x, y)?;
        Ok((x, y))
    }

    /// Ask the overlay to close.
    pub fn kill(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::WrongState {
                op: "close overlay",
                state: self.state,
            });
        }
        self.overlay.request_close()?;
        self.state = SessionState::ActionPending;
        Ok(())
    }

    /// Block until the overlay window is confirmed gone.
    pub fn wait_for_dismissal(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::ActionPending {
            return Err(SessionError::WrongState {
                op: "await dismissal",
                state: self.state,
            });
        }
        wait::poll_until(
            "overlay dismissal",
            self.timing.poll_interval(),
            self.timing.dismiss_timeout(),
            || !self.overlay.is_visible(),
        )?;
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Close the overlay, confirm it is gone, and give the window system a
    /// moment before any input is synthesized.
    pub fn dismiss(&mut self) -> Result<(), SessionError> {
        self.kill()?;
        self.wait_for_dismissal()?;
        thread::sleep(self.timing.post_dismiss());
        Ok(())
    }

    /// Drag from `source` to `destination`, then apply the trailing
    /// action.
    ///
    /// A `source` with outer index 0 starts the drag from wherever the
    /// cursor already is. Both selections are validated before the overlay
    /// comes down or any button event goes out.
    pub fn drag<P: PointerInput>(
        &mut self,
        pointer: &mut P,
        source: CellSelection,
        destination: CellSelection,
        action: PointerAction,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Visible {
            return Err(SessionError::WrongState {
                op: "drag",
                state: self.state,
            });
        }
        let (dest_x, dest_y) = self.grid.resolve(destination)?;
        if !source.is_none() {
            self.move_to(pointer, source)?;
        }

        self.dismiss()?;

        let settle = self.timing.settle();
        pointer.press()?;
        thread::sleep(settle);
        pointer.set_position(dest_x, dest_y)?;
        thread::sleep(settle);
        pointer.release()?;
        thread::sleep(self.timing.release_settle());

        pointer.perform(action)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayControl;

    /// Overlay that appears instantly and optionally refuses to close
    struct FakeOverlay {
        visible: bool,
        stuck: bool,
    }

    impl FakeOverlay {
        fn new() -> Self {
            Self {
                visible: false,
                stuck: false,
            }
        }

        fn stuck() -> Self {
            Self {
                visible: false,
                stuck: true,
            }
        }
    }

    impl OverlayControl for FakeOverlay {
        fn show(&mut self) -> Result<(), OverlayError> {
            self.visible = true;
            Ok(())
        }

        fn is_visible(&mut self) -> bool {
            self.visible
        }

        fn request_close(&mut self) -> Result<(), OverlayError> {
            if !self.stuck {
                self.visible = false;
            }
            Ok(())
        }

        fn title(&self) -> &str {
            "fakegrid"
        }
    }

    /// Pointer that records every call
    #[derive(Default)]
    struct RecordingPointer {
        events: Vec<String>,
    }

    impl PointerInput for RecordingPointer {
        fn screen_size(&mut self) -> Result<(i32, i32), PointerError> {
            Ok((900, 900))
        }
        fn set_position(&mut self, x: i32, y: i32) -> Result<(), PointerError> {
            self.events.push(format!("pos {x},{y}"));
            Ok(())
        }
        fn press(&mut self) -> Result<(), PointerError> {
            self.events.push("press".into());
            Ok(())
        }
        fn release(&mut self) -> Result<(), PointerError> {
            self.events.push("release".into());
            Ok(())
        }
        fn click(&mut self) -> Result<(), PointerError> {
            self.events.push("click".into());
            Ok(())
        }
        fn double_click(&mut self) -> Result<(), PointerError> {
            self.events.push("double".into());
            Ok(())
        }
        fn right_click(&mut self) -> Result<(), PointerError> {
            self.events.push("right".into());
            Ok(())
        }
    }

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            settle_ms: 0,
            release_settle_ms: 0,
            post_dismiss_ms: 0,
            poll_interval_ms: 1,
            show_timeout_ms: 100,
            dismiss_timeout_ms: 50,
        }
    }

    fn session(overlay: FakeOverlay) -> GridSession<FakeOverlay> {
        GridSession::new(Grid::new((0, 0), 30, 30, 3, 3), overlay, fast_timing())
    }

    #[test]
    fn test_lifecycle() {
        let mut s = session(FakeOverlay::new());
        assert_eq!(s.state(), SessionState::Created);
        s.show().unwrap();
        assert_eq!(s.state(), SessionState::Visible);
        s.kill().unwrap();
        assert_eq!(s.state(), SessionState::ActionPending);
        s.wait_for_dismissal().unwrap();
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn test_move_requires_visible() {
        let mut s = session(FakeOverlay::new());
        let mut pointer = RecordingPointer::default();
        let err = s
            .move_to(&mut pointer, CellSelection::cell(5))
            .unwrap_err();
        assert!(matches!(err, SessionError::WrongState { .. }));
        assert!(pointer.events.is_empty());
    }

    #[test]
    fn test_move_positions_cursor_at_center() {
        let mut s = session(FakeOverlay::new());
        let mut pointer = RecordingPointer::default();
        s.show().unwrap();
        let point = s.move_to(&mut pointer, CellSelection::cell(5)).unwrap();
        assert_eq!(point, (45, 45));
        assert_eq!(pointer.events, vec!["pos 45,45"]);
    }

    #[test]
    fn test_out_of_range_reaches_no_pointer_call() {
        let mut s = session(FakeOverlay::new());
        let mut pointer = RecordingPointer::default();
        s.show().unwrap();
        let err = s
            .move_to(&mut pointer, CellSelection::cell(10))
            .unwrap_err();
        assert!(matches!(err, SessionError::OutOfRange(_)));
        assert!(pointer.events.is_empty());
    }

    #[test]
    fn test_dismissal_timeout() {
        let mut s = session(FakeOverlay::stuck());
        s.show().unwrap();
        s.kill().unwrap();
        let err = s.wait_for_dismissal().unwrap_err();
        assert!(matches!(err, SessionError::Timeout(_)));
    }

    #[test]
    fn test_drag_sequence_dismisses_before_buttons() {
        let mut s = session(FakeOverlay::new());
        let mut pointer = RecordingPointer::default();
        s.show().unwrap();
        s.drag(
            &mut pointer,
            CellSelection::cell(1),
            CellSelection::cell(9),
            PointerAction::Click,
        )
        .unwrap();
        assert_eq!(s.state(), SessionState::Closed);
        assert_eq!(
            pointer.events,
            vec!["pos 15,15", "press", "pos 75,75", "release", "click"]
        );
    }

    #[test]
    fn test_drag_from_current_position_skips_initial_move() {
        let mut s = session(FakeOverlay::new());
        let mut pointer = RecordingPointer::default();
        s.show().unwrap();
        s.drag(
            &mut pointer,
            CellSelection::none(),
            CellSelection::cell(9),
            PointerAction::Move,
        )
        .unwrap();
        assert_eq!(pointer.events, vec!["press", "pos 75,75", "release"]);
    }

    #[test]
    fn test_drag_validates_destination_before_any_event() {
        let mut s = session(FakeOverlay::new());
        let mut pointer = RecordingPointer::default();
        s.show().unwrap();
        let err = s
            .drag(
                &mut pointer,
                CellSelection::cell(1),
                CellSelection::cell(99),
                PointerAction::Click,
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::OutOfRange(_)));
        assert!(pointer.events.is_empty());
        // overlay is still up, session still usable
        assert_eq!(s.state(), SessionState::Visible);
    }
}
