//! End-to-end dispatch tests against fake overlay and pointer backends
//!
//! These drive the same path a recognized phrase takes in production:
//! parse, validate, session lifecycle, synthesized pointer events.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gridpilot::clipboard::ClipboardSlots;
use gridpilot::config::Config;
use gridpilot::dispatch::{CommandError, DispatchResult, Dispatcher};
use gridpilot::element::ElementClient;
use gridpilot::grid::GridKind;
use gridpilot::overlay::{OverlayControl, OverlayError, OverlayProvider};
use gridpilot::pointer::{PointerError, PointerInput};

type EventLog = Rc<RefCell<Vec<String>>>;

struct FakeOverlay {
    title: &'static str,
    visible: bool,
    log: EventLog,
}

impl OverlayControl for FakeOverlay {
    fn show(&mut self) -> Result<(), OverlayError> {
        self.visible = true;
        self.log.borrow_mut().push(format!("show {}", self.title));
        Ok(())
    }

    fn is_visible(&mut self) -> bool {
        self.visible
    }

    fn request_close(&mut self) -> Result<(), OverlayError> {
        self.visible = false;
        self.log.borrow_mut().push(format!("close {}", self.title));
        Ok(())
    }

    fn title(&self) -> &str {
        self.title
    }
}

struct FakeProvider {
    log: EventLog,
}

impl OverlayProvider for FakeProvider {
    type Overlay = FakeOverlay;

    fn open(&mut self, kind: GridKind) -> Result<FakeOverlay, OverlayError> {
        Ok(FakeOverlay {
            title: kind.window_title(),
            visible: false,
            log: Rc::clone(&self.log),
        })
    }
}

struct FakePointer {
    log: EventLog,
}

impl FakePointer {
    fn log(&mut self, event: impl Into<String>) -> Result<(), PointerError> {
        self.log.borrow_mut().push(event.into());
        Ok(())
    }
}

impl PointerInput for FakePointer {
    fn screen_size(&mut self) -> Result<(i32, i32), PointerError> {
        Ok((900, 900))
    }
    fn set_position(&mut self, x: i32, y: i32) -> Result<(), PointerError> {
        self.log(format!("pos {x},{y}"))
    }
    fn press(&mut self) -> Result<(), PointerError> {
        self.log("press")
    }
    fn release(&mut self) -> Result<(), PointerError> {
        self.log("release")
    }
    fn click(&mut self) -> Result<(), PointerError> {
        self.log("click")
    }
    fn double_click(&mut self) -> Result<(), PointerError> {
        self.log("double")
    }
    fn right_click(&mut self) -> Result<(), PointerError> {
        self.log("right")
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.timing.settle_ms = 0;
    config.timing.release_settle_ms = 0;
    config.timing.post_dismiss_ms = 0;
    config.timing.poll_interval_ms = 1;
    config.timing.show_timeout_ms = 100;
    config.timing.dismiss_timeout_ms = 100;
    config
}

fn dispatcher(log: &EventLog) -> Dispatcher<FakePointer, FakeProvider> {
    let clipboard_path = std::env::temp_dir().join(format!(
        "gridpilot-test-slots-{}.json",
        std::process::id()
    ));
    // nothing listens here; element tests expect the connection to fail
    let element =
        ElementClient::with_base_url("http://127.0.0.1:9".into(), Duration::from_millis(200))
            .unwrap();
    Dispatcher::new(
        fast_config(),
        FakePointer { log: Rc::clone(log) },
        FakeProvider { log: Rc::clone(log) },
        element,
        ClipboardSlots::load(clipboard_path),
    )
}

fn events(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn move_command_targets_cell_center_then_clicks() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    // 900x900 screen, 9x9 sudoku: 100px cells
    assert_eq!(
        d.dispatch("sudoku grid").unwrap(),
        DispatchResult::Handled(None)
    );
    assert_eq!(d.dispatch("5 click").unwrap(), DispatchResult::Handled(None));
    assert_eq!(
        events(&log),
        vec!["show sudokugrid", "pos 450,50", "close sudokugrid", "click"]
    );
}

#[test]
fn inner_cell_lands_inside_the_outer_cell() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("sudoku grid").unwrap();
    d.dispatch("1 grid 1").unwrap();
    // first 33px sub-cell of the first 100px cell
    assert!(events(&log).contains(&"pos 16,16".to_string()));
}

#[test]
fn drag_dismisses_overlay_before_button_events() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("sudoku grid").unwrap();
    d.dispatch("3 drag 7").unwrap();
    assert_eq!(
        events(&log),
        vec![
            "show sudokugrid",
            "pos 250,50",
            "close sudokugrid",
            "press",
            "pos 650,50",
            "release",
        ]
    );
}

#[test]
fn drag_from_current_position_skips_initial_move() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("sudoku grid").unwrap();
    d.dispatch("drag 7 click").unwrap();
    assert_eq!(
        events(&log),
        vec![
            "show sudokugrid",
            "close sudokugrid",
            "press",
            "pos 650,50",
            "release",
            "click",
        ]
    );
}

#[test]
fn out_of_range_leaves_overlay_up_for_retry() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("sudoku grid").unwrap();
    let err = d.dispatch("99 click").unwrap_err();
    assert!(matches!(err, CommandError::Session(_)), "{err}");
    // no pointer event went out for the bad index
    assert_eq!(events(&log), vec!["show sudokugrid"]);

    // the session is still usable
    d.dispatch("5 click").unwrap();
    assert!(events(&log).contains(&"click".to_string()));
}

#[test]
fn grid_commands_require_an_open_grid() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    let err = d.dispatch("45 click").unwrap_err();
    assert!(matches!(err, CommandError::NoActiveGrid));
    assert!(events(&log).is_empty());
}

#[test]
fn inner_cells_rejected_outside_sudoku() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("douglas grid").unwrap();
    let err = d.dispatch("4 grid 2 click").unwrap_err();
    assert!(matches!(err, CommandError::BadSlot(_)));
    // overlay untouched by the rejected command
    assert_eq!(events(&log), vec!["show douglasgrid"]);
}

#[test]
fn escape_closes_the_active_grid() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("rainbow grid").unwrap();
    d.dispatch("escape").unwrap();
    assert_eq!(events(&log), vec!["show rainbowgrid", "close rainbowgrid"]);

    // a second escape is a no-op with feedback
    assert_eq!(
        d.dispatch("escape").unwrap(),
        DispatchResult::Handled(Some("no grid overlay is open".into()))
    );
}

#[test]
fn opening_a_grid_replaces_the_active_one() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    d.dispatch("sudoku grid").unwrap();
    d.dispatch("douglas grid").unwrap();
    assert_eq!(
        events(&log),
        vec!["show sudokugrid", "close sudokugrid", "show douglasgrid"]
    );
}

#[test]
fn unrecognized_phrase_reports_no_match() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    assert_eq!(
        d.dispatch("make me a sandwich").unwrap(),
        DispatchResult::Unrecognized
    );
}

#[test]
fn unreachable_element_helper_surfaces_remote_error() {
    let log: EventLog = Rc::default();
    let mut d = dispatcher(&log);

    let err = d.dispatch("rescan directory").unwrap_err();
    assert!(matches!(err, CommandError::Remote(_)), "{err}");
}
