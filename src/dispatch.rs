//! Phrase-to-action dispatch
//!
//! Maps recognized phrases onto grid and helper operations. Parsing is
//! pure (phrase text in, [`Command`] out) so the grammar is testable
//! without any OS surface; execution owns the single active grid session
//! and the process-wide pointer backend.
//!
//! Numeric slots are 1-based as spoken. `0` is the only sentinel for "no
//! selection"; wire indices for the element helper are normalized to
//! 0-based here, at the edge.

use std::fmt;
use std::process::{Child, Command as ProcessCommand, Stdio};

use crate::clipboard::{ClipboardError, ClipboardSlots};
use crate::config::Config;
use crate::element::{ElementAction, ElementClient, RemoteCommandError};
use crate::grid::{CellSelection, GridKind, GridSession, SessionError, SessionState};
use crate::overlay::{OverlayError, OverlayProvider};
use crate::phrase;
use crate::pointer::{PointerAction, PointerError, PointerInput};

/// A fully parsed spoken command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenGrid(GridKind),
    GridMove {
        selection: CellSelection,
        action: PointerAction,
    },
    GridDrag {
        source: CellSelection,
        destination: CellSelection,
        action: PointerAction,
    },
    GridKill,
    RunElement,
    KillElement,
    Scroll { index: u32 },
    Retrieve { index: u32 },
    StickyList { from: u32, to: u32 },
    StickyCopy { slot: u32 },
    AddWord,
    RemoveWord { index: u32 },
    Search,
    Extensions,
    ChangeDirectory,
    RescanDirectory,
    FilterStrict,
}

/// What dispatching a phrase produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// Command ran; optional feedback line for the user
    Handled(Option<String>),
    /// The phrase matched no command template
    Unrecognized,
}

/// A command matched but could not run to completion
#[derive(Debug)]
pub enum CommandError {
    /// A numeric slot failed validation before anything executed
    BadSlot(String),
    /// Grid command without an open grid overlay
    NoActiveGrid,
    Session(SessionError),
    Remote(RemoteCommandError),
    Clipboard(ClipboardError),
    Overlay(OverlayError),
    Pointer(PointerError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::BadSlot(msg) => write!(f, "{}", msg),
            CommandError::NoActiveGrid => write!(f, "no grid overlay is open"),
            CommandError::Session(e) => e.fmt(f),
            CommandError::Remote(e) => e.fmt(f),
            CommandError::Clipboard(e) => e.fmt(f),
            CommandError::Overlay(e) => e.fmt(f),
            CommandError::Pointer(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        CommandError::Session(e)
    }
}
impl From<RemoteCommandError> for CommandError {
    fn from(e: RemoteCommandError) -> Self {
        CommandError::Remote(e)
    }
}
impl From<ClipboardError> for CommandError {
    fn from(e: ClipboardError) -> Self {
        CommandError::Clipboard(e)
    }
}
impl From<OverlayError> for CommandError {
    fn from(e: OverlayError) -> Self {
        CommandError::Overlay(e)
    }
}
impl From<PointerError> for CommandError {
    fn from(e: PointerError) -> Self {
        CommandError::Pointer(e)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a raw phrase into a command. Returns None when nothing matches.
pub fn parse(raw: &str) -> Option<Command> {
    let normalized = phrase::normalize(raw);
    let tokens = phrase::tokenize(&normalized);
    if tokens.is_empty() {
        return None;
    }

    if let Some(cmd) = parse_element_phrase(&tokens) {
        return Some(cmd);
    }

    if tokens == ["escape"] || tokens == ["cancel"] {
        return Some(Command::GridKill);
    }

    // "<kind> grid" or the bare family name
    if let Some(kind) = GridKind::from_spoken(tokens[0]) {
        if tokens.len() == 1 || (tokens.len() == 2 && tokens[1] == "grid") {
            return Some(Command::OpenGrid(kind));
        }
    }

    if let Some(at) = tokens.iter().position(|t| *t == "drag") {
        return parse_drag(&tokens[..at], &tokens[at + 1..]);
    }

    parse_move(&tokens)
}

/// `<n> [grid <s>] [<action>]`
fn parse_move(tokens: &[&str]) -> Option<Command> {
    let (selection, used) = parse_selection(tokens)?;
    if selection.is_none() {
        return None;
    }
    let action = parse_action(&tokens[used..])?;
    Some(Command::GridMove { selection, action })
}

/// `[<n0>] [grid <s0>] drag <n> [grid <s>] [<action>]`, already split at
/// the "drag" keyword
fn parse_drag(left: &[&str], right: &[&str]) -> Option<Command> {
    let source = if left.is_empty() {
        CellSelection::none()
    } else {
        let (selection, used) = parse_selection(left)?;
        if used != left.len() {
            return None;
        }
        selection
    };

    let (destination, used) = parse_selection(right)?;
    if destination.is_none() {
        return None;
    }
    let action = parse_action(&right[used..])?;
    Some(Command::GridDrag {
        source,
        destination,
        action,
    })
}

/// Parse `<n> [grid <s>]` from the front of a token list; returns the
/// selection and tokens consumed.
fn parse_selection(tokens: &[&str]) -> Option<(CellSelection, usize)> {
    let (outer, mut used) = phrase::parse_number(tokens)?;
    let mut inner = 0;
    if tokens.get(used) == Some(&"grid") {
        let (value, inner_used) = phrase::parse_number(&tokens[used + 1..])?;
        inner = value;
        used += 1 + inner_used;
    }
    Some((CellSelection::sub(outer, inner), used))
}

/// Trailing action words; empty means plain move.
fn parse_action(tokens: &[&str]) -> Option<PointerAction> {
    let joined = tokens.join(" ");
    if let Some(action) = PointerAction::from_spoken(&joined) {
        return Some(action);
    }
    for (spoken, action) in [
        ("move", PointerAction::Move),
        ("click", PointerAction::Click),
        ("double click", PointerAction::DoubleClick),
        ("right click", PointerAction::RightClick),
    ] {
        if phrase::matches_keyword(spoken, &joined) {
            return Some(action);
        }
    }
    None
}

/// Fixed element-helper phrases
fn parse_element_phrase(tokens: &[&str]) -> Option<Command> {
    match tokens {
        ["run", "element"] => Some(Command::RunElement),
        ["kill", "element"] => Some(Command::KillElement),
        ["add", "word"] => Some(Command::AddWord),
        ["search"] => Some(Command::Search),
        ["extensions"] => Some(Command::Extensions),
        ["change", "directory"] => Some(Command::ChangeDirectory),
        ["rescan", "directory"] => Some(Command::RescanDirectory),
        ["filter", "strict"] => Some(Command::FilterStrict),
        ["scroll", "to", rest @ ..] => {
            let (index, used) = phrase::parse_number(rest)?;
            (used == rest.len()).then_some(Command::Scroll { index })
        }
        ["get", rest @ ..] => {
            let (index, used) = phrase::parse_number(rest)?;
            (used == rest.len()).then_some(Command::Retrieve { index })
        }
        ["remove", "word", rest @ ..] => {
            let (index, used) = phrase::parse_number(rest)?;
            (used == rest.len()).then_some(Command::RemoveWord { index })
        }
        ["sticky", "copy"] => Some(Command::StickyCopy { slot: 1 }),
        ["sticky", "copy", rest @ ..] => {
            let (slot, used) = phrase::parse_number(rest)?;
            (used == rest.len()).then_some(Command::StickyCopy { slot })
        }
        ["sticky", "list", rest @ ..] => {
            let (from, used) = phrase::parse_number(rest)?;
            let rest = &rest[used..];
            let after_to = rest.strip_prefix(&["to"] as &[&str])?;
            let (to, used2) = phrase::parse_number(after_to)?;
            (used2 == after_to.len()).then_some(Command::StickyList { from, to })
        }
        _ => None,
    }
}

// ============================================================================
// Execution
// ============================================================================

struct ActiveGrid<O> {
    kind: GridKind,
    session: GridSession<O>,
}

/// Owns the pointer backend, the one active grid session, and the element
/// helper connection; runs parsed commands to completion.
pub struct Dispatcher<P, V: OverlayProvider> {
    config: Config,
    pointer: P,
    overlays: V,
    element: ElementClient,
    clipboard: ClipboardSlots,
    active: Option<ActiveGrid<V::Overlay>>,
    element_child: Option<Child>,
}

impl<P: PointerInput, V: OverlayProvider> Dispatcher<P, V> {
    pub fn new(
        config: Config,
        pointer: P,
        overlays: V,
        element: ElementClient,
        clipboard: ClipboardSlots,
    ) -> Self {
        Self {
            config,
            pointer,
            overlays,
            element,
            clipboard,
            active: None,
            element_child: None,
        }
    }

    /// Parse and run one phrase.
    pub fn dispatch(&mut self, raw: &str) -> Result<DispatchResult, CommandError> {
        match parse(raw) {
            Some(command) => {
                log::info!("phrase {:?} -> {:?}", raw, command);
                self.execute(command)
            }
            None => Ok(DispatchResult::Unrecognized),
        }
    }

    fn execute(&mut self, command: Command) -> Result<DispatchResult, CommandError> {
        match command {
            Command::OpenGrid(kind) => self.open_grid(kind),
            Command::GridMove { selection, action } => self.grid_move(selection, action),
            Command::GridDrag {
                source,
                destination,
                action,
            } => self.grid_drag(source, destination, action),
            Command::GridKill => self.grid_kill(),

            Command::RunElement => self.run_element(),
            Command::KillElement => self.element_send(ElementAction::Kill),
            Command::Scroll { index } => {
                let index = wire_index(index)?;
                self.element_send(ElementAction::Scroll { index })
            }
            Command::Retrieve { index } => {
                let index = wire_index(index)?;
                self.element_send(ElementAction::Retrieve { index })
            }
            Command::RemoveWord { index } => {
                let index = wire_index(index)?;
                self.element_send(ElementAction::Remove { index })
            }
            Command::StickyList { from, to } => {
                // The first ten rows of the helper display are the sticky
                // list itself; the unordered list starts below them.
                let mut index = wire_index(from)?;
                if index < 10 {
                    index += 10;
                }
                let sticky_index = wire_index(to)?;
                self.element_send(ElementAction::Sticky {
                    index,
                    sticky_index,
                    auto_sticky: String::new(),
                })
            }
            Command::StickyCopy { slot } => {
                let sticky_index = wire_index(slot)?;
                let text = self.clipboard.capture(1)?;
                self.element_send(ElementAction::Sticky {
                    index: 1,
                    sticky_index,
                    auto_sticky: text,
                })
            }
            Command::AddWord => {
                let text = self.clipboard.capture(1)?;
                self.element_send(ElementAction::Add { name: text })
            }
            Command::Search => self.element_send(ElementAction::Search),
            Command::Extensions => self.element_send(ElementAction::Extensions),
            Command::ChangeDirectory => self.element_send(ElementAction::TriggerDirectoryBox),
            Command::RescanDirectory => self.element_send(ElementAction::Rescan),
            Command::FilterStrict => {
                let kept = self.element.run_strict_filter()?;
                Ok(DispatchResult::Handled(Some(format!(
                    "strict filter kept {} names",
                    kept
                ))))
            }
        }
    }

    // ------------------------------------------------------------------
    // Grid commands
    // ------------------------------------------------------------------

    fn open_grid(&mut self, kind: GridKind) -> Result<DispatchResult, CommandError> {
        if let Some(mut old) = self.active.take() {
            log::info!("replacing active {} grid", old.kind);
            if let Err(e) = old.session.kill().and_then(|_| old.session.wait_for_dismissal()) {
                log::warn!("old {} overlay did not close cleanly: {}", old.kind, e);
            }
        }

        let screen = match self.pointer.screen_size() {
            Ok(size) => size,
            Err(e) => {
                log::warn!("display query failed ({}), using configured size", e);
                (self.config.screen.width, self.config.screen.height)
            }
        };

        let grid = kind.build_grid(screen, &self.config.grids);
        let overlay = self.overlays.open(kind)?;
        let mut session = GridSession::new(grid, overlay, self.config.timing);
        session.show()?;
        self.active = Some(ActiveGrid { kind, session });
        Ok(DispatchResult::Handled(None))
    }

    fn grid_move(
        &mut self,
        selection: CellSelection,
        action: PointerAction,
    ) -> Result<DispatchResult, CommandError> {
        let active = self.active.as_mut().ok_or(CommandError::NoActiveGrid)?;
        check_inner(active.kind, &[selection])?;

        // Failures up to here leave the overlay up so the user can retry
        // with a different number.
        active.session.move_to(&mut self.pointer, selection)?;
        active.session.dismiss()?;
        self.pointer.perform(action)?;
        self.active = None;
        Ok(DispatchResult::Handled(None))
    }

    fn grid_drag(
        &mut self,
        source: CellSelection,
        destination: CellSelection,
        action: PointerAction,
    ) -> Result<DispatchResult, CommandError> {
        let active = self.active.as_mut().ok_or(CommandError::NoActiveGrid)?;
        check_inner(active.kind, &[source, destination])?;

        active
            .session
            .drag(&mut self.pointer, source, destination, action)?;
        self.active = None;
        Ok(DispatchResult::Handled(None))
    }

    fn grid_kill(&mut self) -> Result<DispatchResult, CommandError> {
        let Some(mut active) = self.active.take() else {
            return Ok(DispatchResult::Handled(Some("no grid overlay is open".into())));
        };
        if active.session.state() != SessionState::Closed {
            active.session.kill()?;
            active.session.wait_for_dismissal()?;
        }
        Ok(DispatchResult::Handled(None))
    }

    // ------------------------------------------------------------------
    // Element helper commands
    // ------------------------------------------------------------------

    fn element_send(&mut self, action: ElementAction) -> Result<DispatchResult, CommandError> {
        // The helper raises its own window for interactive actions; there
        // is no focus operation in its protocol.
        let status = self.element.send(&action)?;
        let feedback = (!status.is_empty()).then_some(status);
        Ok(DispatchResult::Handled(feedback))
    }

    fn run_element(&mut self) -> Result<DispatchResult, CommandError> {
        if let Some(child) = self.element_child.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return Ok(DispatchResult::Handled(Some(
                    "element helper is already running".into(),
                )));
            }
            self.element_child = None;
        }
        let command = &self.config.element.command;
        let (program, args) = command.split_first().ok_or_else(|| {
            CommandError::Remote(RemoteCommandError::Unreachable(
                "no element command configured".into(),
            ))
        })?;
        let child = ProcessCommand::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                CommandError::Remote(RemoteCommandError::Unreachable(format!(
                    "could not launch {}: {}",
                    program, e
                )))
            })?;
        log::info!("element helper started (pid {})", child.id());
        self.element_child = Some(child);
        Ok(DispatchResult::Handled(None))
    }
}

/// Normalize a spoken 1-based index for the wire.
fn wire_index(spoken: u32) -> Result<u32, CommandError> {
    spoken
        .checked_sub(1)
        .ok_or_else(|| CommandError::BadSlot("index must be at least 1".into()))
}

/// Reject inner-cell addressing on grids that have no inner cells.
fn check_inner(kind: GridKind, selections: &[CellSelection]) -> Result<(), CommandError> {
    if kind.supports_inner() {
        return Ok(());
    }
    if selections.iter().any(|s| s.inner > 0) {
        return Err(CommandError::BadSlot(format!(
            "the {} grid has no inner cells",
            kind
        )));
    }
    Ok(())
}

/// Print the spoken-command catalog to the feedback channel.
pub fn print_catalog() {
    eprintln!(
        "
╭──────────────────────────────────────────────────────────────╮
│                    SPOKEN COMMANDS                           │
├──────────────────────────────────────────────────────────────┤
│ GRIDS                                                        │
│   douglas / rainbow / sudoku / legion grid   open overlay    │
│   <n> [grid <s>] [<action>]                  move to cell    │
│   [<n0>] [grid <s0>] drag <n> [grid <s>]     drag            │
│   escape / cancel                            close overlay   │
│   actions: move, click, double click, right click            │
│   <s> is a 1-9 inner cell (sudoku only)                      │
├──────────────────────────────────────────────────────────────┤
│ ELEMENT HELPER                                               │
│   run element / kill element                                 │
│   get <n>                retrieve list entry <n>             │
│   scroll to <n>          scroll the list                     │
│   sticky list <n> to <n2>                                    │
│   sticky copy [<n>]      clipboard into sticky slot <n>      │
│   add word / remove word <n>                                 │
│   search / extensions / change directory                     │
│   rescan directory / filter strict                           │
╰──────────────────────────────────────────────────────────────╯
"
    );
}
