//! Overlay window control
//!
//! Grid overlays are rendered by an external helper; this process only
//! needs to show one, observe whether it is still on screen, and ask it to
//! go away. The production implementation owns the helper as a child
//! process: alive means visible.

use std::fmt;
use std::process::{Child, Command, Stdio};

use crate::config::GridsConfig;
use crate::grid::GridKind;

/// Overlay helper could not be started or signalled
#[derive(Debug, Clone)]
pub struct OverlayError(pub String);

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay error: {}", self.0)
    }
}

impl std::error::Error for OverlayError {}

/// The three operations the grid session needs from an overlay window
pub trait OverlayControl {
    /// Make the overlay visible. Idempotent once shown.
    fn show(&mut self) -> Result<(), OverlayError>;

    /// Whether the overlay window is currently present
    fn is_visible(&mut self) -> bool;

    /// Ask the overlay to close. The window may take time to disappear;
    /// callers poll [`is_visible`](Self::is_visible) afterwards.
    fn request_close(&mut self) -> Result<(), OverlayError>;

    /// Fixed window title the overlay is identified by
    fn title(&self) -> &str;
}

/// Overlay helper managed as a child process
pub struct ProcessOverlay {
    title: String,
    command: Vec<String>,
    child: Option<Child>,
}

impl ProcessOverlay {
    pub fn new(title: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            title: title.into(),
            command,
            child: None,
        }
    }
}

impl OverlayControl for ProcessOverlay {
    fn show(&mut self) -> Result<(), OverlayError> {
        if self.child.is_some() {
            return Ok(());
        }
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| OverlayError(format!("no launch command for {}", self.title)))?;
        let child = Command::new(program)
            .args(args)
            .arg("--title")
            .arg(&self.title)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OverlayError(format!("could not launch {}: {}", program, e)))?;
        log::debug!("overlay {} spawned (pid {})", self.title, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn is_visible(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    log::debug!("overlay {} exited: {}", self.title, status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    log::warn!("could not poll overlay {}: {}", self.title, e);
                    false
                }
            },
            None => false,
        }
    }

    fn request_close(&mut self) -> Result<(), OverlayError> {
        if let Some(child) = self.child.as_mut() {
            child
                .kill()
                .map_err(|e| OverlayError(format!("could not close {}: {}", self.title, e)))?;
        }
        Ok(())
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl Drop for ProcessOverlay {
    fn drop(&mut self) {
        // Best effort: never leave a stray overlay on screen.
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Creates overlay handles for grid families
pub trait OverlayProvider {
    type Overlay: OverlayControl;

    fn open(&mut self, kind: GridKind) -> Result<Self::Overlay, OverlayError>;
}

/// Production provider, launching the per-family command from config
pub struct ProcessOverlayProvider {
    grids: GridsConfig,
}

impl ProcessOverlayProvider {
    pub fn new(grids: GridsConfig) -> Self {
        Self { grids }
    }
}

impl OverlayProvider for ProcessOverlayProvider {
    type Overlay = ProcessOverlay;

    fn open(&mut self, kind: GridKind) -> Result<ProcessOverlay, OverlayError> {
        let layout = kind.layout(&self.grids);
        if layout.command.is_empty() {
            return Err(OverlayError(format!("no overlay command configured for {}", kind)));
        }
        Ok(ProcessOverlay::new(kind.window_title(), layout.command.clone()))
    }
}
