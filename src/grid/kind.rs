//! The fixed set of grid families

use std::fmt;

use crate::config::{GridLayout, GridsConfig};
use crate::grid::geometry::Grid;
use crate::phrase;

/// Grid families, each with its own overlay window and layout.
///
/// Only one family's session may be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    /// Full-screen ruled grid
    Douglas,
    /// Color-banded rows
    Rainbow,
    /// Numbered squares with 3x3 sub-cell addressing
    Sudoku,
    /// Region grid
    Legion,
}

pub const ALL_KINDS: [GridKind; 4] = [
    GridKind::Douglas,
    GridKind::Rainbow,
    GridKind::Sudoku,
    GridKind::Legion,
];

impl GridKind {
    /// Fixed title of the overlay window for this family
    pub fn window_title(&self) -> &'static str {
        match self {
            GridKind::Douglas => "douglasgrid",
            GridKind::Rainbow => "rainbowgrid",
            GridKind::Sudoku => "sudokugrid",
            GridKind::Legion => "legiongrid",
        }
    }

    /// Spoken name of the family
    pub fn spoken_name(&self) -> &'static str {
        match self {
            GridKind::Douglas => "douglas",
            GridKind::Rainbow => "rainbow",
            GridKind::Sudoku => "sudoku",
            GridKind::Legion => "legion",
        }
    }

    /// Whether cells may be addressed with a 3x3 inner index
    pub fn supports_inner(&self) -> bool {
        matches!(self, GridKind::Sudoku)
    }

    /// Match a spoken word against the family names, tolerating
    /// recognition slop.
    pub fn from_spoken(word: &str) -> Option<Self> {
        ALL_KINDS
            .into_iter()
            .find(|kind| phrase::matches_keyword(kind.spoken_name(), word))
    }

    pub fn layout<'a>(&self, grids: &'a GridsConfig) -> &'a GridLayout {
        match self {
            GridKind::Douglas => &grids.douglas,
            GridKind::Rainbow => &grids.rainbow,
            GridKind::Sudoku => &grids.sudoku,
            GridKind::Legion => &grids.legion,
        }
    }

    /// Build this family's grid geometry over the given screen size.
    pub fn build_grid(&self, screen: (i32, i32), grids: &GridsConfig) -> Grid {
        let layout = self.layout(grids);
        Grid::covering(screen.0, screen.1, layout.rows, layout.columns)
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spoken_name())
    }
}
