//! Cell-index to screen-coordinate mapping
//!
//! A grid divides a pixel rectangle into `rows x columns` cells addressed
//! by a 1-based index running left-to-right, top-to-bottom. A cell can
//! optionally be subdivided into a fixed 3x3 inner grid addressed the same
//! way. All index validation happens here, before any cursor movement.

use std::fmt;

/// Inner grids are always 3x3.
pub const INNER_DIM: u32 = 3;
const INNER_CELLS: u32 = INNER_DIM * INNER_DIM;

/// A cell index fell outside the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfRangeError {
    /// The index as spoken (1-based)
    pub index: u32,
    /// Highest valid index for the slot
    pub max: u32,
    /// Which slot was out of range
    pub slot: &'static str,
}

impl fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} index {} out of range (1..={})",
            self.slot, self.index, self.max
        )
    }
}

impl std::error::Error for OutOfRangeError {}

/// Selected cell: a 1-based outer index plus an optional 1-based inner
/// index into the cell's 3x3 subdivision.
///
/// `0` is the "no selection" sentinel for both fields: an outer of 0 means
/// no cell was spoken (drags use it to start from the current cursor), an
/// inner of 0 means the whole cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSelection {
    pub outer: u32,
    pub inner: u32,
}

impl CellSelection {
    /// Selection of a whole cell
    pub fn cell(outer: u32) -> Self {
        Self { outer, inner: 0 }
    }

    /// Selection of an inner sub-cell
    pub fn sub(outer: u32, inner: u32) -> Self {
        Self { outer, inner }
    }

    /// The "nothing spoken" sentinel
    pub fn none() -> Self {
        Self { outer: 0, inner: 0 }
    }

    pub fn is_none(&self) -> bool {
        self.outer == 0
    }
}

/// Pixel geometry of an on-screen grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    origin: (i32, i32),
    cell_width: i32,
    cell_height: i32,
    rows: u32,
    columns: u32,
}

impl Grid {
    pub fn new(origin: (i32, i32), cell_width: i32, cell_height: i32, rows: u32, columns: u32) -> Self {
        debug_assert!(cell_width > 0 && cell_height > 0);
        debug_assert!(rows > 0 && columns > 0);
        Self {
            origin,
            cell_width,
            cell_height,
            rows,
            columns,
        }
    }

    /// Grid covering `(width, height)` pixels with the given cell counts.
    pub fn covering(width: i32, height: i32, rows: u32, columns: u32) -> Self {
        Self::new((0, 0), width / columns as i32, height / rows as i32, rows, columns)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Highest addressable outer index
    pub fn cell_count(&self) -> u32 {
        self.rows * self.columns
    }

    /// Resolve a selection to absolute screen coordinates.
    ///
    /// Inner index 0 yields the outer cell's center; 1..=9 yields the
    /// center of the corresponding 3x3 sub-cell.
    pub fn resolve(&self, selection: CellSelection) -> Result<(i32, i32), OutOfRangeError> {
        let (left, top) = self.cell_origin(selection.outer)?;

        if selection.inner == 0 {
            return Ok((left + self.cell_width / 2, top + self.cell_height / 2));
        }
        if selection.inner > INNER_CELLS {
            return Err(OutOfRangeError {
                index: selection.inner,
                max: INNER_CELLS,
                slot: "inner cell",
            });
        }

        let sub_w = self.cell_width / INNER_DIM as i32;
        let sub_h = self.cell_height / INNER_DIM as i32;
        let col = ((selection.inner - 1) % INNER_DIM) as i32;
        let row = ((selection.inner - 1) / INNER_DIM) as i32;
        Ok((left + col * sub_w + sub_w / 2, top + row * sub_h + sub_h / 2))
    }

    /// Top-left corner of a 1-based outer cell
    fn cell_origin(&self, outer: u32) -> Result<(i32, i32), OutOfRangeError> {
        if outer == 0 || outer > self.cell_count() {
            return Err(OutOfRangeError {
                index: outer,
                max: self.cell_count(),
                slot: "cell",
            });
        }
        let col = ((outer - 1) % self.columns) as i32;
        let row = ((outer - 1) / self.columns) as i32;
        Ok((
            self.origin.0 + col * self.cell_width,
            self.origin.1 + row * self.cell_height,
        ))
    }

    /// Pixel bounds of an outer cell as `(left, top, right, bottom)`,
    /// right/bottom exclusive.
    pub fn cell_bounds(&self, outer: u32) -> Result<(i32, i32, i32, i32), OutOfRangeError> {
        let (left, top) = self.cell_origin(outer)?;
        Ok((left, top, left + self.cell_width, top + self.cell_height))
    }

    /// Inverse of [`resolve`](Self::resolve) at the cell level: the
    /// 0-based `(row, column)` containing a point, if inside the grid.
    pub fn cell_of_point(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        let dx = x - self.origin.0;
        let dy = y - self.origin.1;
        if dx < 0 || dy < 0 {
            return None;
        }
        let col = (dx / self.cell_width) as u32;
        let row = (dy / self.cell_height) as u32;
        if row >= self.rows || col >= self.columns {
            return None;
        }
        Some((row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x3() -> Grid {
        Grid::new((0, 0), 30, 30, 3, 3)
    }

    #[test]
    fn test_outer_centers() {
        let grid = grid_3x3();
        assert_eq!(grid.resolve(CellSelection::cell(1)).unwrap(), (15, 15));
        assert_eq!(grid.resolve(CellSelection::cell(5)).unwrap(), (45, 45));
        assert_eq!(grid.resolve(CellSelection::cell(9)).unwrap(), (75, 75));
    }

    #[test]
    fn test_origin_offset() {
        let grid = Grid::new((100, 200), 30, 30, 3, 3);
        assert_eq!(grid.resolve(CellSelection::cell(1)).unwrap(), (115, 215));
        assert_eq!(grid.resolve(CellSelection::cell(5)).unwrap(), (145, 245));
    }

    #[test]
    fn test_inner_points_stay_inside_outer_cell() {
        let grid = grid_3x3();
        for outer in 1..=9 {
            let (left, top, right, bottom) = grid.cell_bounds(outer).unwrap();
            for inner in 1..=9 {
                let (x, y) = grid.resolve(CellSelection::sub(outer, inner)).unwrap();
                assert!(x > left && x < right, "outer {outer} inner {inner}: x {x}");
                assert!(y > top && y < bottom, "outer {outer} inner {inner}: y {y}");
            }
        }
    }

    #[test]
    fn test_inner_corners() {
        // 90px cells subdivide into 30px sub-cells
        let grid = Grid::new((0, 0), 90, 90, 2, 2);
        assert_eq!(grid.resolve(CellSelection::sub(1, 1)).unwrap(), (15, 15));
        assert_eq!(grid.resolve(CellSelection::sub(1, 5)).unwrap(), (45, 45));
        assert_eq!(grid.resolve(CellSelection::sub(1, 9)).unwrap(), (75, 75));
        assert_eq!(grid.resolve(CellSelection::sub(4, 1)).unwrap(), (105, 105));
    }

    #[test]
    fn test_out_of_range_never_resolves() {
        let grid = grid_3x3();
        for outer in [0, 10, 100, 999] {
            let err = grid.resolve(CellSelection::cell(outer)).unwrap_err();
            assert_eq!(err.max, 9);
            assert_eq!(err.index, outer);
        }
        let err = grid.resolve(CellSelection::sub(5, 10)).unwrap_err();
        assert_eq!(err.slot, "inner cell");
    }

    #[test]
    fn test_round_trip_row_column() {
        let grid = Grid::new((40, 60), 32, 24, 7, 11);
        for outer in 1..=grid.cell_count() {
            let (x, y) = grid.resolve(CellSelection::cell(outer)).unwrap();
            let expected = ((outer - 1) / 11, (outer - 1) % 11);
            assert_eq!(grid.cell_of_point(x, y), Some(expected), "outer {outer}");
        }
    }

    #[test]
    fn test_cell_of_point_outside() {
        let grid = grid_3x3();
        assert_eq!(grid.cell_of_point(-1, 10), None);
        assert_eq!(grid.cell_of_point(10, 91), None);
        assert_eq!(grid.cell_of_point(91, 10), None);
    }

    #[test]
    fn test_covering_screen() {
        let grid = Grid::covering(1920, 1080, 9, 12);
        assert_eq!(grid.cell_count(), 108);
        // first cell center sits inside the first 160x120 block
        let (x, y) = grid.resolve(CellSelection::cell(1)).unwrap();
        assert_eq!((x, y), (80, 60));
    }
}
