//! Grid model: per-grid dimensions, cell addressing, auto-sizing, and resize debouncing.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{ShellError, ShellResult},
    model::{CellPosition, GridId, GridState, LayoutDirection, Position, Size},
};

/// Maps a linear fill index to a cell for the given dimensions and fill order.
pub fn cell_at_index(index: u32, rows: u32, cols: u32, direction: LayoutDirection) -> CellPosition {
    match direction {
        LayoutDirection::Vertical => {
            let rows = rows.max(1);
            CellPosition::new(index / rows, index % rows)
        }
        LayoutDirection::Horizontal => {
            let cols = cols.max(1);
            CellPosition::new(index % cols, index / cols)
        }
    }
}

/// Every in-bounds cell in fill order.
pub fn cells_in_fill_order(
    rows: u32,
    cols: u32,
    direction: LayoutDirection,
) -> impl Iterator<Item = CellPosition> {
    (0..rows.saturating_mul(cols)).map(move |index| cell_at_index(index, rows, cols, direction))
}

/// First unoccupied in-bounds cell, or `None` when every cell is taken.
pub fn first_available_position(
    rows: u32,
    cols: u32,
    direction: LayoutDirection,
    occupied: &BTreeSet<CellPosition>,
) -> Option<CellPosition> {
    cells_in_fill_order(rows, cols, direction).find(|cell| !occupied.contains(cell))
}

/// Derives `(rows, cols)` for a responsive grid from its measured pixel size.
///
/// Both axes fit as many `icon_size + margin` cells as the size allows (at least one). Horizontal
/// grids then shrink rows to what `icon_count` actually needs.
pub fn derive_dimensions(
    direction: LayoutDirection,
    size: Size,
    icon_size: u32,
    margin: u32,
    icon_count: usize,
) -> (u32, u32) {
    let pitch = (icon_size + margin).max(1);
    let fit = |px: i32| (px.max(0) as u32 / pitch).max(1);
    let cols = fit(size.width);
    let rows = match direction {
        LayoutDirection::Vertical => fit(size.height),
        LayoutDirection::Horizontal => {
            let count = icon_count.max(1) as u32;
            count.div_ceil(cols)
        }
    };
    (rows, cols)
}

/// Settled size change produced by [`ResizeDebouncer::take_settled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledResize {
    pub previous: Size,
    pub current: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingResize {
    size: Size,
    observed_at_ms: u64,
}

/// Coalesces bursts of size observations into one settled change per quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeDebouncer {
    delay_ms: u64,
    pending: BTreeMap<GridId, PendingResize>,
    last_settled: BTreeMap<GridId, Size>,
}

impl ResizeDebouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: BTreeMap::new(),
            last_settled: BTreeMap::new(),
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Records the size a grid had when it was mounted.
    pub fn prime(&mut self, grid_id: GridId, size: Size) {
        self.last_settled.insert(grid_id, size);
    }

    /// Records an observation, restarting the quiet period.
    pub fn observe(&mut self, grid_id: GridId, size: Size, now_ms: u64) {
        self.pending.insert(
            grid_id,
            PendingResize {
                size,
                observed_at_ms: now_ms,
            },
        );
    }

    pub fn is_pending(&self, grid_id: GridId) -> bool {
        self.pending.contains_key(&grid_id)
    }

    /// Time left in the quiet period of a pending resize, at least 1 ms.
    pub fn remaining_ms(&self, grid_id: GridId, now_ms: u64) -> Option<u64> {
        let pending = self.pending.get(&grid_id)?;
        let elapsed = now_ms.saturating_sub(pending.observed_at_ms);
        Some(self.delay_ms.saturating_sub(elapsed).max(1))
    }

    /// Returns the settled change once the quiet period has elapsed since the last observation.
    pub fn take_settled(&mut self, grid_id: GridId, now_ms: u64) -> Option<SettledResize> {
        let pending = *self.pending.get(&grid_id)?;
        if now_ms.saturating_sub(pending.observed_at_ms) < self.delay_ms {
            return None;
        }
        self.pending.remove(&grid_id);
        let previous = self
            .last_settled
            .insert(grid_id, pending.size)
            .unwrap_or_default();
        Some(SettledResize {
            previous,
            current: pending.size,
        })
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Registered grids keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTable {
    grids: BTreeMap<GridId, GridState>,
    resize: ResizeDebouncer,
}

impl Default for GridTable {
    fn default() -> Self {
        Self::new(250)
    }
}

impl GridTable {
    pub fn new(resize_debounce_ms: u64) -> Self {
        Self {
            grids: BTreeMap::new(),
            resize: ResizeDebouncer::new(resize_debounce_ms),
        }
    }

    /// Registers `grid` unless a grid with its id already exists. Returns whether it was inserted.
    pub fn ensure_grid(&mut self, grid: GridState) -> bool {
        if self.grids.contains_key(&grid.id) {
            return false;
        }
        self.resize.prime(grid.id, grid.size);
        self.grids.insert(grid.id, grid);
        true
    }

    pub fn get(&self, id: GridId) -> Option<&GridState> {
        self.grids.get(&id)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::GridNotFound`] when the grid is not registered.
    pub fn require(&self, id: GridId) -> ShellResult<&GridState> {
        self.grids.get(&id).ok_or(ShellError::GridNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridState> {
        self.grids.values()
    }

    /// Pixel size of the home grid, the coordinate space for all windows.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`ShellError::HomeGridMissing`] when the home grid is absent or unmeasured.
    pub fn home_size(&self) -> ShellResult<Size> {
        self.grids
            .get(&GridId::Home)
            .map(|grid| grid.size)
            .filter(|size| size.has_area())
            .ok_or(ShellError::HomeGridMissing)
    }

    /// Sets rows and columns together. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::GridNotFound`] when the grid is not registered.
    pub fn set_dimensions(&mut self, id: GridId, rows: u32, cols: u32) -> ShellResult<bool> {
        let grid = self.grid_mut(id)?;
        if grid.rows == rows && grid.cols == cols {
            return Ok(false);
        }
        grid.rows = rows;
        grid.cols = cols;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::GridNotFound`] when the grid is not registered.
    pub fn set_size(&mut self, id: GridId, size: Size) -> ShellResult<bool> {
        let grid = self.grid_mut(id)?;
        if grid.size == size {
            return Ok(false);
        }
        grid.size = size;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::GridNotFound`] when the grid is not registered.
    pub fn set_position(&mut self, id: GridId, position: Position) -> ShellResult<bool> {
        let grid = self.grid_mut(id)?;
        if grid.position == position {
            return Ok(false);
        }
        grid.position = position;
        Ok(true)
    }

    pub fn resize_debouncer(&self) -> &ResizeDebouncer {
        &self.resize
    }

    pub fn resize_debouncer_mut(&mut self) -> &mut ResizeDebouncer {
        &mut self.resize
    }

    /// Drops every grid. Hosts re-register grids when their surfaces mount again.
    pub fn clear(&mut self) {
        self.grids.clear();
        self.resize.clear();
    }

    fn grid_mut(&mut self, id: GridId) -> ShellResult<&mut GridState> {
        self.grids.get_mut(&id).ok_or(ShellError::GridNotFound(id))
    }
}
