//! Launcher placement records and the grid placement engine.
//!
//! Each grid holds a list of [`GridLauncher`] records. Positions are unique per grid for every
//! in-bounds cell; icons that no longer fit after a shrink keep their out-of-bounds coordinate until
//! the grid grows again.

use std::collections::{BTreeMap, BTreeSet};

use leptos::logging;

use crate::{
    catalog::ShellCatalog,
    error::{ShellError, ShellResult},
    grid::{first_available_position, GridTable},
    model::{
        CellPosition, DisplayId, GridId, GridLauncher, GridState, LauncherId, LauncherMetadata,
        ProgramId,
    },
};

/// An icon relocated by [`LauncherTable::reconcile_launcher_positions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherMove {
    pub id: LauncherId,
    pub from: CellPosition,
    pub to: CellPosition,
}

/// Outcome of reconciling a grid against new dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub moved: Vec<LauncherMove>,
    /// Icons with no free in-bounds cell. They stay at their previous coordinate.
    pub overflowed: Vec<LauncherId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Placement records for every grid, with an id index.
pub struct LauncherTable {
    grids: BTreeMap<GridId, Vec<GridLauncher>>,
    index: BTreeMap<LauncherId, GridId>,
    last_launcher_id: u64,
    /// Set by every mutation of a persisted field; cleared by [`Self::take_placements_changed`].
    placements_changed: bool,
}

impl LauncherTable {
    /// Rebuilds a table from persisted records. Id allocation resumes above the largest id.
    pub fn from_records(records: impl IntoIterator<Item = GridLauncher>) -> Self {
        let mut table = Self::default();
        for mut record in records {
            if table.index.contains_key(&record.id) {
                logging::warn!("dropping duplicate launcher record {}", record.id);
                continue;
            }
            record.display_ids.clear();
            table.last_launcher_id = table.last_launcher_id.max(record.id.0);
            table.index.insert(record.id, record.grid_id);
            table.grids.entry(record.grid_id).or_default().push(record);
        }
        table
    }

    /// Returns whether placements changed since the last call, and resets the flag.
    pub fn take_placements_changed(&mut self) -> bool {
        std::mem::take(&mut self.placements_changed)
    }

    pub(crate) fn mark_placements_changed(&mut self) {
        self.placements_changed = true;
    }

    /// Every record across all grids, grouped by grid.
    pub fn records(&self) -> impl Iterator<Item = &GridLauncher> {
        self.grids.values().flatten()
    }

    pub fn launchers(&self, grid_id: GridId) -> &[GridLauncher] {
        self.grids.get(&grid_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: LauncherId) -> Option<&GridLauncher> {
        let grid_id = self.index.get(&id)?;
        self.launchers(*grid_id).iter().find(|l| l.id == id)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::LauncherNotFound`] when no record has this id.
    pub fn require(&self, id: LauncherId) -> ShellResult<&GridLauncher> {
        self.get(id).ok_or(ShellError::LauncherNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn launcher_at(&self, grid_id: GridId, cell: CellPosition) -> Option<&GridLauncher> {
        self.launchers(grid_id).iter().find(|l| l.position == cell)
    }

    pub fn occupied(&self, grid_id: GridId) -> BTreeSet<CellPosition> {
        self.launchers(grid_id).iter().map(|l| l.position).collect()
    }

    pub fn next_launcher_id(&mut self) -> LauncherId {
        self.last_launcher_id += 1;
        LauncherId(self.last_launcher_id)
    }

    /// Appends a record at a caller-chosen cell. Callers guarantee the cell is free.
    pub(crate) fn insert_at(
        &mut self,
        grid_id: GridId,
        meta: LauncherMetadata,
        position: CellPosition,
        is_pinned: bool,
        display_ids: Vec<DisplayId>,
    ) -> LauncherId {
        let id = self.next_launcher_id();
        self.placements_changed = true;
        self.index.insert(id, grid_id);
        self.grids.entry(grid_id).or_default().push(GridLauncher {
            id,
            meta,
            grid_id,
            position,
            display_ids,
            is_pinned,
        });
        id
    }

    pub(crate) fn get_mut(&mut self, id: LauncherId) -> ShellResult<&mut GridLauncher> {
        let grid_id = *self
            .index
            .get(&id)
            .ok_or(ShellError::LauncherNotFound(id))?;
        self.grids
            .get_mut(&grid_id)
            .and_then(|launchers| launchers.iter_mut().find(|l| l.id == id))
            .ok_or(ShellError::LauncherNotFound(id))
    }

    /// Places `meta` at the grid's first free cell.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::GridFull`] when no in-bounds cell is free. Existing icons are never
    /// displaced.
    pub fn add_launcher(
        &mut self,
        grid: &GridState,
        meta: LauncherMetadata,
    ) -> ShellResult<LauncherId> {
        let occupied = self.occupied(grid.id);
        let Some(position) =
            first_available_position(grid.rows, grid.cols, grid.layout_direction, &occupied)
        else {
            logging::debug_warn!("no available position for launcher in grid {}", grid.id);
            return Err(ShellError::GridFull(grid.id));
        };
        Ok(self.insert_at(grid.id, meta, position, true, Vec::new()))
    }

    /// Removes a record from whichever grid holds it.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::LauncherNotFound`] when no record has this id.
    pub fn remove_launcher(&mut self, id: LauncherId) -> ShellResult<GridLauncher> {
        let grid_id = self
            .index
            .remove(&id)
            .ok_or(ShellError::LauncherNotFound(id))?;
        let launchers = self
            .grids
            .get_mut(&grid_id)
            .ok_or(ShellError::LauncherNotFound(id))?;
        let index = launchers
            .iter()
            .position(|l| l.id == id)
            .ok_or(ShellError::LauncherNotFound(id))?;
        let removed = launchers.remove(index);
        self.placements_changed = true;
        Ok(removed)
    }

    /// Removes a record only if it lives on `grid_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::LauncherNotFound`] when the grid holds no record with this id.
    pub fn delete_from_grid(&mut self, grid_id: GridId, id: LauncherId) -> ShellResult<GridLauncher> {
        if self.index.get(&id) != Some(&grid_id) {
            return Err(ShellError::LauncherNotFound(id));
        }
        self.remove_launcher(id)
    }

    /// Moves the icon at `from` to `to` within one grid. An occupied target leaves both icons in
    /// place. Returns whether the icon moved.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::CellEmpty`] when no icon sits at `from`.
    pub fn move_launcher(
        &mut self,
        grid_id: GridId,
        from: CellPosition,
        to: CellPosition,
    ) -> ShellResult<bool> {
        let launchers = self
            .grids
            .get_mut(&grid_id)
            .ok_or(ShellError::CellEmpty(grid_id, from))?;
        let from_index = launchers
            .iter()
            .position(|l| l.position == from)
            .ok_or(ShellError::CellEmpty(grid_id, from))?;
        if from == to || launchers.iter().any(|l| l.position == to) {
            return Ok(false);
        }
        launchers[from_index].position = to;
        self.placements_changed = true;
        Ok(true)
    }

    /// Closes the gap left at `removed`: icons below it in the same column shift up, icons to its
    /// right in the same row shift left.
    pub fn reorder_after_removal(&mut self, grid_id: GridId, removed: CellPosition) {
        let Some(launchers) = self.grids.get_mut(&grid_id) else {
            return;
        };
        let mut shifted = false;
        for launcher in launchers {
            let CellPosition { x, y } = launcher.position;
            if x == removed.x && y > removed.y {
                launcher.position.y -= 1;
                shifted = true;
            }
            if y == removed.y && x > removed.x {
                launcher.position.x -= 1;
                shifted = true;
            }
        }
        self.placements_changed |= shifted;
    }

    /// Re-homes icons that fall outside `rows` x `cols`.
    ///
    /// An icon past the right edge first slides left along its (clamped) row; one past the bottom
    /// slides up its column. If that row or column is full the first free cell in fill order is
    /// used. Each placement claims its cell before the next icon is considered.
    pub fn reconcile_launcher_positions(
        &mut self,
        grid: &GridState,
        rows: u32,
        cols: u32,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let Some(launchers) = self.grids.get_mut(&grid.id) else {
            return report;
        };
        if rows == 0 || cols == 0 {
            report.overflowed = launchers.iter().map(|l| l.id).collect();
            return report;
        }

        let in_bounds = |cell: CellPosition| cell.x < cols && cell.y < rows;
        let mut occupied: BTreeSet<CellPosition> = launchers
            .iter()
            .map(|l| l.position)
            .filter(|cell| in_bounds(*cell))
            .collect();

        for launcher in launchers.iter_mut() {
            let from = launcher.position;
            if in_bounds(from) {
                continue;
            }

            let slid = if from.x >= cols {
                let y = from.y.min(rows - 1);
                (0..cols)
                    .rev()
                    .map(|x| CellPosition::new(x, y))
                    .find(|cell| !occupied.contains(cell))
            } else {
                (0..rows)
                    .rev()
                    .map(|y| CellPosition::new(from.x, y))
                    .find(|cell| !occupied.contains(cell))
            };
            let target = slid.or_else(|| {
                first_available_position(rows, cols, grid.layout_direction, &occupied)
            });

            match target {
                Some(to) => {
                    occupied.insert(to);
                    launcher.position = to;
                    report.moved.push(LauncherMove {
                        id: launcher.id,
                        from,
                        to,
                    });
                }
                None => report.overflowed.push(launcher.id),
            }
        }
        self.placements_changed |= !report.moved.is_empty();

        if !report.overflowed.is_empty() {
            logging::warn!(
                "{} launcher(s) do not fit in grid {} ({rows}x{cols})",
                report.overflowed.len(),
                grid.id
            );
        }
        report
    }

    /// Replaces a grid's records with its catalog default layout.
    pub fn reset_launchers(&mut self, catalog: &ShellCatalog, grid_id: GridId) {
        for old in self.grids.remove(&grid_id).unwrap_or_default() {
            self.index.remove(&old.id);
            self.placements_changed = true;
        }
        for entry in catalog.default_layout(grid_id) {
            let Some(meta) = catalog.launcher(&entry.launcher) else {
                logging::warn!("default layout references unknown launcher `{}`", entry.launcher);
                continue;
            };
            self.insert_at(grid_id, meta.clone(), entry.position(), true, Vec::new());
        }
    }

    /// Boot-time pass over every registered grid: empty grids receive their default layout, and
    /// unpinned icons left over from the previous session are dropped.
    pub fn initialize_launchers(&mut self, grids: &GridTable, catalog: &ShellCatalog) {
        for grid in grids.iter() {
            if self.launchers(grid.id).is_empty() {
                self.reset_launchers(catalog, grid.id);
                continue;
            }
            let stale: Vec<LauncherId> = self
                .launchers(grid.id)
                .iter()
                .filter(|l| !l.is_pinned)
                .map(|l| l.id)
                .collect();
            for id in stale {
                logging::debug_warn!("removed unpinned launcher {id} from grid {}", grid.id);
                let _ = self.remove_launcher(id);
            }
        }
    }

    /// Removes every unpinned icon on `grid_id` that opens `program_id`. Nothing is removed when the
    /// first matching icon is pinned. Returns whether anything was removed.
    pub fn remove_from_grid_with_program_id(
        &mut self,
        grid_id: GridId,
        program_id: &ProgramId,
        reorder: bool,
    ) -> bool {
        let opens_program =
            |launcher: &GridLauncher| launcher.meta.target.program_id() == Some(program_id);
        let Some(first) = self.launchers(grid_id).iter().find(|l| opens_program(l)) else {
            return false;
        };
        if first.is_pinned {
            return false;
        }
        let removed_at = first.position;
        let ids: Vec<LauncherId> = self
            .launchers(grid_id)
            .iter()
            .filter(|l| opens_program(l))
            .map(|l| l.id)
            .collect();
        for id in ids {
            let _ = self.remove_launcher(id);
        }
        if reorder {
            self.reorder_after_removal(grid_id, removed_at);
        }
        true
    }

    /// Links a surface to the icon. Duplicate links are ignored.
    pub fn attach_display(&mut self, id: LauncherId, display_id: DisplayId) -> ShellResult<bool> {
        let launcher = self.get_mut(id)?;
        if launcher.display_ids.contains(&display_id) {
            return Ok(false);
        }
        launcher.display_ids.push(display_id);
        Ok(true)
    }

    /// Unlinks a surface from every icon that references it.
    pub fn detach_display(&mut self, display_id: DisplayId) -> bool {
        let mut changed = false;
        for launcher in self.grids.values_mut().flatten() {
            let before = launcher.display_ids.len();
            launcher.display_ids.retain(|id| *id != display_id);
            changed |= launcher.display_ids.len() != before;
        }
        changed
    }

    /// Drops every record but keeps id allocation monotonic.
    pub fn clear(&mut self) {
        self.placements_changed |= !self.index.is_empty();
        self.grids.clear();
        self.index.clear();
    }
}
