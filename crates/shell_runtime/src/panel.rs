//! Taskbar icon operations layered on [`LauncherTable`].

use leptos::logging;

use crate::{
    error::{ShellError, ShellResult},
    model::{CellPosition, DisplayId, GridId, LauncherId, LauncherMetadata, LauncherTarget},
    placement::LauncherTable,
    process::ProcessTable,
};

impl LauncherTable {
    /// Adds a taskbar icon, or updates the icon that already opens the same program or runs the
    /// same action. Pinning is only ever turned on here, never off. New icons take the first free
    /// column of the taskbar row.
    pub fn panel_add_launcher(
        &mut self,
        meta: LauncherMetadata,
        pinned: bool,
        display_id: Option<DisplayId>,
    ) -> LauncherId {
        let existing = self
            .launchers(GridId::Panel)
            .iter()
            .find(|launcher| launcher.meta.same_target(&meta))
            .map(|launcher| launcher.id);

        if let Some(id) = existing {
            let mut newly_pinned = false;
            if let Ok(launcher) = self.get_mut(id) {
                if let Some(display_id) = display_id {
                    if !launcher.display_ids.contains(&display_id) {
                        launcher.display_ids.push(display_id);
                    }
                }
                if pinned && !launcher.is_pinned {
                    launcher.is_pinned = true;
                    newly_pinned = true;
                }
            }
            if newly_pinned {
                self.mark_placements_changed();
            }
            return id;
        }

        let occupied = self.occupied(GridId::Panel);
        let column = (0..)
            .find(|x| !occupied.contains(&CellPosition::new(*x, 0)))
            .unwrap_or_default();
        self.insert_at(
            GridId::Panel,
            meta,
            CellPosition::new(column, 0),
            pinned,
            display_id.into_iter().collect(),
        )
    }

    /// Pins the metadata of an existing icon (from any grid) to the taskbar.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::LauncherNotFound`] when no record has this id.
    pub fn add_launcher_by_id(&mut self, id: LauncherId, pinned: bool) -> ShellResult<LauncherId> {
        let meta = self.require(id)?.meta.clone();
        Ok(self.panel_add_launcher(meta, pinned, None))
    }

    /// Unpins a taskbar icon. Action icons and icons of programs with no running instance are
    /// removed and the row compacted; icons of running programs stay until the last instance stops.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::LauncherNotFound`] when the taskbar holds no icon with this id.
    pub fn unpin_launcher(&mut self, id: LauncherId, processes: &ProcessTable) -> ShellResult<()> {
        if !self.launchers(GridId::Panel).iter().any(|l| l.id == id) {
            logging::debug_warn!("{id} is not on the taskbar");
            return Err(ShellError::LauncherNotFound(id));
        }
        let launcher = self.get_mut(id)?;
        let was_pinned = std::mem::replace(&mut launcher.is_pinned, false);
        let position = launcher.position;
        let target = launcher.meta.target.clone();
        if was_pinned {
            self.mark_placements_changed();
        }

        match target {
            LauncherTarget::Action { .. } => {
                self.remove_launcher(id)?;
                self.reorder_after_removal(GridId::Panel, position);
            }
            LauncherTarget::Program { program_id, .. } => {
                if processes.count_running(&program_id) == 0 {
                    self.remove_from_grid_with_program_id(GridId::Panel, &program_id, true);
                }
            }
        }
        Ok(())
    }
}
