//! Window table, spawn geometry, and stacking transitions.
//!
//! The home grid's pixel size is the coordinate space for every window. The z-order is a stack of
//! window ids with the focused window at the tail.

use std::collections::BTreeMap;

use leptos::logging;

use crate::{
    env::ShellEnv,
    error::{ShellError, ShellResult},
    model::{
        point_inside, Anchor, GridId, Position, ProcessId, ShellState, Size, SizeUnit, WindowFlags,
        WindowId, WindowMetadata, WindowRecord,
    },
    process,
};

#[derive(Debug, Clone, Default, PartialEq)]
/// Open windows and their stacking order.
pub struct WindowTable {
    windows: BTreeMap<WindowId, WindowRecord>,
    z_order: Vec<WindowId>,
}

impl WindowTable {
    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.get(&id)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn require(&self, id: WindowId) -> ShellResult<&WindowRecord> {
        self.windows.get(&id).ok_or(ShellError::WindowNotFound(id))
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Windows from bottom to top of the stack.
    pub fn iter(&self) -> impl Iterator<Item = &WindowRecord> {
        self.z_order.iter().filter_map(|id| self.windows.get(id))
    }

    pub fn z_order(&self) -> &[WindowId] {
        &self.z_order
    }

    /// Tail of the z-order, when that window is visible.
    pub fn focused_window_id(&self) -> Option<WindowId> {
        let id = *self.z_order.last()?;
        self.windows
            .get(&id)
            .filter(|window| window.is_visible())
            .map(|_| id)
    }

    /// Inserts a window on top of the stack, replacing any record with the same id.
    pub fn add_window(&mut self, window: WindowRecord) {
        let id = window.id;
        self.z_order.retain(|existing| *existing != id);
        self.z_order.push(id);
        self.windows.insert(id, window);
    }

    pub fn remove_window(&mut self, id: WindowId) -> Option<WindowRecord> {
        self.z_order.retain(|existing| *existing != id);
        self.windows.remove(&id)
    }

    /// Raises the window to the tail, clearing minimized and show-desktop hiding. Returns whether
    /// anything changed; focusing the visible top window is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn focus_window(&mut self, id: WindowId) -> ShellResult<bool> {
        let visible = self.require(id)?.is_visible();
        if visible && self.z_order.last() == Some(&id) {
            return Ok(false);
        }
        let window = self.window_mut(id)?;
        window.is_minimized = false;
        window.hidden_by_desktop_mode = false;
        self.z_order.retain(|existing| *existing != id);
        self.z_order.push(id);
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn minimize_window(&mut self, id: WindowId) -> ShellResult<bool> {
        let window = self.window_mut(id)?;
        if window.is_minimized {
            return Ok(false);
        }
        window.is_minimized = true;
        Ok(true)
    }

    /// Fills `bounds` from the origin, remembering the current geometry for restore.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn maximize_window(&mut self, id: WindowId, bounds: Size) -> ShellResult<bool> {
        let window = self.window_mut(id)?;
        if !window.flags.maximizable {
            return Ok(false);
        }
        if window.is_maximized && window.size == bounds && window.position == Position::default()
        {
            return Ok(false);
        }
        if !window.is_maximized {
            window.previous_position = window.position;
            window.previous_size = window.size;
        }
        window.is_maximized = true;
        window.is_minimized = false;
        window.position = Position::default();
        window.size = bounds;
        Ok(true)
    }

    /// Returns a maximized window to the geometry it had before maximizing.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn restore_window(&mut self, id: WindowId) -> ShellResult<bool> {
        let window = self.window_mut(id)?;
        if !window.is_maximized {
            return Ok(false);
        }
        window.is_maximized = false;
        window.position = window.previous_position;
        window.size = window.previous_size;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn move_window(&mut self, id: WindowId, position: Position) -> ShellResult<bool> {
        let window = self.window_mut(id)?;
        if window.position == position {
            return Ok(false);
        }
        window.position = position;
        Ok(true)
    }

    /// Writes position and size together; unchanged values are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn set_bounds(&mut self, id: WindowId, position: Position, size: Size) -> ShellResult<bool> {
        let window = self.window_mut(id)?;
        if window.position == position && window.size == size {
            return Ok(false);
        }
        window.position = position;
        window.size = size;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::WindowNotFound`] when the window is not open.
    pub fn set_title(&mut self, id: WindowId, title: impl Into<String>) -> ShellResult<bool> {
        let window = self.window_mut(id)?;
        let title = title.into();
        if window.title == title {
            return Ok(false);
        }
        window.title = title;
        Ok(true)
    }

    /// Flags every window hidden for show-desktop. Stacking order is kept.
    pub fn hide_all(&mut self) -> bool {
        let mut changed = false;
        for window in self.windows.values_mut() {
            changed |= !window.hidden_by_desktop_mode;
            window.hidden_by_desktop_mode = true;
        }
        changed
    }

    pub fn unhide_all(&mut self) -> bool {
        let mut changed = false;
        for window in self.windows.values_mut() {
            changed |= window.hidden_by_desktop_mode;
            window.hidden_by_desktop_mode = false;
        }
        changed
    }

    /// Scales every window's position and size, rounding to whole pixels and keeping each window at
    /// or above its minimum size. Returns whether any window changed.
    pub fn rescale_all(&mut self, scale_x: f64, scale_y: f64) -> bool {
        let mut changed = false;
        for window in self.windows.values_mut() {
            let position = Position::new(
                scale_px(window.position.x, scale_x),
                scale_px(window.position.y, scale_y),
            );
            let mut size = Size::new(
                scale_px(window.size.width, scale_x),
                scale_px(window.size.height, scale_y),
            );
            if let Some(min) = window.min_size {
                size = size.clamped_min(min);
            }
            if window.position != position || window.size != size {
                window.position = position;
                window.size = size;
                changed = true;
            }
        }
        changed
    }

    pub fn clear(&mut self) {
        self.windows.clear();
        self.z_order.clear();
    }

    pub(crate) fn window_mut(&mut self, id: WindowId) -> ShellResult<&mut WindowRecord> {
        self.windows
            .get_mut(&id)
            .ok_or(ShellError::WindowNotFound(id))
    }
}

/// Rounds half up.
fn scale_px(value: i32, scale: f64) -> i32 {
    (f64::from(value) * scale + 0.5).floor() as i32
}

/// Computes the initial window record for a process without registering it.
///
/// Size is the spawn size (fractions of the home grid for `%`), clamped to the spawn min (else the
/// global minimum) and the spawn max (else the viewport). Desktop windows are centered unless
/// anchored; mobile windows fill the home grid below the status bar.
///
/// # Errors
///
/// Returns the fatal [`ShellError::HomeGridMissing`] when the home grid is absent or unmeasured.
pub fn create_window(
    env: &ShellEnv,
    state: &ShellState,
    process_id: ProcessId,
    meta: Option<&WindowMetadata>,
    title: &str,
    silent: bool,
) -> ShellResult<WindowRecord> {
    let home = state.grids.home_size()?;
    let defaults = &env.config.windows;
    let viewport = state.desktop.viewport;

    let spawn = meta.and_then(|m| m.spawn.as_ref());
    let spawn_size = spawn.map(|s| s.size).unwrap_or(defaults.default_spawn);
    let (raw_width, raw_height) = match spawn_size.unit {
        SizeUnit::Percent => (
            f64::from(home.width) * spawn_size.width,
            f64::from(home.height) * spawn_size.height,
        ),
        SizeUnit::Px => (spawn_size.width, spawn_size.height),
    };
    let lower = spawn.and_then(|s| s.min_size).unwrap_or(defaults.min_size);
    let upper = spawn.and_then(|s| s.max_size).unwrap_or(viewport);
    let width = clamp_px(raw_width, lower.width, upper.width);
    let height = clamp_px(raw_height, lower.height, upper.height);

    let (position, size) = if state.is_desktop() {
        let mut x = (home.width - width) / 2;
        let mut y = (home.height - height) / 2;
        match meta.and_then(|m| m.anchor) {
            Some(Anchor::TopLeft) => {
                x = 0;
                y = 0;
            }
            Some(Anchor::BottomCenter) => y = home.height - height,
            Some(Anchor::BottomRight) => {
                x = home.width - width;
                y = home.height - height;
            }
            Some(Anchor::Center) | None => {}
        }
        (Position::new(x, y), Size::new(width, height))
    } else {
        (Position::new(0, defaults.mobile_top_offset), home)
    };

    Ok(WindowRecord {
        id: WindowId(process_id),
        process_id,
        title: title.to_string(),
        position,
        size,
        previous_position: position,
        previous_size: size,
        min_size: Some(meta.and_then(|m| m.min_size).unwrap_or(defaults.min_size)),
        max_size: meta.and_then(|m| m.max_size),
        is_minimized: silent,
        is_maximized: spawn_size.is_full_container(),
        hidden_by_desktop_mode: false,
        flags: meta.map(WindowFlags::from).unwrap_or_default(),
    })
}

/// Clamps with the upper bound applied last, so an inverted range yields `upper`.
fn clamp_px(value: f64, lower: i32, upper: i32) -> i32 {
    (value.round() as i32).max(lower).min(upper)
}

/// Raises a window and leaves show-desktop mode.
///
/// # Errors
///
/// Returns [`ShellError::WindowNotFound`] when the window is not open.
pub fn focus_window(state: &mut ShellState, id: WindowId) -> ShellResult<bool> {
    let changed = state.windows.focus_window(id)?;
    if changed {
        state.desktop.showing_desktop = false;
    }
    Ok(changed)
}

/// Taskbar toggle: minimizes the focused window, otherwise focuses it.
///
/// # Errors
///
/// Returns [`ShellError::WindowNotFound`] when the window is not open.
pub fn focus_or_minimize(state: &mut ShellState, id: WindowId) -> ShellResult<bool> {
    state.windows.require(id)?;
    if state.windows.focused_window_id() == Some(id) {
        state.windows.minimize_window(id)
    } else {
        focus_window(state, id)
    }
}

/// # Errors
///
/// Returns [`ShellError::WindowNotFound`] for an unknown window, or the fatal
/// [`ShellError::HomeGridMissing`] when maximizing without a measured home grid.
pub fn maximize_window(state: &mut ShellState, id: WindowId) -> ShellResult<bool> {
    state.windows.require(id)?;
    let bounds = state.grids.home_size()?;
    state.windows.maximize_window(id, bounds)
}

/// # Errors
///
/// See [`maximize_window`].
pub fn maximize_or_restore(state: &mut ShellState, id: WindowId) -> ShellResult<bool> {
    if state.windows.require(id)?.is_maximized {
        state.windows.restore_window(id)
    } else {
        maximize_window(state, id)
    }
}

/// Closes a window by stopping its owning process.
///
/// # Errors
///
/// Returns [`ShellError::WindowNotFound`] when the window is not open.
pub fn close_window(state: &mut ShellState, id: WindowId) -> ShellResult<()> {
    let process_id = state.windows.require(id)?.process_id;
    if state.processes.get(process_id).is_some() {
        process::stop_process(state, process_id)
    } else {
        logging::warn!("{id} has no owning process; removing it directly");
        state.windows.remove_window(id);
        if state.desktop.ephemeral_window_id == Some(id) {
            state.desktop.ephemeral_window_id = None;
        }
        Ok(())
    }
}

pub fn close_all_windows(state: &mut ShellState) {
    let ids: Vec<WindowId> = state.windows.z_order().to_vec();
    for id in ids {
        if let Err(err) = close_window(state, id) {
            logging::warn!("failed to close {id}: {err}");
        }
    }
}

/// Minimizes the session's ephemeral window when `click` is absent or outside it. Returns whether
/// it was dismissed.
pub fn try_close_ephemeral_window(state: &mut ShellState, click: Option<Position>) -> bool {
    let Some(id) = state.desktop.ephemeral_window_id else {
        return false;
    };
    let Some(window) = state.windows.get(id) else {
        return false;
    };
    if click.is_some_and(|point| point_inside(point, window.position, window.size)) {
        return false;
    }
    let _ = state.windows.minimize_window(id);
    state.desktop.ephemeral_window_id = None;
    true
}

/// Hides every window, or brings them all back when already showing the desktop.
pub fn toggle_show_desktop(state: &mut ShellState) -> bool {
    if state.desktop.showing_desktop {
        state.desktop.showing_desktop = false;
        state.windows.unhide_all();
    } else {
        state.desktop.showing_desktop = true;
        state.windows.hide_all();
    }
    true
}

/// Rescales windows proportionally after the home grid changed from `old_size` to its current
/// size. Nothing changes when either size has a zero axis.
///
/// # Errors
///
/// Returns the fatal [`ShellError::HomeGridMissing`] when the home grid is not registered.
pub fn reconcile_window_positions(state: &mut ShellState, old_size: Size) -> ShellResult<bool> {
    let current = state
        .grids
        .get(GridId::Home)
        .ok_or(ShellError::HomeGridMissing)?
        .size;
    if !current.has_area() || !old_size.has_area() {
        return Ok(false);
    }
    let scale_x = f64::from(current.width) / f64::from(old_size.width);
    let scale_y = f64::from(current.height) / f64::from(old_size.height);
    Ok(state.windows.rescale_all(scale_x, scale_y))
}
