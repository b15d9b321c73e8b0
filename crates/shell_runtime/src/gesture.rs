//! Pointer-driven window drag and resize sessions.
//!
//! A session starts on pointer-down, receives zero or more pointer moves, and ends on pointer-up.
//! Sessions whose window disappears are dropped by [`InteractionState::retain_live`].

use crate::{
    env::ShellEnv,
    error::ShellResult,
    model::{GridId, Position, ShellState, Size, WindowId},
    window_manager::{self, WindowTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: Position,
    pub position_start: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub edge: ResizeEdge,
    pub pointer_start: Position,
    pub position_start: Position,
    pub size_start: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSession {
    Drag(DragSession),
    Resize(ResizeSession),
}

impl GestureSession {
    pub fn window_id(&self) -> WindowId {
        match self {
            Self::Drag(session) => session.window_id,
            Self::Resize(session) => session.window_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Transient pointer state kept apart from [`ShellState`].
pub struct InteractionState {
    pub gesture: Option<GestureSession>,
}

impl InteractionState {
    /// Starts dragging a window and raises it. Windows that are not draggable are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ShellError::WindowNotFound`] when the window is not open.
    pub fn begin_drag(
        &mut self,
        state: &mut ShellState,
        window_id: WindowId,
        pointer: Position,
    ) -> ShellResult<bool> {
        let window = state.windows.require(window_id)?;
        if !window.flags.draggable {
            return Ok(false);
        }
        let position_start = window.position;
        window_manager::focus_window(state, window_id)?;
        self.gesture = Some(GestureSession::Drag(DragSession {
            window_id,
            pointer_start: pointer,
            position_start,
        }));
        Ok(true)
    }

    /// Starts resizing a window from `edge` and raises it. Fixed-size windows are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ShellError::WindowNotFound`] when the window is not open.
    pub fn begin_resize(
        &mut self,
        state: &mut ShellState,
        window_id: WindowId,
        edge: ResizeEdge,
        pointer: Position,
    ) -> ShellResult<bool> {
        let window = state.windows.require(window_id)?;
        if !window.flags.resizable {
            return Ok(false);
        }
        let session = ResizeSession {
            window_id,
            edge,
            pointer_start: pointer,
            position_start: window.position,
            size_start: window.size,
        };
        window_manager::focus_window(state, window_id)?;
        self.gesture = Some(GestureSession::Resize(session));
        Ok(true)
    }

    /// Applies a pointer sample to the active session. Returns whether the window changed.
    pub fn update(&mut self, env: &ShellEnv, state: &mut ShellState, pointer: Position) -> bool {
        let Some(gesture) = self.gesture else {
            return false;
        };
        if !state.windows.contains(gesture.window_id()) {
            self.gesture = None;
            return false;
        }
        match gesture {
            GestureSession::Drag(session) => apply_drag(env, state, session, pointer),
            GestureSession::Resize(session) => apply_resize(state, session, pointer),
        }
    }

    /// Ends the active session. A resized window is brought back up to its minimum size.
    pub fn end(&mut self, state: &mut ShellState) -> Option<WindowId> {
        let gesture = self.gesture.take()?;
        let window_id = gesture.window_id();
        if let GestureSession::Resize(_) = gesture {
            if let Ok(window) = state.windows.require(window_id) {
                if let Some(min) = window.min_size {
                    let size = window.size.clamped_min(min);
                    let position = window.position;
                    let _ = state.windows.set_bounds(window_id, position, size);
                }
            }
        }
        Some(window_id)
    }

    /// Drops the session when its window is gone. Returns whether a session was dropped.
    pub fn retain_live(&mut self, windows: &WindowTable) -> bool {
        match self.gesture {
            Some(gesture) if !windows.contains(gesture.window_id()) => {
                self.gesture = None;
                true
            }
            _ => false,
        }
    }
}

fn apply_drag(env: &ShellEnv, state: &mut ShellState, session: DragSession, pointer: Position) -> bool {
    let Some(home_height) = state
        .grids
        .get(GridId::Home)
        .map(|grid| grid.size.height)
        .filter(|height| *height > 0)
    else {
        return false;
    };
    let max_y = (home_height - env.config.windows.title_bar_height).max(0);
    let dx = pointer.x - session.pointer_start.x;
    let dy = pointer.y - session.pointer_start.y;
    let position = Position::new(
        session.position_start.x + dx,
        (session.position_start.y + dy).clamp(0, max_y),
    );
    state
        .windows
        .move_window(session.window_id, position)
        .unwrap_or(false)
}

fn apply_resize(state: &mut ShellState, session: ResizeSession, pointer: Position) -> bool {
    let viewport = state.desktop.viewport;
    let inside_viewport = pointer.x >= 0
        && pointer.y >= 0
        && pointer.x <= viewport.width
        && pointer.y <= viewport.height;
    if !inside_viewport {
        return false;
    }
    let Ok(window) = state.windows.require(session.window_id) else {
        return false;
    };

    let dx = pointer.x - session.pointer_start.x;
    let dy = pointer.y - session.pointer_start.y;
    let (candidate_position, candidate_size) =
        resize_bounds(session.position_start, session.size_start, session.edge, dx, dy);

    let min = window.min_size.unwrap_or_default();
    let width_ok = candidate_size.width >= min.width && candidate_size.width <= viewport.width;
    let height_ok = candidate_size.height >= min.height && candidate_size.height <= viewport.height;

    let position = Position::new(
        if width_ok { candidate_position.x } else { window.position.x },
        if height_ok { candidate_position.y } else { window.position.y },
    );
    let size = Size::new(
        if width_ok { candidate_size.width } else { window.size.width },
        if height_ok { candidate_size.height } else { window.size.height },
    );
    state
        .windows
        .set_bounds(session.window_id, position, size)
        .unwrap_or(false)
}

/// Applies a pointer delta to the bounds captured at resize start for the dragged edge or corner.
pub fn resize_bounds(
    position: Position,
    size: Size,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
) -> (Position, Size) {
    let Position { mut x, mut y } = position;
    let Size {
        mut width,
        mut height,
    } = size;
    match edge {
        ResizeEdge::North => {
            y += dy;
            height -= dy;
        }
        ResizeEdge::East => width += dx,
        ResizeEdge::South => height += dy,
        ResizeEdge::West => {
            x += dx;
            width -= dx;
        }
        ResizeEdge::NorthEast => {
            width += dx;
            y += dy;
            height -= dy;
        }
        ResizeEdge::NorthWest => {
            x += dx;
            width -= dx;
            y += dy;
            height -= dy;
        }
        ResizeEdge::SouthEast => {
            width += dx;
            height += dy;
        }
        ResizeEdge::SouthWest => {
            x += dx;
            width -= dx;
            height += dy;
        }
    }
    (Position::new(x, y), Size::new(width, height))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use platform_host::ManualClock;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        catalog::ShellCatalog,
        config::ShellConfig,
        model::{GridState, LayoutDirection, Platform, ProcessId},
    };

    fn setup() -> (ShellEnv, ShellState, WindowId) {
        let env = ShellEnv::new(
            ShellConfig::default(),
            ShellCatalog::default(),
            Rc::new(ManualClock::starting_at(0)),
        );
        let mut state = ShellState::new(Platform::Desktop, &ShellConfig::default());
        state.desktop.viewport = Size::new(1200, 900);
        state.grids.ensure_grid(
            GridState::new(GridId::Home, 8, 8, LayoutDirection::Vertical)
                .with_size(Size::new(1200, 860)),
        );
        let window = window_manager::create_window(&env, &state, ProcessId(1), None, "w", false)
            .expect("window");
        let id = window.id;
        state.windows.add_window(window);
        state
            .windows
            .set_bounds(id, Position::new(100, 100), Size::new(500, 400))
            .expect("bounds");
        (env, state, id)
    }

    #[test]
    fn drag_moves_by_pointer_delta_and_clamps_vertically() {
        let (env, mut state, id) = setup();
        let mut interaction = InteractionState::default();

        interaction
            .begin_drag(&mut state, id, Position::new(10, 10))
            .expect("begin");
        assert!(interaction.update(&env, &mut state, Position::new(35, 50)));
        assert_eq!(
            state.windows.require(id).expect("window").position,
            Position::new(125, 140)
        );

        interaction.update(&env, &mut state, Position::new(35, -500));
        assert_eq!(state.windows.require(id).expect("window").position.y, 0);

        interaction.update(&env, &mut state, Position::new(35, 5000));
        assert_eq!(state.windows.require(id).expect("window").position.y, 840);

        assert!(!interaction.update(&env, &mut state, Position::new(35, 5000)));
        assert_eq!(interaction.end(&mut state), Some(id));
        assert_eq!(interaction.gesture, None);
    }

    #[test]
    fn drag_is_skipped_while_home_has_no_height() {
        let (env, mut state, id) = setup();
        state
            .grids
            .set_size(GridId::Home, Size::new(1200, 0))
            .expect("size");
        let mut interaction = InteractionState::default();

        interaction
            .begin_drag(&mut state, id, Position::new(10, 10))
            .expect("begin");
        assert!(!interaction.update(&env, &mut state, Position::new(60, 60)));
        assert_eq!(
            state.windows.require(id).expect("window").position,
            Position::new(100, 100)
        );
    }

    #[test]
    fn resize_validates_each_axis_independently() {
        let (env, mut state, id) = setup();
        let mut interaction = InteractionState::default();

        interaction
            .begin_resize(&mut state, id, ResizeEdge::SouthEast, Position::new(600, 500))
            .expect("begin");
        interaction.update(&env, &mut state, Position::new(700, 300));

        let window = state.windows.require(id).expect("window");
        assert_eq!(window.size, Size::new(600, 400));
        assert_eq!(window.position, Position::new(100, 100));
    }

    #[test]
    fn west_resize_moves_origin_with_width() {
        let (env, mut state, id) = setup();
        let mut interaction = InteractionState::default();

        interaction
            .begin_resize(&mut state, id, ResizeEdge::West, Position::new(100, 300))
            .expect("begin");
        interaction.update(&env, &mut state, Position::new(50, 300));

        let window = state.windows.require(id).expect("window");
        assert_eq!(window.position, Position::new(50, 100));
        assert_eq!(window.size, Size::new(550, 400));
    }

    #[test]
    fn pointer_samples_outside_viewport_are_ignored() {
        let (env, mut state, id) = setup();
        let mut interaction = InteractionState::default();
        interaction
            .begin_resize(&mut state, id, ResizeEdge::East, Position::new(600, 300))
            .expect("begin");

        assert!(!interaction.update(&env, &mut state, Position::new(-1, 300)));
        assert!(!interaction.update(&env, &mut state, Position::new(1201, 300)));
        assert_eq!(state.windows.require(id).expect("window").size, Size::new(500, 400));
    }

    #[test]
    fn session_is_dropped_when_window_closes() {
        let (env, mut state, id) = setup();
        let mut interaction = InteractionState::default();
        interaction
            .begin_drag(&mut state, id, Position::new(0, 0))
            .expect("begin");

        state.windows.remove_window(id);
        assert!(interaction.retain_live(&state.windows));
        assert_eq!(interaction.gesture, None);
        assert!(!interaction.update(&env, &mut state, Position::new(5, 5)));
    }

    #[test]
    fn update_without_window_ends_the_session() {
        let (env, mut state, id) = setup();
        let mut interaction = InteractionState::default();
        interaction
            .begin_resize(&mut state, id, ResizeEdge::North, Position::new(300, 100))
            .expect("begin");
        state.windows.remove_window(id);

        assert!(!interaction.update(&env, &mut state, Position::new(300, 50)));
        assert_eq!(interaction.gesture, None);
    }

    #[test]
    fn each_edge_moves_the_expected_sides() {
        let origin = Position::new(10, 10);
        let size = Size::new(100, 100);
        assert_eq!(
            resize_bounds(origin, size, ResizeEdge::NorthWest, 5, 5),
            (Position::new(15, 15), Size::new(95, 95))
        );
        assert_eq!(
            resize_bounds(origin, size, ResizeEdge::NorthEast, 5, 5),
            (Position::new(10, 15), Size::new(105, 95))
        );
        assert_eq!(
            resize_bounds(origin, size, ResizeEdge::SouthWest, 5, 5),
            (Position::new(15, 10), Size::new(95, 105))
        );
        assert_eq!(
            resize_bounds(origin, size, ResizeEdge::South, 5, 5),
            (origin, Size::new(100, 105))
        );
    }
}
