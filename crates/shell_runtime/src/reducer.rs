//! Reducer actions, side-effect intents, and transition logic for the shell runtime.

use leptos::logging;

use crate::{
    catalog::START_MENU_PROGRAM_ID,
    env::ShellEnv,
    error::ShellResult,
    gesture::{InteractionState, ResizeEdge},
    grid::derive_dimensions,
    launcher,
    model::{
        CardId, CellPosition, DesktopSession, GridId, GridLauncher, GridSizing, GridState,
        LauncherAction, LauncherId, LauncherMetadata, OsStatus, Platform, Position, ProcessId,
        ProgramId, ShellState, Size, WindowId,
    },
    placement::LauncherTable,
    process, window_manager,
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_shell`] to mutate [`ShellState`].
pub enum ShellAction {
    /// Replace launcher placements with a persisted snapshot.
    HydrateLaunchers {
        /// Placement records restored from storage.
        records: Vec<GridLauncher>,
    },
    /// Apply default layouts to empty grids and drop stale unpinned icons.
    InitializeLaunchers,
    /// The desktop or mobile surface finished mounting its grids.
    DesktopMounted,
    /// Switch between the desktop and mobile surfaces. Running programs are stopped.
    SetPlatform {
        /// New platform.
        platform: Platform,
    },
    /// Set the OS lifecycle status.
    SetStatus {
        /// New status.
        status: OsStatus,
    },
    /// Enter the boot screen after a scheduled reboot delay.
    Boot,
    /// Record the browser viewport size.
    ViewportMeasured {
        /// Measured viewport.
        size: Size,
    },
    /// Register a grid when its container mounts.
    GridMounted {
        /// Grid with its initial measured size.
        grid: GridState,
    },
    /// A grid container was observed at a new size.
    GridObserved {
        /// Observed grid.
        grid_id: GridId,
        /// Observed container size.
        size: Size,
    },
    /// The resize debounce for a grid elapsed.
    GridResizeSettled {
        /// Grid whose pending size should be applied.
        grid_id: GridId,
    },
    /// A grid container moved on screen.
    GridMoved {
        /// Moved grid.
        grid_id: GridId,
        /// New container origin.
        position: Position,
    },
    /// Set a grid's rows and columns, re-homing icons that no longer fit.
    SetGridDimensions {
        /// Target grid.
        grid_id: GridId,
        /// New row count.
        rows: u32,
        /// New column count.
        cols: u32,
    },
    /// Start a process for a program launcher.
    StartProcess {
        /// Launcher describing the program and its arguments.
        launcher: LauncherMetadata,
        /// Open the window minimized.
        silent: bool,
    },
    /// Stop a process and tear down its surface.
    StopProcess {
        /// Process to stop.
        process_id: ProcessId,
    },
    /// Stop every instance of a program.
    StopProgram {
        /// Program to stop.
        program_id: ProgramId,
    },
    /// Stop every process.
    StopAllProcesses,
    /// Open a launcher from a menu or the taskbar.
    OpenLauncher {
        /// Launcher to open.
        meta: LauncherMetadata,
        /// Pointer position when clicked on the taskbar.
        panel_click: Option<Position>,
    },
    /// Open a placement record by id.
    OpenLauncherById {
        /// Placement record to open.
        id: LauncherId,
    },
    /// Pointer pressed on a grid icon.
    LauncherPointerDown {
        /// Icon under the pointer.
        id: LauncherId,
    },
    /// Pointer released on a grid icon.
    LauncherPointerUp {
        /// Icon under the pointer.
        id: LauncherId,
        /// Pointer position in viewport pixels.
        pointer: Position,
    },
    /// Add an icon to the current selection.
    AddSelectedLauncher {
        /// Icon to select.
        id: LauncherId,
    },
    /// Clear the icon selection.
    ClearLauncherSelection,
    /// Run a launcher action directly.
    ExecuteAction {
        /// Action to run.
        action: LauncherAction,
    },
    /// Place a launcher at a grid's first free cell.
    AddLauncher {
        /// Target grid.
        grid_id: GridId,
        /// Launcher to place.
        meta: LauncherMetadata,
    },
    /// Move the icon at `from` to `to`.
    MoveLauncher {
        /// Grid holding the icon.
        grid_id: GridId,
        /// Current cell.
        from: CellPosition,
        /// Target cell.
        to: CellPosition,
    },
    /// Remove an icon from a grid.
    DeleteLauncher {
        /// Grid holding the icon.
        grid_id: GridId,
        /// Icon to remove.
        id: LauncherId,
    },
    /// Re-home icons that fall outside `rows` x `cols` without changing the grid.
    ReconcileLaunchers {
        /// Target grid.
        grid_id: GridId,
        /// Row count to fit.
        rows: u32,
        /// Column count to fit.
        cols: u32,
    },
    /// Replace a grid's icons with its default layout.
    ResetLaunchers {
        /// Grid to reset.
        grid_id: GridId,
    },
    /// Add or update a taskbar icon.
    PanelAddLauncher {
        /// Launcher to show.
        meta: LauncherMetadata,
        /// Keep the icon when no instance runs.
        pinned: bool,
    },
    /// Unpin a taskbar icon.
    UnpinLauncher {
        /// Taskbar icon.
        id: LauncherId,
    },
    /// Raise a window.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Taskbar toggle: minimize when focused, focus otherwise.
    FocusOrMinimizeWindow {
        /// Window to toggle.
        window_id: WindowId,
    },
    /// Minimize a window.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Maximize a window to the home grid.
    MaximizeWindow {
        /// Window to maximize.
        window_id: WindowId,
    },
    /// Restore a maximized window to its previous bounds.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Title-bar toggle between maximized and restored.
    MaximizeOrRestoreWindow {
        /// Window to toggle.
        window_id: WindowId,
    },
    /// Close a window and stop its process.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Close every window.
    CloseAllWindows,
    /// Replace a window's title.
    SetWindowTitle {
        /// Target window.
        window_id: WindowId,
        /// New title.
        title: String,
    },
    /// Hide every window, or bring them back.
    ToggleShowDesktop,
    /// Pointer pressed on the desktop; dismisses the ephemeral window when outside it.
    DismissEphemeral {
        /// Pointer position, or `None` to dismiss unconditionally.
        pointer: Option<Position>,
    },
    /// Begin dragging a window by its title bar.
    BeginDrag {
        /// Window being dragged.
        window_id: WindowId,
        /// Pointer position at drag start.
        pointer: Position,
    },
    /// Begin resizing a window from an edge or corner.
    BeginResize {
        /// Window being resized.
        window_id: WindowId,
        /// Edge or corner being dragged.
        edge: ResizeEdge,
        /// Pointer position at resize start.
        pointer: Position,
    },
    /// Update the active drag or resize.
    PointerMove {
        /// Current pointer position.
        pointer: Position,
    },
    /// End the active drag or resize.
    PointerUp,
    /// Rescale windows after the home grid changed from `old_size`.
    ReconcileWindows {
        /// Home grid size before the change.
        old_size: Size,
    },
    /// Bring a mobile card to the front.
    SetActiveCard {
        /// Card to activate.
        card_id: CardId,
        /// Do not record the previous card for back navigation.
        skip_navigation_stack: bool,
    },
    /// Return to the mobile home screen.
    HideActiveCard,
    /// Browser back navigation on mobile.
    NavigateBack,
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_shell`] for the host to execute.
pub enum RuntimeEffect {
    /// Persist launcher placements.
    PersistLaunchers,
    /// Open an external URL in a new tab.
    OpenExternalUrl(String),
    /// Show thumbnails for several windows of one program.
    ShowWindowPreview {
        /// Windows to preview.
        window_ids: Vec<WindowId>,
        /// Anchor point above the taskbar.
        anchor: Position,
    },
    /// Hide the active overlay (menus, dialogs, previews).
    HideOverlay,
    /// Ask the user to confirm shutdown.
    ShowShutdownDialog,
    /// Push a browser history entry so back navigation closes the new card.
    PushHistoryState,
    /// Dispatch [`ShellAction::GridResizeSettled`] after `delay_ms`.
    ScheduleGridSettle {
        /// Grid with a pending resize.
        grid_id: GridId,
        /// Debounce delay.
        delay_ms: u64,
    },
    /// Dispatch [`ShellAction::Boot`] after `delay_ms`.
    ScheduleBoot {
        /// Delay before booting.
        delay_ms: u64,
    },
}

/// Applies a [`ShellAction`] to the shell state and collects resulting side effects.
///
/// Gesture sessions whose window closed during the action are dropped before returning. A
/// [`RuntimeEffect::PersistLaunchers`] is emitted whenever launcher placements changed.
///
/// # Errors
///
/// Returns the [`crate::ShellError`] of the first failing step. The state may be partially
/// modified in that case; callers reduce on a copy and discard it on error.
pub fn reduce_shell(
    env: &ShellEnv,
    state: &mut ShellState,
    interaction: &mut InteractionState,
    action: ShellAction,
) -> ShellResult<Vec<RuntimeEffect>> {
    let mut effects = Vec::new();
    let hydrating = matches!(action, ShellAction::HydrateLaunchers { .. });

    match action {
        ShellAction::HydrateLaunchers { records } => {
            state.launchers = LauncherTable::from_records(records);
        }
        ShellAction::InitializeLaunchers => {
            state
                .launchers
                .initialize_launchers(&state.grids, &env.catalog);
        }
        ShellAction::DesktopMounted => {
            state
                .launchers
                .initialize_launchers(&state.grids, &env.catalog);
            if state.is_desktop() {
                start_menu_silently(env, state, &mut effects)?;
            }
        }
        ShellAction::SetPlatform { platform } => {
            if state.platform != platform {
                process::stop_all_processes(state);
                state.windows.clear();
                state.cards.clear();
                state.desktop = DesktopSession::new(state.desktop.viewport);
                state.platform = platform;
            }
        }
        ShellAction::SetStatus { status } => {
            state.status = status;
        }
        ShellAction::Boot => {
            state.status = OsStatus::Booting;
            effects.push(RuntimeEffect::HideOverlay);
        }
        ShellAction::ViewportMeasured { size } => {
            state.desktop.viewport = size;
        }
        ShellAction::GridMounted { grid } => {
            if !state.grids.ensure_grid(grid) {
                logging::debug_warn!("grid already mounted");
            }
        }
        ShellAction::GridObserved { grid_id, size } => {
            observe_grid(env, state, grid_id, size, &mut effects)?;
        }
        ShellAction::GridResizeSettled { grid_id } => {
            let now_ms = env.now_ms();
            let debouncer = state.grids.resize_debouncer_mut();
            if let Some(settled) = debouncer.take_settled(grid_id, now_ms) {
                state.grids.set_size(grid_id, settled.current)?;
                if grid_id == GridId::Home {
                    window_manager::reconcile_window_positions(state, settled.previous)?;
                }
            } else if let Some(delay_ms) = debouncer.remaining_ms(grid_id, now_ms) {
                // Fired early: observations keep arriving or the timer ran short.
                effects.push(RuntimeEffect::ScheduleGridSettle { grid_id, delay_ms });
            }
        }
        ShellAction::GridMoved { grid_id, position } => {
            state.grids.set_position(grid_id, position)?;
        }
        ShellAction::SetGridDimensions {
            grid_id,
            rows,
            cols,
        } => {
            let grid = state.grids.require(grid_id)?;
            state.launchers.reconcile_launcher_positions(grid, rows, cols);
            state.grids.set_dimensions(grid_id, rows, cols)?;
        }
        ShellAction::StartProcess { launcher, silent } => {
            process::start_process(env, state, &launcher, silent, &mut effects)?;
        }
        ShellAction::StopProcess { process_id } => {
            process::stop_process(state, process_id)?;
        }
        ShellAction::StopProgram { program_id } => {
            process::stop_processes_with_program_id(state, &program_id);
        }
        ShellAction::StopAllProcesses => {
            process::stop_all_processes(state);
        }
        ShellAction::OpenLauncher { meta, panel_click } => {
            launcher::open_launcher(env, state, &meta, panel_click, &mut effects)?;
        }
        ShellAction::OpenLauncherById { id } => {
            launcher::open_launcher_by_id(env, state, id, &mut effects)?;
        }
        ShellAction::LauncherPointerDown { id } => {
            launcher::launcher_pointer_down(state, id, &mut effects)?;
        }
        ShellAction::LauncherPointerUp { id, pointer } => {
            launcher::launcher_pointer_up(env, state, id, pointer, &mut effects)?;
        }
        ShellAction::AddSelectedLauncher { id } => {
            state.launchers.require(id)?;
            if !state.desktop.selected_launchers.contains(&id) {
                state.desktop.selected_launchers.push(id);
            }
        }
        ShellAction::ClearLauncherSelection => {
            state.desktop.selected_launchers.clear();
        }
        ShellAction::ExecuteAction { action } => {
            launcher::execute_action(env, state, action, &mut effects)?;
        }
        ShellAction::AddLauncher { grid_id, meta } => {
            let grid = state.grids.require(grid_id)?;
            state.launchers.add_launcher(grid, meta)?;
        }
        ShellAction::MoveLauncher { grid_id, from, to } => {
            state.launchers.move_launcher(grid_id, from, to)?;
        }
        ShellAction::DeleteLauncher { grid_id, id } => {
            state.launchers.delete_from_grid(grid_id, id)?;
        }
        ShellAction::ReconcileLaunchers {
            grid_id,
            rows,
            cols,
        } => {
            let grid = state.grids.require(grid_id)?;
            state.launchers.reconcile_launcher_positions(grid, rows, cols);
        }
        ShellAction::ResetLaunchers { grid_id } => {
            state.launchers.reset_launchers(&env.catalog, grid_id);
        }
        ShellAction::PanelAddLauncher { meta, pinned } => {
            state.launchers.panel_add_launcher(meta, pinned, None);
        }
        ShellAction::UnpinLauncher { id } => {
            state.launchers.unpin_launcher(id, &state.processes)?;
        }
        ShellAction::FocusWindow { window_id } => {
            window_manager::focus_window(state, window_id)?;
        }
        ShellAction::FocusOrMinimizeWindow { window_id } => {
            window_manager::focus_or_minimize(state, window_id)?;
        }
        ShellAction::MinimizeWindow { window_id } => {
            state.windows.minimize_window(window_id)?;
        }
        ShellAction::MaximizeWindow { window_id } => {
            window_manager::maximize_window(state, window_id)?;
        }
        ShellAction::RestoreWindow { window_id } => {
            state.windows.restore_window(window_id)?;
        }
        ShellAction::MaximizeOrRestoreWindow { window_id } => {
            window_manager::maximize_or_restore(state, window_id)?;
        }
        ShellAction::CloseWindow { window_id } => {
            window_manager::close_window(state, window_id)?;
        }
        ShellAction::CloseAllWindows => {
            window_manager::close_all_windows(state);
        }
        ShellAction::SetWindowTitle { window_id, title } => {
            state.windows.set_title(window_id, title)?;
        }
        ShellAction::ToggleShowDesktop => {
            window_manager::toggle_show_desktop(state);
        }
        ShellAction::DismissEphemeral { pointer } => {
            window_manager::try_close_ephemeral_window(state, pointer);
        }
        ShellAction::BeginDrag { window_id, pointer } => {
            interaction.begin_drag(state, window_id, pointer)?;
        }
        ShellAction::BeginResize {
            window_id,
            edge,
            pointer,
        } => {
            interaction.begin_resize(state, window_id, edge, pointer)?;
        }
        ShellAction::PointerMove { pointer } => {
            interaction.update(env, state, pointer);
        }
        ShellAction::PointerUp => {
            interaction.end(state);
        }
        ShellAction::ReconcileWindows { old_size } => {
            window_manager::reconcile_window_positions(state, old_size)?;
        }
        ShellAction::SetActiveCard {
            card_id,
            skip_navigation_stack,
        } => {
            state
                .cards
                .set_active_card(card_id, skip_navigation_stack)?;
        }
        ShellAction::HideActiveCard => {
            state.cards.hide_active_card();
        }
        ShellAction::NavigateBack => match state.cards.pop_navigation_stack() {
            Some(card_id) if state.cards.card(card_id).is_some() => {
                state.cards.set_active_card(card_id, true)?;
            }
            _ => {
                state.cards.hide_active_card();
            }
        },
    }

    interaction.retain_live(&state.windows);
    if state.launchers.take_placements_changed() && !hydrating {
        effects.push(RuntimeEffect::PersistLaunchers);
    }
    Ok(effects)
}

fn start_menu_silently(
    env: &ShellEnv,
    state: &mut ShellState,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    let program_id = ProgramId::from(START_MENU_PROGRAM_ID);
    if state.processes.count_running(&program_id) > 0 {
        return Ok(());
    }
    let Some(meta) = env.catalog.launcher(START_MENU_PROGRAM_ID).cloned() else {
        logging::warn!("catalog has no `{START_MENU_PROGRAM_ID}` launcher");
        return Ok(());
    };
    process::start_process(env, state, &meta, true, effects).map(|_| ())
}

/// Recomputes responsive dimensions right away and defers the size change to the debounce.
fn observe_grid(
    env: &ShellEnv,
    state: &mut ShellState,
    grid_id: GridId,
    size: Size,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    let grid = state.grids.require(grid_id)?;
    if let GridSizing::Responsive { icon_size } = grid.sizing {
        let (rows, cols) = derive_dimensions(
            grid.layout_direction,
            size,
            icon_size,
            env.config.grids.icon_margin,
            state.launchers.launchers(grid_id).len(),
        );
        if (rows, cols) != (grid.rows, grid.cols) {
            state.launchers.reconcile_launcher_positions(grid, rows, cols);
            state.grids.set_dimensions(grid_id, rows, cols)?;
        }
    }

    let unchanged = state.grids.require(grid_id)?.size == size;
    let debouncer = state.grids.resize_debouncer_mut();
    let scheduled = debouncer.is_pending(grid_id);
    if unchanged && !scheduled {
        return Ok(());
    }
    debouncer.observe(grid_id, size, env.now_ms());
    // A pending settle re-arms itself until the quiet period has passed.
    if !scheduled {
        effects.push(RuntimeEffect::ScheduleGridSettle {
            grid_id,
            delay_ms: debouncer.delay_ms(),
        });
    }
    Ok(())
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
        error::ShellError,
        model::{LayoutDirection, ProgramMetadata},
    };

    fn setup() -> (ShellEnv, ManualClock, ShellState, InteractionState) {
        let clock = ManualClock::starting_at(0);
        let catalog = ShellCatalog::from_parts(
            vec![
                ProgramMetadata::new("terminal", "Terminal"),
                ProgramMetadata::new("notes", "Notes"),
            ],
            Vec::new(),
            Default::default(),
        );
        let env = ShellEnv::new(ShellConfig::default(), catalog, Rc::new(clock.clone()));
        let mut state = ShellState::new(Platform::Desktop, &ShellConfig::default());
        state.grids.ensure_grid(
            GridState::new(GridId::Home, 4, 4, LayoutDirection::Vertical)
                .with_size(Size::new(1000, 800))
                .responsive(40),
        );
        state.grids.ensure_grid(
            GridState::new(GridId::Panel, 1, 10, LayoutDirection::Horizontal)
                .with_size(Size::new(1000, 42)),
        );
        (env, clock, state, InteractionState::default())
    }

    fn dispatch(
        env: &ShellEnv,
        state: &mut ShellState,
        interaction: &mut InteractionState,
        action: ShellAction,
    ) -> Vec<RuntimeEffect> {
        reduce_shell(env, state, interaction, action).expect("reduce")
    }

    #[test]
    fn starting_a_program_persists_its_taskbar_icon() {
        let (env, _, mut state, mut ui) = setup();
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::StartProcess {
                launcher: LauncherMetadata::program("terminal"),
                silent: false,
            },
        );

        assert_eq!(effects, vec![RuntimeEffect::PersistLaunchers]);
        assert_eq!(state.launchers.launchers(GridId::Panel).len(), 1);
    }

    #[test]
    fn window_actions_do_not_persist_launchers() {
        let (env, _, mut state, mut ui) = setup();
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::StartProcess {
                launcher: LauncherMetadata::program("terminal"),
                silent: false,
            },
        );
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::MinimizeWindow {
                window_id: WindowId(ProcessId(1)),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn hydration_replaces_placements_without_persisting() {
        let (env, _, mut state, mut ui) = setup();
        let mut source = LauncherTable::default();
        source.panel_add_launcher(LauncherMetadata::program("notes"), true, None);
        let records: Vec<GridLauncher> = source.records().cloned().collect();

        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::HydrateLaunchers { records },
        );

        assert!(effects.is_empty());
        assert_eq!(state.launchers.len(), 1);
    }

    #[test]
    fn grid_observation_debounces_size_and_rescales_windows() {
        let (env, clock, mut state, mut ui) = setup();
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::StartProcess {
                launcher: LauncherMetadata::program("terminal"),
                silent: false,
            },
        );
        let window_id = WindowId(ProcessId(1));
        let before = state.windows.require(window_id).expect("window").clone();

        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridObserved {
                grid_id: GridId::Home,
                size: Size::new(2000, 1600),
            },
        );
        assert_eq!(
            effects,
            vec![RuntimeEffect::ScheduleGridSettle {
                grid_id: GridId::Home,
                delay_ms: 250,
            }]
        );
        let home = state.grids.get(GridId::Home).expect("home");
        assert_eq!((home.rows, home.cols), (20, 25));
        assert_eq!(home.size, Size::new(1000, 800));

        clock.advance(100);
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridResizeSettled {
                grid_id: GridId::Home,
            },
        );
        assert_eq!(
            effects,
            vec![RuntimeEffect::ScheduleGridSettle {
                grid_id: GridId::Home,
                delay_ms: 150,
            }]
        );
        assert_eq!(state.windows.require(window_id), Ok(&before));

        clock.advance(200);
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridResizeSettled {
                grid_id: GridId::Home,
            },
        );
        let after = state.windows.require(window_id).expect("window");
        assert_eq!(
            state.grids.get(GridId::Home).map(|g| g.size),
            Some(Size::new(2000, 1600))
        );
        assert_eq!(after.position, Position::new(before.position.x * 2, before.position.y * 2));
        assert_eq!(
            after.size,
            Size::new(before.size.width * 2, before.size.height * 2)
        );
    }

    #[test]
    fn early_settle_reschedules_for_the_rest_of_the_quiet_period() {
        let (env, clock, mut state, mut ui) = setup();
        clock.advance(1_000);
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridObserved {
                grid_id: GridId::Home,
                size: Size::new(2000, 1600),
            },
        );

        clock.advance(249);
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridResizeSettled {
                grid_id: GridId::Home,
            },
        );
        assert_eq!(
            effects,
            vec![RuntimeEffect::ScheduleGridSettle {
                grid_id: GridId::Home,
                delay_ms: 1,
            }]
        );
        assert_eq!(
            state.grids.get(GridId::Home).map(|g| g.size),
            Some(Size::new(1000, 800))
        );

        clock.advance(1);
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridResizeSettled {
                grid_id: GridId::Home,
            },
        );
        assert!(effects.is_empty());
        assert_eq!(
            state.grids.get(GridId::Home).map(|g| g.size),
            Some(Size::new(2000, 1600))
        );
        assert!(!state.grids.resize_debouncer_mut().is_pending(GridId::Home));
    }

    #[test]
    fn observations_while_pending_share_one_timer() {
        let (env, clock, mut state, mut ui) = setup();
        let observe = |state: &mut ShellState, ui: &mut InteractionState, width: i32| {
            dispatch(
                &env,
                state,
                ui,
                ShellAction::GridObserved {
                    grid_id: GridId::Home,
                    size: Size::new(width, 800),
                },
            )
        };
        assert_eq!(observe(&mut state, &mut ui, 1100).len(), 1);
        clock.advance(100);
        assert!(observe(&mut state, &mut ui, 1200).is_empty());

        clock.advance(150);
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::GridResizeSettled {
                grid_id: GridId::Home,
            },
        );
        assert_eq!(
            effects,
            vec![RuntimeEffect::ScheduleGridSettle {
                grid_id: GridId::Home,
                delay_ms: 100,
            }]
        );
    }

    #[test]
    fn placement_changes_persist_once_and_clear_the_flag() {
        let (env, _, mut state, mut ui) = setup();
        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::PanelAddLauncher {
                meta: LauncherMetadata::program("notes"),
                pinned: true,
            },
        );
        assert_eq!(effects, vec![RuntimeEffect::PersistLaunchers]);
        assert!(!state.launchers.take_placements_changed());

        let effects = dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::PanelAddLauncher {
                meta: LauncherMetadata::program("notes"),
                pinned: true,
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn closing_the_dragged_window_ends_the_gesture() {
        let (env, _, mut state, mut ui) = setup();
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::StartProcess {
                launcher: LauncherMetadata::program("terminal"),
                silent: false,
            },
        );
        let window_id = WindowId(ProcessId(1));
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::BeginDrag {
                window_id,
                pointer: Position::new(10, 10),
            },
        );
        assert!(ui.gesture.is_some());

        dispatch(&env, &mut state, &mut ui, ShellAction::CloseWindow { window_id });
        assert_eq!(ui.gesture, None);
    }

    #[test]
    fn missing_window_is_reported() {
        let (env, _, mut state, mut ui) = setup();
        assert_eq!(
            reduce_shell(
                &env,
                &mut state,
                &mut ui,
                ShellAction::FocusWindow {
                    window_id: WindowId(ProcessId(9)),
                },
            ),
            Err(ShellError::WindowNotFound(WindowId(ProcessId(9))))
        );
    }

    #[test]
    fn platform_switch_stops_running_programs() {
        let (env, _, mut state, mut ui) = setup();
        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::StartProcess {
                launcher: LauncherMetadata::program("terminal"),
                silent: false,
            },
        );

        dispatch(
            &env,
            &mut state,
            &mut ui,
            ShellAction::SetPlatform {
                platform: Platform::Mobile,
            },
        );

        assert!(state.processes.is_empty());
        assert!(state.windows.is_empty());
        assert_eq!(state.platform, Platform::Mobile);
        assert_eq!(state.processes.peek_next_process_id(), ProcessId(2));
    }

    #[test]
    fn back_navigation_returns_to_previous_card() {
        let (env, _, mut state, mut ui) = setup();
        state.platform = Platform::Mobile;
        for program in ["terminal", "notes"] {
            let effects = dispatch(
                &env,
                &mut state,
                &mut ui,
                ShellAction::StartProcess {
                    launcher: LauncherMetadata::program(program),
                    silent: false,
                },
            );
            assert_eq!(effects, vec![RuntimeEffect::PushHistoryState]);
        }

        dispatch(&env, &mut state, &mut ui, ShellAction::NavigateBack);
        assert_eq!(state.cards.active_card_id(), Some(CardId(ProcessId(1))));

        dispatch(&env, &mut state, &mut ui, ShellAction::NavigateBack);
        assert_eq!(state.cards.active_card_id(), None);
    }
}
