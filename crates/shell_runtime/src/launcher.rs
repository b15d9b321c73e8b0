//! Launcher activation: pointer handling on icons, program opening rules, and launcher actions.

use leptos::logging;
use serde_json::json;

use crate::{
    catalog::SOFTWARE_CENTER_PROGRAM_ID,
    env::ShellEnv,
    error::{ShellError, ShellResult},
    model::{
        same_args, DesktopSession, DisplayId, GridId, LauncherAction, LauncherActivation,
        LauncherId, LauncherMetadata, LauncherTarget, OsStatus, Position, ShellState,
    },
    process,
    reducer::RuntimeEffect,
    window_manager,
};

/// Opens a launcher from a menu, a grid icon, or the taskbar.
///
/// `panel_click` carries the pointer position when the launcher was clicked on the taskbar; it
/// anchors the window preview for programs with several instances.
///
/// # Errors
///
/// Propagates process start failures and lookups of missing launchers or windows.
pub fn open_launcher(
    env: &ShellEnv,
    state: &mut ShellState,
    meta: &LauncherMetadata,
    panel_click: Option<Position>,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    effects.push(RuntimeEffect::HideOverlay);
    let opens_start_menu = meta
        .target
        .program_id()
        .is_some_and(|id| id.as_str() == crate::catalog::START_MENU_PROGRAM_ID);
    if !opens_start_menu {
        window_manager::try_close_ephemeral_window(state, None);
    }

    match &meta.target {
        LauncherTarget::Action { action } => execute_action(env, state, action.clone(), effects),
        LauncherTarget::Program { .. } => open_program(env, state, meta, panel_click, effects),
    }
}

/// Opens the placement record `id` as if it were clicked from a menu.
///
/// # Errors
///
/// Returns [`ShellError::LauncherNotFound`] when no record has this id.
pub fn open_launcher_by_id(
    env: &ShellEnv,
    state: &mut ShellState,
    id: LauncherId,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    let meta = state.launchers.require(id)?.meta.clone();
    open_launcher(env, state, &meta, None, effects)
}

fn open_program(
    env: &ShellEnv,
    state: &mut ShellState,
    meta: &LauncherMetadata,
    panel_click: Option<Position>,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    let program = env
        .catalog
        .program_for(&meta.target)
        .ok_or_else(|| match meta.target.program_id() {
            Some(id) => ShellError::ProgramNotFound(id.clone()),
            None => ShellError::NotAProgram,
        })?;

    if !program.runnable && program.has_details {
        if program.id.as_str() == SOFTWARE_CENTER_PROGRAM_ID {
            return Err(ShellError::NotRunnable(program.id.clone()));
        }
        let details = LauncherMetadata::new(LauncherTarget::Program {
            program_id: SOFTWARE_CENTER_PROGRAM_ID.into(),
            args: json!({ "program": program.id.as_str() }),
        });
        return open_program(env, state, &details, None, effects);
    }

    let running: Vec<(DisplayId, bool)> = state
        .processes
        .processes_for_program(&program.id)
        .iter()
        .map(|p| {
            let exact = same_args(
                p.launcher.target.args().unwrap_or(&serde_json::Value::Null),
                meta.target.args().unwrap_or(&serde_json::Value::Null),
            );
            (p.display_id, exact)
        })
        .collect();

    if let Some(click) = panel_click {
        match running.as_slice() {
            [] => {}
            [(display_id, _)] => {
                return toggle_single_instance(state, *display_id, program.is_ephemeral());
            }
            several => {
                let anchor_y = state
                    .grids
                    .get(GridId::Panel)
                    .map_or(0, |grid| grid.position.y);
                effects.push(RuntimeEffect::ShowWindowPreview {
                    window_ids: several
                        .iter()
                        .filter_map(|(display_id, _)| display_id.as_window())
                        .collect(),
                    anchor: Position::new(click.x, anchor_y),
                });
                return Ok(());
            }
        }
    }

    let exact_match = running
        .iter()
        .find(|(_, exact)| *exact)
        .map(|(display_id, _)| *display_id);
    if let Some(display_id) = exact_match.filter(|_| !program.allow_multiple_instances) {
        return match display_id {
            DisplayId::Window(window_id) => {
                window_manager::focus_window(state, window_id).map(|_| ())
            }
            DisplayId::Card(card_id) => state.cards.set_active_card(card_id, false).map(|_| ()),
        };
    }

    process::start_process(env, state, meta, false, effects).map(|_| ())
}

fn toggle_single_instance(
    state: &mut ShellState,
    display_id: DisplayId,
    ephemeral: bool,
) -> ShellResult<()> {
    match display_id {
        DisplayId::Window(window_id) => {
            if ephemeral && state.is_desktop() {
                state.desktop.ephemeral_window_id = Some(window_id);
            }
            window_manager::focus_or_minimize(state, window_id).map(|_| ())
        }
        DisplayId::Card(card_id) => state.cards.set_active_card(card_id, false).map(|_| ()),
    }
}

/// Pointer-down on a grid icon. Home icons are selected; taskbar icons wait for pointer-up.
///
/// # Errors
///
/// Returns [`ShellError::LauncherNotFound`] when no record has this id.
pub fn launcher_pointer_down(
    state: &mut ShellState,
    id: LauncherId,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    let launcher = state.launchers.require(id)?;
    if launcher.meta.disabled || launcher.grid_id == GridId::Panel {
        return Ok(());
    }
    state.desktop.selected_launchers = vec![id];
    effects.push(RuntimeEffect::HideOverlay);
    Ok(())
}

/// Pointer-up on a grid icon.
///
/// Taskbar icons open immediately. Home icons open on the second pointer-up on the same icon
/// within the double-click window, and are only selected otherwise.
///
/// # Errors
///
/// Returns [`ShellError::LauncherNotFound`] when no record has this id, and propagates failures
/// from opening the launcher.
pub fn launcher_pointer_up(
    env: &ShellEnv,
    state: &mut ShellState,
    id: LauncherId,
    pointer: Position,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    let launcher = state.launchers.require(id)?;
    if launcher.meta.disabled {
        return Ok(());
    }
    let meta = launcher.meta.clone();
    if launcher.grid_id == GridId::Panel {
        return open_launcher(env, state, &meta, Some(pointer), effects);
    }

    let now_ms = env.now_ms();
    let double_click = state.desktop.last_activation.is_some_and(|last| {
        last.launcher_id == id
            && now_ms.saturating_sub(last.at_ms) < env.config.launchers.double_click_ms
    });
    state.desktop.last_activation = Some(LauncherActivation {
        launcher_id: id,
        at_ms: now_ms,
    });

    if double_click {
        open_launcher(env, state, &meta, None, effects)
    } else {
        state.desktop.selected_launchers = vec![id];
        effects.push(RuntimeEffect::HideOverlay);
        Ok(())
    }
}

/// Runs a launcher action.
///
/// # Errors
///
/// Returns lookup errors for actions that reference missing launchers, and [`ShellError::GridFull`]
/// when the home grid has no room for a new icon.
pub fn execute_action(
    env: &ShellEnv,
    state: &mut ShellState,
    action: LauncherAction,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<()> {
    match action {
        LauncherAction::OpenUrl { url } => {
            effects.push(RuntimeEffect::OpenExternalUrl(url));
        }
        LauncherAction::LaunchProgram { launcher } => {
            let meta = env
                .catalog
                .launcher(&launcher)
                .cloned()
                .ok_or(ShellError::CatalogLauncherNotFound(launcher))?;
            open_launcher(env, state, &meta, None, effects)?;
        }
        LauncherAction::PanelSettings => {
            logging::log!("panel settings selected");
        }
        LauncherAction::CloseLauncherWindows { id } => {
            let launcher = state.launchers.require(id)?;
            if let Some(program_id) = launcher.meta.target.program_id().cloned() {
                process::stop_processes_with_program_id(state, &program_id);
            }
        }
        LauncherAction::DeleteLauncherFromHome { id } => {
            state.launchers.delete_from_grid(GridId::Home, id)?;
        }
        LauncherAction::AddLauncherToHome { meta } => {
            let home = state.grids.require(GridId::Home)?;
            state.launchers.add_launcher(home, *meta)?;
        }
        LauncherAction::AddLauncherToPanel { id } => {
            state.launchers.add_launcher_by_id(id, true)?;
        }
        LauncherAction::PinToPanel { meta } => {
            state.launchers.panel_add_launcher(*meta, true, None);
        }
        LauncherAction::UnpinLauncherFromPanel { id } => {
            state.launchers.unpin_launcher(id, &state.processes)?;
        }
        LauncherAction::LockScreen => {
            state.status = OsStatus::Locked;
        }
        LauncherAction::PromptShutdown => {
            effects.push(RuntimeEffect::ShowShutdownDialog);
        }
        LauncherAction::Reboot => {
            shutdown(state, effects);
            effects.push(RuntimeEffect::ScheduleBoot {
                delay_ms: env.config.system.reboot_delay_ms,
            });
        }
        LauncherAction::Shutdown => shutdown(state, effects),
        LauncherAction::ResetHomeScreen => {
            state.launchers.reset_launchers(&env.catalog, GridId::Home);
        }
        LauncherAction::ToggleShowDesktop => {
            window_manager::toggle_show_desktop(state);
        }
    }
    Ok(())
}

/// Stops every process and resets the desktop session. Launcher placements survive.
fn shutdown(state: &mut ShellState, effects: &mut Vec<RuntimeEffect>) {
    effects.push(RuntimeEffect::HideOverlay);
    process::stop_all_processes(state);
    state.windows.clear();
    state.cards.clear();
    state.desktop = DesktopSession::new(state.desktop.viewport);
    state.status = OsStatus::Shutdown;
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, rc::Rc};

    use platform_host::ManualClock;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        catalog::ShellCatalog,
        config::ShellConfig,
        model::{
            GridState, LayoutDirection, Platform, ProcessId, ProgramId, ProgramMetadata, Size,
            WindowId, WindowMetadata,
        },
    };

    fn catalog() -> ShellCatalog {
        let mut terminal = ProgramMetadata::new("terminal", "Terminal");
        terminal.window = Some(WindowMetadata::default());
        let mut browser = ProgramMetadata::new("browser", "Browser");
        browser.allow_multiple_instances = true;
        let mut game = ProgramMetadata::new("game", "Game");
        game.runnable = false;
        game.has_details = true;
        let software_center = ProgramMetadata::new(SOFTWARE_CENTER_PROGRAM_ID, "Software Center");
        let mut start_menu = ProgramMetadata::new("start_menu", "Menu");
        start_menu.window = Some(WindowMetadata {
            is_ephemeral: true,
            ..WindowMetadata::default()
        });
        ShellCatalog::from_parts(
            vec![terminal, browser, game, software_center, start_menu],
            Vec::new(),
            BTreeMap::new(),
        )
    }

    fn setup() -> (ShellEnv, ManualClock, ShellState) {
        let clock = ManualClock::starting_at(10_000);
        let env = ShellEnv::new(ShellConfig::default(), catalog(), Rc::new(clock.clone()));
        let mut state = ShellState::new(Platform::Desktop, &ShellConfig::default());
        state.grids.ensure_grid(
            GridState::new(GridId::Home, 6, 6, LayoutDirection::Vertical)
                .with_size(Size::new(1000, 800)),
        );
        state.grids.ensure_grid(
            GridState::new(GridId::Panel, 1, 12, LayoutDirection::Horizontal)
                .with_size(Size::new(1000, 40)),
        );
        state
            .grids
            .set_position(GridId::Panel, Position::new(0, 800))
            .expect("panel position");
        (env, clock, state)
    }

    fn open(env: &ShellEnv, state: &mut ShellState, meta: &LauncherMetadata) -> Vec<RuntimeEffect> {
        let mut effects = Vec::new();
        open_launcher(env, state, meta, None, &mut effects).expect("open");
        effects
    }

    #[test]
    fn reopening_same_args_focuses_existing_window() {
        let (env, _, mut state) = setup();
        let terminal = LauncherMetadata::program("terminal");
        open(&env, &mut state, &terminal);
        open(&env, &mut state, &LauncherMetadata::program("browser"));

        open(&env, &mut state, &terminal);

        assert_eq!(state.processes.len(), 2);
        assert_eq!(
            state.windows.focused_window_id(),
            Some(WindowId(ProcessId(1)))
        );
    }

    #[test]
    fn multiple_instance_programs_always_start() {
        let (env, _, mut state) = setup();
        let browser = LauncherMetadata::program("browser");
        open(&env, &mut state, &browser);
        open(&env, &mut state, &browser);

        assert_eq!(
            state
                .processes
                .count_running(&ProgramId::from("browser")),
            2
        );
    }

    #[test]
    fn different_args_start_a_new_instance() {
        let (env, _, mut state) = setup();
        open(&env, &mut state, &LauncherMetadata::program("terminal"));
        open(
            &env,
            &mut state,
            &LauncherMetadata::new(LauncherTarget::Program {
                program_id: "terminal".into(),
                args: json!({ "title": "Logs" }),
            }),
        );

        assert_eq!(state.processes.len(), 2);
        assert_eq!(
            state.windows.require(WindowId(ProcessId(2))).map(|w| w.title.clone()),
            Ok("Logs".to_string())
        );
    }

    #[test]
    fn programs_with_details_open_in_software_center() {
        let (env, _, mut state) = setup();
        open(&env, &mut state, &LauncherMetadata::program("game"));

        let process = state.processes.get(ProcessId(1)).expect("software center");
        assert_eq!(process.program_id, ProgramId::from(SOFTWARE_CENTER_PROGRAM_ID));
        assert_eq!(
            process.launcher.target.args(),
            Some(&json!({ "program": "game" }))
        );
    }

    #[test]
    fn software_center_without_a_runnable_build_is_rejected() {
        let (_, clock, mut state) = setup();
        let mut software_center =
            ProgramMetadata::new(SOFTWARE_CENTER_PROGRAM_ID, "Software Center");
        software_center.runnable = false;
        software_center.has_details = true;
        let mut game = ProgramMetadata::new("game", "Game");
        game.runnable = false;
        game.has_details = true;
        let env = ShellEnv::new(
            ShellConfig::default(),
            ShellCatalog::from_parts(vec![software_center, game], Vec::new(), BTreeMap::new()),
            Rc::new(clock),
        );

        let mut effects = Vec::new();
        assert_eq!(
            open_launcher(
                &env,
                &mut state,
                &LauncherMetadata::program("game"),
                None,
                &mut effects,
            ),
            Err(ShellError::NotRunnable(SOFTWARE_CENTER_PROGRAM_ID.into()))
        );
        assert!(state.processes.is_empty());
    }

    #[test]
    fn panel_click_toggles_a_single_instance() {
        let (env, _, mut state) = setup();
        let terminal = LauncherMetadata::program("terminal");
        open(&env, &mut state, &terminal);
        let mut effects = Vec::new();

        open_launcher(&env, &mut state, &terminal, Some(Position::new(30, 810)), &mut effects)
            .expect("panel click");

        let window = state.windows.require(WindowId(ProcessId(1))).expect("window");
        assert!(window.is_minimized);
        assert_eq!(state.processes.len(), 1);
    }

    #[test]
    fn panel_click_with_several_instances_shows_preview() {
        let (env, _, mut state) = setup();
        let browser = LauncherMetadata::program("browser");
        open(&env, &mut state, &browser);
        open(&env, &mut state, &browser);
        let mut effects = Vec::new();

        open_launcher(&env, &mut state, &browser, Some(Position::new(64, 815)), &mut effects)
            .expect("panel click");

        assert_eq!(
            effects,
            vec![
                RuntimeEffect::HideOverlay,
                RuntimeEffect::ShowWindowPreview {
                    window_ids: vec![WindowId(ProcessId(1)), WindowId(ProcessId(2))],
                    anchor: Position::new(64, 800),
                },
            ]
        );
    }

    #[test]
    fn home_icons_open_on_double_click_only() {
        let (env, clock, mut state) = setup();
        let id = state.launchers.add_launcher(
            state.grids.get(GridId::Home).expect("home"),
            LauncherMetadata::program("terminal"),
        );
        let id = id.expect("icon");
        let mut effects = Vec::new();
        let pointer = Position::new(5, 5);

        launcher_pointer_down(&mut state, id, &mut effects).expect("down");
        launcher_pointer_up(&env, &mut state, id, pointer, &mut effects).expect("up");
        assert!(state.processes.is_empty());
        assert_eq!(state.desktop.selected_launchers, vec![id]);

        clock.advance(500);
        launcher_pointer_up(&env, &mut state, id, pointer, &mut effects).expect("slow up");
        assert!(state.processes.is_empty());

        clock.advance(120);
        launcher_pointer_up(&env, &mut state, id, pointer, &mut effects).expect("double");
        assert_eq!(state.processes.len(), 1);
    }

    #[test]
    fn disabled_icons_ignore_pointer_events() {
        let (env, _, mut state) = setup();
        let mut meta = LauncherMetadata::program("terminal");
        meta.disabled = true;
        let id = state.launchers.panel_add_launcher(meta, true, None);
        let mut effects = Vec::new();

        launcher_pointer_up(&env, &mut state, id, Position::new(0, 0), &mut effects)
            .expect("ignored");
        assert!(effects.is_empty());
        assert!(state.processes.is_empty());
    }

    #[test]
    fn opening_a_launcher_dismisses_the_ephemeral_window() {
        let (env, _, mut state) = setup();
        let mut effects = Vec::new();
        process::start_process(
            &env,
            &mut state,
            &LauncherMetadata::program("start_menu"),
            true,
            &mut effects,
        )
        .expect("menu");
        let menu = WindowId(ProcessId(1));
        state.windows.focus_window(menu).expect("show menu");
        state.desktop.ephemeral_window_id = Some(menu);

        open(&env, &mut state, &LauncherMetadata::program("terminal"));

        assert_eq!(state.desktop.ephemeral_window_id, None);
        assert!(state.windows.require(menu).expect("menu").is_minimized);
    }

    #[test]
    fn shutdown_clears_processes_and_sets_status() {
        let (env, _, mut state) = setup();
        open(&env, &mut state, &LauncherMetadata::program("terminal"));
        let mut effects = Vec::new();

        execute_action(&env, &mut state, LauncherAction::Reboot, &mut effects).expect("reboot");

        assert_eq!(state.status, OsStatus::Shutdown);
        assert!(state.processes.is_empty());
        assert!(state.windows.is_empty());
        assert!(state.launchers.launchers(GridId::Panel).is_empty());
        assert_eq!(
            effects,
            vec![
                RuntimeEffect::HideOverlay,
                RuntimeEffect::ScheduleBoot { delay_ms: 2500 },
            ]
        );
    }

    #[test]
    fn unknown_catalog_launcher_is_reported() {
        let (env, _, mut state) = setup();
        let mut effects = Vec::new();
        assert_eq!(
            execute_action(
                &env,
                &mut state,
                LauncherAction::LaunchProgram {
                    launcher: "missing".into()
                },
                &mut effects,
            ),
            Err(ShellError::CatalogLauncherNotFound("missing".into()))
        );
    }
}
