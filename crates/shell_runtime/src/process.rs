//! Process table and the start/stop lifecycle that ties processes to windows, cards, and taskbar
//! icons.

use std::collections::BTreeMap;

use leptos::logging;

use crate::{
    app_stack::AppStackTable,
    env::ShellEnv,
    error::{ShellError, ShellResult},
    model::{
        DisplayId, GridId, LauncherMetadata, Process, ProcessId, ProgramId, ShellState, WindowId,
    },
    reducer::RuntimeEffect,
    window_manager,
};

#[derive(Debug, Clone, Default, PartialEq)]
/// Running processes with a per-program index.
pub struct ProcessTable {
    last_process_id: u64,
    processes: BTreeMap<ProcessId, Process>,
    by_program: BTreeMap<ProgramId, Vec<ProcessId>>,
}

impl ProcessTable {
    /// Allocates the next id. Ids start at 1 and are never reused.
    pub fn next_process_id(&mut self) -> ProcessId {
        self.last_process_id += 1;
        ProcessId(self.last_process_id)
    }

    /// The id [`Self::next_process_id`] will return, without allocating it.
    pub fn peek_next_process_id(&self) -> ProcessId {
        ProcessId(self.last_process_id + 1)
    }

    pub fn insert(&mut self, process: Process) {
        let id = process.id;
        let ids = self.by_program.entry(process.program_id.clone()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self.processes.insert(id, process);
    }

    pub fn remove(&mut self, id: ProcessId) -> Option<Process> {
        let process = self.processes.remove(&id)?;
        if let Some(ids) = self.by_program.get_mut(&process.program_id) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.by_program.remove(&process.program_id);
            }
        }
        Some(process)
    }

    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(&id)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::ProcessNotFound`] when the process is not running.
    pub fn require(&self, id: ProcessId) -> ShellResult<&Process> {
        self.processes
            .get(&id)
            .ok_or(ShellError::ProcessNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn ids(&self) -> Vec<ProcessId> {
        self.processes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn display_id(&self, id: ProcessId) -> Option<DisplayId> {
        self.processes.get(&id).map(|process| process.display_id)
    }

    /// Processes of `program_id` in start order.
    pub fn processes_for_program(&self, program_id: &ProgramId) -> Vec<&Process> {
        self.by_program
            .get(program_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.processes.get(id))
            .collect()
    }

    pub fn count_running(&self, program_id: &ProgramId) -> usize {
        self.by_program.get(program_id).map_or(0, Vec::len)
    }

    /// Drops every process while keeping id allocation monotonic.
    pub fn clear(&mut self) {
        self.processes.clear();
        self.by_program.clear();
    }
}

/// Starts a process for a program launcher and opens its window (desktop) or card (mobile).
///
/// Nothing is allocated or registered unless every precondition holds. A `silent` start opens the
/// window minimized; a silent ephemeral window becomes the session's ephemeral window.
///
/// # Errors
///
/// Returns [`ShellError::NotAProgram`] for action targets, [`ShellError::ProgramNotFound`] for an
/// unknown program, [`ShellError::NotRunnable`] for programs that cannot start, and the fatal
/// [`ShellError::HomeGridMissing`] on desktop when the home grid is not measured.
pub fn start_process(
    env: &ShellEnv,
    state: &mut ShellState,
    launcher: &LauncherMetadata,
    silent: bool,
    effects: &mut Vec<RuntimeEffect>,
) -> ShellResult<ProcessId> {
    let program_id = launcher
        .target
        .program_id()
        .ok_or(ShellError::NotAProgram)?;
    let program = env
        .catalog
        .program(program_id)
        .ok_or_else(|| ShellError::ProgramNotFound(program_id.clone()))?;
    if !program.runnable {
        logging::debug_warn!("program {program_id} is not runnable");
        return Err(ShellError::NotRunnable(program_id.clone()));
    }

    let title = launcher
        .target
        .title_arg()
        .map(str::to_string)
        .unwrap_or_else(|| program.name.clone());
    let started_at_ms = env.now_ms();

    if state.is_desktop() {
        let pending_id = state.processes.peek_next_process_id();
        let window = window_manager::create_window(
            env,
            state,
            pending_id,
            program.window.as_ref(),
            &title,
            silent,
        )?;
        let process_id = state.processes.next_process_id();
        let window_id = window.id;
        let display_id = DisplayId::Window(window_id);
        state.processes.insert(Process {
            id: process_id,
            launcher: launcher.clone(),
            program_id: program.id.clone(),
            display_id,
            started_at_ms,
            running: true,
        });
        state.windows.add_window(window);
        if !program.is_ephemeral() {
            state
                .launchers
                .panel_add_launcher(launcher.clone(), false, Some(display_id));
        } else if silent {
            state.desktop.ephemeral_window_id = Some(window_id);
        }
        Ok(process_id)
    } else {
        let process_id = state.processes.next_process_id();
        let card = AppStackTable::create_card(process_id, title);
        state.processes.insert(Process {
            id: process_id,
            launcher: launcher.clone(),
            program_id: program.id.clone(),
            display_id: DisplayId::Card(card.id),
            started_at_ms,
            running: true,
        });
        state.cards.add_card(card);
        effects.push(RuntimeEffect::PushHistoryState);
        Ok(process_id)
    }
}

/// Stops a process and tears down its surface. Stopping the last instance of a program removes its
/// unpinned taskbar icon and compacts the taskbar row.
///
/// # Errors
///
/// Returns [`ShellError::ProcessNotFound`] when the process is not running.
pub fn stop_process(state: &mut ShellState, process_id: ProcessId) -> ShellResult<()> {
    let process = state.processes.require(process_id)?;
    let program_id = process.program_id.clone();
    let display_id = process.display_id;

    match display_id {
        DisplayId::Window(window_id) => {
            if state.processes.count_running(&program_id) <= 1 {
                state
                    .launchers
                    .remove_from_grid_with_program_id(GridId::Panel, &program_id, true);
            }
            state.launchers.detach_display(display_id);
            state.windows.remove_window(window_id);
            if state.desktop.ephemeral_window_id == Some(window_id) {
                state.desktop.ephemeral_window_id = None;
            }
        }
        DisplayId::Card(card_id) => {
            state.cards.remove_card(card_id);
        }
    }

    state.processes.remove(process_id);
    Ok(())
}

/// Stops every process. Process ids keep increasing afterwards.
pub fn stop_all_processes(state: &mut ShellState) {
    for id in state.processes.ids() {
        if let Err(err) = stop_process(state, id) {
            logging::warn!("failed to stop process {id}: {err}");
        }
    }
    state.processes.clear();
}

/// Stops every instance of a program. Returns how many were stopped.
pub fn stop_processes_with_program_id(state: &mut ShellState, program_id: &ProgramId) -> usize {
    let ids: Vec<ProcessId> = state
        .processes
        .processes_for_program(program_id)
        .iter()
        .map(|process| process.id)
        .collect();
    ids.into_iter()
        .filter(|id| stop_process(state, *id).is_ok())
        .count()
}

/// Window of a desktop process, when it has one.
pub fn window_for_process(state: &ShellState, process_id: ProcessId) -> Option<WindowId> {
    state.processes.display_id(process_id)?.as_window()
}
