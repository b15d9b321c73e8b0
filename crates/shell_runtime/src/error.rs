//! Error taxonomy shared by every shell subsystem.

use thiserror::Error;

use crate::model::{CardId, CellPosition, GridId, LauncherId, ProcessId, ProgramId, WindowId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors returned by shell operations.
///
/// Every variant except [`ShellError::HomeGridMissing`] is recoverable: the failing operation
/// performs no mutation and the caller may keep going.
pub enum ShellError {
    /// The process id is not in the process table.
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),
    /// The window id is not in the window table.
    #[error("{0} not found")]
    WindowNotFound(WindowId),
    /// The card id is not in the card stack.
    #[error("{0} not found")]
    CardNotFound(CardId),
    /// No placement record with this id exists on any grid.
    #[error("{0} not found")]
    LauncherNotFound(LauncherId),
    /// No catalog launcher is registered under this key.
    #[error("catalog launcher `{0}` not found")]
    CatalogLauncherNotFound(String),
    /// No program is registered under this id.
    #[error("program `{0}` not found")]
    ProgramNotFound(ProgramId),
    /// The grid has not been registered.
    #[error("grid `{0}` not found")]
    GridNotFound(GridId),
    /// No icon occupies the referenced cell.
    #[error("no launcher at {1} in grid `{0}`")]
    CellEmpty(GridId, CellPosition),
    /// Every in-bounds cell is occupied.
    #[error("no available position in grid `{0}`")]
    GridFull(GridId),
    /// The program exists but cannot be started.
    #[error("program `{0}` is not runnable")]
    NotRunnable(ProgramId),
    /// The launcher target is an action, not a program.
    #[error("launcher target is not a program")]
    NotAProgram,
    /// The home grid has not been measured, so window geometry has no coordinate space.
    #[error("home grid has not been measured")]
    HomeGridMissing,
}

impl ShellError {
    /// Returns `true` for broken preconditions that indicate a host wiring bug.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HomeGridMissing)
    }
}

/// Result alias for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn only_missing_home_grid_is_fatal() {
        assert!(ShellError::HomeGridMissing.is_fatal());
        assert!(!ShellError::GridFull(GridId::Home).is_fatal());
        assert!(!ShellError::ProcessNotFound(ProcessId(4)).is_fatal());
    }

    #[test]
    fn messages_name_the_missing_entity() {
        assert_eq!(
            ShellError::WindowNotFound(WindowId(ProcessId(3))).to_string(),
            "window:3 not found"
        );
        assert_eq!(
            ShellError::CellEmpty(GridId::Panel, CellPosition::new(2, 0)).to_string(),
            "no launcher at (2,0) in grid `panel`"
        );
    }
}
