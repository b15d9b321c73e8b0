//! Browser shell runtime: processes, windows, icon grids, and the reducer that ties them together.
//!
//! All state lives in [`ShellState`] and changes only through [`reduce_shell`]. Hosts render from
//! the state and execute the [`RuntimeEffect`] values the reducer returns; in a Leptos app the
//! [`ShellProvider`] component does both.

pub mod app_stack;
pub mod catalog;
pub mod config;
mod effect_executor;
pub mod env;
pub mod error;
pub mod gesture;
pub mod grid;
mod host;
pub mod launcher;
pub mod model;
mod panel;
pub mod persistence;
pub mod placement;
pub mod process;
pub mod reducer;
pub mod runtime_context;
pub mod window_manager;

pub use catalog::ShellCatalog;
pub use config::ShellConfig;
pub use env::ShellEnv;
pub use error::{ShellError, ShellResult};
pub use gesture::{InteractionState, ResizeEdge};
pub use model::*;
pub use persistence::{load_launcher_snapshot, persist_launcher_snapshot, LauncherSnapshot};
pub use reducer::{reduce_shell, RuntimeEffect, ShellAction};
pub use runtime_context::{use_shell_runtime, ShellOverlay, ShellProvider, ShellRuntimeContext};
