//! Drains reducer-emitted runtime effects in order.

use std::time::Duration;

use leptos::*;

use crate::{
    host, persistence,
    reducer::{RuntimeEffect, ShellAction},
    runtime_context::{ShellOverlay, ShellRuntimeContext},
};

/// Installs the effect executor for a runtime context.
pub fn install(runtime: ShellRuntimeContext) {
    // The queue is cleared before running so nested dispatches enqueue a fresh batch.
    create_effect(move |_| {
        let queued = runtime.effects.get();
        if queued.is_empty() {
            return;
        }

        runtime.effects.set(Vec::new());

        for effect in queued {
            run_runtime_effect(runtime, effect);
        }
    });
}

fn run_runtime_effect(runtime: ShellRuntimeContext, effect: RuntimeEffect) {
    match effect {
        RuntimeEffect::PersistLaunchers => persist_launchers(runtime),
        RuntimeEffect::OpenExternalUrl(url) => host::open_external_url(&url),
        RuntimeEffect::ShowWindowPreview { window_ids, anchor } => {
            runtime
                .overlay
                .set(Some(ShellOverlay::WindowPreview { window_ids, anchor }));
        }
        RuntimeEffect::HideOverlay => {
            if runtime.overlay.get_untracked().is_some() {
                runtime.overlay.set(None);
            }
        }
        RuntimeEffect::ShowShutdownDialog => runtime.overlay.set(Some(ShellOverlay::ShutdownDialog)),
        RuntimeEffect::PushHistoryState => host::push_history_state(),
        RuntimeEffect::ScheduleGridSettle { grid_id, delay_ms } => host::dispatch_after(
            runtime.dispatch,
            ShellAction::GridResizeSettled { grid_id },
            Duration::from_millis(delay_ms),
        ),
        RuntimeEffect::ScheduleBoot { delay_ms } => host::dispatch_after(
            runtime.dispatch,
            ShellAction::Boot,
            Duration::from_millis(delay_ms),
        ),
    }
}

fn persist_launchers(runtime: ShellRuntimeContext) {
    let launchers = runtime.state.get_untracked().launchers;
    let store = runtime.store.get_value();
    spawn_local(async move {
        if let Err(err) = persistence::persist_launcher_snapshot(&*store, &launchers).await {
            logging::warn!("persist launchers failed: {err}");
        }
    });
}
