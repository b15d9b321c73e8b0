//! Runtime provider and context wiring for the shell.
//!
//! This module owns the long-lived reducer container, the runtime effect queue, overlay requests,
//! and boot hydration of launcher placements. Surfaces read state from the context and send every
//! change through [`ShellRuntimeContext::dispatch_action`].
#![allow(clippy::clone_on_copy)]

use std::rc::Rc;

use leptos::*;
use platform_host::AppStateStore;

use crate::{
    effect_executor,
    env::ShellEnv,
    gesture::InteractionState,
    model::{Platform, Position, ShellState, WindowId},
    persistence,
    reducer::{reduce_shell, RuntimeEffect, ShellAction},
};

#[derive(Debug, Clone, PartialEq)]
/// Overlay the host should render above the shell.
pub enum ShellOverlay {
    /// Thumbnails of several windows belonging to one taskbar icon.
    WindowPreview {
        /// Windows to preview.
        window_ids: Vec<WindowId>,
        /// Anchor point above the taskbar.
        anchor: Position,
    },
    /// Shutdown confirmation.
    ShutdownDialog,
}

#[derive(Clone, Copy)]
/// Leptos context for reading shell state and dispatching [`ShellAction`] values.
pub struct ShellRuntimeContext {
    /// Configuration, catalog, and clock.
    pub env: StoredValue<ShellEnv>,
    /// Store for launcher snapshots.
    pub store: StoredValue<Rc<dyn AppStateStore>>,
    /// Reactive shell state signal.
    pub state: RwSignal<ShellState>,
    /// Reactive drag/resize session signal.
    pub interaction: RwSignal<InteractionState>,
    /// Queue of runtime effects emitted by the reducer.
    pub effects: RwSignal<Vec<RuntimeEffect>>,
    /// Active overlay request.
    pub overlay: RwSignal<Option<ShellOverlay>>,
    /// Set once persisted launchers were loaded (or found absent). Surfaces dispatch
    /// [`ShellAction::DesktopMounted`] only after this turns `true`.
    pub hydrated: RwSignal<bool>,
    /// Reducer dispatch callback.
    pub dispatch: Callback<ShellAction>,
}

impl ShellRuntimeContext {
    /// Dispatches a reducer action through the runtime context callback.
    pub fn dispatch_action(&self, action: ShellAction) {
        self.dispatch.call(action);
    }
}

fn install_boot_hydration(runtime: ShellRuntimeContext) {
    let store = runtime.store.get_value();
    spawn_local(async move {
        if let Some(snapshot) = persistence::load_launcher_snapshot(&*store).await {
            runtime.dispatch_action(ShellAction::HydrateLaunchers {
                records: snapshot.launchers,
            });
        }
        runtime.hydrated.set(true);
    });
}

#[component]
/// Provides [`ShellRuntimeContext`] to descendant components and hydrates persisted launchers.
pub fn ShellProvider(
    /// Initial platform.
    platform: Platform,
    /// Configuration, catalog, and clock.
    env: ShellEnv,
    /// Store for launcher snapshots.
    store: Rc<dyn AppStateStore>,
    children: Children,
) -> impl IntoView {
    let initial = ShellState::new(platform, &env.config);
    let env = store_value(env);
    let store = store_value(store);
    let state = create_rw_signal(initial);
    let interaction = create_rw_signal(InteractionState::default());
    let effects = create_rw_signal(Vec::<RuntimeEffect>::new());
    let overlay = create_rw_signal(None::<ShellOverlay>);
    let hydrated = create_rw_signal(false);

    let dispatch = Callback::new(move |action: ShellAction| {
        let mut shell = state.get_untracked();
        let mut ui = interaction.get_untracked();
        let previous_shell = shell.clone();
        let previous_ui = ui.clone();

        match env.with_value(|env| reduce_shell(env, &mut shell, &mut ui, action)) {
            Ok(new_effects) => {
                if shell != previous_shell {
                    state.set(shell);
                }
                if ui != previous_ui {
                    interaction.set(ui);
                }
                if !new_effects.is_empty() {
                    let mut queue = effects.get_untracked();
                    queue.extend(new_effects);
                    effects.set(queue);
                }
            }
            Err(err) if err.is_fatal() => logging::error!("shell reducer failed: {err}"),
            Err(err) => logging::warn!("shell reducer error: {err}"),
        }
    });

    let runtime = ShellRuntimeContext {
        env,
        store,
        state,
        interaction,
        effects,
        overlay,
        hydrated,
        dispatch,
    };

    provide_context(runtime.clone());

    effect_executor::install(runtime);
    install_boot_hydration(runtime);

    let history_listener = window_event_listener(ev::popstate, move |_| {
        dispatch.call(ShellAction::NavigateBack);
    });
    on_cleanup(move || history_listener.remove());

    children().into_view()
}

/// Returns the current [`ShellRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`ShellProvider`].
pub fn use_shell_runtime() -> ShellRuntimeContext {
    use_context::<ShellRuntimeContext>().expect("ShellRuntimeContext not provided")
}
