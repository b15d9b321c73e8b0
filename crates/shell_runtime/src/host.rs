//! Browser side effects requested by the reducer. Non-wasm targets log and skip them.

use std::time::Duration;

use leptos::{logging, Callable, Callback};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

use crate::reducer::ShellAction;

pub(crate) fn open_external_url(url: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(window) = web_sys::window() else {
            return;
        };
        if window.open_with_url_and_target(url, "_blank").is_err() {
            logging::warn!("open external url failed for `{url}`");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    logging::log!("open external url `{url}`");
}

/// Adds a history entry so the browser back button closes the newest card.
pub(crate) fn push_history_state() {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(history) = web_sys::window().and_then(|window| window.history().ok()) else {
            return;
        };
        if history
            .push_state_with_url(&JsValue::NULL, "", None)
            .is_err()
        {
            logging::warn!("history push failed");
        }
    }
}

/// Dispatches `action` after `delay`.
pub(crate) fn dispatch_after(dispatch: Callback<ShellAction>, action: ShellAction, delay: Duration) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = Closure::once_into_js(move || dispatch.call(action));
        let timeout_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                timeout_ms,
            )
            .is_err()
        {
            logging::warn!("failed to schedule delayed shell action");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = delay;
        dispatch.call(action);
    }
}
