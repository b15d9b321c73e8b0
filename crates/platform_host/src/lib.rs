//! Host contracts shared by the shell runtime and its browser adapters.
//!
//! The shell core never touches browser storage or clocks directly. It talks to the key-value
//! [`AppStateStore`] for launcher snapshots and to a [`Clock`] for process start times, gesture
//! timing, and resize debouncing. Concrete browser adapters live next to the runtime behind
//! `cfg(target_arch = "wasm32")`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod clock;
pub mod storage;

pub use clock::{
    next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock,
};
pub use storage::app_state::{
    build_app_state_envelope, load_app_state_with_migration, migrate_envelope_payload,
    save_app_state_with, AppStateEnvelope, AppStateStore, AppStateStoreFuture,
    MemoryAppStateStore, NoopAppStateStore, APP_STATE_ENVELOPE_VERSION,
    LAUNCHER_STATE_NAMESPACE,
};
