//! Launcher placement persistence for boot hydration.

use leptos::logging;
use platform_host::{AppStateEnvelope, AppStateStore, LAUNCHER_STATE_NAMESPACE};
use serde::{Deserialize, Serialize};

use crate::{
    model::{GridLauncher, LAUNCHER_SNAPSHOT_SCHEMA_VERSION},
    placement::LauncherTable,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Persisted launcher placements. Surface links are never stored.
pub struct LauncherSnapshot {
    pub schema_version: u32,
    pub launchers: Vec<GridLauncher>,
}

impl LauncherSnapshot {
    pub fn from_table(table: &LauncherTable) -> Self {
        Self {
            schema_version: LAUNCHER_SNAPSHOT_SCHEMA_VERSION,
            launchers: table.records().cloned().collect(),
        }
    }
}

/// Schema 0 stored the bare record list.
fn migrate_launcher_snapshot(
    schema_version: u32,
    envelope: &AppStateEnvelope,
) -> Result<Option<LauncherSnapshot>, String> {
    match schema_version {
        0 => platform_host::migrate_envelope_payload::<Vec<GridLauncher>>(envelope).map(|launchers| {
            Some(LauncherSnapshot {
                schema_version: LAUNCHER_SNAPSHOT_SCHEMA_VERSION,
                launchers,
            })
        }),
        _ => Ok(None),
    }
}

/// Loads the persisted launcher snapshot. Read and decode failures are logged and treated as no
/// snapshot.
pub async fn load_launcher_snapshot<S: AppStateStore + ?Sized>(store: &S) -> Option<LauncherSnapshot> {
    match platform_host::load_app_state_with_migration::<_, LauncherSnapshot, _>(
        store,
        LAUNCHER_STATE_NAMESPACE,
        LAUNCHER_SNAPSHOT_SCHEMA_VERSION,
        migrate_launcher_snapshot,
    )
    .await
    {
        Ok(snapshot) => snapshot,
        Err(err) => {
            logging::warn!("launcher snapshot load failed: {err}");
            None
        }
    }
}

/// Persists the current launcher placements.
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub async fn persist_launcher_snapshot<S: AppStateStore + ?Sized>(
    store: &S,
    table: &LauncherTable,
) -> Result<(), String> {
    platform_host::save_app_state_with(
        store,
        LAUNCHER_STATE_NAMESPACE,
        LAUNCHER_SNAPSHOT_SCHEMA_VERSION,
        &LauncherSnapshot::from_table(table),
    )
    .await
}

/// # Errors
///
/// Returns an error when the store delete fails.
pub async fn clear_launcher_snapshot<S: AppStateStore + ?Sized>(store: &S) -> Result<(), String> {
    store.delete_app_state(LAUNCHER_STATE_NAMESPACE).await
}

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageAppStateStore;

#[cfg(target_arch = "wasm32")]
mod local_storage {
    use platform_host::{AppStateEnvelope, AppStateStore, AppStateStoreFuture};

    const KEY_PREFIX: &str = "showcase-os.";

    #[derive(Debug, Clone, Copy, Default)]
    /// Browser `localStorage` adapter. Each namespace is one JSON string entry.
    pub struct LocalStorageAppStateStore;

    fn storage() -> Result<web_sys::Storage, String> {
        web_sys::window()
            .ok_or_else(|| "no window".to_string())?
            .local_storage()
            .map_err(|_| "localStorage is not accessible".to_string())?
            .ok_or_else(|| "localStorage is unavailable".to_string())
    }

    fn key(namespace: &str) -> String {
        format!("{KEY_PREFIX}{namespace}")
    }

    impl AppStateStore for LocalStorageAppStateStore {
        fn load_app_state_envelope<'a>(
            &'a self,
            namespace: &'a str,
        ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
            Box::pin(async move {
                let raw = storage()?
                    .get_item(&key(namespace))
                    .map_err(|_| format!("failed to read `{namespace}`"))?;
                raw.map(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
                    .transpose()
            })
        }

        fn save_app_state_envelope<'a>(
            &'a self,
            envelope: &'a AppStateEnvelope,
        ) -> AppStateStoreFuture<'a, Result<(), String>> {
            Box::pin(async move {
                let raw = serde_json::to_string(envelope).map_err(|e| e.to_string())?;
                storage()?
                    .set_item(&key(&envelope.namespace), &raw)
                    .map_err(|_| format!("failed to write `{}`", envelope.namespace))
            })
        }

        fn delete_app_state<'a>(
            &'a self,
            namespace: &'a str,
        ) -> AppStateStoreFuture<'a, Result<(), String>> {
            Box::pin(async move {
                storage()?
                    .remove_item(&key(namespace))
                    .map_err(|_| format!("failed to delete `{namespace}`"))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryAppStateStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{DisplayId, GridId, LauncherMetadata, ProcessId, WindowId};

    fn table() -> LauncherTable {
        let mut table = LauncherTable::default();
        table.panel_add_launcher(
            LauncherMetadata::program("terminal"),
            true,
            Some(DisplayId::Window(WindowId(ProcessId(3)))),
        );
        table
    }

    #[test]
    fn persisted_snapshot_omits_surface_links() {
        let store = MemoryAppStateStore::default();
        block_on(persist_launcher_snapshot(&store, &table())).expect("persist");

        let snapshot = block_on(load_launcher_snapshot(&store)).expect("snapshot");
        assert_eq!(snapshot.launchers.len(), 1);
        assert!(snapshot.launchers[0].display_ids.is_empty());
        assert_eq!(snapshot.launchers[0].grid_id, GridId::Panel);
    }

    #[test]
    fn schema_zero_record_list_is_migrated() {
        let store = MemoryAppStateStore::default();
        let records: Vec<GridLauncher> = table().records().cloned().collect();
        let envelope =
            platform_host::build_app_state_envelope(LAUNCHER_STATE_NAMESPACE, 0, &records)
                .expect("envelope");
        block_on(store.save_app_state_envelope(&envelope)).expect("save");

        let snapshot = block_on(load_launcher_snapshot(&store)).expect("migrated");
        assert_eq!(snapshot.schema_version, LAUNCHER_SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(snapshot.launchers.len(), 1);
    }

    #[test]
    fn unknown_schema_is_ignored() {
        let store = MemoryAppStateStore::default();
        let envelope = platform_host::build_app_state_envelope(
            LAUNCHER_STATE_NAMESPACE,
            99,
            &serde_json::json!({ "anything": true }),
        )
        .expect("envelope");
        block_on(store.save_app_state_envelope(&envelope)).expect("save");

        assert_eq!(block_on(load_launcher_snapshot(&store)), None);
    }

    #[test]
    fn clearing_removes_the_snapshot() {
        let store = MemoryAppStateStore::default();
        block_on(persist_launcher_snapshot(&store, &table())).expect("persist");
        block_on(clear_launcher_snapshot(&store)).expect("clear");
        assert!(store.is_empty());
    }

    #[test]
    fn noop_store_never_hydrates() {
        let store = platform_host::NoopAppStateStore;
        block_on(persist_launcher_snapshot(&store, &table())).expect("persist");
        assert_eq!(block_on(load_launcher_snapshot(&store)), None);
    }
}
