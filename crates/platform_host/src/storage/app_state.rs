//! Versioned app-state envelopes and the key-value store contract that persists them.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Version for [`AppStateEnvelope`] metadata serialization.
pub const APP_STATE_ENVELOPE_VERSION: u32 = 1;
/// Store name used for launcher placement snapshots.
pub const LAUNCHER_STATE_NAMESPACE: &str = "launcher-store";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Versioned envelope for a persisted payload.
pub struct AppStateEnvelope {
    /// Envelope schema version.
    pub envelope_version: u32,
    /// Store name identifying the owning domain.
    pub namespace: String,
    /// Domain-defined schema version for the payload.
    pub schema_version: u32,
    /// Last update time in unix milliseconds.
    pub updated_at_unix_ms: u64,
    /// Serialized payload.
    pub payload: Value,
}

impl AppStateEnvelope {
    /// Creates a new envelope stamped with a monotonic timestamp.
    pub fn new(namespace: impl Into<String>, schema_version: u32, payload: Value) -> Self {
        Self {
            envelope_version: APP_STATE_ENVELOPE_VERSION,
            namespace: namespace.into(),
            schema_version,
            updated_at_unix_ms: crate::clock::next_monotonic_timestamp_ms(),
            payload,
        }
    }
}

/// Object-safe boxed future used by [`AppStateStore`] async methods.
pub type AppStateStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Key-value store for app-state envelopes, keyed by namespace.
pub trait AppStateStore {
    /// Loads a persisted envelope by namespace.
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>>;

    /// Saves (replaces) an envelope under its namespace.
    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>>;

    /// Deletes the envelope stored under `namespace`.
    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that never persists anything.
pub struct NoopAppStateStore;

impl AppStateStore for NoopAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        _envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_app_state<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by namespace. Clones share storage.
pub struct MemoryAppStateStore {
    inner: Rc<RefCell<HashMap<String, AppStateEnvelope>>>,
}

impl MemoryAppStateStore {
    /// Number of namespaces currently stored.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl AppStateStore for MemoryAppStateStore {
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(namespace).cloned()) })
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(envelope.namespace.clone(), envelope.clone());
            Ok(())
        })
    }

    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(namespace);
            Ok(())
        })
    }
}

/// Builds a versioned [`AppStateEnvelope`] from a serializable payload.
///
/// # Errors
///
/// Returns an error when `payload` cannot be converted to JSON.
pub fn build_app_state_envelope<T: Serialize>(
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<AppStateEnvelope, String> {
    let payload = serde_json::to_value(payload).map_err(|e| e.to_string())?;
    Ok(AppStateEnvelope::new(namespace, schema_version, payload))
}

/// Deserializes an envelope payload into a target type.
///
/// # Errors
///
/// Returns an error when deserialization fails.
pub fn migrate_envelope_payload<T: DeserializeOwned>(
    envelope: &AppStateEnvelope,
) -> Result<T, String> {
    serde_json::from_value(envelope.payload.clone()).map_err(|e| e.to_string())
}

/// Serializes `payload` into an envelope and saves it through `store`.
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub async fn save_app_state_with<S: AppStateStore + ?Sized, T: Serialize>(
    store: &S,
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<(), String> {
    let envelope = build_app_state_envelope(namespace, schema_version, payload)?;
    store.save_app_state_envelope(&envelope).await
}

/// Loads a typed payload, routing older schema versions through `migrate`.
///
/// Envelopes at `current_schema` decode directly. Any other version is handed to `migrate`, which
/// may return `Ok(None)` to discard data it cannot upgrade.
///
/// # Errors
///
/// Returns an error when the store read, decoding, or migration fails.
pub async fn load_app_state_with_migration<S, T, F>(
    store: &S,
    namespace: &str,
    current_schema: u32,
    migrate: F,
) -> Result<Option<T>, String>
where
    S: AppStateStore + ?Sized,
    T: DeserializeOwned,
    F: FnOnce(u32, &AppStateEnvelope) -> Result<Option<T>, String>,
{
    let Some(envelope) = store.load_app_state_envelope(namespace).await? else {
        return Ok(None);
    };
    if envelope.schema_version == current_schema {
        return migrate_envelope_payload(&envelope).map(Some);
    }
    migrate(envelope.schema_version, &envelope)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Placement {
        count: u32,
        label: String,
    }

    #[test]
    fn envelope_serialization_uses_snake_case_keys() {
        let envelope = AppStateEnvelope {
            envelope_version: APP_STATE_ENVELOPE_VERSION,
            namespace: LAUNCHER_STATE_NAMESPACE.to_string(),
            schema_version: 3,
            updated_at_unix_ms: 99,
            payload: json!({"ok": true}),
        };

        let value = serde_json::to_value(&envelope).expect("serialize envelope");
        let object = value.as_object().expect("object");
        assert_eq!(object.get("namespace"), Some(&json!("launcher-store")));
        assert_eq!(object.get("schema_version"), Some(&json!(3)));
        assert_eq!(object.get("updated_at_unix_ms"), Some(&json!(99)));
        assert!(!object.contains_key("updatedAtUnixMs"));
    }

    #[test]
    fn typed_save_then_load_at_current_schema() {
        let store = MemoryAppStateStore::default();
        let payload = Placement {
            count: 2,
            label: "home".to_string(),
        };

        block_on(save_app_state_with(&store, "ns", 1, &payload)).expect("save");
        let loaded: Option<Placement> =
            block_on(load_app_state_with_migration(&store, "ns", 1, |_, _| {
                panic!("current schema must not migrate")
            }))
            .expect("load");

        assert_eq!(loaded, Some(payload));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn older_schema_is_routed_through_migration() {
        let store = MemoryAppStateStore::default();
        block_on(save_app_state_with(
            &store,
            "ns",
            0,
            &json!({"count": 5, "label": "old"}),
        ))
        .expect("save");

        let loaded: Option<Placement> =
            block_on(load_app_state_with_migration(&store, "ns", 1, |version, env| {
                assert_eq!(version, 0);
                migrate_envelope_payload(env).map(Some)
            }))
            .expect("load");

        assert_eq!(loaded.map(|p| p.count), Some(5));
    }

    #[test]
    fn migration_errors_on_mismatched_payload() {
        let envelope = AppStateEnvelope::new("ns", 1, json!({"count": "bad"}));
        let err = migrate_envelope_payload::<Placement>(&envelope).expect_err("decode failure");
        assert!(!err.is_empty());
    }

    #[test]
    fn memory_store_overwrites_and_deletes() {
        let store = MemoryAppStateStore::default();
        let store_obj: &dyn AppStateStore = &store;
        let first = AppStateEnvelope::new("ns", 1, json!({"v": 1}));
        let second = AppStateEnvelope::new("ns", 1, json!({"v": 2}));

        block_on(store_obj.save_app_state_envelope(&first)).expect("save");
        block_on(store_obj.save_app_state_envelope(&second)).expect("overwrite");
        let loaded = block_on(store_obj.load_app_state_envelope("ns"))
            .expect("load")
            .expect("present");
        assert_eq!(loaded.payload, json!({"v": 2}));
        assert!(second.updated_at_unix_ms > first.updated_at_unix_ms);

        block_on(store_obj.delete_app_state("ns")).expect("delete");
        assert!(store.is_empty());
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopAppStateStore;
        let store_obj: &dyn AppStateStore = &store;
        let envelope = AppStateEnvelope::new("noop", 1, json!({}));

        block_on(store_obj.save_app_state_envelope(&envelope)).expect("save");
        assert_eq!(
            block_on(store_obj.load_app_state_envelope("noop")).expect("load"),
            None
        );
        block_on(store_obj.delete_app_state("noop")).expect("delete");
    }
}
