//! Integration tests for podstate

use podstate::runtime::ReactiveRuntime;
use podstate::{
    create_effect, Host, MemoryStorage, Pod, PodConfig, PodKey, Scope, Seed, Storage, StorageKind,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

fn host_with(items: &[(&str, &str)]) -> (Host, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::with_items(items.iter().copied()));
    let host = Host::in_memory().with_storage(StorageKind::Local, storage.clone());
    (host, storage)
}

fn acquire(host: &Host, key: &str, initial: Option<Value>, override_stored: bool) -> Pod<Value> {
    Pod::acquire(host, &PodConfig::default(), key, StorageKind::Local, initial, override_stored)
}

fn stored(storage: &MemoryStorage, name: &str) -> Option<String> {
    storage.get_item(name).unwrap()
}

#[test]
fn seeds_empty_slot_from_initial() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[]);
        let pod = acquire(&host, "theme", Some(json!({"theme": "light"})), false);

        assert_eq!(pod.get(), json!({"theme": "light"}));
        assert_eq!(stored(&storage, "theme").as_deref(), Some(r#"{"theme":"light"}"#));
    });
}

#[test]
fn restores_existing_record() {
    ReactiveRuntime::scope(|| {
        let (host, _storage) = host_with(&[("theme", r#"{"theme":"dark"}"#)]);
        let pod = acquire(&host, "theme", None, false);

        assert_eq!(pod.get(), json!({"theme": "dark"}));
    });
}

#[test]
fn restored_record_beats_initial() {
    ReactiveRuntime::scope(|| {
        let (host, _storage) = host_with(&[("theme", r#"{"theme":"dark"}"#)]);
        let pod = acquire(&host, "theme", Some(json!({"theme": "light"})), false);

        assert_eq!(pod.get(), json!({"theme": "dark"}));
    });
}

#[test]
fn malformed_record_becomes_empty_object() {
    ReactiveRuntime::scope(|| {
        let (host, _storage) = host_with(&[("theme", "not-json")]);
        let pod = acquire(&host, "theme", None, false);

        assert_eq!(pod.get(), json!({}));
    });
}

#[test]
fn empty_record_counts_as_absent() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[("theme", "")]);
        let pod = acquire(&host, "theme", Some(json!({"theme": "light"})), false);

        assert_eq!(pod.get(), json!({"theme": "light"}));
        assert_eq!(stored(&storage, "theme").as_deref(), Some(r#"{"theme":"light"}"#));
    });
}

#[test]
fn override_replaces_record() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[("theme", r#"{"theme":"dark"}"#)]);
        let pod = acquire(&host, "theme", Some(json!({"theme": "light"})), true);

        assert_eq!(pod.get(), json!({"theme": "light"}));
        assert_eq!(stored(&storage, "theme").as_deref(), Some(r#"{"theme":"light"}"#));
    });
}

#[test]
fn override_without_initial_writes_empty_object() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[("theme", r#"{"theme":"dark"}"#)]);
        let pod = acquire(&host, "theme", None, true);

        assert_eq!(pod.get(), json!({}));
        assert_eq!(stored(&storage, "theme").as_deref(), Some("{}"));
    });
}

#[test]
fn no_initial_and_no_record_gives_empty_object() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[]);
        let pod = acquire(&host, "prefs", None, false);

        assert_eq!(pod.get(), json!({}));
        assert_eq!(stored(&storage, "prefs").as_deref(), Some("{}"));
    });
}

#[test]
fn changes_are_written_through() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[]);
        let pod = acquire(&host, "box", Some(json!({"color": "#ff3e00", "dimensions": [100, 100]})), false);

        pod.update(|value| value["dimensions"][0] = json!(250));
        let record = stored(&storage, "box").unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&record).unwrap(),
            json!({"color": "#ff3e00", "dimensions": [250, 100]})
        );

        pod.set(json!({"color": "blue"}));
        assert_eq!(stored(&storage, "box").as_deref(), Some(r#"{"color":"blue"}"#));
    });
}

#[test]
fn writes_through_a_clone() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[]);
        let pod = acquire(&host, "n", Some(json!(1)), false);
        let handle = pod.clone();
        drop(pod);

        handle.set(json!(2));
        assert_eq!(stored(&storage, "n").as_deref(), Some("2"));
    });
}

#[test]
fn persistence_stops_when_every_handle_is_dropped() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[]);
        let pod = acquire(&host, "n", Some(json!(1)), false);
        let signal = pod.signal().clone();
        drop(pod);

        signal.set(json!(2));
        assert_eq!(stored(&storage, "n").as_deref(), Some("1"));
        assert_eq!(signal.observer_count(), 0);
    });
}

#[test]
fn headless_host_skips_persistence() {
    ReactiveRuntime::scope(|| {
        let pod = acquire(&Host::headless(), "theme", Some(json!({"theme": "light"})), false);

        assert_eq!(pod.get(), json!({"theme": "light"}));
        assert!(!pod.is_persistent());
    });
}

#[test]
fn session_and_local_are_independent() {
    ReactiveRuntime::scope(|| {
        let host = Host::in_memory();
        let config = PodConfig::default();
        let local = Pod::acquire(&host, &config, "k", StorageKind::Local, Some(json!("a")), false);
        let session = Pod::acquire(&host, &config, "k", StorageKind::Session, Some(json!("b")), false);

        local.set(json!("c"));
        assert_eq!(session.get(), json!("b"));

        let local_storage = host.storage(StorageKind::Local).unwrap();
        let session_storage = host.storage(StorageKind::Session).unwrap();
        assert_eq!(local_storage.get_item("k").unwrap().as_deref(), Some("\"c\""));
        assert_eq!(session_storage.get_item("k").unwrap().as_deref(), Some("\"b\""));
    });
}

#[test]
fn effects_observe_pods() {
    ReactiveRuntime::scope(|| {
        let (host, _storage) = host_with(&[]);
        let pod = acquire(&host, "n", Some(json!(0)), false);
        let runs = Arc::new(AtomicUsize::new(0));

        let _effect = create_effect({
            let pod = pod.clone();
            let runs = runs.clone();
            move || {
                let _ = pod.get();
                runs.fetch_add(1, Ordering::SeqCst);
            }
        });

        pod.set(json!(1));
        pod.set(json!(2));
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    });
}

#[test]
fn subscribe_sees_every_value() {
    ReactiveRuntime::scope(|| {
        let (host, _storage) = host_with(&[]);
        let pod = acquire(&host, "n", Some(json!(0)), false);
        let sum = Arc::new(AtomicUsize::new(0));

        let _guard = pod.subscribe({
            let sum = sum.clone();
            move |value| {
                sum.fetch_add(value.as_u64().unwrap_or(0) as usize, Ordering::SeqCst);
            }
        });

        pod.set(json!(4));
        pod.set(json!(5));
        assert_eq!(sum.load(Ordering::SeqCst), 9);
    });
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSettings {
    theme: String,
    font_size: u32,
}

struct UserSettingsKey;

impl PodKey for UserSettingsKey {
    const NAME: &'static str = "userSettings";
    type Value = UserSettings;
}

#[test]
fn typed_keys_share_through_scopes() {
    ReactiveRuntime::scope(|| {
        let (host, storage) = host_with(&[("userSettings", r#"{"theme":"dark","fontSize":14}"#)]);
        let root = Scope::root(host, PodConfig::default());

        let settings = root.pod_typed::<UserSettingsKey>(StorageKind::Local, Seed::Stored);
        assert_eq!(settings.get().font_size, 14);

        let child = root.child();
        let shared = child.lookup_typed::<UserSettingsKey>(StorageKind::Local).unwrap();
        shared.update(|s| s.font_size = 16);

        assert_eq!(settings.get().font_size, 16);
        assert_eq!(
            stored(&storage, "userSettings").as_deref(),
            Some(r#"{"theme":"dark","fontSize":16}"#)
        );
    });
}

#[test]
fn reacquiring_restores_last_write() {
    ReactiveRuntime::scope(|| {
        let (host, _storage) = host_with(&[]);
        let first = Pod::<UserSettings>::acquire_typed::<UserSettingsKey>(
            &host,
            &PodConfig::default(),
            StorageKind::Local,
            Some(UserSettings {
                theme: "light".into(),
                font_size: 12,
            }),
            false,
        );
        first.update(|s| s.theme = "dark".into());
        drop(first);

        let root = Scope::root(host, PodConfig::default());
        let second = root.pod_typed::<UserSettingsKey>(StorageKind::Local, Seed::Stored);
        assert_eq!(
            second.get(),
            UserSettings {
                theme: "dark".into(),
                font_size: 12
            }
        );
    });
}

#[test]
fn scope_lookup_before_publish_fails() {
    let root = Scope::root(Host::in_memory(), PodConfig::default());
    assert!(root.lookup::<Value>("theme", StorageKind::Local).is_err());
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn stored_records_restore_to_the_same_value(value in json_value()) {
        ReactiveRuntime::scope(|| {
            let (host, _storage) = host_with(&[]);
            let pod = acquire(&host, "v", Some(json!(null)), false);
            pod.set(value.clone());
            drop(pod);

            let restored = acquire(&host, "v", None, false);
            prop_assert_eq!(restored.get(), value);
            Ok(())
        })?;
    }
}
