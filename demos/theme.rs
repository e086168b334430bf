//! A settings panel whose state survives "reloads".
//!
//! Run with `RUST_LOG=podstate=debug cargo run --example theme` to watch
//! slots being read and written.

use podstate::{Host, PodConfig, PodKey, Scope, Seed, Storage, StorageKind};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
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

/// One "page load": a root component acquires the pod, a nested component
/// looks it up and edits it.
fn page_load(host: &Host, round: u32) {
    let app = Scope::root(host.clone(), PodConfig::default());
    let settings = app.pod_typed::<UserSettingsKey>(
        StorageKind::Local,
        Seed::Initial(UserSettings {
            theme: "light".to_string(),
            font_size: 14,
        }),
    );
    println!("load {round}: {:?}", settings.get());

    let toolbar = app.child();
    if let Ok(shared) = toolbar.lookup_typed::<UserSettingsKey>(StorageKind::Local) {
        shared.update(|s| {
            s.theme = if s.theme == "light" { "dark" } else { "light" }.to_string();
            s.font_size += 1;
        });
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = Host::in_memory();
    for round in 1..=3 {
        page_load(&host, round);
    }

    let record = host
        .storage(StorageKind::Local)
        .and_then(|storage| storage.get_item(UserSettingsKey::NAME).ok().flatten());
    println!("stored: {}", record.unwrap_or_default());
}
