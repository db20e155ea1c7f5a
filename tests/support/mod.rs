#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use livly::api::LivlyClient;
use livly::auth::credentials::unix_now;
use livly::auth::{ConfigStore, CredentialUpdate, PersistedConfig, StoreError};
use livly::coordinator::{PollScheduler, UpdateCoordinator};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const PHONE: &str = "+15551234567";
pub const USER_ID: i64 = 4242;

#[derive(Default)]
pub struct InMemoryConfigStore {
    entry: Mutex<Option<PersistedConfig>>,
    saves: AtomicUsize,
    merges: Mutex<Vec<CredentialUpdate>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(entry: PersistedConfig) -> Self {
        let store = Self::default();
        *store.entry.lock().expect("store lock poisoned") = Some(entry);
        store
    }

    pub fn entry(&self) -> Option<PersistedConfig> {
        self.entry.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn merges(&self) -> Vec<CredentialUpdate> {
        self.merges.lock().expect("store lock poisoned").clone()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load(&self) -> Result<Option<PersistedConfig>, StoreError> {
        Ok(self.entry())
    }

    fn save(&self, config: &PersistedConfig) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.entry.lock().expect("store lock poisoned") = Some(config.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.entry.lock().expect("store lock poisoned") = None;
        Ok(())
    }

    fn merge(&self, update: &CredentialUpdate) -> Result<(), StoreError> {
        self.merges
            .lock()
            .expect("store lock poisoned")
            .push(update.clone());
        let mut config = self.load()?.ok_or(StoreError::NotConfigured)?;
        config.apply(update);
        self.save(&config)
    }
}

#[derive(Debug, Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<Duration>>,
    cancels: AtomicUsize,
    notifies: AtomicUsize,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<Duration> {
        self.scheduled.lock().expect("scheduler lock poisoned").clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn notify_count(&self) -> usize {
        self.notifies.load(Ordering::SeqCst)
    }
}

impl PollScheduler for RecordingScheduler {
    fn schedule(&self, interval: Duration) {
        self.scheduled
            .lock()
            .expect("scheduler lock poisoned")
            .push(interval);
    }

    fn cancel_schedule(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn notify_listeners(&self) {
        self.notifies.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stored entry whose token stays valid for another hour.
pub fn fresh_entry() -> PersistedConfig {
    PersistedConfig {
        phone_number: PHONE.to_string(),
        access_token: Some("access-1".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        id_token: Some("id-1".to_string()),
        token_expires_at: unix_now() + 3600.0,
        user_id: Some(USER_ID),
    }
}

/// Client pointed at `server` for both hosts, seeded from `entry`.
pub fn client_for(server: &MockServer, entry: &PersistedConfig) -> LivlyClient {
    let mut client = LivlyClient::new()
        .with_auth_base_url(server.uri())
        .with_api_base_url(server.uri());
    client.set_credentials(entry.credentials());
    client
}

pub fn coordinator_for(
    server: &MockServer,
    store: Arc<InMemoryConfigStore>,
    scheduler: Arc<RecordingScheduler>,
) -> UpdateCoordinator {
    let entry = store.entry().expect("store seeded");
    UpdateCoordinator::new(
        client_for(server, &entry),
        store,
        scheduler,
        Duration::from_secs(30 * 60),
    )
}

pub fn packages_body(count: usize) -> Value {
    let packages: Vec<Value> = (0..count)
        .map(|idx| {
            json!({
                "packageId": 100 + idx,
                "carrier": "UPS",
                "status": "Received",
            })
        })
        .collect();
    json!({ "Data": packages })
}

pub fn packages_path() -> String {
    format!("/api/livly/packages/user/{USER_ID}/filtered")
}

pub fn token_body(access: &str, refresh: &str, id: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "id_token": id,
        "expires_in": expires_in,
        "token_type": "Bearer",
    })
}
