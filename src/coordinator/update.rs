use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::scheduler::PollScheduler;
use crate::api::{LivlyClient, Package};
use crate::auth::{ConfigStore, CredentialSet, CredentialUpdate, StoreError};
use crate::error::LivlyError;

/// Outcome of one successful fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollResult {
    pub pending_packages: Vec<Package>,
    pub pending_count: usize,
}

impl PollResult {
    pub fn new(pending_packages: Vec<Package>) -> Self {
        let pending_count = pending_packages.len();
        Self {
            pending_packages,
            pending_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub enabled: bool,
    pub last_success: Option<DateTime<Utc>>,
}

/// Point-in-time view handed to consumers.
#[derive(Debug, Clone)]
pub struct CoordinatorSnapshot {
    pub data: Option<Arc<PollResult>>,
    /// False after a failed cycle until the next one succeeds.
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub sync: SyncState,
}

#[derive(Debug)]
struct State {
    sync: SyncState,
    data: Option<Arc<PollResult>>,
    last_update_success: bool,
    last_error: Option<String>,
}

/// Owns the fetch cycle, the sync toggle and credential write-back.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use livly::api::LivlyClient;
/// use livly::auth::FileConfigStore;
/// use livly::coordinator::{TokioScheduler, UpdateCoordinator};
///
/// # async fn example() -> livly::error::Result<()> {
/// let store = Arc::new(FileConfigStore::new(std::path::PathBuf::from("/tmp/livly")));
/// let coordinator = UpdateCoordinator::new(
///     LivlyClient::new(),
///     store,
///     Arc::new(TokioScheduler::new()),
///     Duration::from_secs(1800),
/// );
/// coordinator.first_refresh().await?;
/// println!("{:?}", coordinator.snapshot().data);
/// # Ok(())
/// # }
/// ```
pub struct UpdateCoordinator {
    client: tokio::sync::Mutex<LivlyClient>,
    store: Arc<dyn ConfigStore>,
    scheduler: Arc<dyn PollScheduler>,
    update_interval: Duration,
    state: Mutex<State>,
}

impl std::fmt::Debug for UpdateCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCoordinator")
            .field("update_interval", &self.update_interval)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl UpdateCoordinator {
    /// New coordinator with sync enabled and no data yet.
    pub fn new(
        client: LivlyClient,
        store: Arc<dyn ConfigStore>,
        scheduler: Arc<dyn PollScheduler>,
        update_interval: Duration,
    ) -> Self {
        Self {
            client: tokio::sync::Mutex::new(client),
            store,
            scheduler,
            update_interval,
            state: Mutex::new(State {
                sync: SyncState {
                    enabled: true,
                    last_success: None,
                },
                data: None,
                last_update_success: true,
                last_error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn sync_enabled(&self) -> bool {
        self.state().sync.enabled
    }

    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.state().sync.last_success
    }

    pub fn data(&self) -> Option<Arc<PollResult>> {
        self.state().data.clone()
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.state();
        CoordinatorSnapshot {
            data: state.data.clone(),
            last_update_success: state.last_update_success,
            last_error: state.last_error.clone(),
            sync: state.sync,
        }
    }

    /// Copy of the client's current credentials.
    pub async fn credentials(&self) -> CredentialSet {
        self.client.lock().await.credentials().clone()
    }

    /// Arm the periodic timer if sync is enabled.
    pub fn start(&self) {
        if self.sync_enabled() {
            self.scheduler.schedule(self.update_interval);
        }
    }

    /// Disarm the periodic timer.
    pub fn stop(&self) {
        self.scheduler.cancel_schedule();
    }

    /// One fetch cycle.
    ///
    /// While paused this returns the last result (or an empty one) without
    /// touching the network. Client failures come back as
    /// [`LivlyError::UpdateFailed`]; store failures propagate as-is.
    pub async fn refresh(&self) -> Result<Arc<PollResult>, LivlyError> {
        if !self.sync_enabled() {
            debug!("Sync disabled, skipping fetch");
            return Ok(self.data().unwrap_or_default());
        }

        let mut client = self.client.lock().await;
        let packages = match client.get_pending_packages().await {
            Ok(packages) => packages,
            Err(err) => {
                if err.is_auth() {
                    error!(error = %err, "Authentication error");
                } else {
                    error!(error = %err, "API error");
                }
                return Err(LivlyError::update_failed(err));
            }
        };

        self.persist_credentials(client.credentials())?;
        drop(client);

        self.state().sync.last_success = Some(Utc::now());
        let result = PollResult::new(packages);
        debug!(pending_count = result.pending_count, "Fetched pending packages");
        Ok(Arc::new(result))
    }

    /// Write back whichever token fields drifted from the stored entry.
    fn persist_credentials(&self, current: &CredentialSet) -> Result<(), StoreError> {
        let stored = self.store.load()?.ok_or(StoreError::NotConfigured)?;
        let update = CredentialUpdate::diff(current, &stored);
        if update.is_empty() {
            return Ok(());
        }
        debug!(fields = update.fields().len(), "Persisting refreshed credentials");
        self.store.merge(&update)
    }

    /// Run a cycle the way the polling framework does: keep stale data on failure.
    pub async fn request_refresh(&self) {
        let outcome = self.refresh().await;
        {
            let mut state = self.state();
            match outcome {
                Ok(result) => {
                    if !state.last_update_success {
                        info!("Fetching Livly data recovered");
                    }
                    state.data = Some(result);
                    state.last_update_success = true;
                    state.last_error = None;
                }
                Err(err) => {
                    if state.last_update_success {
                        warn!(error = %err, "Error fetching Livly data");
                    }
                    state.last_update_success = false;
                    state.last_error = Some(err.to_string());
                }
            }
        }
        self.scheduler.notify_listeners();
    }

    /// The mandatory first cycle; failure is returned so setup can abort.
    pub async fn first_refresh(&self) -> Result<(), LivlyError> {
        match self.refresh().await {
            Ok(result) => {
                let mut state = self.state();
                state.data = Some(result);
                state.last_update_success = true;
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                let mut state = self.state();
                state.last_update_success = false;
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Pause or resume polling; resuming re-arms the timer and fetches immediately.
    pub async fn set_sync_enabled(&self, enabled: bool) {
        self.state().sync.enabled = enabled;
        if enabled {
            info!("Sync enabled");
            self.scheduler.schedule(self.update_interval);
            self.request_refresh().await;
        } else {
            info!("Sync disabled");
            self.scheduler.cancel_schedule();
        }
        self.scheduler.notify_listeners();
    }
}
