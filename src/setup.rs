//! Explicit lifecycle: connect an account, hand the coordinator to its consumers, disconnect.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::LivlyClient;
use crate::auth::login::masked_phone;
use crate::auth::{ConfigStore, StoreError};
use crate::config::LivlyConfig;
use crate::coordinator::{drive, TokioScheduler, UpdateCoordinator};
use crate::entities::{DeviceInfo, PendingPackagesSensor, SyncSwitch};
use crate::error::LivlyError;

/// A connected account with its polling task running.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use livly::config::LivlyConfig;
/// use livly::setup::Integration;
///
/// # async fn example() -> livly::error::Result<()> {
/// let config = LivlyConfig::from_env();
/// let integration = Integration::setup(&config, Arc::new(config.file_store())).await?;
/// println!("{:?} packages waiting", integration.sensor().native_value());
/// integration.unload().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Integration {
    coordinator: Arc<UpdateCoordinator>,
    scheduler: Arc<TokioScheduler>,
    sensor: PendingPackagesSensor,
    switch: SyncSwitch,
    shutdown: CancellationToken,
    driver: JoinHandle<()>,
}

impl Integration {
    /// Build everything from the stored entry and run the first fetch.
    ///
    /// If that fetch fails nothing is spawned and the error is returned.
    pub async fn setup(
        config: &LivlyConfig,
        store: Arc<dyn ConfigStore>,
    ) -> Result<Self, LivlyError> {
        Self::setup_with_client(LivlyClient::from_config(config), config, store).await
    }

    /// Same as [`Integration::setup`] with a caller-built client.
    pub async fn setup_with_client(
        mut client: LivlyClient,
        config: &LivlyConfig,
        store: Arc<dyn ConfigStore>,
    ) -> Result<Self, LivlyError> {
        let entry = store.load()?.ok_or(StoreError::NotConfigured)?;
        client.set_credentials(entry.credentials());

        let scheduler = Arc::new(TokioScheduler::new());
        let coordinator = Arc::new(UpdateCoordinator::new(
            client,
            store,
            scheduler.clone(),
            config.poll_interval,
        ));

        coordinator.first_refresh().await?;

        let shutdown = CancellationToken::new();
        let driver = tokio::spawn(drive(
            coordinator.clone(),
            scheduler.ticks(),
            shutdown.clone(),
        ));
        coordinator.start();

        let device = DeviceInfo::for_phone(&entry.phone_number);
        info!(
            phone = %masked_phone(&entry.phone_number),
            interval_secs = config.poll_interval.as_secs(),
            "Livly integration ready"
        );
        Ok(Self {
            sensor: PendingPackagesSensor::new(coordinator.clone(), device.clone()),
            switch: SyncSwitch::new(coordinator.clone(), device),
            coordinator,
            scheduler,
            shutdown,
            driver,
        })
    }

    pub fn coordinator(&self) -> &Arc<UpdateCoordinator> {
        &self.coordinator
    }

    pub fn sensor(&self) -> &PendingPackagesSensor {
        &self.sensor
    }

    pub fn switch(&self) -> &SyncSwitch {
        &self.switch
    }

    /// Receiver that changes whenever consumers should re-read their state.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.scheduler.subscribe()
    }

    /// Stop polling and release the coordinator.
    pub async fn unload(self) {
        self.coordinator.stop();
        self.shutdown.cancel();
        if let Err(err) = self.driver.await {
            warn!(error = %err, "Poll driver ended abnormally");
        }
        info!("Livly integration unloaded");
    }
}
