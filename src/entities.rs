//! Consumers of the coordinator snapshot: the package-count sensor and the sync switch.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::login::{entry_title, unique_id};
use crate::coordinator::UpdateCoordinator;

pub const MANUFACTURER: &str = "Livly";

/// Device both consumers are grouped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
}

impl DeviceInfo {
    pub fn for_phone(phone_number: &str) -> Self {
        Self {
            identifier: unique_id(phone_number),
            name: entry_title(phone_number),
            manufacturer: MANUFACTURER,
        }
    }
}

/// Number of packages waiting for pickup.
#[derive(Debug, Clone)]
pub struct PendingPackagesSensor {
    coordinator: Arc<UpdateCoordinator>,
    device: DeviceInfo,
}

impl PendingPackagesSensor {
    pub const NAME: &'static str = "Pending Packages";
    pub const ICON: &'static str = "mdi:package-variant";
    pub const STATE_CLASS: &'static str = "measurement";

    pub fn new(coordinator: Arc<UpdateCoordinator>, device: DeviceInfo) -> Self {
        Self { coordinator, device }
    }

    pub fn unique_id(&self) -> String {
        format!("{}_pending_packages", self.device.identifier)
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn available(&self) -> bool {
        self.coordinator.snapshot().last_update_success
    }

    /// `None` until the first result arrives.
    pub fn native_value(&self) -> Option<usize> {
        self.coordinator
            .data()
            .map(|result| result.pending_count)
    }

    /// `last_checked` (RFC 3339) once a fetch has succeeded.
    pub fn extra_state_attributes(&self) -> BTreeMap<&'static str, String> {
        let mut attrs = BTreeMap::new();
        if let Some(last) = self.coordinator.last_update_time() {
            attrs.insert("last_checked", last.to_rfc3339());
        }
        attrs
    }
}

/// Toggle for automatic polling.
#[derive(Debug, Clone)]
pub struct SyncSwitch {
    coordinator: Arc<UpdateCoordinator>,
    device: DeviceInfo,
}

impl SyncSwitch {
    pub const NAME: &'static str = "Sync Enabled";
    pub const ICON: &'static str = "mdi:sync";

    pub fn new(coordinator: Arc<UpdateCoordinator>, device: DeviceInfo) -> Self {
        Self { coordinator, device }
    }

    pub fn unique_id(&self) -> String {
        format!("{}_sync_enabled", self.device.identifier)
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn is_on(&self) -> bool {
        self.coordinator.sync_enabled()
    }

    pub async fn turn_on(&self) {
        self.coordinator.set_sync_enabled(true).await;
    }

    pub async fn turn_off(&self) {
        self.coordinator.set_sync_enabled(false).await;
    }
}
