//! SMS login, in-memory credentials and the durable configuration entry.

pub mod credentials;
pub mod error;
pub mod login;
pub mod store;

pub use credentials::{CredentialSet, TokenBundle};
pub use error::{AuthError, StoreError};
pub use login::{LoginError, LoginFlow};
pub use store::{ConfigStore, CredentialField, CredentialUpdate, FileConfigStore, PersistedConfig};
