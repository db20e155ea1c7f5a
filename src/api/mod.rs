//! Livly login service and resident API client.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

pub use client::LivlyClient;
pub use endpoints::Endpoints;
pub use error::ApiError;
pub use types::{Package, UserData};
