//! Livly resident-app integration.
//!
//! Logs in with an SMS one-time passcode, keeps the resulting token set
//! fresh, and polls the number of packages waiting at the leasing office.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use livly::config::LivlyConfig;
//! use livly::setup::Integration;
//!
//! # async fn example() -> livly::error::Result<()> {
//! let config = LivlyConfig::from_env();
//! let integration = Integration::setup(&config, Arc::new(config.file_store())).await?;
//! if let Some(count) = integration.sensor().native_value() {
//!     println!("{count} packages waiting");
//! }
//! integration.unload().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod setup;

#[cfg(feature = "cli")]
pub mod cli;
