//! CLI entry point for Livly.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::login::DEFAULT_COUNTRY_CODE;
use crate::config::{minutes_to_interval, LivlyConfig};

/// Livly package notifier
#[derive(Parser, Debug)]
#[command(name = "livly", version, about = "Livly: pending package notifier")]
pub struct Cli {
    /// Directory holding the saved login (default: ~/.livly)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Minutes between automatic checks (default: 30)
    #[arg(long, global = true)]
    pub interval_minutes: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with a texted one-time code
    Login(LoginArgs),
    /// Show the saved login
    Status,
    /// Check pending packages once
    Check,
    /// Keep polling and print the count as it changes
    Watch(WatchArgs),
    /// Forget the saved login
    Logout,
}

/// Arguments for `livly login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Phone number without the country code; punctuation is ignored
    pub phone: String,

    /// Dial prefix
    #[arg(short, long, default_value = DEFAULT_COUNTRY_CODE)]
    pub country_code: String,

    /// Replace an existing login for the same number
    #[arg(long)]
    pub replace: bool,
}

/// Arguments for `livly watch`.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Start with automatic polling turned off
    #[arg(long)]
    pub paused: bool,
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    pub fn config(&self) -> LivlyConfig {
        let mut config = LivlyConfig::from_env();
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir.clone());
        }
        if let Some(minutes) = self.interval_minutes.filter(|m| *m > 0) {
            config = config.with_poll_interval(minutes_to_interval(minutes));
        }
        config
    }
}
