//! Livly CLI binary entry point.

use clap::Parser;
use livly::cli::{commands, Cli, Commands};
use livly::error::{ErrorCategory, LivlyError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("livly=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let result = match &cli.command {
        Commands::Login(args) => commands::handle_login(&config, args).await,
        Commands::Status => commands::handle_status(&config).await,
        Commands::Check => commands::handle_check(&config).await,
        Commands::Watch(args) => commands::handle_watch(&config, args).await,
        Commands::Logout => commands::handle_logout(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(err) = e.downcast_ref::<LivlyError>() {
            if err.category() == ErrorCategory::Authentication {
                eprintln!("Run `livly login <phone>` to sign in again.");
            }
        }
        std::process::exit(1);
    }
}
