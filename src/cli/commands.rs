//! CLI command handlers.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::{LoginArgs, WatchArgs};
use crate::api::LivlyClient;
use crate::auth::login::{ensure_not_configured, entry_title, masked_phone, normalize_phone};
use crate::auth::{ConfigStore, LoginFlow};
use crate::config::LivlyConfig;
use crate::setup::Integration;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Handle `livly login <phone>`.
pub async fn handle_login(config: &LivlyConfig, args: &LoginArgs) -> CliResult {
    let store = config.file_store();
    if !args.replace {
        let phone_number = normalize_phone(&args.country_code, &args.phone)?;
        ensure_not_configured(&store, &phone_number)?;
    }

    let mut flow = LoginFlow::new(LivlyClient::from_config(config));
    flow.start(&args.country_code, &args.phone).await?;
    let masked = flow.phone_number().map(masked_phone).unwrap_or_default();
    println!("📱 Code sent to {masked}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("🔑 Enter the 6-digit code: ");
        std::io::stdout().flush()?;
        let Some(code) = lines.next_line().await? else {
            return Err("no code entered".into());
        };
        match flow.verify(&code).await {
            Ok(entry) => {
                store.save(&entry)?;
                println!("✅ Logged in as {}", entry_title(&entry.phone_number));
                return Ok(());
            }
            Err(crate::auth::LoginError::InvalidOtpFormat) => {
                eprintln!("❌ The code is exactly 6 digits, try again");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Handle `livly status`.
pub async fn handle_status(config: &LivlyConfig) -> CliResult {
    let store = config.file_store();
    let Some(entry) = store.load()? else {
        println!("Not logged in (run `livly login <phone>`)");
        return Ok(());
    };
    let credentials = entry.credentials();
    println!("{}", entry_title(&entry.phone_number));
    match entry.user_id {
        Some(user_id) => println!("  User id:       {user_id}"),
        None => println!("  User id:       unknown"),
    }
    match credentials.expires_at_utc() {
        Some(at) if credentials.is_authenticated() => {
            println!("  Token expires: {}", at.to_rfc3339())
        }
        _ => println!("  Token expires: unknown"),
    }
    println!("  Config file:   {}", store.path().display());
    Ok(())
}

/// Handle `livly check`.
pub async fn handle_check(config: &LivlyConfig) -> CliResult {
    let integration = Integration::setup(config, Arc::new(config.file_store())).await?;
    print_sensor(&integration);
    integration.unload().await;
    Ok(())
}

/// Handle `livly watch`.
pub async fn handle_watch(config: &LivlyConfig, args: &WatchArgs) -> CliResult {
    let integration = Integration::setup(config, Arc::new(config.file_store())).await?;
    if args.paused {
        integration.switch().turn_off().await;
    }
    print_sensor(&integration);
    eprintln!("Commands: on | off | refresh | quit");

    let mut updates = integration.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_sensor(&integration);
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match line.trim() {
                    "on" => integration.switch().turn_on().await,
                    "off" => integration.switch().turn_off().await,
                    "refresh" => integration.coordinator().request_refresh().await,
                    "quit" | "exit" => break,
                    "" => {}
                    other => eprintln!("Unknown command: {other}"),
                }
            }
        }
    }

    integration.unload().await;
    Ok(())
}

/// Handle `livly logout`.
pub async fn handle_logout(config: &LivlyConfig) -> CliResult {
    config.file_store().clear()?;
    println!("✅ Logged out");
    Ok(())
}

fn print_sensor(integration: &Integration) {
    let sensor = integration.sensor();
    let sync = if integration.switch().is_on() { "on" } else { "off" };
    let count = match (sensor.available(), sensor.native_value()) {
        (true, Some(count)) => count.to_string(),
        _ => "unavailable".to_string(),
    };
    let checked = sensor
        .extra_state_attributes()
        .get("last_checked")
        .cloned()
        .unwrap_or_else(|| "never".to_string());
    println!("📦 {}: {count} (sync {sync}, last checked {checked})", sensor.device_info().name);
}
