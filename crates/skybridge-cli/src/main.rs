//! `skybridge` – SkyBridge command line entry point.
//!
//! 1. Initialises logging (and OTLP export when configured).
//! 2. Loads `~/.skybridge/config.toml`, or the path given as the first
//!    argument, writing defaults on first run.
//! 3. Builds the [`Platform`] on a bus-backed simulator link and runs it
//!    until **Ctrl-C**, which stops the vehicle with a zero twist.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use skybridge_middleware::{BusLink, EventBus, Topic};
use skybridge_runtime::{Platform, PlatformStatus, init_tracing};
use skybridge_types::{BridgeError, EventPayload};

/// Capacity of the control-request channel.
const REQUEST_CAPACITY: usize = 16;

fn main() -> ExitCode {
    let _guard = init_tracing("skybridge");
    print_banner();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);
    let cfg = load_config(&path);
    if let Err(e) = cfg.validate() {
        println!("{}: {e}", "Config error".red());
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg)) {
        Ok(status) => {
            match serde_json::to_string(&status) {
                Ok(json) => info!(status = %json, "final platform status"),
                Err(e) => warn!(error = %e, "could not serialize final status"),
            }
            println!("{}", "  ✓ SkyBridge stopped.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "bridge failed");
            println!("{}: {e}", "Error".red());
            ExitCode::FAILURE
        }
    }
}

/// Load the config at `path`; on first run write the defaults there.
fn load_config(path: &Path) -> config::Config {
    match config::load_from(path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save_to(&cfg, path) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => println!("{}: {e}", "Error saving config".red()),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {e}", "Config error".red());
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

async fn run(cfg: config::Config) -> Result<PlatformStatus, BridgeError> {
    let bus = EventBus::default();
    let link = Arc::new(BusLink::new(bus.clone()));
    let platform = Platform::new(&cfg.platform_config(), bus.clone(), link)?;

    // ── Ctrl-C ────────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // Without a handler the shutdown sender would be dropped and the
    // platform would stop at once, so a failure here is fatal.
    ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – stopping the vehicle …".yellow().bold()
        );
        let _ = shutdown_tx.send(true);
    })
    .map_err(|e| BridgeError::Channel(format!("failed to install Ctrl-C handler: {e}")))?;

    // Transport adapters attach to these senders.
    let (_inbound_tx, inbound_rx) = mpsc::channel(cfg.inbound_capacity);
    let (_requests_tx, requests_rx) = mpsc::channel(REQUEST_CAPACITY);

    tokio::spawn(log_commands(bus.clone()));
    tokio::spawn(log_alerts(bus));

    println!(
        "  Bridging namespace {} every {} ms. Press {} to stop.\n",
        cfg.namespace.bold(),
        cfg.command_period_ms,
        "Ctrl-C".bold().cyan()
    );

    let platform = tokio::spawn(platform.run(inbound_rx, requests_rx, shutdown_rx))
        .await
        .map_err(|e| BridgeError::Channel(format!("platform task failed: {e}")))?;
    Ok(platform.status())
}

/// Trace every twist handed to the simulator.
async fn log_commands(bus: EventBus) {
    let mut rx = bus.subscribe_to(Topic::Commands);
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let EventPayload::Command(twist) = event.payload {
                    debug!(?twist, "command");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => debug!(skipped = n, "command log lagged"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Surface control-mode changes and faults on the console.
async fn log_alerts(bus: EventBus) {
    let mut rx = bus.subscribe_to(Topic::SystemAlerts);
    loop {
        match rx.recv().await {
            Ok(event) => match event.payload {
                EventPayload::ControlModeChanged(mode) => {
                    println!("  {} control mode {mode}", "→".cyan());
                }
                EventPayload::Fault { component, message } => {
                    println!("  {} [{component}] {message}", "!".red().bold());
                }
                _ => {}
            },
            Err(broadcast::error::RecvError::Lagged(n)) => warn!(skipped = n, "alert log lagged"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ______        ___      _     __         "#.bold().cyan());
    println!("{}", r#"  / __/ /____ __/ _ )____(_)__/ /__ ____ "#.bold().cyan());
    println!("{}", r#" _\ \/  '_/ // / _  / __/ / _  / _ `/ -_)"#.bold().cyan());
    println!("{}", r#"/___/_/\_\\_, /____/_/ /_/\_,_/\_, /\__/ "#.bold().cyan());
    println!("{}", r#"         /___/                /___/      "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "SkyBridge".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Simulator sensor bridge & command frame translator");
    println!();
}
