//! stereo-link - telepresence client daemon
//!
//! Connects to the stereo video server, streams a fixed head orientation and
//! logs (optionally dumps) received frames until Ctrl-C.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stereo_link::{AppConfig, Error, Result};

/// Config file looked for in the working directory
const DEFAULT_CONFIG_PATH: &str = "stereo-link.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `stereo-link <path>` (positional)
/// - `stereo-link --config <path>` / `-c <path>`
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn load_config() -> Result<AppConfig> {
    match parse_config_path() {
        Some(path) => AppConfig::from_file(&path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(AppConfig::default()),
    }
}

fn main() -> Result<()> {
    let config = load_config()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("stereo-link v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Server: {:?}", config.server);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    match stereo_link::host::run(&config, &running) {
        Ok(()) => {
            log::info!("stereo-link stopped");
            Ok(())
        }
        Err(e) => {
            log::error!("Fatal error: {}", e);
            Err(e)
        }
    }
}
