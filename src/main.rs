//! slservd - Straylight Services Daemon
//!
//! Links to a TS6 uplink as a services pseudo-server.

use slservd::config::{Config, LogFormat, validate};
use slservd::state::Matrix;
use slservd::{pseudoclient, uplink};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    match config.log.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        server = %config.server.name,
        sid = %config.server.sid,
        uplink = %config.uplink.address(),
        "Starting slservd"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let mut matrix = Matrix::new(config.server.identity(), tx);
    pseudoclient::register(&mut matrix, config.pseudoclient.clone());

    // The core is single-threaded; only the uplink socket needs a runtime.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(uplink::run(&mut matrix, &config.uplink, rx))?;

    Ok(())
}
