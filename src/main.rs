use anyhow::{Context, Result};
use memory_bridge::config::{load_config, validate_config, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting memory-bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Architecture: {}", std::env::consts::ARCH);

    run(config).await
}

#[cfg(windows)]
async fn run(config: Config) -> Result<()> {
    use memory_bridge::bootstrap::bootstrap_pointer;
    use memory_bridge::inventory::{InventoryLayout, SignatureSearch};
    use memory_bridge::process::{attach, SystemProcesses, TARGET_PROCESS_PATTERN};
    use memory_bridge::{BridgeContext, BridgeError, CommandServer};
    use std::sync::Arc;
    use tracing::{error, warn};

    let source = SystemProcesses::default();
    let context = Arc::new(BridgeContext::new(InventoryLayout::from(&config.inventory)));

    info!("Waiting for {}...", TARGET_PROCESS_PATTERN);
    let target = loop {
        match attach(&source, TARGET_PROCESS_PATTERN) {
            Ok(target) => break target,
            Err(BridgeError::ProcessNotFound(_)) => {}
            Err(e) => warn!("Attach failed: {}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(config.target.attach_retry()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted while waiting for the target");
                return Ok(());
            }
        }
    };

    let session = context.attach(target);
    let search = SignatureSearch::from_config(&config.scanner)?;
    let pointer_file = config.inventory.pointer_file.clone();
    let bootstrap_session = Arc::clone(&session);
    let pointer = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        bootstrap_pointer(
            &bootstrap_session,
            search.as_ref(),
            &pointer_file,
            &mut input,
            &mut output,
        )
    })
    .await?
    .context("Failed to establish the inventory pointer")?;
    info!("Inventory pointer: {}", pointer);

    let mut server = CommandServer::new(Arc::clone(&context));
    if config.server.enabled {
        let addr = config.server.socket_addr()?;
        if let Err(e) = server.start_socket(addr, config.server.read_timeout()) {
            error!("Socket channel not started: {}", e);
        }
    }
    if config.file_channel.enabled {
        server.start_file_channel(
            config.file_channel.path.clone(),
            config.file_channel.poll_interval(),
        )?;
    }
    drop(session);

    info!("Bridge ready. Press Ctrl+C to shut down.");
    let mut liveness = tokio::time::interval(config.target.liveness_poll());
    loop {
        tokio::select! {
            _ = liveness.tick() => {
                let alive = context.session().map(|s| s.is_alive()).unwrap_or(false);
                if !alive {
                    info!("Target process exited");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    tokio::task::spawn_blocking(move || server.stop()).await?;
    context.detach();
    info!("memory-bridge stopped");
    Ok(())
}

#[cfg(not(windows))]
async fn run(_config: Config) -> Result<()> {
    anyhow::bail!("memory-bridge attaches to Windows processes only")
}
