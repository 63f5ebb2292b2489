//! MarketSync CLI and collector binary
//!
//! Entry point for the collector. Wires the fetcher, synchronizer,
//! streaming client, and health endpoint together and runs them under a
//! single shutdown controller.

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use common::Symbol;
use config::{generate_default_config, load_config, save_config, validate_config, CollectorConfig};
use fetcher::FetchClient;
use ingest::Synchronizer;
use observability::{init_logging, LogFormat};
use server::{
    health_routes, ComponentStatus, HealthState, HttpServer, Server, ShutdownController,
};
use session::SessionGate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::{InMemoryMarketStore, MarketStore};
use stream::{LogAlertSink, StoreSink, StreamClient, StreamState, WsConnector};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start {
            config,
            force_open,
            port,
        } => start_command(config, force_open, port).await,
        Commands::Sync {
            config,
            force_open,
            symbols,
        } => sync_command(config, force_open, symbols).await,
        Commands::Stream { config } => stream_command(config).await,
        Commands::Validate { config } => validate_command(config).await,
        Commands::Init { output } => init_command(output).await,
    }
}

/// Everything the long-running commands share
struct Runtime {
    config: CollectorConfig,
    gate: Arc<SessionGate>,
    store: Arc<dyn MarketStore>,
    fetcher: Arc<FetchClient>,
}

async fn build_runtime<P: AsRef<Path>>(config_path: P, force_open: bool) -> Result<Runtime> {
    let config = load_config(config_path)?;
    let report = validate_config(&config);

    let format = config
        .service
        .log_format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Pretty);
    init_logging(&config.service.name, format)?;

    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start collector due to configuration errors");
    }

    let gate = Arc::new(SessionGate::us_equity(
        config.session.force_open || force_open,
    ));
    if gate.is_forced_open() {
        warn!("session gate forced open, calendar checks are bypassed");
    }

    let store = build_store(&config).await?;
    let fetcher = Arc::new(FetchClient::new(
        &config.provider,
        &config.fetcher,
        gate.clone(),
    )?);

    Ok(Runtime {
        config,
        gate,
        store,
        fetcher,
    })
}

async fn build_store(config: &CollectorConfig) -> Result<Arc<dyn MarketStore>> {
    if let Some(db) = &config.database {
        #[cfg(feature = "postgres")]
        {
            info!("Connecting to postgres store");
            let store = store::PostgresMarketStore::connect(&db.url).await?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = db;
            warn!("Database configured but binary built without postgres support, using in-memory store");
        }
    }
    info!("Using in-memory store");
    Ok(Arc::new(InMemoryMarketStore::new()))
}

fn configured_symbols(config: &CollectorConfig) -> Vec<Symbol> {
    config.sync.symbols.iter().map(Symbol::new).collect()
}

async fn start_command(config_path: PathBuf, force_open: bool, port: Option<u16>) -> Result<()> {
    let rt = build_runtime(&config_path, force_open).await?;
    let config = rt.config.clone();
    let symbols = configured_symbols(&config);

    info!(
        symbols = symbols.len(),
        interval_secs = config.sync.interval_secs,
        stream_enabled = config.stream.enabled,
        "Starting collector"
    );

    let shutdown = ShutdownController::with_ctrl_c();
    let health = Arc::new(HealthState::new(&config.service.name));

    // Health endpoint
    let http = HttpServer::new(
        server::ServerConfig::new(&config.server.host, port.unwrap_or(config.server.port)),
        health_routes(health.clone()),
    );
    let http_token = shutdown.child_token();
    let http_handle = tokio::spawn(async move { http.run(http_token).await });

    // Scheduled sync loop
    let synchronizer = Synchronizer::new(
        rt.fetcher.clone(),
        rt.store.clone(),
        rt.gate.clone(),
        config.sync.clone(),
    );
    let sync_token = shutdown.child_token();
    let sync_health = health.clone();
    let sync_symbols = symbols.clone();
    let sync_interval = Duration::from_secs(config.sync.interval_secs);
    let sync_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sync_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = sync_token.cancelled() => break,
                _ = ticker.tick() => {
                    let summary = synchronizer.run_pass(&sync_symbols).await;
                    sync_health
                        .update_component(ComponentStatus {
                            component: "sync".to_string(),
                            healthy: summary.failed == 0,
                            detail: Some(format!(
                                "{} synced, {} failed",
                                summary.synced, summary.failed
                            )),
                        })
                        .await;
                }
            }
        }
    });

    // Streaming client
    let stream_handle = if config.stream.enabled {
        let client = StreamClient::new(
            Box::new(WsConnector),
            Arc::new(StoreSink::new(rt.store.clone())),
            Arc::new(LogAlertSink),
            &config.provider,
            &config.stream,
            &symbols,
        );

        // Mirror stream transitions into the health state
        let mut status = client.subscribe();
        let stream_health = health.clone();
        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let current = *status.borrow();
                stream_health
                    .update_component(ComponentStatus {
                        component: "stream".to_string(),
                        healthy: current.state == StreamState::Subscribed,
                        detail: Some(format!("{:?} on {} feed", current.state, current.tier)),
                    })
                    .await;
            }
        });

        let stream_token = shutdown.child_token();
        Some(tokio::spawn(async move { client.run(stream_token).await }))
    } else {
        None
    };

    shutdown.wait_for_shutdown().await;
    info!("Shutting down collector");

    let _ = sync_handle.await;
    if let Some(handle) = stream_handle {
        match handle.await {
            Ok(Err(e)) => error!(%e, "Stream client exited with error"),
            Err(e) => error!(%e, "Stream task panicked"),
            _ => {}
        }
    }
    match http_handle.await {
        Ok(Err(e)) => error!(%e, "HTTP server exited with error"),
        Err(e) => error!(%e, "HTTP server task panicked"),
        _ => {}
    }

    info!("Collector shutdown complete");
    Ok(())
}

async fn sync_command(
    config_path: PathBuf,
    force_open: bool,
    symbol_overrides: Vec<String>,
) -> Result<()> {
    let rt = build_runtime(&config_path, force_open).await?;

    let symbols: Vec<Symbol> = if symbol_overrides.is_empty() {
        configured_symbols(&rt.config)
    } else {
        symbol_overrides.iter().map(Symbol::new).collect()
    };
    if symbols.is_empty() {
        anyhow::bail!("No symbols to sync; configure sync.symbols or pass --symbols");
    }

    let synchronizer = Synchronizer::new(
        rt.fetcher.clone(),
        rt.store.clone(),
        rt.gate.clone(),
        rt.config.sync.clone(),
    );
    let summary = synchronizer.run_pass(&symbols).await;

    println!(
        "Sync pass complete: {} synced, {} failed",
        summary.synced, summary.failed
    );
    if summary.failed > 0 {
        anyhow::bail!("{} symbols failed to sync", summary.failed);
    }
    Ok(())
}

async fn stream_command(config_path: PathBuf) -> Result<()> {
    let rt = build_runtime(&config_path, false).await?;
    let symbols = configured_symbols(&rt.config);
    if symbols.is_empty() {
        anyhow::bail!("No symbols to stream; configure sync.symbols");
    }

    let client = StreamClient::new(
        Box::new(WsConnector),
        Arc::new(StoreSink::new(rt.store.clone())),
        Arc::new(LogAlertSink),
        &rt.config.provider,
        &rt.config.stream,
        &symbols,
    );

    let shutdown = ShutdownController::with_ctrl_c();
    client
        .run(shutdown.token())
        .await
        .context("stream client stopped")?;
    Ok(())
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {}", config.service.name);
    println!("Provider: {}", config.provider.base_url);
    println!("Symbols: {}", config.sync.symbols.len());
    println!(
        "Streaming: {} ({} tier)",
        if config.stream.enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.stream.tier
    );
    println!(
        "Store: {}",
        if config.database.is_some() {
            "postgres"
        } else {
            "in-memory"
        }
    );

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Set the POLYGON_API_KEY environment variable");
    println!("  2. Edit the file to pick your symbols and streaming tier");
    println!(
        "  3. Run 'marketsync validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  4. Run 'marketsync start --config {:?}' to start the collector",
        output_path
    );

    Ok(())
}
