use geojson_server::admin::server::AdminChannel;
use geojson_server::config::loader::CliArgs;
use geojson_server::config::types::Config;
use geojson_server::query::handlers::routes;
use geojson_server::registry::registry::ServiceRegistry;
use geojson_server::shutdown::coordinator::ShutdownCoordinator;
use geojson_server::shutdown::fault::install_panic_hook;
use geojson_server::shutdown::types::ShutdownTrigger;
use geojson_server::stats::usage::UsageStatistics;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (fault_tx, mut fault_rx) = mpsc::unbounded_channel::<String>();
    install_panic_hook(fault_tx.clone());

    // 1. Configuration:
    let args = CliArgs::parse(std::env::args())?;
    let config_path = args.config_path();
    let config = Config::load_or_init(&config_path)?.apply_overrides(&args);
    let services = config.service_configs()?;
    tracing::info!(
        "Loaded {} services from {}",
        services.len(),
        config_path.display()
    );

    // 2. Statistics and registry:
    let stats = UsageStatistics::open(&config.statistics.file);
    let registry = ServiceRegistry::new(services, &config.storage.dir, stats.clone());

    match registry.purge_stale_stores() {
        Ok(0) => {}
        Ok(n) => tracing::info!("Purged {} stale databases", n),
        Err(e) => tracing::warn!("Failed to purge stale databases: {}", e),
    }
    for service in registry.service_names() {
        drop(registry.reload(&service));
    }

    let coordinator = ShutdownCoordinator::new(Duration::from_secs(
        config.shutdown.drain_timeout_secs,
    ));

    // 3. HTTP server:
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let app = routes(registry.clone());
    let http_stop = coordinator.subscribe();
    let http_faults = fault_tx.clone();
    let http = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(stopped(http_stop))
            .await;
        if let Err(e) = result {
            tracing::error!("HTTP server failed: {}", e);
            let _ = http_faults.send(format!("HTTP server failed: {}", e));
        }
    });

    // 4. Admin socket:
    let admin = AdminChannel::bind(&config.localsocket.file, registry.clone())?;
    let admin = tokio::spawn(admin.serve(coordinator.subscribe()));

    // 5. Statistics flusher:
    let flusher = stats.spawn_flusher(coordinator.subscribe());

    // 6. Wait for a shutdown trigger:
    let mut sigterm = signal(SignalKind::terminate())?;
    let trigger = tokio::select! {
        _ = tokio::signal::ctrl_c() => ShutdownTrigger::Interrupt,
        _ = sigterm.recv() => ShutdownTrigger::Terminate,
        Some(reason) = fault_rx.recv() => {
            tracing::error!("Uncaught fault: {}", reason);
            ShutdownTrigger::Fault(reason)
        }
    };

    let second_signal = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let status = coordinator
        .shutdown(trigger, registry, vec![http, admin], second_signal)
        .await;

    if let Err(e) = flusher.await {
        tracing::warn!("Statistics flusher ended abnormally: {}", e);
    }
    if let Err(e) = stats.flush().await {
        tracing::warn!("Failed to save statistics: {:#}", e);
    }

    std::process::exit(status.code());
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    while !*stop.borrow() {
        if stop.changed().await.is_err() {
            return;
        }
    }
}
