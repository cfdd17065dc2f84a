use availability_monitor::config::args::{CliArgs, USAGE};
use availability_monitor::config::context::MonitorContext;
use availability_monitor::config::types::AppConfig;
use availability_monitor::membership::client::HttpCoordination;
use availability_monitor::membership::handlers::serve;
use availability_monitor::membership::memory::InMemoryCoordination;
use availability_monitor::membership::service::PeerRegistry;
use availability_monitor::membership::store::EntryStore;
use availability_monitor::orchestrator::service::run_monitor;
use availability_monitor::workers::probes::tcp_reachability;
use availability_monitor::workers::registry::ProbeRegistry;
use availability_monitor::workers::types::WorkerKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let argv: Vec<String> = std::env::args().collect();

    let args = match CliArgs::parse(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}", e);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    // 1. Properties:
    let config = AppConfig::load(&args.config_path)?;

    if let Some(addr) = args.serve_registry {
        return serve_registry(addr, &config).await;
    }

    // 2. Startup context:
    let ctx = Arc::new(MonitorContext::resolve(&args, config)?);

    let span = tracing::info_span!(
        "monitor",
        cluster = %ctx.cluster,
        host = %ctx.computer_name
    );

    start_monitor(ctx, args.registry_url.clone())
        .instrument(span)
        .await
}

async fn start_monitor(
    ctx: Arc<MonitorContext>,
    registry_url: Option<String>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Starting availability monitor for {} as {}",
        ctx.cluster,
        ctx.self_address
    );

    // 3. Probe workers:
    let probes = ProbeRegistry::new();
    for kind in WorkerKind::ALL {
        probes.register(
            kind,
            ctx.config.interval_for(kind),
            tcp_reachability(
                ctx.config.brokers.clone(),
                ctx.config.broker_connect_timeout(),
            ),
        );
    }

    // 4. Coordination service (properties win over the command line):
    match ctx.config.registry_url.clone().or(registry_url) {
        Some(url) => {
            let coordination = HttpCoordination::connect(&url, ctx.config.session_ttl()).await?;
            let registry = PeerRegistry::new(coordination, ctx.registration_path());
            run_monitor(ctx, registry, probes, shutdown_signal()).await
        }
        None => {
            tracing::warn!("No registry configured, peers are limited to this process");
            let registry =
                PeerRegistry::new(InMemoryCoordination::standalone(), ctx.registration_path());
            run_monitor(ctx, registry, probes, shutdown_signal()).await
        }
    }
}

async fn serve_registry(addr: SocketAddr, config: &AppConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let store = EntryStore::new(config.session_ttl());

    tokio::select! {
        served = serve(listener, store) => served,
        _ = shutdown_signal() => {
            tracing::info!("Coordination service shutting down");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
