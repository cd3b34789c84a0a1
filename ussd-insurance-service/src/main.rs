use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ussd_flow::{
    InMemoryLedger, InMemorySessionStorage, Ledgers, SessionStorage, spawn_session_sweeper,
};
use ussd_insurance_service::{AppState, LogFormat, ServiceConfig, build_router};

fn init_tracing(log_format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "ussd_insurance_service=debug,ussd_flow=debug,tower_http=debug".into()
    });

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format);

    info!(
        port = config.port,
        session_ttl_secs = config.session_ttl.num_seconds(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Starting USSD insurance service"
    );

    let ledger = Arc::new(InMemoryLedger::new());
    let sessions: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());

    let _sweeper = spawn_session_sweeper(
        sessions.clone(),
        config.sweep_interval,
        config.session_ttl,
    );

    let app = build_router(AppState::new(Ledgers::in_memory(ledger), sessions));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;
    info!("USSD gateway callback: POST http://{}/api/ussd", addr);
    info!("Health check endpoint: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
