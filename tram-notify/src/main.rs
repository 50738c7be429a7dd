use std::error::Error;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

use tram_notify::bot::{Bot, EventDispatcher};
use tram_notify::cache::{CacheConfig, CachedPositionSource};
use tram_notify::config::AppConfig;
use tram_notify::driver::{Poller, spawn_daily_jobs};
use tram_notify::line::{LineClient, LineConfig, Messenger, RecordingMessenger};
use tram_notify::notify::{Notifier, NotifyConfig};
use tram_notify::store::{MemoryStore, PostgrestStore, Store};
use tram_notify::topology::Topology;
use tram_notify::tram::{MockTramSource, PositionSource, TramClient, TramConfig};
use tram_notify::web::{AppState, create_router};

/// Webhook batches waiting for the event worker.
const EVENT_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    init_logger();
    if let Err(e) = run().await {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|e| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            e,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    let topology = Arc::new(Topology::builtin()?);
    info!(stations = topology.stations().len(), "loaded network");

    let store: Arc<dyn Store> = match config.store.clone() {
        Some(postgrest) => {
            info!(url = %postgrest.url, "using Supabase store");
            Arc::new(PostgrestStore::new(postgrest)?)
        }
        None => {
            warn!("SUPABASE_URL not set, using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let messenger: Arc<dyn Messenger> = match (&config.line_token, config.dry_run) {
        (Some(token), false) => Arc::new(LineClient::new(LineConfig::new(token.clone()))?),
        _ => {
            warn!("LINE dry run: messages are logged, not sent");
            Arc::new(RecordingMessenger::new())
        }
    };

    let source: Arc<dyn PositionSource> = match &config.tram_mock_file {
        Some(path) => {
            warn!(path = %path.display(), "serving tram positions from snapshot file");
            Arc::new(MockTramSource::from_file(path)?)
        }
        None => {
            let mut tram_config = TramConfig::new();
            if let Some(url) = &config.tram_api_url {
                tram_config = tram_config.with_base_url(url.clone());
            }
            Arc::new(TramClient::new(tram_config)?)
        }
    };
    let cached = Arc::new(CachedPositionSource::new(
        source.clone(),
        &CacheConfig::default(),
    ));

    let notifier = Notifier::new(
        topology.clone(),
        store.clone(),
        messenger.clone(),
        NotifyConfig::default(),
    );
    let poller = Poller::new(source, notifier, config.operating_hours, config.timezone);

    let bot = Bot::new(topology, store, messenger, cached).with_morning_time(config.morning_time);
    let (dispatcher, worker) = EventDispatcher::spawn(bot, EVENT_QUEUE_CAPACITY);

    if config.polling_enabled {
        poller.start(config.poll_interval).await;
    } else {
        info!("background polling disabled; use /cron/poll");
    }
    let mut daily = spawn_daily_jobs(poller.clone(), config.morning_time);

    let state = AppState::new(
        dispatcher,
        poller.clone(),
        &config.channel_secret,
        config.cron_secret.as_deref(),
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        hours = %config.operating_hours,
        timezone = config.timezone.name(),
        "tram notifier listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    poller.stop().await;
    daily.shutdown().await;
    // The router held the last dispatcher handle; queued events drain first
    if let Err(e) = worker.await {
        error!(error = %e, "event worker ended abnormally");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
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
