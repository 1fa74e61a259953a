//! skybridge - daemon mirroring the newest Bluesky post to X
//!
//! Polls the watched Bluesky account on a fixed interval and republishes
//! each unseen post's text to X exactly once, with an optional HTTP
//! status surface for dashboards, health probes and manual triggers.

use clap::Parser;
use libskybridge::bridge::Bridge;
use libskybridge::config::{mask_secret, Config};
use libskybridge::platforms::bluesky::BlueskyFeed;
use libskybridge::platforms::oauth1::OAuthCredentials;
use libskybridge::platforms::x::XSink;
use libskybridge::platforms::{SinkPublisher, SourceFeed};
use libskybridge::{BridgeError, Result, SeenStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "skybridge")]
#[command(version)]
#[command(about = "Mirror the newest post of a Bluesky account to X")]
#[command(long_about = "\
skybridge - mirror the newest post of a Bluesky account to X

DESCRIPTION:
    skybridge is a long-running daemon that polls one Bluesky account at
    a fixed interval and republishes each unseen post's text to X. A
    SQLite seen-set guarantees every post is mirrored at most once, even
    across restarts.

    An optional HTTP surface exposes a dashboard of mirrored posts, a
    health probe, and a manual trigger endpoint.

USAGE:
    # Run in foreground (logs to stderr)
    skybridge

    # Run with a custom poll interval
    skybridge --poll-interval 300

    # Run one tick and exit
    skybridge --once

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current tick)

CONFIGURATION:
    Configuration file: ~/.config/skybridge/config.toml
    (override with SKYBRIDGE_CONFIG)

    Credentials live in the config file, inline or via *_file
    indirection. They are never baked into the binary.

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Authentication error
    3 - Invalid input
")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, value_name = "PATH", env = "SKYBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run one tick and exit (for testing)
    #[arg(long, hide = true)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libskybridge::logging::init_default(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let store = SeenStore::open(&config.database.path).await?;
    info!(
        "Seen-set opened at {} ({} posts recorded)",
        config.database.path,
        store.count().await?
    );

    let source = connect_source(&config).await?;
    let sink = connect_sink(&config).await?;

    if source.is_none() && sink.is_none() {
        return Err(BridgeError::InvalidInput(
            "neither the Bluesky source nor the X sink authenticated; check the credentials"
                .to_string(),
        ));
    }

    let bridge = Arc::new(Bridge::new(store, source, sink));

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    if cli.once {
        bridge.run_tick().await;
        return Ok(());
    }

    if config.http.enabled {
        serve_http(bridge.clone(), &config.http.bind).await?;
    }

    let poll_interval = cli.poll_interval.unwrap_or(config.poll.interval_secs);
    info!(
        "Watching {} every {}s",
        config.bluesky.target_account, poll_interval
    );

    run_poll_loop(&bridge, poll_interval, shutdown).await;

    info!("skybridge stopped");
    Ok(())
}

/// Log in to Bluesky. An authentication failure degrades to a missing
/// source instead of aborting, so the HTTP surface stays up for
/// diagnosis; config errors (absent secrets) still abort.
async fn connect_source(config: &Config) -> Result<Option<Arc<dyn SourceFeed>>> {
    let app_password = config.bluesky.app_password()?;

    match BlueskyFeed::login(
        &config.bluesky.handle,
        &app_password,
        &config.bluesky.target_account,
    )
    .await
    {
        Ok(feed) => {
            info!(
                "Bluesky session created as {} (app password {})",
                config.bluesky.handle,
                mask_secret(&app_password)
            );
            Ok(Some(Arc::new(feed)))
        }
        Err(e) => {
            error!("Bluesky login failed, running without a source: {}", e);
            Ok(None)
        }
    }
}

/// Build and verify the X sink, degrading like the source side.
async fn connect_sink(config: &Config) -> Result<Option<Arc<dyn SinkPublisher>>> {
    let creds = OAuthCredentials {
        api_key: config.x.api_key()?,
        api_key_secret: config.x.api_key_secret()?,
        access_token: config.x.access_token()?,
        access_token_secret: config.x.access_token_secret()?,
    };

    let sink = XSink::new(creds)?;
    match sink.verify_credentials().await {
        Ok(()) => {
            info!(
                "X credentials verified (api key {})",
                mask_secret(&config.x.api_key()?)
            );
            Ok(Some(Arc::new(sink)))
        }
        Err(e) => {
            error!(
                "X credential verification failed, running without a sink: {}",
                e
            );
            Ok(None)
        }
    }
}

fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])
        .map_err(|e| BridgeError::InvalidInput(format!("Signal setup failed: {}", e)))?;

    let shutdown_clone = shutdown.clone();
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown_clone.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}

/// Bind the status surface and serve it in the background.
async fn serve_http(bridge: Arc<Bridge>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| BridgeError::InvalidInput(format!("Failed to bind {}: {}", bind, e)))?;

    info!("Status surface listening on http://{}", bind);

    let app = libskybridge::http::router(bridge);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Status surface stopped: {}", e);
        }
    });

    Ok(())
}

/// One tick per interval. A tick never aborts the loop; its outcome is
/// logged inside the bridge. The sleep runs in one-second slices so
/// shutdown stays responsive.
async fn run_poll_loop(bridge: &Bridge, poll_interval: u64, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping poll loop");
            break;
        }

        bridge.run_tick().await;

        for _ in 0..poll_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}
