//! skybridge-check - verify credentials without publishing
//!
//! Resolves every secret from the config, logs in to Bluesky, fetches
//! the newest post of the watched account, and verifies the X tokens
//! against `GET /2/users/me`. Nothing is published and the seen-set is
//! not touched. Secrets are only ever printed masked.

use clap::Parser;
use libskybridge::bridge::truncate_to_limit;
use libskybridge::config::{mask_secret, Config};
use libskybridge::platforms::bluesky::BlueskyFeed;
use libskybridge::platforms::oauth1::OAuthCredentials;
use libskybridge::platforms::x::{XSink, X_CHARACTER_LIMIT};
use libskybridge::platforms::SourceFeed;
use libskybridge::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "skybridge-check")]
#[command(version)]
#[command(about = "Verify skybridge credentials without publishing anything")]
#[command(long_about = "\
skybridge-check - verify credentials without publishing

DESCRIPTION:
    Dry-run companion to the skybridge daemon. Checks that the config
    file parses, that every secret resolves, that the Bluesky login and
    feed read work, and that the X tokens are accepted. No post is
    published and the seen-set is not touched.

USAGE:
    skybridge-check
    skybridge-check --config ./config.toml

EXIT CODES:
    0 - All credentials verified
    1 - Runtime or configuration error
    2 - One or both sides failed to authenticate
    3 - Invalid input
")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, value_name = "PATH", env = "SKYBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libskybridge::logging::init_default(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    println!("Configuration");
    println!("  database:        {}", config.database.path);
    println!("  bluesky handle:  {}", config.bluesky.handle);
    println!("  watched account: {}", config.bluesky.target_account);
    println!(
        "  app password:    {}",
        mask_secret(&config.bluesky.app_password()?)
    );
    println!("  x api key:       {}", mask_secret(&config.x.api_key()?));
    println!(
        "  x access token:  {}",
        mask_secret(&config.x.access_token()?)
    );
    println!();

    let bluesky_ok = check_bluesky(&config).await;
    let x_ok = check_x(&config).await?;

    println!();
    if bluesky_ok && x_ok {
        println!("All credentials verified.");
    } else {
        println!("One or both sides failed; see above.");
    }

    Ok(bluesky_ok && x_ok)
}

/// Log in and read the newest post, printing what the daemon would see.
async fn check_bluesky(config: &Config) -> bool {
    println!("Bluesky");

    let app_password = match config.bluesky.app_password() {
        Ok(password) => password,
        Err(e) => {
            println!("  FAIL: {}", e);
            return false;
        }
    };

    let feed = match BlueskyFeed::login(
        &config.bluesky.handle,
        &app_password,
        &config.bluesky.target_account,
    )
    .await
    {
        Ok(feed) => {
            println!("  login: ok");
            feed
        }
        Err(e) => {
            println!("  FAIL: {}", e);
            return false;
        }
    };

    match feed.fetch_latest().await {
        Ok(Some(candidate)) => {
            println!("  newest post: {}", candidate.source_id);
            if candidate.raw_text.is_empty() {
                println!("  text: (none, would be recorded without publishing)");
            } else {
                println!(
                    "  text: {}",
                    truncate_to_limit(&candidate.raw_text, X_CHARACTER_LIMIT)
                );
            }
            true
        }
        Ok(None) => {
            println!("  newest post: account has no posts");
            true
        }
        Err(e) => {
            println!("  FAIL reading the feed: {}", e);
            false
        }
    }
}

/// Verify the four X tokens; nothing is posted.
async fn check_x(config: &Config) -> Result<bool> {
    println!("X");

    let creds = OAuthCredentials {
        api_key: config.x.api_key()?,
        api_key_secret: config.x.api_key_secret()?,
        access_token: config.x.access_token()?,
        access_token_secret: config.x.access_token_secret()?,
    };

    let sink = XSink::new(creds)?;
    match sink.verify_credentials().await {
        Ok(()) => {
            println!("  tokens: ok");
            Ok(true)
        }
        Err(e) => {
            println!("  FAIL: {}", e);
            Ok(false)
        }
    }
}
