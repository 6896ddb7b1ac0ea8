//! Polymarket price-move tracker
//!
//! Polls the top markets by 24h volume and alerts on significant
//! YES-price moves.

use chrono::Utc;
use clap::{Parser, Subcommand};
use pm_tracker::{
    client::{GammaClient, RetryPolicy},
    config::Config,
    notify::Notifier,
    price::extract_yes_price,
    report::{ReportKind, ReportWriter},
    state::StateStore,
    tracker::{Tracker, TrackerConfig},
};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pm-tracker")]
#[command(about = "Polymarket YES-price move tracker with Telegram alerts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling loop
    Run {
        /// Polling interval in seconds (default 60)
        #[arg(long)]
        poll_seconds: Option<u64>,
        /// Number of top markets to track (default 50)
        #[arg(long)]
        top_n: Option<usize>,
        /// Minimum absolute YES-price change on the 0..1 scale (default 0.08)
        #[arg(long)]
        jump_threshold: Option<f64>,
        /// Per-market cooldown between alerts, seconds (default 300)
        #[arg(long)]
        cooldown_seconds: Option<u64>,
        /// Enable Telegram notifications
        #[arg(long)]
        notify: bool,
        /// Run a single cycle and exit (useful for CI)
        #[arg(long)]
        once: bool,
    },
    /// Write CSV snapshot reports (both kinds unless one is selected)
    Report {
        /// Only the top-by-24h-volume report
        #[arg(long)]
        top50: bool,
        /// Only the all-active-markets snapshot
        #[arg(long)]
        all_active: bool,
        /// Market limit per report
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output folder
        #[arg(long)]
        outdir: Option<String>,
    },
    /// Print the current top markets
    Markets {
        /// Number of top markets to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Send a test notification
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run {
            poll_seconds,
            top_n,
            jump_threshold,
            cooldown_seconds,
            notify,
            once,
        } => {
            run_tracker(
                config,
                RunOverrides {
                    poll_seconds,
                    top_n,
                    jump_threshold,
                    cooldown_seconds,
                    notify,
                    once,
                },
            )
            .await
        }
        Commands::Report {
            top50,
            all_active,
            limit,
            outdir,
        } => run_reports(config, top50, all_active, limit, outdir).await,
        Commands::Markets { limit } => show_markets(config, limit).await,
        Commands::TestNotify => test_notify(config).await,
    }
}

struct RunOverrides {
    poll_seconds: Option<u64>,
    top_n: Option<usize>,
    jump_threshold: Option<f64>,
    cooldown_seconds: Option<u64>,
    notify: bool,
    once: bool,
}

fn gamma_client(config: &Config) -> anyhow::Result<GammaClient> {
    let policy = RetryPolicy {
        max_retries: config.gamma.retries,
        backoff_base: Duration::from_millis(config.gamma.backoff_ms),
    };
    Ok(GammaClient::new(
        &config.gamma.base_url,
        policy,
        Duration::from_secs(config.gamma.timeout_secs),
    )?)
}

async fn run_tracker(config: Config, overrides: RunOverrides) -> anyhow::Result<()> {
    let tracker_config = TrackerConfig {
        poll_seconds: overrides.poll_seconds.unwrap_or(config.tracker.poll_seconds),
        top_n: overrides.top_n.unwrap_or(config.tracker.top_n),
        jump_threshold: overrides
            .jump_threshold
            .unwrap_or(config.tracker.jump_threshold),
        cooldown_seconds: overrides
            .cooldown_seconds
            .unwrap_or(config.tracker.cooldown_seconds),
        once: overrides.once,
    };

    let notify_enabled = overrides.notify || config.tracker.notify;
    let notifier = Notifier::from_parts(notify_enabled, config.telegram_credentials());
    if notify_enabled && !notifier.is_enabled() {
        tracing::warn!("notifications requested but Telegram credentials are missing");
    }

    // A bad state path is the one unrecoverable startup failure.
    let store = StateStore::new(&config.tracker.state_file)?;
    let client = gamma_client(&config)?;

    tracing::info!(
        poll_seconds = tracker_config.poll_seconds,
        top_n = tracker_config.top_n,
        jump_threshold = tracker_config.jump_threshold,
        cooldown_seconds = tracker_config.cooldown_seconds,
        once = tracker_config.once,
        "starting tracker"
    );

    let mut tracker = Tracker::new(client, store, notifier, tracker_config);
    tracker.run().await?;
    Ok(())
}

async fn run_reports(
    config: Config,
    top50: bool,
    all_active: bool,
    limit: Option<usize>,
    outdir: Option<String>,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(config.reports.limit);
    let outdir = outdir.unwrap_or_else(|| config.reports.outdir.clone());
    let client = gamma_client(&config)?;
    let writer = ReportWriter::new(&outdir);

    // With no selector, run both (matching the batch-report default).
    let run_top = top50 || !all_active;
    let run_all = all_active || !top50;

    if run_top {
        let markets = client.top_markets(limit).await?;
        let path = writer.write(ReportKind::TopByVolume, &markets, Utc::now())?;
        println!("Saved: {}", path.display());
    }

    if run_all {
        let markets = client.active_markets(limit).await?;
        let path = writer.write(ReportKind::AllActive, &markets, Utc::now())?;
        println!("Saved: {}", path.display());
    }

    println!("Done.");
    Ok(())
}

async fn show_markets(config: Config, limit: usize) -> anyhow::Result<()> {
    let client = gamma_client(&config)?;
    let markets = client.top_markets(limit).await?;

    for (i, market) in markets.iter().enumerate() {
        let yes = extract_yes_price(market)
            .map(|p| format!("{:.1}%", p * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:>3}. {}  YES {}  (24h vol {})",
            i + 1,
            market.question_text(),
            yes,
            market
                .volume_24hr()
                .map(|v| format!("${v:.0}"))
                .unwrap_or_else(|| "?".to_string()),
        );
    }
    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let notifier = Notifier::from_parts(true, config.telegram_credentials());
    if !notifier.is_enabled() {
        println!("⚠️ Missing TELEGRAM_TOKEN or TELEGRAM_CHAT_ID.");
        return Ok(());
    }
    match notifier.send("🔔 Test notification from pm-tracker.").await {
        Ok(()) => println!("Notification sent."),
        Err(e) => println!("Notification failed: {e}"),
    }
    Ok(())
}
