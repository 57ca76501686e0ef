// Placar entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (log to file, not terminal)
// 3. Load config
// 4. Create mpsc channels and the app state
// 5. Open the five SSE subscriptions
// 6. Spawn the app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use placar::app;
use placar::cli::Cli;
use placar::config;
use placar::feed::Subscriptions;
use placar::logs::HttpLogClient;
use placar::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let base_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to read working directory")?,
    };

    init_tracing(&base_dir)?;
    info!("Placar starting up");

    let mut config =
        config::load_config(Some(&base_dir)).context("failed to load configuration")?;
    if let Some(url) = &cli.base_url {
        config = config
            .with_base_url(url)
            .context("invalid --base-url")?;
    }
    info!(
        "Config loaded: base_url={}, tick={}ms",
        config.server.base_url, config.display.tick_millis
    );

    let (feed_tx, feed_rx) = mpsc::channel(256);
    let (log_tx, log_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let http = reqwest::Client::builder()
        .user_agent(concat!("placar/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let log_source = Arc::new(HttpLogClient::new(http.clone(), config.clone()));
    let app_state = app::AppState::new(config.clone(), log_source, log_tx);

    let mut subscriptions = Subscriptions::default();
    subscriptions.connect(&config, &http, feed_tx);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(feed_rx, log_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    info!("Application ready, {} channels subscribed", subscriptions.len());

    // Blocks until the user presses 'q' or Ctrl+C.
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {:#}", e);
    }

    subscriptions.close();

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Placar shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("placar.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("placar=info,placar_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
