use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vigild::alert::{AlertSink, WebhookSink};
use vigild::baseline::BaselineStore;
use vigild::collectors::HostCollector;
use vigild::config::Config;
use vigild::daemon::{Daemon, PhaseCell};
use vigild::detectors;
use vigild::dispatcher::Dispatcher;
use vigild::history::EventHistory;
use vigild::metrics::Metrics;
use vigild::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "vigild",
    version,
    about = "Host health monitoring daemon with symbolic event classification"
)]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run exactly one poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Override the poll interval, in minutes
    #[arg(long)]
    interval_mins: Option<u64>,

    /// Override the status API listen address (e.g. 127.0.0.1:3900)
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        error!("[vigild] fatal: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(mins) = args.interval_mins {
        anyhow::ensure!(mins > 0, "--interval-mins must be > 0");
        cfg.poll_interval_mins = mins;
    }
    if let Some(listen) = args.listen {
        cfg.listen = Some(listen);
    }

    let metrics = Arc::new(Metrics::new());
    let history = Arc::new(EventHistory::new(
        cfg.history_capacity,
        cfg.journal_path.clone(),
    ));
    let phase = Arc::new(PhaseCell::default());

    let baseline = match &cfg.baseline_path {
        Some(path) => BaselineStore::with_path(path.clone()),
        None => BaselineStore::new(),
    };

    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    match &cfg.webhook_url {
        Some(url) => {
            sinks.push(Box::new(WebhookSink::new(
                url,
                Duration::from_secs(cfg.webhook_timeout_secs.max(1)),
            )?));
        }
        None => warn!("[vigild] no webhook configured; alerts go to the log only"),
    }

    let registry = detectors::default_registry(&cfg)?;
    let dispatcher = Dispatcher::new(
        registry,
        sinks,
        Arc::clone(&history),
        Arc::clone(&metrics),
    );

    if let Some(addr) = &cfg.listen {
        let listener = server::bind(addr).await?;
        let state = AppState {
            metrics: Arc::clone(&metrics),
            history: Arc::clone(&history),
            phase: Arc::clone(&phase),
        };
        tokio::spawn(async move {
            if let Err(err) = server::serve(listener, state).await {
                error!("[server] {:#}", err);
            }
        });
    }

    let mut daemon = Daemon::new(
        HostCollector::new(),
        dispatcher,
        baseline,
        Duration::from_secs(cfg.poll_interval_mins * 60),
        phase,
        metrics,
    );

    if args.once {
        let events = daemon.run_once().await;
        info!("[vigild] one-shot cycle complete: {} event(s)", events.len());
        return Ok(());
    }

    if let Err(err) = daemon.run().await {
        daemon.send_farewell(&format!("{err:#}")).await;
        return Err(err);
    }
    Ok(())
}
