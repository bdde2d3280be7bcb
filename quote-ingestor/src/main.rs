use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use analytics::PipelineConfig;
use clap::Parser;
use ingestor::backend::{csv_file_name, BackendClient};
use ingestor::config::{Cli, Command, Settings};
use ingestor::control::{self, Control};
use ingestor::error::IngestorError;
use ingestor::fetcher::ResilientFetcher;
use ingestor::metrics;
use ingestor::pipeline::QuotePipeline;
use ingestor::scheduler::spawn_scheduler;
use ingestor::sink::{self, DynSink};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, watch};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    // logger; stdout is reserved for the board
    let level = settings.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Some(addr) = &settings.metrics_addr {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| IngestorError::Other(format!("invalid metrics_addr {addr}: {e}")))?;
        tokio::spawn(metrics::serve(addr));
    }

    let fetcher = ResilientFetcher::from_settings(&settings)?;
    tracing::info!(endpoints = ?fetcher.endpoints(), "backend endpoints");
    let client = BackendClient::new(fetcher, settings.fallback_cache);
    let cfg = settings.pipeline_config();

    match cli.command.clone().unwrap_or(Command::Watch) {
        Command::Watch => {
            let sink = sink::from_settings(&settings).await?;
            watch_board(client, cfg, sink).await?;
        }
        Command::Once => {
            let sink = sink::from_settings(&settings).await?;
            let pipeline = QuotePipeline::new(client);
            pipeline.refresh(cfg.market, cfg.tab).await;
            sink.publish(&pipeline.view(&cfg).await).await?;
        }
        Command::Start => {
            let resp = client
                .start_automation(cfg.market, cfg.interval_min())
                .await?;
            if !resp.ok {
                return Err(IngestorError::Backend {
                    operation: "start",
                    message: resp.message.unwrap_or_default(),
                }
                .into());
            }
            tracing::info!(
                market = %cfg.market,
                interval_min = resp.interval_min.unwrap_or(cfg.interval_min()),
                message = resp.message.as_deref().unwrap_or(""),
                "automation started"
            );
        }
        Command::Export => {
            let resp = client
                .export_oracle(cfg.market, cfg.tab.only_base())
                .await?;
            if !resp.ok {
                return Err(IngestorError::Backend {
                    operation: "export",
                    message: resp.error.unwrap_or_default(),
                }
                .into());
            }
            tracing::info!(
                market = %cfg.market,
                exported = resp.exported.unwrap_or(0),
                "quotes exported"
            );
        }
        Command::Csv { out } => {
            let bytes = client
                .download_csv(cfg.market, cfg.tab.only_base())
                .await?;
            let path = out.unwrap_or_else(|| PathBuf::from(csv_file_name(cfg.market)));
            tokio::fs::write(&path, &bytes).await?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "csv written");
        }
    }

    Ok(())
}

/// Keep the board refreshed until stdin says `quit` or Ctrl+C arrives.
async fn watch_board(
    client: BackendClient,
    cfg: PipelineConfig,
    sink: DynSink,
) -> Result<(), IngestorError> {
    let pipeline = Arc::new(QuotePipeline::new(client));
    let (cfg_tx, cfg_rx) = watch::channel(cfg);
    let (trigger_tx, trigger_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (views_tx, mut views_rx) = mpsc::channel(16);
    let scheduler = spawn_scheduler(pipeline, cfg_rx, trigger_rx, shutdown_rx, views_tx);

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            Some(view) = views_rx.recv() => {
                if let Err(e) = sink.publish(&view).await {
                    tracing::error!(error = %e, "failed to publish view");
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let cmd = control::parse(&cfg_tx.borrow(), &line);
                    match cmd {
                        Control::Refresh => {
                            // a refresh already queued covers this one
                            let _ = trigger_tx.try_send(());
                        }
                        Control::Update(next) => {
                            let _ = cfg_tx.send(next);
                        }
                        Control::Quit => break,
                        Control::Unknown(input) => {
                            tracing::warn!(%input, "unknown command");
                        }
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin unreadable; commands disabled");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down…");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = scheduler.await;
    Ok(())
}
