//! LiveCoder controller
//!
//! Reads UI requirements from stdin, runs each through the full
//! generation-render-capture-evaluate pipeline, and prints the verdict.

use clap::Parser;
use livecoder_common::{ServiceKind, TEST_CASE_DELIMITER};
use livecoder_controller::health::Probe;
use livecoder_controller::view::BrowserSurface;
use livecoder_controller::{ControllerConfig, HealthMonitor, PipelineController, TestCaseStore};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "livecoder")]
#[command(about = "LiveCoder - LLM-driven UI generation and evaluation pipeline")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.livecoder/config.toml")]
    config: PathBuf,

    /// Artifact store base URL (overrides config)
    #[arg(long)]
    artifact_url: Option<String>,

    /// Generation backend base URL (overrides config)
    #[arg(long)]
    generation_url: Option<String>,

    /// Live preview base URL (overrides config)
    #[arg(long)]
    preview_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("LiveCoder controller v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ControllerConfig::load(&cli.config)?;
    if let Some(url) = cli.artifact_url {
        config.artifact_store.base_url = url;
    }
    if let Some(url) = cli.generation_url {
        config.generation.base_url = url;
    }
    if let Some(url) = cli.preview_url {
        config.preview.base_url = url;
    }

    // Health monitoring for both backends, started before any submission
    let mut probes: HashMap<ServiceKind, Arc<dyn Probe>> = HashMap::new();
    probes.insert(
        ServiceKind::Generation,
        Arc::new(livecoder_controller::services::GenerationClient::new(
            config.generation.base_url.clone(),
        )),
    );
    probes.insert(
        ServiceKind::ArtifactStore,
        Arc::new(livecoder_controller::artifact::ArtifactStoreClient::new(
            config.artifact_store.base_url.clone(),
        )),
    );
    let monitor = HealthMonitor::new(
        probes,
        config.timing.health_poll(),
        config.timing.retry_backoff(),
    );
    monitor.start();
    monitor.check_once(ServiceKind::Generation).await;
    monitor.check_once(ServiceKind::ArtifactStore).await;

    let surface = Arc::new(BrowserSurface::new(&config.preview)?);
    let store = Arc::new(parking_lot::RwLock::new(TestCaseStore::new()));
    let controller =
        PipelineController::new(config, monitor.clone(), store, surface);

    // Start the preview from the known placeholder component
    if let Err(e) = controller.reset_artifact().await {
        warn!("Could not reset artifact to placeholder: {}", e);
    }

    info!("Enter a UI requirement per line (Ctrl-C to exit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            line = lines.next_line() => {
                let Some(requirement) = line? else {
                    info!("Input closed");
                    break;
                };
                if requirement.trim().is_empty() {
                    continue;
                }
                match controller.submit(&requirement).await {
                    Ok(report) => {
                        println!("run {} completed in {}ms", report.run_id, report.duration_ms);
                        println!("checklist:");
                        for case in report.checklist.split(TEST_CASE_DELIMITER) {
                            println!("  - {case}");
                        }
                        println!("screenshot: {}", report.screenshot.path);
                        println!("verdict:\n{}", report.verdict);
                    }
                    Err(e) => {
                        error!("Pipeline run failed: {}", e);
                    }
                }
            }
        }
    }

    monitor.stop();
    info!("Controller shutdown complete");
    Ok(())
}
