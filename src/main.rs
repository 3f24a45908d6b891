use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use textbook_export::api::{self, ApiState};
use textbook_export::browser::{BrowserTocDiscoverer, EngineManager, EngineSettings};
use textbook_export::services::SubsectionFetcher;
use textbook_export::transform::ContentTransformer;
use textbook_export::utils::logging;
use textbook_export::workflow::SubsectionFlow;
use textbook_export::{AllowList, BookExporter, ConcurrencyGovernor, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    logging::init(config.verbose_logging);

    // The allow-list is required; a bad style sheet stops startup
    let allow_list = Arc::new(
        AllowList::load(&config.stylesheet_path).context("failed to build attribute allow-list")?,
    );
    logging::log_startup(&config, allow_list.class_count(), allow_list.id_count());

    let engine = Arc::new(EngineManager::new(EngineSettings::from_config(&config)));
    let discoverer = Arc::new(BrowserTocDiscoverer::new(
        engine.clone(),
        config.toc.clone(),
        config.ui_wait_timeout(),
    ));
    let flow = Arc::new(SubsectionFlow::new(
        SubsectionFetcher::new(config.fetch_timeout())?,
        ContentTransformer::new(&config, allow_list)?,
    ));
    let governor = Arc::new(ConcurrencyGovernor::from_config(&config));
    let exporter = Arc::new(BookExporter::new(&config, discoverer, flow, governor)?);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    let state = ApiState::new(exporter, config.retry_after_secs);

    let served = api::serve(listener, state, shutdown_signal()).await;

    logging::log_shutdown();
    engine.release().await;
    served.context("server error")?;
    info!("bye");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
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
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
