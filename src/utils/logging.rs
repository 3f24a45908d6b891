//! Logging setup and banner helpers

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Installs the global subscriber. `RUST_LOG` wins over the configured default.
pub fn init(verbose: bool) {
    let default = if verbose {
        "info,textbook_export=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_startup(config: &Config, classes: usize, ids: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 textbook export service starting");
    info!(
        "📊 job gate: {}, subsection gate: {}",
        config.max_concurrent_jobs, config.max_concurrent_subsections
    );
    info!(
        "⏱️ fetch timeout: {}s, ui wait ceiling: {}s",
        config.fetch_timeout_secs, config.ui_wait_timeout_secs
    );
    info!(
        "🎨 allow-list from {}: {} classes, {} ids",
        config.stylesheet_path, classes, ids
    );
    info!("{}", "=".repeat(60));
}

pub fn log_job_start(slug: &str, url: &str) {
    info!("\n{}", "=".repeat(60));
    info!("[job {}] 📦 export started", slug);
    info!("[job {}] source: {}", slug, url);
    info!("{}", "=".repeat(60));
}

pub fn log_job_complete(slug: &str, parts: usize, subsections: usize, degraded: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "[job {}] ✅ export complete: {} parts, {} subsections",
        slug, parts, subsections
    );
    if degraded > 0 {
        info!("[job {}] ⚠️ {} subsections exported empty", slug, degraded);
    }
    info!(
        "completed at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

pub fn log_shutdown() {
    info!("{}", "=".repeat(60));
    info!("🛑 shutting down");
    info!("{}", "=".repeat(60));
}
