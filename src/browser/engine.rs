//! Process-wide rendering engine.
//!
//! The engine is launched lazily by the first [`EngineManager::acquire`] and
//! shared by every later job. Concurrent callers during startup await the same
//! in-flight launch.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chromiumoxide::cdp::browser_protocol::browser::CloseParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::BrowserError;

type LaunchResult<T> = Result<Arc<T>, String>;
type LaunchFuture<T> = Shared<BoxFuture<'static, LaunchResult<T>>>;

/// Memoizes one in-flight or finished launch of `T`.
///
/// A failed launch is forgotten so the next caller starts a fresh one.
pub struct LaunchSlot<T> {
    slot: Mutex<Option<LaunchFuture<T>>>,
}

impl<T: Send + Sync + 'static> LaunchSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Returns the memoized value, starting `launch` only when nothing is memoized
    pub async fn get_or_launch<F, Fut>(&self, launch: F) -> LaunchResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let pending = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let pending = launch().map(|r| r.map(Arc::new)).boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;
        if result.is_err() {
            let mut slot = self.slot.lock().await;
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
                *slot = None;
            }
        }
        result
    }

    /// Clears the slot, handing back whatever was memoized
    pub async fn take(&self) -> Option<LaunchFuture<T>> {
        self.slot.lock().await.take()
    }

    pub async fn is_empty(&self) -> bool {
        self.slot.lock().await.is_none()
    }
}

impl<T: Send + Sync + 'static> Default for LaunchSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Launch options taken from [`Config`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            executable: config.chrome_executable.as_ref().map(PathBuf::from),
            headless: config.headless,
        }
    }
}

/// A launched browser plus the task draining its event handler
pub struct Engine {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Engine {
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    async fn shutdown(&self) {
        if let Err(e) = self.browser.execute(CloseParams::default()).await {
            warn!("rendering engine did not acknowledge close: {}", e);
        }
        self.handler.abort();
    }
}

/// Owner of the shared rendering engine handle
pub struct EngineManager {
    settings: EngineSettings,
    slot: LaunchSlot<Engine>,
}

impl EngineManager {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            slot: LaunchSlot::new(),
        }
    }

    /// Shared engine, launched on first use
    pub async fn acquire(&self) -> Result<Arc<Engine>, BrowserError> {
        let settings = self.settings.clone();
        self.slot
            .get_or_launch(move || async move {
                launch_engine(&settings).await.map_err(|e| e.to_string())
            })
            .await
            .map_err(|message| BrowserError::LaunchFailed { message })
    }

    /// Closes the engine if one was launched; safe to call at any time
    pub async fn release(&self) {
        let Some(pending) = self.slot.take().await else {
            debug!("no rendering engine to release");
            return;
        };
        match pending.await {
            Ok(engine) => {
                engine.shutdown().await;
                info!("🛑 rendering engine released");
            }
            Err(message) => debug!("engine launch had failed, nothing to close: {}", message),
        }
    }
}

/// Launches a browser and spawns its event loop
pub async fn launch_engine(settings: &EngineSettings) -> Result<Engine, BrowserError> {
    info!("🚀 launching rendering engine...");

    let mut builder = BrowserConfig::builder().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--remote-debugging-port=0",
    ]);
    if settings.headless {
        builder = builder.new_headless_mode();
    } else {
        builder = builder.with_head();
    }
    if let Some(path) = &settings.executable {
        debug!("using browser binary {}", path.display());
        builder = builder.chrome_executable(path);
    }
    let config = builder.build().map_err(|message| {
        error!("invalid rendering engine config: {}", message);
        BrowserError::LaunchFailed { message }
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("failed to launch rendering engine: {}", e);
        BrowserError::LaunchFailed {
            message: e.to_string(),
        }
    })?;

    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    info!("✅ rendering engine ready");
    Ok(Engine { browser, handler })
}
