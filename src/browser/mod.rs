//! Rendering engine access, used only for table-of-contents discovery.

pub mod context;
pub mod discoverer;
pub mod engine;

pub use context::BrowsingContext;
pub use discoverer::{BrowserTocDiscoverer, TocDiscoverer, TocSnapshot};
pub use engine::{Engine, EngineManager, EngineSettings, LaunchSlot};
