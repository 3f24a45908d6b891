//! # Textbook Export
//!
//! Scrapes an online textbook and exports it as a WordPress WXR feed.
//!
//! ## Layers
//!
//! ### ① Resources
//! - `browser/` - the shared rendering engine, used only for table-of-contents discovery
//! - `EngineManager` - lazy single launch, released on shutdown
//! - `BrowsingContext` - one isolated context per navigation, always disposed
//!
//! ### ② Stages
//! - `services/` - table-of-contents parsing, subsection fetching, WXR assembly
//! - `transform/` - the ordered content rewrite passes
//! - `mathml/` - MathML to LaTeX
//! - `dom/` - the mutable tree the passes work on
//!
//! ### ③ Flow
//! - `workflow/` - one subsection: fetch, then transform
//!
//! ### ④ Orchestration
//! - `orchestrator/` - one book per job, behind the two concurrency gates
//! - `api/` - the HTTP boundary

pub mod api;
pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod mathml;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod transform;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AllowList, Book, Part, Subsection};
pub use orchestrator::{BookExporter, ConcurrencyGovernor, ExportOutcome};
