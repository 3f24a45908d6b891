//! Orchestration layer.
//!
//! ```text
//! api (admits a job through the governor)
//!     ↓
//! book_job::BookExporter (one textbook: discover, parse, fan out, assemble)
//!     ↓
//! workflow::SubsectionFlow (one subsection: fetch, transform)
//!     ↓
//! services / transform (stages with no shared resources)
//! ```
//!
//! Only this layer holds gate permits; only discovery touches the engine.

pub mod book_job;
pub mod governor;

pub use book_job::{BookExporter, ExportOutcome};
pub use governor::{ConcurrencyGovernor, JobPermit};
