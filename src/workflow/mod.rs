//! Per-subsection flow: fetch the page, then rewrite it.

pub mod subsection_flow;

pub use subsection_flow::SubsectionFlow;
