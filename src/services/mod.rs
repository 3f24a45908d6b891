//! Pipeline stages that need neither the rendering engine nor the gates.

pub mod fetcher;
pub mod toc_parser;
pub mod wxr;

pub use fetcher::SubsectionFetcher;
pub use toc_parser::TocParser;
pub use wxr::build_export;
