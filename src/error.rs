use std::time::Duration;

use thiserror::Error;

/// Top-level error for a single export job
#[derive(Debug, Error)]
pub enum AppError {
    /// Rendering engine and table-of-contents discovery
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    /// Table-of-contents structure
    #[error("table of contents error: {0}")]
    Toc(#[from] TocError),
    /// Export feed serialization
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    /// Configuration and startup inputs
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Rendering engine errors. All of them are fatal to the job.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch rendering engine: {message}")]
    LaunchFailed { message: String },
    #[error("failed to open browsing context: {source}")]
    ContextFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    #[error("failed to navigate to {url}: {message}")]
    NavigationFailed { url: String, message: String },
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },
    #[error("failed to extract table of contents markup: {message}")]
    ExtractFailed { message: String },
}

#[derive(Debug, Error)]
pub enum TocError {
    #[error("invalid table of contents url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("part {part_id} has {count} subsections, at most {max} fit its id block")]
    PartCapacityExceeded {
        part_id: u32,
        count: usize,
        max: usize,
    },
}

/// Subsection fetch errors. Local to one subsection.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("request to {url} returned status {status}")]
    BadStatus { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("main content region not found")]
    MissingMainContent,
    #[error("math conversion failed: {0}")]
    Math(#[from] MathError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("malformed math markup: {0}")]
    Malformed(String),
    #[error("unbalanced element </{0}>")]
    Unbalanced(String),
    #[error("no math element in fragment")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export document: {0}")]
    Write(#[from] std::io::Error),
    #[error("export document is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("style sheet {path} defines no class or id selectors")]
    EmptyAllowList { path: String },
}

/// Failure of one subsection's fetch-and-transform task
#[derive(Debug, Error)]
pub enum SubsectionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("subsection gate closed")]
    GateClosed,
    #[error("task aborted: {0}")]
    Join(String),
}

// ========== Convenience constructors ==========

impl BrowserError {
    pub fn navigation_failed(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        BrowserError::NavigationFailed {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        BrowserError::Timeout {
            what: what.into(),
            waited,
        }
    }
}

impl ConfigError {
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

/// Library result type
pub type AppResult<T> = Result<T, AppError>;
