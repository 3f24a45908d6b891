use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "TEXTBOOK_EXPORT_CONFIG";

/// Program configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whole-textbook jobs allowed to run at once
    pub max_concurrent_jobs: usize,
    /// Subsection fetch/transform tasks allowed at once, across all jobs
    pub max_concurrent_subsections: usize,
    /// Per-subsection network timeout, seconds
    pub fetch_timeout_secs: u64,
    /// Ceiling for each rendering engine wait, seconds
    pub ui_wait_timeout_secs: u64,
    /// Suggested delay returned with a busy rejection, seconds
    pub retry_after_secs: u64,
    /// Address the request boundary listens on
    pub bind_address: String,
    /// Style sheet the attribute allow-list is derived from
    pub stylesheet_path: String,
    /// Path to a Chrome/Chromium binary; autodetected when unset
    pub chrome_executable: Option<String>,
    /// Run the rendering engine without a window
    pub headless: bool,
    /// Whether to log at debug level by default
    pub verbose_logging: bool,
    pub toc: TocSelectors,
    pub content: ContentSelectors,
    pub attribution: AttributionConfig,
    pub feed: FeedConfig,
}

/// Selectors used to drive and read the table of contents
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TocSelectors {
    /// Control that reveals the table of contents (CSS, evaluated by the browser)
    pub reveal_control: String,
    /// Revealed table-of-contents element (CSS, evaluated by the browser)
    pub container: String,
    pub part_marker: String,
    pub part_title: String,
    pub subsection_list: String,
    pub subsection_link: String,
}

/// Selectors for the content blocks the transformer rewrites
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ContentSelectors {
    pub main: String,
    pub learning_objectives: String,
    pub check_understanding: String,
    pub note: String,
    /// Native block headers stripped during restructuring
    pub header: String,
}

/// Links placed in the attribution block of every subsection
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub book_title: String,
    pub book_url: String,
    pub license_name: String,
    pub license_url: String,
}

/// Channel-level metadata of the export feed
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub description: String,
    pub language: String,
    pub author: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            max_concurrent_subsections: 5,
            fetch_timeout_secs: 10,
            ui_wait_timeout_secs: 60,
            retry_after_secs: 30,
            bind_address: "0.0.0.0:3000".to_string(),
            stylesheet_path: "assets/style.css".to_string(),
            chrome_executable: None,
            headless: true,
            verbose_logging: false,
            toc: TocSelectors::default(),
            content: ContentSelectors::default(),
            attribution: AttributionConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl Default for TocSelectors {
    fn default() -> Self {
        Self {
            reveal_control: r#"button[aria-label="Click to open the Table of Contents"]"#
                .to_string(),
            container: r#"nav[data-testid="toc"]"#.to_string(),
            part_marker: ".os-number".to_string(),
            part_title: ".os-text".to_string(),
            subsection_list: "ol".to_string(),
            subsection_link: "a".to_string(),
        }
    }
}

impl Default for ContentSelectors {
    fn default() -> Self {
        Self {
            main: "#main-content".to_string(),
            learning_objectives: "section.learning-objectives".to_string(),
            check_understanding: "section.check-understanding".to_string(),
            note: r#"[data-type="note"]"#.to_string(),
            header: r#"h1, h2, h3, h4, h5, h6, header, [data-type="title"]"#.to_string(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            book_title: "OpenStax".to_string(),
            book_url: "https://openstax.org/subjects".to_string(),
            license_name: "CC BY 4.0".to_string(),
            license_url: "https://creativecommons.org/licenses/by/4.0/".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            description: "Imported textbook".to_string(),
            language: "en".to_string(),
            author: "admin".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file named by `TEXTBOOK_EXPORT_CONFIG`, then env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_toml_file(&path)?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply environment overrides on top of `self`
    pub fn with_env_overrides(self) -> Self {
        Self {
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS", self.max_concurrent_jobs),
            max_concurrent_subsections: env_parse(
                "MAX_CONCURRENT_SUBSECTIONS",
                self.max_concurrent_subsections,
            ),
            fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS", self.fetch_timeout_secs),
            ui_wait_timeout_secs: env_parse("UI_WAIT_TIMEOUT_SECS", self.ui_wait_timeout_secs),
            retry_after_secs: env_parse("RETRY_AFTER_SECS", self.retry_after_secs),
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or(self.bind_address),
            stylesheet_path: std::env::var("STYLESHEET_PATH").unwrap_or(self.stylesheet_path),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            headless: env_parse("HEADLESS", self.headless),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
            ..self
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn ui_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.ui_wait_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("ignoring {}={:?}: not a valid value", name, value);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_resource_limits() {
        let config = Config::default();
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.max_concurrent_subsections, 5);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.ui_wait_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let raw = r#"
            max_concurrent_jobs = 4

            [content]
            main = "main"

            [attribution]
            book_title = "Physics"
        "#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.max_concurrent_subsections, 5);
        assert_eq!(config.content.main, "main");
        assert_eq!(config.content.note, ContentSelectors::default().note);
        assert_eq!(config.attribution.book_title, "Physics");
        assert_eq!(
            config.attribution.license_url,
            AttributionConfig::default().license_url
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::from_toml_str("max_concurrent_jobs = \"two\"").is_err());
    }
}
