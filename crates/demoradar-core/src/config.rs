//! Configuration loading and typed config structures for the bridge.
//!
//! The bridge runs with no configuration at all: every field defaults to
//! the values the pipeline was designed around (5 s retry delays, one
//! cycle per second, the radar backend on `ws://localhost:8080`). An
//! optional YAML file can override any subset of them.
//!
//! ```yaml
//! stream:
//!   ws_url: "ws://127.0.0.1:8080"
//!   reconnect_delay_ms: 5000
//! source:
//!   connected_value: 1
//! display:
//!   mode: minimal
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::normalize::ConnectivityFilter;
use crate::render::RenderOptions;
use crate::retry::FixedDelayRetry;

/// Placeholder substituted by the numeric source suffix.
const SOURCE_NUMBER_TOKEN: &str = "{n}";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BridgeConfig {
    /// Outbound radar stream settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Replay source and snapshot extraction settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Console output settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl BridgeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. An empty document yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Resolve the positional source argument to a path.
    ///
    /// An argument made only of ASCII digits is substituted into
    /// [`SourceConfig::pattern`]; anything else is taken literally.
    pub fn resolve_source(&self, arg: &str) -> PathBuf {
        if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) {
            PathBuf::from(self.source.pattern.replace(SOURCE_NUMBER_TOKEN, arg))
        } else {
            PathBuf::from(arg)
        }
    }

    /// Time to sleep between completed cycles.
    ///
    /// Falls back to the display mode's natural cadence when no explicit
    /// interval is configured.
    pub fn cycle_interval(&self) -> Duration {
        let ms = self
            .display
            .cycle_interval_ms
            .unwrap_or_else(|| self.display.mode.default_cycle_interval_ms());
        Duration::from_millis(ms)
    }

    /// Retry policy for reconnecting the radar stream.
    pub const fn reconnect_retry(&self) -> FixedDelayRetry {
        FixedDelayRetry::from_millis(self.stream.reconnect_delay_ms)
    }

    /// Retry policy for a source that is not yet parseable.
    pub const fn not_ready_retry(&self) -> FixedDelayRetry {
        FixedDelayRetry::from_millis(self.source.not_ready_delay_ms)
    }

    /// Optional upper bound on a single send.
    pub fn send_timeout(&self) -> Option<Duration> {
        self.stream.send_timeout_ms.map(Duration::from_millis)
    }

    /// Connectivity predicate applied during normalization.
    pub const fn connectivity_filter(&self) -> ConnectivityFilter {
        match self.source.connected_value {
            Some(value) => ConnectivityFilter::Equals(value),
            None => ConnectivityFilter::Any,
        }
    }

    /// Table rendering options.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            color: self.display.color,
            title: self.display.title.clone(),
        }
    }

    /// Directory poll cadence for watch mode.
    pub const fn watch_poll_retry(&self) -> FixedDelayRetry {
        FixedDelayRetry::from_millis(self.source.watch_poll_ms)
    }

    /// Wait between detecting a new replay and the first parse.
    pub const fn watch_settle(&self) -> Duration {
        Duration::from_millis(self.source.watch_settle_ms)
    }
}

/// Outbound radar stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// WebSocket URL of the radar backend.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Fixed wait between reconnect attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound on a single send. Unset means sends may block for as
    /// long as the transport does.
    #[serde(default)]
    pub send_timeout_ms: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_delay_ms: default_retry_delay_ms(),
            send_timeout_ms: None,
        }
    }
}

/// Replay source and snapshot extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Filename pattern for numeric source arguments; `{n}` is replaced by
    /// the number.
    #[serde(default = "default_source_pattern")]
    pub pattern: String,

    /// Fixed wait after the source failed to parse.
    #[serde(default = "default_retry_delay_ms")]
    pub not_ready_delay_ms: u64,

    /// Keep only rows whose `is_connected` equals this value. `null`
    /// disables the filter.
    #[serde(default = "default_connected_value")]
    pub connected_value: Option<i64>,

    /// File extension watched for in `--watch` mode.
    #[serde(default = "default_watch_extension")]
    pub watch_extension: String,

    /// Directory poll interval in `--watch` mode.
    #[serde(default = "default_watch_poll_ms")]
    pub watch_poll_ms: u64,

    /// Wait after a new file appears before parsing starts.
    #[serde(default = "default_watch_settle_ms")]
    pub watch_settle_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pattern: default_source_pattern(),
            not_ready_delay_ms: default_retry_delay_ms(),
            connected_value: default_connected_value(),
            watch_extension: default_watch_extension(),
            watch_poll_ms: default_watch_poll_ms(),
            watch_settle_ms: default_watch_settle_ms(),
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// Output verbosity.
    #[serde(default)]
    pub mode: DisplayMode,

    /// Override for the sleep between cycles.
    #[serde(default)]
    pub cycle_interval_ms: Option<u64>,

    /// Emit ANSI colours in the table.
    #[serde(default = "default_true")]
    pub color: bool,

    /// Banner title printed above the table.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            cycle_interval_ms: None,
            color: true,
            title: default_title(),
        }
    }
}

/// How much each cycle writes to the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Clear the screen, then print the banner, the table, and the JSON sent.
    #[default]
    Full,
    /// One structured log line per cycle, for high-rate streaming.
    Minimal,
}

impl DisplayMode {
    /// Natural cycle cadence of this mode.
    pub const fn default_cycle_interval_ms(self) -> u64 {
        match self {
            Self::Full => 1000,
            Self::Minimal => 50,
        }
    }
}

fn default_ws_url() -> String {
    "ws://localhost:8080".to_owned()
}

const fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_source_pattern() -> String {
    "demo_{n}.json".to_owned()
}

#[allow(clippy::unnecessary_wraps)]
const fn default_connected_value() -> Option<i64> {
    Some(0)
}

fn default_watch_extension() -> String {
    "json".to_owned()
}

const fn default_watch_poll_ms() -> u64 {
    1000
}

const fn default_watch_settle_ms() -> u64 {
    1000
}

const fn default_true() -> bool {
    true
}

fn default_title() -> String {
    "Radar".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BridgeConfig::default();
        assert_eq!(config.stream.ws_url, "ws://localhost:8080");
        assert_eq!(config.reconnect_retry().delay(), Duration::from_secs(5));
        assert_eq!(config.not_ready_retry().delay(), Duration::from_secs(5));
        assert_eq!(config.send_timeout(), None);
        assert_eq!(config.connectivity_filter(), ConnectivityFilter::Equals(0));
        assert_eq!(config.display.mode, DisplayMode::Full);
        assert_eq!(config.cycle_interval(), Duration::from_secs(1));
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
stream:
  ws_url: "ws://127.0.0.1:22006/cs2_webradar"
  reconnect_delay_ms: 250
  send_timeout_ms: 100

source:
  pattern: "match{n}.json"
  not_ready_delay_ms: 1500
  connected_value: 1
  watch_extension: "dem"
  watch_poll_ms: 2000
  watch_settle_ms: 0

display:
  mode: minimal
  color: false
  title: "Wall Radar"
"#;

        let config = BridgeConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.stream.ws_url, "ws://127.0.0.1:22006/cs2_webradar");
        assert_eq!(config.send_timeout(), Some(Duration::from_millis(100)));
        assert_eq!(config.source.not_ready_delay_ms, 1500);
        assert_eq!(config.connectivity_filter(), ConnectivityFilter::Equals(1));
        assert_eq!(config.source.watch_extension, "dem");
        assert_eq!(config.display.mode, DisplayMode::Minimal);
        assert_eq!(config.cycle_interval(), Duration::from_millis(50));
        assert!(!config.render_options().color);
        assert_eq!(config.render_options().title, "Wall Radar");
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "display:\n  cycle_interval_ms: 200\n";
        let config = BridgeConfig::parse(yaml).ok().unwrap_or_default();

        assert_eq!(config.cycle_interval(), Duration::from_millis(200));
        // Everything else uses defaults
        assert_eq!(config.stream, StreamConfig::default());
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = BridgeConfig::parse("");
        assert!(matches!(config, Ok(ref c) if *c == BridgeConfig::default()));
    }

    #[test]
    fn null_connected_value_disables_filter() {
        let config = BridgeConfig::parse("source:\n  connected_value: null\n")
            .ok()
            .unwrap_or_default();
        assert_eq!(config.connectivity_filter(), ConnectivityFilter::Any);
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let config = BridgeConfig::parse("display:\n  mode: [not, a, mode]\n");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn numeric_argument_uses_pattern() {
        let config = BridgeConfig::default();
        assert_eq!(config.resolve_source("17"), PathBuf::from("demo_17.json"));
    }

    #[test]
    fn other_arguments_are_literal_paths() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.resolve_source("replays/inferno.json"),
            PathBuf::from("replays/inferno.json")
        );
        assert_eq!(config.resolve_source("17a"), PathBuf::from("17a"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let config = BridgeConfig::from_file(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(config, Err(ConfigError::Io { .. })));
    }
}
