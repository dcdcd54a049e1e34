//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

/// Stream the newest tick of a replay to the radar backend.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Replay export to stream. A bare number `N` expands to the configured
    /// pattern (`demo_N.json` by default).
    #[arg(value_name = "SOURCE", required_unless_present = "watch")]
    pub source: Option<String>,

    /// Optional YAML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Wait for a new replay export to appear in this directory instead of
    /// naming one.
    #[arg(long, value_name = "DIR", conflicts_with = "source")]
    pub watch: Option<PathBuf>,

    /// One log line per tick instead of the full table.
    #[arg(long)]
    pub minimal: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn numeric_source() {
        let cli = Cli::try_parse_from(["demoradar-bridge", "3"]).unwrap();
        assert_eq!(cli.source.as_deref(), Some("3"));
        assert!(cli.watch.is_none());
        assert!(!cli.minimal);
    }

    #[test]
    fn flags_and_config() {
        let cli = Cli::try_parse_from([
            "demoradar-bridge",
            "replays/match.json",
            "--config",
            "bridge.yaml",
            "--minimal",
        ])
        .unwrap();
        assert_eq!(cli.source.as_deref(), Some("replays/match.json"));
        assert_eq!(cli.config, Some(PathBuf::from("bridge.yaml")));
        assert!(cli.minimal);
    }

    #[test]
    fn watch_replaces_source() {
        let cli = Cli::try_parse_from(["demoradar-bridge", "--watch", "/tmp/replays"]).unwrap();
        assert!(cli.source.is_none());
        assert_eq!(cli.watch, Some(PathBuf::from("/tmp/replays")));
    }

    #[test]
    fn missing_source_is_rejected() {
        assert!(Cli::try_parse_from(["demoradar-bridge"]).is_err());
    }

    #[test]
    fn source_and_watch_conflict() {
        assert!(Cli::try_parse_from(["demoradar-bridge", "3", "--watch", "/tmp"]).is_err());
    }
}
