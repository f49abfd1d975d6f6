// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Tool settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `PDP_` environment variables, then the command line. Every field is
//! optional so that a later layer only overrides what it sets.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Result, bail};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "PDP_";

// A new field must also be added to `Settings::merge`, otherwise its
// command-line value is dropped.
#[derive(Parser, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[command(about = "Map a PDP network onto many-core nodes and write their memory images")]
pub struct Settings {
    /// Network description file (YAML).
    #[arg(long)]
    pub network: Option<PathBuf>,

    /// Settings file (TOML) read before the environment and command line.
    #[arg(long)]
    #[serde(skip)]
    pub conf: Option<PathBuf>,

    /// Directory the node images are written to.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Stage to generate. Stage 0 writes full images, later stages write
    /// only the regions that change.
    #[arg(long)]
    pub stage: Option<u32>,

    /// Number of ticks to size the recordings for, derived from the example
    /// set if not given.
    #[arg(long)]
    pub run_ticks: Option<u32>,

    /// Generate a testing stage instead of a training stage.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub test: Option<bool>,

    /// Only write images of nodes whose label matches this regular
    /// expression.
    #[arg(long)]
    pub node_filter_regex: Option<String>,

    /// Level of log message to display.
    #[arg(long)]
    pub stdout_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: None,
            conf: None,
            out_dir: Some(PathBuf::from("images")),
            stage: Some(0),
            run_ticks: None,
            test: Some(false),
            node_filter_regex: Some(String::new()),
            stdout_level: Some("info".to_string()),
        }
    }
}

impl Settings {
    /// Parse the command line and combine it with the other sources.
    pub fn parse_all_sources() -> Result<Self> {
        Settings::from_sources(Settings::parse())
    }

    /// Combine defaults, the settings file, the environment and `cli`.
    pub fn from_sources(cli: Settings) -> Result<Self> {
        let mut config = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(conf) = &cli.conf {
            if !conf.exists() {
                bail!("Settings file {} not found", conf.display());
            }
            config = config.merge(Toml::file(conf));
        }
        config = config.merge(Env::prefixed(ENV_PREFIX));

        let settings: Settings = config.extract()?;
        Ok(settings.merge(cli))
    }

    /// Values set in `other` take precedence.
    #[must_use]
    pub fn merge(self, other: Settings) -> Self {
        Self {
            network: other.network.or(self.network),
            conf: other.conf.or(self.conf),
            out_dir: other.out_dir.or(self.out_dir),
            stage: other.stage.or(self.stage),
            run_ticks: other.run_ticks.or(self.run_ticks),
            test: other.test.or(self.test),
            node_filter_regex: other.node_filter_regex.or(self.node_filter_regex),
            stdout_level: other.stdout_level.or(self.stdout_level),
        }
    }

    pub fn network_path(&self) -> Result<&Path> {
        match &self.network {
            Some(path) => Ok(path),
            None => bail!("No network description given (use --network)"),
        }
    }

    #[must_use]
    pub fn out_dir(&self) -> PathBuf {
        self.out_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("images"))
    }

    /// Log level, defaulting to `Error` for unknown names.
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        let lvl = self.stdout_level.as_deref().unwrap_or("info");
        match LevelFilter::from_str(lvl) {
            Ok(level) => level,
            Err(_) => {
                let default = LevelFilter::Error;
                println!("Unable to parse level string '{lvl}', defaulting to {default}");
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_defaults() {
        let cli = Settings::parse_from(["pdp-builder", "--network", "net.yaml", "--stage", "2", "--test"]);
        let settings = Settings::default().merge(cli);
        assert_eq!(settings.network, Some(PathBuf::from("net.yaml")));
        assert_eq!(settings.stage, Some(2));
        assert_eq!(settings.test, Some(true));
        assert_eq!(settings.out_dir(), PathBuf::from("images"));
        assert_eq!(settings.level(), LevelFilter::Info);
    }

    #[test]
    fn unknown_level_falls_back_to_error() {
        let settings = Settings {
            stdout_level: Some("loud".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.level(), LevelFilter::Error);
    }

    #[test]
    #[should_panic(expected = "No network description given")]
    fn network_is_required() {
        Settings::default().network_path().unwrap();
    }
}
