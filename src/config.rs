//! Configuration
//!
//! TOML files, environment variables and command-line arguments, merged in
//! that order of increasing precedence.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::{Config as ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use crate::detect::DetectorThresholds;

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "vitals-monitor")]
#[command(about = "Replay vital-sign measurements through the alert detectors")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load measurements and evaluate every patient once
    Replay {
        /// Measurement file, or directory of *.txt files
        path: PathBuf,
        /// Evaluation time in epoch millis (default: latest measurement)
        #[arg(long)]
        now: Option<i64>,
        /// Only evaluate this patient
        #[arg(long, allow_negative_numbers = true)]
        patient: Option<i32>,
        /// Print alerts as JSON lines on stdout
        #[arg(long)]
        json: bool,
    },
    /// Load measurements and list patient ids
    Patients {
        /// Measurement file, or directory of *.txt files
        path: PathBuf,
    },
    /// Print the default configuration as TOML
    DefaultConfig {
        /// Write it to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Detector limits
    pub thresholds: DetectorThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Also write daily log files here
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Full,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            directory: None,
        }
    }
}

impl Config {
    /// Load configuration for the given command line
    pub fn load_with_cli(cli: &Cli) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. built-in defaults
        builder = builder.add_source(ConfigBuilder::try_from(&Config::default())?);

        // 2. system file
        if let Some(system_config) = Self::get_system_config_path() {
            if system_config.exists() {
                builder = builder.add_source(File::from(system_config));
            }
        }

        // 3. user file
        if let Some(user_config) = Self::get_user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config));
            }
        }

        // 4. explicit file, which must exist
        if let Some(config_path) = &cli.config {
            if !config_path.exists() {
                return Err(anyhow!(
                    "config file does not exist: {}",
                    config_path.display()
                ));
            }
            builder = builder.add_source(File::from(config_path.clone()));
        }

        // 5. environment, e.g. VITALS_MONITOR_LOGGING__LEVEL=debug
        builder = builder.add_source(
            Environment::with_prefix("VITALS_MONITOR")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: Config = builder
            .build()?
            .try_deserialize()
            .context("invalid configuration")?;

        // 6. command line
        if let Some(log_level) = cli.log_level {
            config.logging.level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn get_system_config_path() -> Option<PathBuf> {
        Some(PathBuf::from("/etc/vitals-monitor/config.toml"))
    }

    pub fn get_user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "vitals-monitor")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn generate_default_config() -> Result<String> {
        toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("failed to render default config: {}", e))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| anyhow!("failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject limits the detectors cannot work with
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;

        for (name, window) in [
            ("blood_pressure", t.blood_pressure.window_millis),
            ("saturation", t.saturation.window_millis),
            ("cardiac", t.cardiac.window_millis),
            ("compound", t.compound.window_millis),
        ] {
            if window <= 0 {
                return Err(anyhow!("thresholds.{name}.window_millis must be positive"));
            }
        }

        for (name, bounds) in [
            ("systolic", t.blood_pressure.systolic),
            ("diastolic", t.blood_pressure.diastolic),
        ] {
            if bounds.low > bounds.high {
                return Err(anyhow!(
                    "thresholds.blood_pressure.{name}: low {} is above high {}",
                    bounds.low,
                    bounds.high
                ));
            }
        }

        if t.blood_pressure.trend_samples < 2 {
            return Err(anyhow!(
                "thresholds.blood_pressure.trend_samples must be at least 2"
            ));
        }
        if t.cardiac.low_rate > t.cardiac.high_rate {
            return Err(anyhow!("thresholds.cardiac: low_rate is above high_rate"));
        }
        if t.cardiac.irregular_tolerance < 0.0 {
            return Err(anyhow!(
                "thresholds.cardiac.irregular_tolerance must not be negative"
            ));
        }
        if t.saturation.rapid_drop_percent <= 0.0 {
            return Err(anyhow!(
                "thresholds.saturation.rapid_drop_percent must be positive"
            ));
        }

        if let Some(log_dir) = &self.logging.directory {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir)?;
            }
        }

        Ok(())
    }

    /// Install the global subscriber
    ///
    /// Keep the returned guard alive for as long as file logging should run.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let level_filter = EnvFilter::builder()
            .with_default_directive(Level::from(self.logging.level).into())
            .from_env_lossy();

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
        layers.push(match self.logging.format {
            LogFormat::Compact => fmt::layer().compact().boxed(),
            LogFormat::Full => fmt::layer().boxed(),
            LogFormat::Json => fmt::layer().json().boxed(),
        });

        let guard = match &self.logging.directory {
            Some(log_dir) => {
                std::fs::create_dir_all(log_dir)?;
                let file_appender = tracing_appender::rolling::daily(log_dir, "vitals-monitor.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                layers.push(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking)
                        .boxed(),
                );
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(layers)
            .with(level_filter)
            .try_init()
            .map_err(|e| anyhow!("failed to install logger: {}", e))?;

        tracing::debug!("logging initialised at {:?}", self.logging.level);
        Ok(guard)
    }
}
