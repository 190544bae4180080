//! Configuration management for the dlock server
//!
//! Sources, lowest precedence first: the YAML file, `DLOCK_` environment
//! variables (`__` separates nested keys), then command line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use tracing::Level;

use dlock_common::DEFAULT_SERVER_PORT;

use crate::startup::LoggingConfig;

const DEFAULT_MAINTENANCE_INTERVAL_MS: u64 = 60_000;
const DEFAULT_STALENESS_MS: u64 = 60_000;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PROBE_CONNECT_TIMEOUT_MS: u64 = 2_000;

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "dlock-server", version, about = "dlock quorum lock node")]
pub struct Cli {
    /// Configuration file
    #[arg(
        short = 'c',
        long = "config",
        env = "DLOCK_CONFIG",
        default_value = "conf/application.yml"
    )]
    pub config_file: String,
    /// Bind address
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,
    /// Bind port
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load configuration using the process command line
    pub fn new() -> anyhow::Result<Self> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let mut config_builder = Config::builder()
            .add_source(config::File::with_name(&cli.config_file).required(false))
            .add_source(
                Environment::with_prefix("DLOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = cli.address {
            config_builder = config_builder.set_override("server.address", v)?;
        }
        if let Some(v) = cli.port {
            config_builder = config_builder.set_override("server.port", i64::from(v))?;
        }

        let configuration = Configuration {
            config: config_builder.build()?,
        };
        configuration.validate()?;
        Ok(configuration)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.maintenance_interval().is_zero(),
            "dlock.maintenance.interval_ms must be greater than zero"
        );
        anyhow::ensure!(
            !self.probe_timeout().is_zero(),
            "dlock.maintenance.probe_timeout_ms must be greater than zero"
        );
        Ok(())
    }

    fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(default)
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Worker threads for the HTTP server; `None` keeps the actix default
    pub fn server_workers(&self) -> Option<usize> {
        self.config
            .get_int("server.workers")
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
    }

    // ========================================================================
    // Lock Maintenance Configuration
    // ========================================================================

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_millis(self.get_u64(
            "dlock.maintenance.interval_ms",
            DEFAULT_MAINTENANCE_INTERVAL_MS,
        ))
    }

    pub fn maintenance_staleness(&self) -> Duration {
        Duration::from_millis(self.get_u64("dlock.maintenance.staleness_ms", DEFAULT_STALENESS_MS))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.get_u64(
            "dlock.maintenance.probe_timeout_ms",
            DEFAULT_PROBE_TIMEOUT_MS,
        ))
    }

    pub fn probe_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.get_u64(
            "dlock.maintenance.probe_connect_timeout_ms",
            DEFAULT_PROBE_CONNECT_TIMEOUT_MS,
        ))
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        let mut logging = LoggingConfig::default();
        if let Ok(dir) = self.config.get_string("dlock.log.dir") {
            logging.log_dir = PathBuf::from(dir);
        }
        if let Ok(level) = self.config.get_string("dlock.log.level") {
            logging.level = level.parse().unwrap_or(Level::INFO);
        }
        if let Ok(console) = self.config.get_bool("dlock.log.console") {
            logging.console_output = console;
        }
        if let Ok(file) = self.config.get_bool("dlock.log.file") {
            logging.file_logging = file;
        }
        logging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["dlock-server"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults_without_config_file() {
        let configuration = Configuration::from_cli(cli(&["--config", "does/not/exist.yml"])).unwrap();
        assert_eq!(configuration.server_address(), "0.0.0.0");
        assert_eq!(configuration.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(configuration.server_workers(), None);
        assert_eq!(configuration.maintenance_interval(), Duration::from_secs(60));
        assert_eq!(configuration.maintenance_staleness(), Duration::from_secs(60));
        assert_eq!(configuration.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_file_values_and_cli_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "server:\n  address: 127.0.0.1\n  port: 7000\ndlock:\n  maintenance:\n    interval_ms: 250\n    staleness_ms: 1000\n  log:\n    level: debug\n    file: true"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let configuration = Configuration::from_cli(cli(&["--config", &path, "--port", "7100"])).unwrap();
        assert_eq!(configuration.server_address(), "127.0.0.1");
        assert_eq!(configuration.server_port(), 7100);
        assert_eq!(configuration.maintenance_interval(), Duration::from_millis(250));
        assert_eq!(configuration.maintenance_staleness(), Duration::from_secs(1));

        let logging = configuration.logging_config();
        assert_eq!(logging.level, Level::DEBUG);
        assert!(logging.file_logging);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "dlock:\n  maintenance:\n    interval_ms: 0").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        assert!(Configuration::from_cli(cli(&["--config", &path])).is_err());
    }
}
