//! Command-line configuration for the server binary.

use clap::Parser;
use provider_core::DEFAULT_MAX_COMPLEXITY;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Raw arguments as parsed from the command line.
#[derive(Parser, Debug, Clone)]
#[command(name = "provider_server")]
#[command(about = "HTTP service managing masters and their applications")]
pub struct ServerArgs {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port for HTTP connections
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// SQLite database file; created and migrated on first start
    #[arg(long)]
    pub db_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory for rolling log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Ceiling given to masters created without one
    #[arg(long, default_value_t = DEFAULT_MAX_COMPLEXITY)]
    pub default_max_complexity: i64,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub default_max_complexity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidHost(String),
    NegativeDefaultMaxComplexity(i64),
    NonUtf8LogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHost(host) => write!(f, "invalid bind host `{host}`"),
            Self::NegativeDefaultMaxComplexity(value) => {
                write!(f, "default max complexity must be non-negative, got {value}")
            }
            Self::NonUtf8LogDir(path) => {
                write!(f, "log directory is not valid UTF-8: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Log directory as the string form expected by the logging backend.
    pub fn log_dir_str(&self) -> Result<&str, ConfigError> {
        self.log_dir
            .to_str()
            .ok_or_else(|| ConfigError::NonUtf8LogDir(self.log_dir.clone()))
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let ip: IpAddr = args
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost(args.host.clone()))?;
        if args.default_max_complexity < 0 {
            return Err(ConfigError::NegativeDefaultMaxComplexity(
                args.default_max_complexity,
            ));
        }

        let log_dir = args
            .log_dir
            .unwrap_or_else(|| std::env::temp_dir().join("provider_server").join("logs"));
        let log_dir = match std::path::absolute(&log_dir) {
            Ok(absolute) => absolute,
            Err(_) => log_dir,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(ip, args.port),
            db_path: args.db_path,
            log_level: args
                .log_level
                .unwrap_or_else(|| provider_core::default_log_level().to_string()),
            log_dir,
            default_max_complexity: args.default_max_complexity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerArgs, ServerConfig};
    use clap::Parser;

    #[test]
    fn defaults_bind_localhost_5000() {
        let args = ServerArgs::parse_from(["provider_server", "--db-path", "p.sqlite3"]);
        let config = ServerConfig::try_from(args).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:5000");
        assert_eq!(config.default_max_complexity, 10);
        assert!(config.log_dir.ends_with("logs"));
    }

    #[test]
    fn explicit_values_are_kept() {
        let args = ServerArgs::parse_from([
            "provider_server",
            "--db-path",
            "p.sqlite3",
            "--host",
            "0.0.0.0",
            "--port",
            "8088",
            "--log-level",
            "debug",
            "--default-max-complexity",
            "25",
        ]);
        let config = ServerConfig::try_from(args).unwrap();

        assert_eq!(config.bind_addr.port(), 8088);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.default_max_complexity, 25);
    }

    #[test]
    fn db_path_is_required() {
        assert!(ServerArgs::try_parse_from(["provider_server"]).is_err());
    }

    #[test]
    fn rejects_unparseable_host() {
        let args = ServerArgs::parse_from([
            "provider_server",
            "--db-path",
            "p.sqlite3",
            "--host",
            "not a host",
        ]);
        let err = ServerConfig::try_from(args).unwrap_err();
        assert_eq!(err, ConfigError::InvalidHost("not a host".to_string()));
    }

    #[test]
    fn rejects_negative_default_ceiling() {
        let args = ServerArgs::parse_from([
            "provider_server",
            "--db-path",
            "p.sqlite3",
            "--default-max-complexity=-1",
        ]);
        let err = ServerConfig::try_from(args).unwrap_err();
        assert_eq!(err, ConfigError::NegativeDefaultMaxComplexity(-1));
    }
}
