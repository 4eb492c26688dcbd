use std::fs;
use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{DEFAULT_RESET_TOKEN_TTL_MINUTES, MAX_RESET_TOKEN_TTL_MINUTES};

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration for the Stockroom server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address to listen on
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// How long a password-reset token stays valid, in minutes
    pub reset_token_ttl_minutes: i64,
    /// Directory for JSON log files; file logging is off when unset
    pub log_dir: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub reset_token_ttl_minutes: Option<i64>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Server URL used by the CLI client; ignored by the server
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Reasons the configuration file could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("reset_token_ttl_minutes must be between 1 and {}, got {minutes}", MAX_RESET_TOKEN_TTL_MINUTES)]
    ResetTokenTtl { minutes: i64 },
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "stockroom", about = "An inventory management server")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on
    #[clap(long, env = "STOCKROOM_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[clap(long, env = "STOCKROOM_PORT")]
    pub port: Option<u16>,

    /// Password-reset token lifetime in minutes
    #[clap(long, env = "STOCKROOM_RESET_TOKEN_TTL_MINUTES")]
    pub reset_token_ttl_minutes: Option<i64>,

    /// Directory for JSON log files
    #[clap(long, env = "STOCKROOM_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Debug mode
    #[clap(long, env = "STOCKROOM_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            host: update.host.unwrap_or(self.host),
            port: update.port.unwrap_or(self.port),
            reset_token_ttl_minutes: update.reset_token_ttl_minutes.unwrap_or(self.reset_token_ttl_minutes),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Returns the reset token lifetime as a Duration
    ///
    /// ### Errors
    ///
    /// Returns `ConfigError::ResetTokenTtl` unless the lifetime is between one
    /// minute and `MAX_RESET_TOKEN_TTL_MINUTES`
    pub fn reset_token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        let minutes = self.reset_token_ttl_minutes;
        if !(1..=MAX_RESET_TOKEN_TTL_MINUTES).contains(&minutes) {
            return Err(ConfigError::ResetTokenTtl { minutes });
        }
        chrono::Duration::try_minutes(minutes).ok_or(ConfigError::ResetTokenTtl { minutes })
    }

    /// The `host:port` address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Returns the base (default) configuration
///
/// The database lives in the config directory when there is one, otherwise
/// in the working directory.
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("stockroom.db".to_string(), |path| {
        path.join("stockroom.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 3000,
        reset_token_ttl_minutes: DEFAULT_RESET_TOKEN_TTL_MINUTES,
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
///
/// A missing path or file yields an empty update.
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, ConfigError> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;

    let update = toml::from_str::<ConfigUpdate>(&content).map_err(|source| ConfigError::Parse {
        path: config_path.clone(),
        source,
    })?;

    info!("Loaded configuration from {:?}", config_path);
    Ok(update)
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        host: args.host,
        port: args.port,
        reset_token_ttl_minutes: args.reset_token_ttl_minutes,
        log_dir: args.log_dir,
        server_url: None,
    }
}

/// Returns the platform config directory, if one can be determined
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "stockroom", "stockroom") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine config directory, skipping config file");
            None
        }
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_path = get_config_dir_path().filter(|path| {
        let exists = path.exists();
        if !exists {
            info!("Config path not found at {:?}, using defaults", path);
        }
        exists
    });

    let base = base_config(config_path.clone());

    let file_update = config_from_file(config_path.map(|p| p.join(CONFIG_FILE_NAME))).unwrap_or_else(|e| {
        warn!("{}", e);
        ConfigUpdate::default()
    });

    // Apply updates in order of increasing precedence
    let config = base.apply_update(file_update).apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, address={}, reset_token_ttl={}min, log_dir={:?}",
        config.database_url,
        config.bind_address(),
        config.reset_token_ttl_minutes,
        config.log_dir
    );

    config
}
