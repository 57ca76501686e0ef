// Configuration loading and parsing (config/placar.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use placar_core::format::{is_valid_date_format, DEFAULT_DATE_FORMAT};
use placar_core::{Channel, MatchId};
use serde::Deserialize;
use thiserror::Error;

/// Name of the config file, both under `defaults/` and `config/`.
pub const CONFIG_FILE: &str = "placar.toml";

/// Shipped defaults, written to `config/` when neither it nor `defaults/`
/// has a config file.
const EMBEDDED_DEFAULTS: &str = include_str!("../defaults/placar.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// placar.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub channels: ChannelPaths,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    /// Log endpoint path; `{id}` is replaced with the match id.
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
}

/// Per-channel SSE paths, relative to `server.base_url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelPaths {
    pub new: String,
    pub start: String,
    pub score: String,
    pub finish: String,
    pub deleted: String,
}

impl Default for ChannelPaths {
    fn default() -> Self {
        ChannelPaths {
            new: Channel::New.default_path().to_string(),
            start: Channel::Start.default_path().to_string(),
            score: Channel::Score.default_path().to_string(),
            finish: Channel::Finish.default_path().to_string(),
            deleted: Channel::Deleted.default_path().to_string(),
        }
    }
}

impl ChannelPaths {
    pub fn path(&self, channel: Channel) -> &str {
        match channel {
            Channel::New => &self.new,
            Channel::Start => &self.start,
            Channel::Score => &self.score,
            Channel::Finish => &self.finish,
            Channel::Deleted => &self.deleted,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub tick_millis: u64,
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            tick_millis: 1000,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

fn default_logs_path() -> String {
    "/games/{id}/logs".to_string()
}

impl Config {
    /// Full SSE URL for a channel.
    pub fn channel_url(&self, channel: Channel) -> String {
        join_url(&self.server.base_url, self.channels.path(channel))
    }

    /// Full log URL for a match.
    pub fn logs_url(&self, id: &MatchId) -> String {
        join_url(
            &self.server.base_url,
            &self.server.logs_path.replace("{id}", id.as_str()),
        )
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.display.tick_millis)
    }

    /// Replace the server base URL (e.g. from the command line) and
    /// re-validate.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.server.base_url = base_url.trim().to_string();
        validate(&self)?;
        Ok(self)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse and validate config text. `path` is only used in error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Make sure `config/placar.toml` exists under `base_dir`, copying it from
/// `defaults/` (or the built-in defaults) when missing. Returns the path of
/// the file that was created, if any.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let content = if source.is_file() {
        std::fs::read_to_string(&source).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read {}: {e}", source.display()),
        })?
    } else {
        EMBEDDED_DEFAULTS.to_string()
    };

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, content.as_bytes()).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(Some(target))
        }
        // Created concurrently; keep the existing file.
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Load the config rooted at `base_dir`, or the working directory.
pub fn load_config(base_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let base = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
            path: PathBuf::from("."),
        })?,
    };
    ensure_config_files(&base)?;
    load_config_from(&base)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = &config.server.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "server.base_url".into(),
            message: format!("must be an http(s) URL, got {base:?}"),
        });
    }

    if !config.server.logs_path.starts_with('/') || !config.server.logs_path.contains("{id}") {
        return Err(ConfigError::ValidationError {
            field: "server.logs_path".into(),
            message: "must start with `/` and contain `{id}`".into(),
        });
    }

    for channel in Channel::ALL {
        if !config.channels.path(channel).starts_with('/') {
            return Err(ConfigError::ValidationError {
                field: format!("channels.{}", channel.name()),
                message: "must start with `/`".into(),
            });
        }
    }

    if config.display.tick_millis == 0 {
        return Err(ConfigError::ValidationError {
            field: "display.tick_millis".into(),
            message: "must be > 0".into(),
        });
    }

    if !is_valid_date_format(&config.display.date_format) {
        return Err(ConfigError::ValidationError {
            field: "display.date_format".into(),
            message: format!("not a valid strftime pattern: {:?}", config.display.date_format),
        });
    }

    Ok(())
}
