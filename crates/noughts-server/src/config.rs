//! Server configuration: TOML file + CLI overrides.

use noughts_core::{NoughtsError, NoughtsResult, DEFAULT_BOARD_SIZE};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::info;

/// Largest accepted board edge.
pub const MAX_BOARD_SIZE: usize = 16;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub game: GameSection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// `[game]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GameSection {
    #[serde(default = "default_board_size")]
    pub board_size: usize,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            board_size: default_board_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_sessions() -> usize {
    crate::session::registry::DEFAULT_MAX_SESSIONS
}
fn default_board_size() -> usize {
    DEFAULT_BOARD_SIZE
}

/// Resolved server configuration (CLI overrides applied, values validated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub board_size: usize,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            board_size: default_board_size(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(
        config_path: Option<&Path>,
        cli_host: Option<&str>,
        cli_port: Option<u16>,
        cli_board_size: Option<usize>,
        cli_max_sessions: Option<usize>,
    ) -> NoughtsResult<Self> {
        let file_config = match config_path {
            Some(path) => {
                let expanded = expand_tilde(path);
                if expanded.exists() {
                    info!(path = %expanded.display(), "loading config file");
                    let content = std::fs::read_to_string(&expanded)?;
                    toml::from_str::<ConfigFile>(&content)
                        .map_err(|e| NoughtsError::Config(format!("parse error: {e}")))?
                } else {
                    info!(path = %expanded.display(), "config file not found, using defaults");
                    ConfigFile::default()
                }
            }
            None => ConfigFile::default(),
        };

        let config = Self {
            host: cli_host
                .map(str::to_string)
                .unwrap_or(file_config.server.host),
            port: cli_port.unwrap_or(file_config.server.port),
            board_size: cli_board_size.unwrap_or(file_config.game.board_size),
            max_sessions: cli_max_sessions.unwrap_or(file_config.server.max_sessions),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NoughtsResult<()> {
        if !(1..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(NoughtsError::Config(format!(
                "board_size must be between 1 and {MAX_BOARD_SIZE}, got {}",
                self.board_size
            )));
        }
        if self.max_sessions == 0 {
            return Err(NoughtsError::Config("max_sessions must be at least 1".into()));
        }
        self.bind_addr().map(|_| ())
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> NoughtsResult<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| NoughtsError::Config(format!("invalid host {:?}: {e}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
