use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub upstream: UpstreamConfig,
  pub cache: CacheConfig,
  pub server: ServerConfig,
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
  /// Endpoint root; resources live at `<base_url>/<resource>/`
  pub base_url: String,
  /// Budget for a whole collection fetch, pagination and fallback included
  pub timeout_secs: u64,
  /// Hard cap on pages walked per collection
  pub max_pages: usize,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      base_url: "https://swapi.info/api".to_string(),
      timeout_secs: 10,
      max_pages: 50,
    }
  }
}

impl UpstreamConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Lifetime of a cached collection, counted from when it was stored
  pub ttl_secs: u64,
  /// Entries kept per resource before least-recently-used eviction
  pub max_entries: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: 600,
      max_entries: 1000,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub bind: String,
  /// Page size used when a request does not specify one
  pub default_page_size: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: "127.0.0.1:8080".to_string(),
      default_page_size: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter directives, overridden by RUST_LOG
  pub filter: String,
  /// Write daily-rotated log files here instead of stdout
  pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      filter: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./swapi-proxy.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/swapi-proxy/config.yaml
  ///
  /// Without a file the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("swapi-proxy.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("swapi-proxy").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }
}
