use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable selecting the backend base URL.
pub const SERVER_URL_ENV: &str = "L9S_SERVER_URL";

const DEFAULT_SERVER_URL: &str = "http://localhost:3333";
const DEFAULT_REDIRECT_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub server: ServerConfig,
  pub redirect: RedirectConfig,
  pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Base URL of the shortener backend.
  pub url: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_SERVER_URL.to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
  /// How long the redirect view waits before opening the destination.
  pub delay_ms: u64,
}

impl Default for RedirectConfig {
  fn default() -> Self {
    Self {
      delay_ms: DEFAULT_REDIRECT_DELAY_MS,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
  /// Where exported CSV files land. Defaults to the download directory.
  pub dir: Option<PathBuf>,
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided (an error if missing)
  /// 2. ./l9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/l9s/config.yaml
  ///
  /// No file at all is fine - every field has a default, and the server
  /// URL can come entirely from `L9S_SERVER_URL`.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
      if !url.is_empty() {
        config.server.url = url;
      }
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("l9s.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("l9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Redirect delay as a Duration.
  pub fn redirect_delay(&self) -> std::time::Duration {
    std::time::Duration::from_millis(self.redirect.delay_ms)
  }

  /// Export destination, resolved to a concrete directory.
  pub fn export_dir(&self) -> PathBuf {
    self
      .export
      .dir
      .clone()
      .unwrap_or_else(crate::export::default_export_dir)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.url, "http://localhost:3333");
    assert_eq!(config.redirect.delay_ms, 2000);
    assert!(config.export.dir.is_none());
  }

  #[test]
  fn test_parse_partial_yaml() {
    let config: Config = serde_yaml::from_str("server:\n  url: https://s.example.com\n").unwrap();
    assert_eq!(config.server.url, "https://s.example.com");
    // Unspecified sections fall back to defaults.
    assert_eq!(config.redirect.delay_ms, 2000);
  }

  #[test]
  fn test_parse_full_yaml() {
    let yaml = r#"
server:
  url: http://127.0.0.1:8080
redirect:
  delay_ms: 500
export:
  dir: /tmp/exports
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.server.url, "http://127.0.0.1:8080");
    assert_eq!(config.redirect.delay_ms, 500);
    assert_eq!(config.export_dir(), PathBuf::from("/tmp/exports"));
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/l9s.yaml"))).is_err());
  }
}
