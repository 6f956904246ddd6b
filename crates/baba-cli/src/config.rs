//! Configuration file management for baba.
//!
//! Provides a TOML-based config file at `~/.config/baba/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use baba_core::ai::AiConfig;
use baba_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub ai: AiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AiSection {
    /// Base URL of the generative recipe service.
    pub base_url: String,
    /// Bearer token for the service, if the deployment requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the baba config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/baba` or `~/.config/baba`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("baba");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("baba")
}

/// Return the path to the baba config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix (the file may hold an API key).
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct BabaConfig {
    pub db_config: DbConfig,
    pub ai_config: AiConfig,
}

impl BabaConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `BABA_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - AI base URL: `BABA_AI_BASE_URL` env > `config_file.ai.base_url` > error
    /// - AI API key: `BABA_AI_API_KEY` env > `config_file.ai.api_key` > none
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        // DB URL resolution.
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("BABA_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        // AI base URL resolution.
        let base_url = if let Ok(url) = std::env::var("BABA_AI_BASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.ai.base_url.clone()
        } else {
            bail!(
                "AI service base URL not found; set BABA_AI_BASE_URL or run `baba init` to create a config file"
            );
        };

        let api_key = std::env::var("BABA_AI_API_KEY")
            .ok()
            .or_else(|| file_config.as_ref().and_then(|cfg| cfg.ai.api_key.clone()));

        Ok(Self {
            db_config,
            ai_config: AiConfig::new(base_url, api_key),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("baba");
        let path = dir.join("config.toml");

        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            ai: AiSection {
                base_url: "https://ai.example.test".to_string(),
                api_key: Some("sk-test".to_string()),
            },
        };

        std::fs::create_dir_all(&dir).unwrap();
        let contents = toml::to_string_pretty(&original).unwrap();
        std::fs::write(&path, &contents).unwrap();

        let loaded_contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ConfigFile = toml::from_str(&loaded_contents).unwrap();

        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.ai.base_url, original.ai.base_url);
        assert_eq!(loaded.ai.api_key, original.ai.api_key);
    }

    #[test]
    fn config_without_api_key_parses() {
        let contents = r#"
[database]
url = "postgresql://localhost:5432/baba"

[ai]
base_url = "https://ai.example.test"
"#;
        let loaded: ConfigFile = toml::from_str(contents).unwrap();
        assert!(loaded.ai.api_key.is_none());
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var("BABA_DATABASE_URL", "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var("BABA_AI_BASE_URL", "https://env.example.test") };

        let config = BabaConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
        assert_eq!(config.ai_config.base_url, "https://env.example.test");

        unsafe { std::env::remove_var("BABA_DATABASE_URL") };
        unsafe { std::env::remove_var("BABA_AI_BASE_URL") };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();

        unsafe { std::env::set_var("BABA_DATABASE_URL", "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var("BABA_AI_BASE_URL", "https://env.example.test") };

        let config = BabaConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");

        unsafe { std::env::remove_var("BABA_DATABASE_URL") };
        unsafe { std::env::remove_var("BABA_AI_BASE_URL") };
    }

    #[test]
    fn resolve_errors_when_no_ai_base_url() {
        let _lock = lock_env();

        unsafe { std::env::remove_var("BABA_AI_BASE_URL") };
        // Point HOME and XDG_CONFIG_HOME to a temp dir so load_config() cannot
        // find a real config file.
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_home = std::env::var("HOME").ok();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("HOME", tmp.path()) };
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };

        let result = BabaConfig::resolve(Some("postgresql://localhost:5432/baba"));

        // Restore env before asserting, to avoid poisoning the mutex on failure.
        match orig_home {
            Some(h) => unsafe { std::env::set_var("HOME", h) },
            None => unsafe { std::env::remove_var("HOME") },
        }
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        assert!(result.is_err(), "should error when no AI base URL");
        let msg = result.unwrap_err().to_string();
        assert!(
            msg.contains("AI service base URL not found"),
            "unexpected error: {msg}"
        );
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("baba/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
