//! Runtime configuration
//!
//! Values come from the environment, optionally seeded from `.env.local` / `.env`.
//! A `.env` that dotenvy rejects (markdown, code fences, prose) falls back to a
//! lenient loader that only picks up `KEY=VALUE` lines.

use std::path::{Path, PathBuf};

use url::Url;

use crate::vault::{Kdf, VaultError, VaultOptions, MIN_KDF_ITERATIONS};

pub const ENV_DATA_DIR: &str = "QHELPER_DATA_DIR";
pub const ENV_STORE: &str = "QHELPER_STORE";
pub const ENV_BACKEND_URL: &str = "QHELPER_BACKEND_URL";
pub const ENV_KDF_ITERATIONS: &str = "QHELPER_KDF_ITERATIONS";
pub const ENV_MAX_UNLOCK_ATTEMPTS: &str = "QHELPER_MAX_UNLOCK_ATTEMPTS";
pub const ENV_SESSION_ID: &str = "QHELPER_SESSION_ID";

const DEFAULT_DATA_DIR: &str = ".qhelper";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/";
const DEFAULT_SESSION_ID: &str = "cli-session";

/// Config error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid KDF settings: {0}")]
    Kdf(#[from] VaultError),
}

/// Persistence backend for the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    File,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub backend_url: Url,
    pub kdf_iterations: u32,
    pub max_unlock_attempts: Option<u32>,
    pub session_id: String,
}

impl Config {
    /// Loads `.env` files, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = get(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let store = match get(ENV_STORE).as_deref() {
            None | Some("sqlite") => StoreKind::Sqlite,
            Some("file") => StoreKind::File,
            Some(other) => return Err(invalid(ENV_STORE, other)),
        };

        let backend_raw = get(ENV_BACKEND_URL).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = Url::parse(&backend_raw).map_err(|_| invalid(ENV_BACKEND_URL, &backend_raw))?;

        let kdf_iterations = match get(ENV_KDF_ITERATIONS) {
            None => MIN_KDF_ITERATIONS,
            Some(raw) => raw.parse().map_err(|_| invalid(ENV_KDF_ITERATIONS, &raw))?,
        };
        // Reject weak settings at load time rather than at first unlock.
        Kdf::new(kdf_iterations)?;

        let max_unlock_attempts = match get(ENV_MAX_UNLOCK_ATTEMPTS) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) | Err(_) => return Err(invalid(ENV_MAX_UNLOCK_ATTEMPTS, &raw)),
                Ok(n) => Some(n),
            },
        };

        let session_id = get(ENV_SESSION_ID).unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

        Ok(Self {
            data_dir,
            store,
            backend_url,
            kdf_iterations,
            max_unlock_attempts,
            session_id,
        })
    }

    pub fn vault_options(&self) -> Result<VaultOptions, ConfigError> {
        Ok(VaultOptions {
            kdf: Kdf::new(self.kdf_iterations)?,
            max_unlock_attempts: self.max_unlock_attempts,
        })
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("profiles.db")
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn is_valid_env_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Parses `KEY=VALUE` lines, skipping anything else. Already non-empty
/// variables are never overwritten.
fn parse_env_lenient(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        if !is_valid_env_key(key) {
            continue;
        }

        let mut value = v.trim().to_string();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = value[1..value.len() - 1].to_string();
        }

        out.push((key.to_string(), value));
    }

    out
}

fn try_load_env_lenient(path: &Path) -> std::io::Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let mut loaded = 0usize;

    for (key, value) in parse_env_lenient(&text) {
        if let Ok(existing) = std::env::var(&key) {
            if !existing.trim().is_empty() {
                continue;
            }
        }
        std::env::set_var(&key, value);
        loaded += 1;
    }

    Ok(loaded)
}

fn load_dotenv() {
    for name in [".env.local", ".env"] {
        let path = Path::new(name);
        if !path.exists() {
            continue;
        }
        if dotenvy::from_path(path).is_ok() {
            tracing::debug!(file = name, "loaded environment file");
            continue;
        }
        match try_load_env_lenient(path) {
            Ok(n) => tracing::debug!(file = name, loaded = n, "loaded environment file (lenient)"),
            Err(e) => tracing::warn!(file = name, "failed to read environment file: {}", e),
        }
    }
}
