// Runtime configuration, read from the environment (and `.env` via dotenv).

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const TOKEN_VAR: &str = "GPBOT_DISCORD";
pub const DATA_DIR_VAR: &str = "GPBOT_DATA_DIR";
pub const BACKEND_VAR: &str = "GPBOT_LEDGER_BACKEND";
pub const DEV_GUILD_VAR: &str = "GPBOT_DEV_GUILD_ID";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Missing {0} environment variable! Create a .env file with your bot token.")]
    MissingToken(&'static str),

    #[error("Unknown ledger backend {0:?} (expected \"json\" or \"sqlite\")")]
    UnknownBackend(String),

    #[error("GPBOT_DEV_GUILD_ID must be a guild id, got {0:?}")]
    InvalidGuildId(String),
}

/// Where the spending ledger is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackendKind {
    Json,
    Sqlite,
}

impl FromStr for LedgerBackendKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(SettingsError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    pub token: String,
    pub data_dir: PathBuf,
    pub backend: LedgerBackendKind,
    /// Register commands in this guild only (instant updates while developing).
    pub dev_guild_id: Option<u64>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("data_dir", &self.data_dir)
            .field("backend", &self.backend)
            .field("dev_guild_id", &self.dev_guild_id)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = non_empty(TOKEN_VAR).ok_or(SettingsError::MissingToken(TOKEN_VAR))?;

        let data_dir = non_empty(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let backend = match non_empty(BACKEND_VAR) {
            Some(value) => value.parse()?,
            None => LedgerBackendKind::Json,
        };

        let dev_guild_id = non_empty(DEV_GUILD_VAR)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|id| *id != 0)
                    .ok_or(SettingsError::InvalidGuildId(value))
            })
            .transpose()?;

        Ok(Self {
            token,
            data_dir,
            backend,
            dev_guild_id,
        })
    }

    /// File the chosen backend keeps the ledger in.
    pub fn ledger_path(&self) -> PathBuf {
        match self.backend {
            LedgerBackendKind::Json => self.data_dir.join("spending.json"),
            LedgerBackendKind::Sqlite => self.data_dir.join("spending.db"),
        }
    }
}
