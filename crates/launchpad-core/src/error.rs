use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── launchpad.toml ──
    #[error("failed to load settings from {path}")]
    SettingsLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{key} not set — set it in launchpad.toml or pass it on the command line")]
    MissingSetting { key: &'static str },

    // ── envs/<environment>/<app>.json ──
    #[error("config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("failed to read config from {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid {kind} {value:?}: {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    // ── .env output ──
    #[error("invalid env var name {key:?} — names must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidEnvKey { key: String },

    #[error("failed to write env file {path}")]
    EnvFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
