use serde::{Deserialize, Serialize};

/// launchpad.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchpadConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub certificate: CertificateConfig,
    #[serde(default)]
    pub vercel: VercelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Application name (CLI `--app` overrides)
    pub app: Option<String>,
    /// Environment name (CLI `--environment` overrides)
    pub environment: Option<String>,
    /// Base domain; the site is served from `<app>.<base_domain>`
    pub base_domain: Option<String>,
    /// S3 bucket region (defaults to us-east-1)
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Static export directory, synced to the bucket and reported to Vercel
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// How many times to poll ACM for DNS validation records
    #[serde(default = "default_poll_attempts")]
    pub validation_poll_attempts: u32,
    /// Seconds between polls
    #[serde(default = "default_poll_interval_secs")]
    pub validation_poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VercelConfig {
    #[serde(default = "default_vercel_api_url")]
    pub api_url: String,
    /// Framework preset passed on project creation
    #[serde(default = "default_framework")]
    pub framework: String,
    /// Team scope for project creation
    pub team_id: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            app: None,
            environment: None,
            base_domain: None,
            region: default_region(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            validation_poll_attempts: default_poll_attempts(),
            validation_poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for VercelConfig {
    fn default() -> Self {
        Self {
            api_url: default_vercel_api_url(),
            framework: default_framework(),
            team_id: None,
        }
    }
}

impl LaunchpadConfig {
    pub const FILE_NAME: &'static str = "launchpad.toml";

    /// Load from launchpad.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::SettingsLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::SettingsParse {
                path: config_path,
                source: e,
            })
        } else {
            tracing::debug!(path = %config_path.display(), "no settings file; using defaults");
            Ok(Self::default())
        }
    }

    pub fn require_base_domain(&self) -> crate::Result<&str> {
        self.site
            .base_domain
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(crate::Error::MissingSetting {
                key: "[site].base_domain",
            })
    }

    /// Pick the CLI value when given, else the configured one.
    pub fn resolve_app<'a>(&'a self, flag: Option<&'a str>) -> crate::Result<&'a str> {
        flag.or(self.site.app.as_deref())
            .ok_or(crate::Error::MissingSetting { key: "app" })
    }

    /// Pick the CLI value when given, else the configured one.
    pub fn resolve_environment<'a>(&'a self, flag: Option<&'a str>) -> crate::Result<&'a str> {
        flag.or(self.site.environment.as_deref())
            .ok_or(crate::Error::MissingSetting { key: "environment" })
    }
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

fn default_output_dir() -> String {
    "out".to_owned()
}

fn default_poll_attempts() -> u32 {
    10
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_vercel_api_url() -> String {
    "https://api.vercel.com".to_owned()
}

fn default_framework() -> String {
    "nextjs".to_owned()
}
