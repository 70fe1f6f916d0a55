//! Core types and configuration for launchpad.
//!
//! This crate defines the `launchpad.toml` schema ([`LaunchpadConfig`]),
//! the shared `envs/<environment>/<app>.json` loader ([`EnvVars`]), `.env`
//! serialization ([`envfile`]), resource naming ([`StackNames`]), and shared
//! error types.

pub mod config;
pub mod envfile;
pub mod envs;
pub mod error;
pub mod stack;

pub use config::{BuildConfig, CertificateConfig, LaunchpadConfig, SiteConfig, VercelConfig};
pub use envs::{EnvVar, EnvVars};
pub use error::{Error, Result};
pub use stack::{StackNames, platform_project_name, validate_identifier};
