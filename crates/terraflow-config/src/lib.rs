pub mod error;

pub use error::*;

use std::path::PathBuf;
use std::time::Duration;

/// Terraform release used when nothing else is configured
pub const DEFAULT_TERRAFORM_VERSION: &str = "1.5.7";

/// `terraform import` is given this long before it is killed
pub const DEFAULT_IMPORT_TIMEOUT_SECS: u64 = 30;

pub const ENV_TERRAFORM_VERSION: &str = "TERRAFLOW_TERRAFORM_VERSION";
pub const ENV_CACHE_DIR: &str = "TERRAFLOW_CACHE_DIR";
pub const ENV_IMPORT_TIMEOUT: &str = "TERRAFLOW_IMPORT_TIMEOUT";

/// terraflowのキャッシュディレクトリを取得
///
/// 以下の優先順位で決定:
/// 1. 環境変数 TERRAFLOW_CACHE_DIR
/// 2. ~/.cache/terraflow (OSごとのキャッシュディレクトリ)
/// 3. 一時ディレクトリ内の terraflow
pub fn get_cache_dir() -> Result<PathBuf> {
    let cache_dir = match std::env::var_os(ENV_CACHE_DIR) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("terraflow"),
    };

    if !cache_dir.exists() {
        std::fs::create_dir_all(&cache_dir)?;
        tracing::debug!("Created cache directory: {}", cache_dir.display());
    }

    Ok(cache_dir)
}

/// Settings shared by every Terraform invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Terraform release to download and run
    pub terraform_version: String,

    /// Root of the binary cache
    pub cache_dir: PathBuf,

    pub import_timeout: Duration,
}

impl Settings {
    /// Build settings from `TERRAFLOW_*` environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let terraform_version = match std::env::var(ENV_TERRAFORM_VERSION) {
            Ok(version) if !version.trim().is_empty() => version.trim().to_string(),
            _ => DEFAULT_TERRAFORM_VERSION.to_string(),
        };
        validate_version(&terraform_version)?;

        let import_timeout = match std::env::var(ENV_IMPORT_TIMEOUT) {
            Ok(raw) => Duration::from_secs(parse_seconds(ENV_IMPORT_TIMEOUT, &raw)?),
            Err(_) => Duration::from_secs(DEFAULT_IMPORT_TIMEOUT_SECS),
        };

        Ok(Self {
            terraform_version,
            cache_dir: get_cache_dir()?,
            import_timeout,
        })
    }

    /// Override the Terraform version (e.g. from a CLI flag)
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        validate_version(&version)?;
        self.terraform_version = version;
        Ok(self)
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Directory holding the binary for the configured version
    pub fn binary_dir(&self) -> PathBuf {
        self.cache_dir.join("terraform").join(&self.terraform_version)
    }
}

/// Accepts `MAJOR.MINOR.PATCH` with an optional pre-release suffix.
fn validate_version(version: &str) -> Result<()> {
    let core = version.split_once('-').map_or(version, |(core, _)| core);
    let parts: Vec<&str> = core.split('.').collect();

    let valid = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name: ENV_TERRAFORM_VERSION,
            value: version.to_string(),
            reason: "expected MAJOR.MINOR.PATCH".to_string(),
        })
    }
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        Ok(_) => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}
