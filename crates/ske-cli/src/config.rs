//! Configuration system for the SKE CLI.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use ske_crypto::DerivationKey;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Environment variable holding the hex-encoded key derivation secret.
pub const KDF_SECRET_ENV: &str = "SKE_KDF_SECRET";

/// SKE configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Key derivation configuration
    #[serde(default)]
    pub kdf: KdfConfig,
    /// File cipher configuration
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Key derivation configuration.
///
/// The secret is looked up in order: `SKE_KDF_SECRET`, `secret_hex`,
/// `secret_file`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct KdfConfig {
    /// File holding the hex-encoded secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_file: Option<PathBuf>,
    /// Hex-encoded secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_hex: Option<String>,
}

impl std::fmt::Debug for KdfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdfConfig")
            .field("secret_file", &self.secret_file)
            .field("secret_hex", &self.secret_hex.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Region mapping backend
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Memory-mapped regions
    #[default]
    Mmap,
    /// Plain reads and writes
    Buffered,
}

/// File cipher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Region mapping backend
    #[serde(default)]
    pub backend: Backend,
    /// Default header length in front of the envelope
    #[serde(default)]
    pub header_len: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Mmap,
            header_len: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("ske/config.toml")
    }

    /// Load config from the default path, or the defaults if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config cannot be read or parsed.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        if let Some(secret) = &self.kdf.secret_hex {
            parse_secret(secret).context("Invalid kdf.secret_hex")?;
        }

        if self.kdf.secret_file.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            anyhow::bail!("kdf.secret_file must not be empty");
        }

        Ok(())
    }

    /// Resolve the key derivation secret.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret is configured, or the configured secret
    /// is not valid hex of at least 32 bytes.
    pub fn derivation_key(&self) -> anyhow::Result<DerivationKey> {
        let from_env = std::env::var(KDF_SECRET_ENV).ok().map(Zeroizing::new);
        self.derivation_key_from(from_env.as_deref().map(String::as_str))
    }

    fn derivation_key_from(&self, env_secret: Option<&str>) -> anyhow::Result<DerivationKey> {
        if let Some(secret) = env_secret {
            return parse_secret(secret).with_context(|| format!("Invalid {KDF_SECRET_ENV}"));
        }

        if let Some(secret) = &self.kdf.secret_hex {
            return parse_secret(secret).context("Invalid kdf.secret_hex");
        }

        if let Some(path) = &self.kdf.secret_file {
            let contents = Zeroizing::new(fs::read_to_string(path).with_context(|| {
                format!("failed to read kdf secret file {}", path.display())
            })?);
            return parse_secret(&contents)
                .with_context(|| format!("Invalid kdf secret file {}", path.display()));
        }

        anyhow::bail!(
            "No key derivation secret configured: set {KDF_SECRET_ENV}, kdf.secret_hex, \
             or kdf.secret_file"
        )
    }
}

fn parse_secret(hex_secret: &str) -> anyhow::Result<DerivationKey> {
    let bytes = hex::decode(hex_secret.trim()).context("secret is not valid hex")?;
    Ok(DerivationKey::new(bytes)?)
}
