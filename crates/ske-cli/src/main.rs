//! SKE CLI
//!
//! Symmetric key encryption for files: key generation, encrypt, decrypt.

mod config;
mod keyfile;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ske_crypto::{Iv, KeyPair, derive_key_pair};
use ske_files::{BufferedMapper, FileCipher, FileError, MmapMapper};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use config::{Backend, Config, LoggingConfig};
use keyfile::{read_key_file, write_key_file};
use output::{file_size, format_bytes};

/// SKE - authenticated symmetric encryption for files
#[derive(Parser)]
#[command(name = "ske")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path [default: <config dir>/ske/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair, random or derived from an entropy file
    Keygen {
        /// Output key file
        #[arg(short, long)]
        output: PathBuf,

        /// Derive the key pair from the contents of this file
        #[arg(short, long)]
        entropy_file: Option<PathBuf>,
    },

    /// Encrypt a file
    Encrypt {
        /// Key file
        #[arg(short, long)]
        key: PathBuf,

        /// Plaintext file
        #[arg(short, long)]
        input: PathBuf,

        /// Encrypted output file
        #[arg(short, long)]
        output: PathBuf,

        /// Header bytes to keep in front of the envelope [default: files.header_len]
        #[arg(long)]
        offset: Option<u64>,

        /// Fixed IV as 32 hex characters (random if omitted)
        #[arg(long)]
        iv: Option<String>,

        /// Region mapping backend [default: files.backend]
        #[arg(long, value_enum)]
        backend: Option<Backend>,
    },

    /// Decrypt a file
    Decrypt {
        /// Key file
        #[arg(short, long)]
        key: PathBuf,

        /// Encrypted file
        #[arg(short, long)]
        input: PathBuf,

        /// Plaintext output file
        #[arg(short, long)]
        output: PathBuf,

        /// Header bytes in front of the envelope [default: files.header_len]
        #[arg(long)]
        offset: Option<u64>,

        /// Region mapping backend [default: files.backend]
        #[arg(long, value_enum)]
        backend: Option<Backend>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    if let Commands::Init { force } = cli.command {
        return init_config(&config_path, force);
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    // Validate configuration
    config.validate()?;

    init_logging(cli.verbose, &config.logging)?;
    tracing::debug!(config = %config_path.display(), "configuration loaded");

    match cli.command {
        Commands::Keygen {
            output,
            entropy_file,
        } => generate_keys(&output, entropy_file.as_deref(), &config),
        Commands::Encrypt {
            key,
            input,
            output,
            offset,
            iv,
            backend,
        } => {
            let offset = offset.unwrap_or(config.files.header_len);
            let backend = backend.unwrap_or(config.files.backend);
            encrypt(&key, &input, &output, offset, iv.as_deref(), backend)
        }
        Commands::Decrypt {
            key,
            input,
            output,
            offset,
            backend,
        } => {
            let offset = offset.unwrap_or(config.files.header_len);
            let backend = backend.unwrap_or(config.files.backend);
            decrypt(&key, &input, &output, offset, backend)
        }
        Commands::Init { .. } => Ok(()),
    }
}

/// Initialize tracing from `--verbose`, `RUST_LOG`, and the logging config
fn init_logging(verbose: bool, logging: &LoggingConfig) -> anyhow::Result<()> {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging.level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Write the default configuration to `path`
fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Generate a key pair and save it to `output`
fn generate_keys(
    output: &Path,
    entropy_file: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let keys = match entropy_file {
        Some(path) => {
            let entropy = Zeroizing::new(
                std::fs::read(path)
                    .with_context(|| format!("failed to read entropy file {}", path.display()))?,
            );
            let secret = config.derivation_key()?;
            tracing::info!(entropy_bytes = entropy.len(), "deriving key pair");
            derive_key_pair(Some(entropy.as_slice()), &secret)?
        }
        None => {
            tracing::info!("generating random key pair");
            KeyPair::generate()?
        }
    };

    write_key_file(output, &keys)?;

    println!("Key pair saved to: {}", output.display());
    println!("\nKeep this file secure! Anyone holding it can read and forge your files.");
    Ok(())
}

/// Encrypt `input` into `output`
fn encrypt(
    key: &Path,
    input: &Path,
    output: &Path,
    offset: u64,
    iv: Option<&str>,
    backend: Backend,
) -> anyhow::Result<()> {
    let keys = read_key_file(key)?;
    let iv = iv.map(parse_iv).transpose()?;

    let result = match backend {
        Backend::Mmap => {
            FileCipher::new(MmapMapper).encrypt_file(output, input, &keys, iv.as_ref(), offset)
        }
        Backend::Buffered => {
            FileCipher::new(BufferedMapper).encrypt_file(output, input, &keys, iv.as_ref(), offset)
        }
    };
    result.with_context(|| format!("failed to encrypt {}", input.display()))?;

    println!(
        "Encrypted {} ({}) -> {} ({})",
        input.display(),
        format_bytes(file_size(input)),
        output.display(),
        format_bytes(file_size(output))
    );
    Ok(())
}

/// Decrypt `input` into `output`
fn decrypt(
    key: &Path,
    input: &Path,
    output: &Path,
    offset: u64,
    backend: Backend,
) -> anyhow::Result<()> {
    let keys = read_key_file(key)?;

    let result = match backend {
        Backend::Mmap => FileCipher::new(MmapMapper).decrypt_file(output, input, &keys, offset),
        Backend::Buffered => {
            FileCipher::new(BufferedMapper).decrypt_file(output, input, &keys, offset)
        }
    };

    result.map_err(|err: FileError| {
        if err.is_authentication_failure() {
            anyhow::anyhow!(
                "{} failed authentication: wrong key or modified file; nothing was written",
                input.display()
            )
        } else {
            anyhow::Error::new(err).context(format!("failed to decrypt {}", input.display()))
        }
    })?;

    println!(
        "Decrypted {} -> {} ({})",
        input.display(),
        output.display(),
        format_bytes(file_size(output))
    );
    Ok(())
}

fn parse_iv(hex_iv: &str) -> anyhow::Result<Iv> {
    let bytes = hex::decode(hex_iv).context("IV is not valid hex")?;
    Ok(Iv::from_slice(&bytes)?)
}
