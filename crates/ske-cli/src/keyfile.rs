//! Key files: one line of 128 hex characters, `enc_key ‖ mac_key`.

use anyhow::Context;
use ske_crypto::{KEY_MATERIAL_SIZE, KeyPair};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use zeroize::Zeroizing;

/// Read a key pair from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold exactly
/// 64 hex-encoded bytes.
pub fn read_key_file(path: &Path) -> anyhow::Result<KeyPair> {
    let contents = Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("failed to read key file {}", path.display()))?,
    );
    let bytes = Zeroizing::new(
        hex::decode(contents.trim())
            .with_context(|| format!("key file {} is not valid hex", path.display()))?,
    );

    KeyPair::from_slice(&bytes).with_context(|| {
        format!(
            "key file {} must hold {KEY_MATERIAL_SIZE} bytes",
            path.display()
        )
    })
}

/// Write `keys` to `path`, readable by the owner only.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_key_file(path: &Path, keys: &KeyPair) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut encoded = Zeroizing::new(hex::encode(&*keys.to_bytes()));
    encoded.push('\n');

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create key file {}", path.display()))?;
    // An existing file keeps its old mode through open(2)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(encoded.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
