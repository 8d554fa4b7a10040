use std::path::Path;

use tracing::info;

use crate::config::model::Config;
use crate::config::save::save_config;
use crate::error::{FtpVaultError, Result};

/// Writes a starter config; an existing file is kept unless `force` is set.
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(FtpVaultError::message(format!(
            "{} already exists; use --force to overwrite",
            config_path.display()
        )));
    }
    save_config(config_path, &Config::starter())?;
    info!("wrote starter config to {}", config_path.display());
    println!("Created {}", config_path.display());
    Ok(())
}
