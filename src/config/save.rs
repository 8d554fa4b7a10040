use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::config::model::Config;
use crate::error::{FtpVaultError, Result};

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let data = serde_yaml::to_string(cfg)
        .map_err(|e| FtpVaultError::message(format!("encode config: {}", e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            FtpVaultError::message(format!("create {}: {}", parent.display(), e))
        })?;
    }
    let mut file = File::create(path)
        .map_err(|e| FtpVaultError::message(format!("write config {}: {}", path.display(), e)))?;
    file.write_all(data.as_bytes())
        .map_err(|e| FtpVaultError::message(format!("write config {}: {}", path.display(), e)))?;
    Ok(())
}
