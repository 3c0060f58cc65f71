use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Environment variable overriding the logbook's home directory
pub const HOME_ENV: &str = "CIVICLOG_HOME";

/// File name of the durable store inside the logbook home
pub const STORE_FILE: &str = "store.json";

/// Resolves the durable store location
///
/// `CIVICLOG_HOME` wins when set; otherwise the store lives under
/// `~/.civiclog/`. The directory is created lazily by the first write.
pub fn determine_store_path() -> Result<PathBuf> {
    if let Ok(home) = env::var(HOME_ENV) {
        return Ok(PathBuf::from(home).join(STORE_FILE));
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home_dir.join(".civiclog").join(STORE_FILE))
}
