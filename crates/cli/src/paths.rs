use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Environment variable naming the data directory when the config does not.
pub const DATA_DIR_ENV: &str = "PLANAR_BRIDGE_DIR";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PLANAR_BRIDGE_CONFIG";

const APP_DIR: &str = "planar-bridge";

/// Data directory: flag, then config, then environment, then the platform
/// data directory.
pub fn resolve_data_dir(
    flag: Option<&Path>,
    env: Option<&str>,
    configured: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(value));
    }
    match dirs::data_dir() {
        Some(base) => Ok(base.join(APP_DIR)),
        None => bail!("No data directory given and no platform data directory available"),
    }
}

/// Config file, if any: flag, then environment, then `config.toml` in the
/// platform config directory when it exists.
pub fn resolve_config_path(flag: Option<&Path>, env: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    dirs::config_dir()
        .map(|base| base.join(APP_DIR).join("config.toml"))
        .filter(|path| path.exists())
}
