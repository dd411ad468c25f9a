use std::env;
use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::ModgetError;

/// Locate the Minecraft data directory for the current platform
///
/// The `MODGET_DIR` environment variable overrides the platform default.
pub fn minecraft_dir() -> Result<PathBuf, ModgetError> {
    if let Some(dir) = env::var_os("MODGET_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let base = BaseDirs::new().ok_or_else(|| {
        ModgetError::MiscError("Couldn't determine the user's home directory".into())
    })?;

    // ~/Library/Application Support/minecraft
    #[cfg(target_os = "macos")]
    return Ok(base.data_dir().join("minecraft"));

    // %APPDATA%\.minecraft
    #[cfg(target_os = "windows")]
    return Ok(base.data_dir().join(".minecraft"));

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    Ok(base.home_dir().join(".minecraft"))
}

/// The directory mods for `mc_version` are installed to
pub fn mods_dir(mc_version: impl AsRef<str>) -> Result<PathBuf, ModgetError> {
    Ok(minecraft_dir()?.join("mods").join(mc_version.as_ref()))
}
