mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

const APP_DIR: &str = "golf-swing-sim";

/// Per-user settings directory, e.g. `~/.config/golf-swing-sim/`. Created on demand.
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("no platform config directory")?
        .join(APP_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Where the host keeps the most recent shot.
pub fn last_shot_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("last_shot.toml"))
}

/// Load and validate the user's config. A missing file yields defaults.
pub fn load_config() -> Result<AppConfig> {
    load_from(&config_path()?)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_to(&config_path()?, config)
}

fn load_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!(?path, "No config file, using defaults");
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)?;
    config.validate()?;
    info!(?path, "Loaded config");
    Ok(config)
}

fn save_to(path: &Path, config: &AppConfig) -> Result<()> {
    config.validate()?;
    std::fs::write(path, toml::to_string_pretty(config)?)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(?path, "Saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{APP_DIR}-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("config.toml")
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = scratch("missing");
        let _ = std::fs::remove_file(&path);
        assert_eq!(load_from(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn save_then_load() {
        let path = scratch("roundtrip");
        let mut config = AppConfig::default();
        config.club.length_m = 1.05;
        config.imu.grip = GripMode::EdgeFirst;
        save_to(&path, &config).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let path = scratch("invalid");
        std::fs::write(&path, "[physics]\ngravity = 0.0\n").unwrap();
        assert!(load_from(&path).is_err());

        let mut config = AppConfig::default();
        config.ball.weight_g = -1.0;
        assert!(save_to(&path, &config).is_err());
    }
}
