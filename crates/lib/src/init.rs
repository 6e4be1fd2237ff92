//! Initialize the configuration directory: create ~/.torcida, a default config, and the bundled catalog.
//!
//! `crates/lib/config/catalog.json` is copied to `~/.torcida/catalog.json`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;

pub static BUNDLED_CATALOG: &str = include_str!("../config/catalog.json");

/// Ensure the configuration directory has been initialized (config file and catalog exist).
pub fn require_initialized(config_path: &Path, config: &config::Config) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `torcida init` first (config file not found: {})",
            config_path.display()
        );
    }
    let catalog = config::resolve_catalog_path(config, config_path);
    if !catalog.exists() {
        anyhow::bail!(
            "configuration not initialized; run `torcida init` first (catalog not found: {})",
            catalog.display()
        );
    }
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// - Writes `config.json` with `{}` if missing.
/// - Seeds `catalog.json` from the bundled catalog if missing.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let catalog = config_dir.join("catalog.json");
    if !catalog.exists() {
        std::fs::write(&catalog, BUNDLED_CATALOG)
            .with_context(|| format!("writing catalog to {}", catalog.display()))?;
        log::info!("wrote bundled catalog to {}", catalog.display());
    } else {
        log::debug!("catalog already exists at {}, skipping", catalog.display());
    }

    Ok(config_dir.to_path_buf())
}
