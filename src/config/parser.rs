//! TOML parsing with file path context.
//!
//! ```rust,no_run
//! use docweave::config::{SiteConfig, parse_config};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config: SiteConfig = parse_config(Path::new("docs/docweave.toml"))?;
//! println!("Building '{}'", config.site_title());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML file into `T`.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read or does not deserialize
/// into `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = toml::from_str(&content)
        .map_err(crate::core::DocError::from)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
