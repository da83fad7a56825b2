//! Configuration commands.

use std::io::Write;
use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Writes the effective configuration as TOML.
pub fn dump<W: Write>(config: &ClientConfig, path: &Path, out: &mut W) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::config(format!("failed to serialize config: {}", e)))?;
    writeln!(out, "# config.toml ({})", path.display())?;
    writeln!(out, "{}", toml_str)?;
    Ok(())
}

/// Validates the configuration.
pub fn validate<W: Write>(config: &ClientConfig, out: &mut W) -> ClientResult<()> {
    config.validate()?;
    writeln!(out, "Configuration is valid.")?;
    Ok(())
}

/// Shows the configuration file and cache directory paths.
pub fn path<W: Write>(config: &ClientConfig, path: &Path, out: &mut W) -> ClientResult<()> {
    writeln!(out, "config: {}", path.display())?;
    writeln!(out, "cache: {}", config.cache_config().dir.display())?;
    Ok(())
}
