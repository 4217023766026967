//! Environment status command.

use std::io::Write;

use frontieres_storefront::config::StorefrontConfig;

/// Print which remote services are configured, as JSON booleans.
///
/// # Errors
///
/// Returns an error if the environment cannot be loaded.
pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let json = serde_json::to_string_pretty(&config.status())?;
    let _ = writeln!(std::io::stdout().lock(), "{json}");
    Ok(())
}
