// src/pipeline/validate.rs

//! Configuration validation pipeline.

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Credentials};

/// Validate the configuration and credentials without touching the API.
pub fn run_validate(config: &Config, credentials_path: &Path) -> Result<()> {
    config.validate()?;
    log::info!("Configuration OK");

    Credentials::load(credentials_path)?;
    log::info!("Credentials OK ({})", credentials_path.display());

    Ok(())
}
