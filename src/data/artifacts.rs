//! JSON artifact output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

/// Write a JSON artifact, creating parent directories as needed.
pub fn write_json(path: &Path, data: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(data)?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote json to {}", path.display());
    Ok(())
}
