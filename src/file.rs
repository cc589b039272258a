//! Whole-file reads and writes with path-annotated errors.

use std::path::Path;

use crate::error::EzcfgError;

pub fn read_config(path: &Path) -> Result<String, EzcfgError> {
    let content = std::fs::read_to_string(path).map_err(|e| EzcfgError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "read config file");
    Ok(content)
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_config(path: &Path, content: &str) -> Result<(), EzcfgError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| EzcfgError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| EzcfgError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote config file");
    Ok(())
}
