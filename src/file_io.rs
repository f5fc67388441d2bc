use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figdraw_core::{Document, codec};
use tracing::debug;

/// Load a document from a saved file
pub fn load_document(path: &Path) -> Result<Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read from {:?}", path))?;
    let document =
        codec::deserialize(&content).with_context(|| format!("Failed to parse {:?}", path))?;
    debug!(path = ?path, shapes = document.shapes().len(), "loaded document");
    Ok(document)
}

/// Save a document, creating parent directories as needed
pub fn save_document(document: &Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let content = codec::serialize(document)?;
    fs::write(path, content).with_context(|| format!("Failed to save to {:?}", path))?;
    debug!(path = ?path, version = document.version(), "saved document");
    Ok(())
}

/// Where `new` writes when no output path is given: `<dir>/<name>.figma-clone.json`
pub fn default_path(dir: &Path, document: &Document) -> PathBuf {
    dir.join(codec::default_file_name(document))
}
