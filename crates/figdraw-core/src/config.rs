//! Editor configuration.
//!
//! Every field is optional when deserialized. Locating and reading the
//! config file is left to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_WIDTH, Document, DocumentError};
use crate::history::DEFAULT_MAX_SIZE;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_history must be at least 1")]
    ZeroHistory,

    #[error("invalid default canvas: {0}")]
    Canvas(#[from] DocumentError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of commands kept for undo
    pub max_history: usize,
    pub default_width: f64,
    pub default_height: f64,
    pub background_color: String,
    /// Stamped onto every command issued by this editor
    pub author: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_SIZE,
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            background_color: DEFAULT_BACKGROUND.to_string(),
            author: None,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        self.blank_document("")?;
        Ok(())
    }

    /// Empty document using the configured canvas size and background
    pub fn blank_document(&self, name: impl Into<String>) -> Result<Document, DocumentError> {
        Ok(Document::with_size(name, self.default_width, self.default_height)?
            .with_background(self.background_color.clone()))
    }
}
