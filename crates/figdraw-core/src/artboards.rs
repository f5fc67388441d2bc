//! Artboard types for framing groups of shapes in the document.
//!
//! Artboards are named rectangular regions that reference shapes by id.
//! They carry no mutation logic of their own; the command engine only
//! ever rewrites the shape sequence.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shapes::ShapeId;

/// Artboard identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtboardId(pub String);

impl ArtboardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ArtboardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArtboardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame grouping shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artboard {
    pub id: ArtboardId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default)]
    pub shape_ids: Vec<ShapeId>,
}

impl Artboard {
    pub fn new(name: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: ArtboardId::new(),
            name: name.into(),
            x,
            y,
            width,
            height,
            background_color: Some("#ffffff".to_string()),
            shape_ids: Vec::new(),
        }
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Attach a shape (no-op if already attached)
    pub fn attach(&mut self, id: ShapeId) {
        if !self.shape_ids.contains(&id) {
            self.shape_ids.push(id);
        }
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shape_ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_is_idempotent() {
        let mut board = Artboard::new("Frame 1", 0.0, 0.0, 375.0, 812.0);
        let id = ShapeId::from("a");
        board.attach(id.clone());
        board.attach(id.clone());
        assert_eq!(board.shape_ids, vec![id.clone()]);
        assert!(board.contains(&id));
        assert_eq!(board.background_color.as_deref(), Some("#ffffff"));
    }
}
