//! The versioned document, the single source of truth for shape data.
//!
//! Shapes are only ever replaced through [`Document::commit`], which the
//! command engine calls with the collection it computed. That single writer
//! bumps `version` and refreshes `updated_at`, giving observers one change
//! signal to key off.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::artboards::{Artboard, ArtboardId};
use crate::codec::timestamp;
use crate::shapes::{Shape, ShapeId};

pub const DEFAULT_WIDTH: f64 = 1920.0;
pub const DEFAULT_HEIGHT: f64 = 1080.0;
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Current time at the precision the persisted format keeps
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Document geometry that cannot be persisted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("canvas size must be positive and finite, got {width} x {height}")]
    InvalidCanvasSize { width: f64, height: f64 },

    #[error("artboard {0} has a non-finite position or size")]
    InvalidArtboard(ArtboardId),
}

fn check_canvas_size(width: f64, height: f64) -> Result<(), DocumentError> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(DocumentError::InvalidCanvasSize { width, height })
    }
}

/// Unique identifier for a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canvas document - container for all shapes and artboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    id: DocumentId,
    name: String,
    /// Display order: later shapes draw above earlier ones
    shapes: Vec<Shape>,
    #[serde(default)]
    artboards: Vec<Artboard>,
    width: f64,
    height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    version: u64,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new empty document with the default canvas size
    pub fn new(name: impl Into<String>) -> Self {
        Self::blank(name.into(), DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a new empty document. The canvas must be positive and finite.
    pub fn with_size(name: impl Into<String>, width: f64, height: f64) -> Result<Self, DocumentError> {
        check_canvas_size(width, height)?;
        Ok(Self::blank(name.into(), width, height))
    }

    fn blank(name: String, width: f64, height: f64) -> Self {
        let created = now();
        Self {
            id: DocumentId::new(),
            name,
            shapes: Vec::new(),
            artboards: Vec::new(),
            width,
            height,
            background_color: Some(DEFAULT_BACKGROUND.to_string()),
            version: 1,
            created_at: created,
            updated_at: created,
        }
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_artboard(mut self, artboard: Artboard) -> Self {
        self.artboards.push(artboard);
        self
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// All shapes in display order
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn artboards(&self) -> &[Artboard] {
        &self.artboards
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    /// Monotonic change counter, starts at 1
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Read a single shape
    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    /// Position of a shape in display order
    pub fn shape_index(&self, id: &ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| &s.id == id)
    }

    pub fn contains_shape(&self, id: &ShapeId) -> bool {
        self.shape_index(id).is_some()
    }

    /// First id that occurs more than once, if any
    pub fn duplicate_shape_id(&self) -> Option<&ShapeId> {
        let mut seen = std::collections::HashSet::new();
        self.shapes.iter().map(|s| &s.id).find(|id| !seen.insert(*id))
    }

    /// Check the canvas and artboard geometry can be written out
    pub fn check_geometry(&self) -> Result<(), DocumentError> {
        check_canvas_size(self.width, self.height)?;
        let finite = |a: &Artboard| [a.x, a.y, a.width, a.height].iter().all(|v| v.is_finite());
        match self.artboards.iter().find(|a| !finite(a)) {
            Some(artboard) => Err(DocumentError::InvalidArtboard(artboard.id.clone())),
            None => Ok(()),
        }
    }

    /// Replace the shape collection. The only writer of `shapes`.
    pub(crate) fn commit(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
        self.version += 1;
        // never step backwards if the wall clock does
        self.updated_at = now().max(self.updated_at);
    }
}
