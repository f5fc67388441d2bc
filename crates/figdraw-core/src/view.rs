//! Read-only render cache.
//!
//! The renderer reads shapes and selection from a [`ShapeView`] rather
//! than the live document. `sync` rebuilds the cache only when the
//! document version (or identity) or the selection has moved on.

use std::collections::HashMap;

use crate::document::{Document, DocumentId};
use crate::selection::Selection;
use crate::shapes::{Shape, ShapeId};

#[derive(Debug, Clone, Default)]
pub struct ShapeView {
    /// Cached shapes in render order
    shapes: Vec<Shape>,
    /// Fast lookup by ID
    by_id: HashMap<ShapeId, usize>,
    selection: Selection,
    /// Document and version the cache was built from
    source: Option<(DocumentId, u64)>,
}

impl ShapeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cache up to date. Returns true if the renderer should redraw.
    pub fn sync(&mut self, document: &Document, selection: &Selection) -> bool {
        let source = (document.id().clone(), document.version());
        let shapes_changed = self.source.as_ref() != Some(&source);
        if shapes_changed {
            self.rebuild(document);
            self.source = Some(source);
        }

        let selection_changed = &self.selection != selection;
        if selection_changed {
            self.selection = selection.clone();
        }

        shapes_changed || selection_changed
    }

    fn rebuild(&mut self, document: &Document) {
        self.shapes.clear();
        self.by_id.clear();
        for shape in document.shapes() {
            self.by_id.insert(shape.id.clone(), self.shapes.len());
            self.shapes.push(shape.clone());
        }
    }

    /// Iterate all shapes in render order
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// Shapes that should actually be drawn
    pub fn visible(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.visible)
    }

    /// Get shape by ID
    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.by_id.get(id).map(|&idx| &self.shapes[idx])
    }

    pub fn is_selected(&self, id: &ShapeId) -> bool {
        self.selection.contains(id)
    }

    /// Selected shapes that exist, in render order
    pub fn selected(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| self.selection.contains(&s.id))
    }

    /// Version of the document the cache reflects
    pub fn version(&self) -> Option<u64> {
        self.source.as_ref().map(|(_, version)| *version)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
