//! The set of shape ids the user has selected.
//!
//! Referential integrity is not enforced here: ids may go stale when a shape
//! disappears through undo. Callers prune with [`Selection::retain_existing`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::shapes::ShapeId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    shape_ids: BTreeSet<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single shape
    pub fn select_only(&mut self, id: ShapeId) {
        self.shape_ids.clear();
        self.shape_ids.insert(id);
    }

    /// Replace the selection with the given shapes
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.shape_ids = ids.into_iter().collect();
    }

    /// Add a shape to the selection
    pub fn add(&mut self, id: ShapeId) -> bool {
        self.shape_ids.insert(id)
    }

    pub fn remove(&mut self, id: &ShapeId) -> bool {
        self.shape_ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.shape_ids.clear();
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shape_ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeId> {
        self.shape_ids.iter()
    }

    pub fn len(&self) -> usize {
        self.shape_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape_ids.is_empty()
    }

    /// Drop ids that no longer exist in `document`
    pub fn retain_existing(&mut self, document: &Document) {
        self.shape_ids.retain(|id| document.contains_shape(id));
    }
}
