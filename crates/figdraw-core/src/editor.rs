//! Editing session state: document, selection and history in one place.
//!
//! Every mutation goes through [`Editor::apply`], which runs the command
//! against the live document and records it for undo.

use tracing::debug;

use crate::codec::{self, CodecError};
use crate::command::{Action, Command, CommandError};
use crate::config::EditorConfig;
use crate::document::{Document, DocumentError};
use crate::history::History;
use crate::selection::Selection;
use crate::shapes::{Shape, ShapeId, ShapePatch};

/// Interaction reported back by the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A shape was clicked
    ShapeClicked(ShapeId),
    /// Empty canvas was clicked
    CanvasClicked,
    /// A shape was dropped at a new position
    DragEnded { shape_id: ShapeId, x: f64, y: f64 },
}

/// Main editing state
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    selection: Selection,
    history: History,
    author: Option<String>,
}

impl Editor {
    /// Wrap a document with a default-sized history
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: Selection::new(),
            history: History::default(),
            author: None,
        }
    }

    /// Wrap a document using the configured history size and author
    pub fn with_config(document: Document, config: &EditorConfig) -> Self {
        Self {
            document,
            selection: Selection::new(),
            history: History::new(config.max_history),
            author: config.author.clone(),
        }
    }

    /// Start a session on a fresh document sized per `config`
    pub fn from_config(name: impl Into<String>, config: &EditorConfig) -> crate::Result<Self> {
        config.validate()?;
        let document = config.blank_document(name)?;
        Ok(Self::with_config(document, config))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Replace the document wholesale, dropping selection and history
    pub fn load_document(&mut self, document: Document) {
        debug!(document = %document.id(), version = document.version(), "loaded document");
        self.document = document;
        self.selection.clear();
        self.history.clear();
    }

    /// Replace the document with a new empty one
    pub fn new_document(
        &mut self,
        name: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Result<(), DocumentError> {
        self.load_document(Document::with_size(name, width, height)?);
        Ok(())
    }

    /// Parse serialized text and load it
    pub fn open(&mut self, text: &str) -> Result<(), CodecError> {
        let document = codec::deserialize(text)?;
        self.load_document(document);
        Ok(())
    }

    /// Serialize the current document
    pub fn save(&self) -> Result<String, CodecError> {
        codec::serialize(&self.document)
    }

    // --- Mutations ---

    /// Execute an action against the document and record it for undo
    pub fn apply(&mut self, action: Action) -> Result<(), CommandError> {
        let mut command = Command::new(action);
        if let Some(author) = &self.author {
            command = command.with_author(author.clone());
        }
        command.execute(&mut self.document)?;
        self.history.record(command);
        Ok(())
    }

    /// Append a shape to the top of the display order
    pub fn add_shape(&mut self, shape: Shape) -> Result<ShapeId, CommandError> {
        let id = shape.id.clone();
        self.apply(Action::create(shape))?;
        Ok(id)
    }

    pub fn update_shape(&mut self, id: ShapeId, patch: ShapePatch) -> Result<(), CommandError> {
        self.apply(Action::update(id, patch))
    }

    /// Delete a shape and drop it from the selection
    pub fn delete_shape(&mut self, id: ShapeId) -> Result<(), CommandError> {
        self.apply(Action::delete(id.clone()))?;
        self.selection.remove(&id);
        Ok(())
    }

    pub fn move_shape(&mut self, id: ShapeId, x: f64, y: f64) -> Result<(), CommandError> {
        self.apply(Action::move_to(id, x, y))
    }

    /// Run several actions as one undoable step
    pub fn apply_batch(&mut self, actions: Vec<Action>) -> Result<(), CommandError> {
        self.apply(Action::batch(actions))
    }

    /// Delete every selected shape as one undoable step.
    ///
    /// Selected ids whose shapes are gone are dropped first. Returns the
    /// number of shapes deleted.
    pub fn delete_selection(&mut self) -> Result<usize, CommandError> {
        self.prune_selection();
        if self.selection.is_empty() {
            return Ok(0);
        }
        // topmost first, so each captured index is still valid on the way back
        let mut targets: Vec<(usize, ShapeId)> = Vec::with_capacity(self.selection.len());
        for id in self.selection.iter() {
            let idx = self
                .document
                .shape_index(id)
                .ok_or_else(|| CommandError::ShapeNotFound(id.clone()))?;
            targets.push((idx, id.clone()));
        }
        targets.sort_by(|a, b| b.0.cmp(&a.0));

        let count = targets.len();
        let actions = targets.into_iter().map(|(_, id)| Action::delete(id)).collect();
        self.apply_batch(actions)?;
        self.selection.clear();
        Ok(count)
    }

    // --- History ---

    /// Undo the last command. `Ok(false)` means there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        self.history.undo(&mut self.document)
    }

    /// Redo the last undone command. `Ok(false)` means there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        self.history.redo(&mut self.document)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Selection ---

    pub fn select_shape(&mut self, id: ShapeId) {
        self.selection.select_only(id);
    }

    pub fn select_shapes(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.selection.select_many(ids);
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Drop selected ids whose shapes no longer exist
    pub fn prune_selection(&mut self) {
        self.selection.retain_existing(&self.document);
    }

    /// Translate a renderer interaction into selection changes or commands
    pub fn handle_event(&mut self, event: CanvasEvent) -> Result<(), CommandError> {
        match event {
            CanvasEvent::ShapeClicked(id) => {
                self.select_shape(id);
                Ok(())
            }
            CanvasEvent::CanvasClicked => {
                self.deselect_all();
                Ok(())
            }
            CanvasEvent::DragEnded { shape_id, x, y } => self.move_shape(shape_id, x, y),
        }
    }
}
