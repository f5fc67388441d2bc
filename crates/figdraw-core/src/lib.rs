//! figdraw-core: the editing core of a vector-graphics editor.
//!
//! Shapes live in a versioned [`Document`]. They change only through
//! reversible [`Command`]s, which an [`Editor`] executes and records in a
//! bounded [`History`] for undo/redo. The [`codec`] turns documents into
//! text and back.

pub mod artboards;
pub mod codec;
pub mod command;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod selection;
pub mod shapes;
pub mod view;

pub use artboards::{Artboard, ArtboardId};
pub use codec::{CodecError, FILE_EXTENSION, deserialize, serialize};
pub use command::{Action, Command, CommandError, CommandId, CommandType, ErrorClass};
pub use config::{ConfigError, EditorConfig};
pub use document::{Document, DocumentError, DocumentId};
pub use editor::{CanvasEvent, Editor};
pub use error::{Error, Result};
pub use history::History;
pub use selection::Selection;
pub use shapes::{
    FontWeight, Shape, ShapeId, ShapeKind, ShapePatch, ShapeType, TextAlign, ValidationReport,
    VerticalAlign, create_circle, create_rectangle, create_shape, create_text, validate_shape,
};
pub use view::ShapeView;
