//! Reversible mutations of the shape collection.
//!
//! An [`Action`] is a closed set of payloads interpreted by two pure
//! functions: `apply` computes the next shape collection (capturing what is
//! needed to invert it) and `revert` computes the inverse. A [`Command`]
//! wraps an action with its identity and applies it to whatever
//! [`Document`] it is handed at call time; nothing is bound at construction.
//! A failing step commits nothing, so the document is either fully updated
//! or left exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::codec::timestamp;
use crate::document::{self, Document};
use crate::shapes::{Shape, ShapeId, ShapePatch, validate_shape};

/// Command type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Update,
    Delete,
    Move,
    Batch,
}

impl CommandType {
    pub fn name(self) -> &'static str {
        match self {
            CommandType::Create => "create",
            CommandType::Update => "update",
            CommandType::Delete => "delete",
            CommandType::Move => "move",
            CommandType::Batch => "batch",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a failure should be treated by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input; recoverable by fixing the request
    Validation,
    /// The command protocol was misused (undo out of order, stale id)
    InvariantViolation,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("shape {0} not found")]
    ShapeNotFound(ShapeId),

    #[error("shape {0} already exists")]
    DuplicateShape(ShapeId),

    #[error("invalid shape: {}", .0.join("; "))]
    InvalidShape(Vec<String>),

    #[error("cannot undo {0} command: it is not currently applied")]
    NotApplied(CommandType),

    #[error("cannot apply {0} command: it is already applied")]
    AlreadyApplied(CommandType),

    #[error("history entry {0} is missing")]
    MissingHistoryEntry(usize),
}

impl CommandError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CommandError::DuplicateShape(_) | CommandError::InvalidShape(_) => ErrorClass::Validation,
            CommandError::ShapeNotFound(_)
            | CommandError::NotApplied(_)
            | CommandError::AlreadyApplied(_)
            | CommandError::MissingHistoryEntry(_) => ErrorClass::InvariantViolation,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        self.class() == ErrorClass::InvariantViolation
    }
}

/// A captured x/y position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A shape removed by a delete, with its position in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedShape {
    pub index: usize,
    pub shape: Shape,
}

/// Command payloads. The `Option` fields are the captures filled in by the
/// first successful application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Action {
    Create {
        shape: Shape,
    },
    Update {
        shape_id: ShapeId,
        patch: ShapePatch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous: Option<Shape>,
    },
    Delete {
        shape_id: ShapeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        removed: Option<RemovedShape>,
    },
    Move {
        shape_id: ShapeId,
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous: Option<Point>,
    },
    Batch {
        actions: Vec<Action>,
    },
}

fn find(shapes: &[Shape], id: &ShapeId) -> Result<usize, CommandError> {
    shapes
        .iter()
        .position(|s| &s.id == id)
        .ok_or_else(|| CommandError::ShapeNotFound(id.clone()))
}

fn ensure_valid(shape: &Shape) -> Result<(), CommandError> {
    let report = validate_shape(shape);
    if report.valid {
        Ok(())
    } else {
        Err(CommandError::InvalidShape(report.errors))
    }
}

impl Action {
    pub fn create(shape: Shape) -> Self {
        Action::Create { shape }
    }

    pub fn update(shape_id: ShapeId, patch: ShapePatch) -> Self {
        Action::Update { shape_id, patch, previous: None }
    }

    pub fn delete(shape_id: ShapeId) -> Self {
        Action::Delete { shape_id, removed: None }
    }

    pub fn move_to(shape_id: ShapeId, x: f64, y: f64) -> Self {
        Action::Move { shape_id, x, y, previous: None }
    }

    pub fn batch(actions: Vec<Action>) -> Self {
        Action::Batch { actions }
    }

    pub fn command_type(&self) -> CommandType {
        match self {
            Action::Create { .. } => CommandType::Create,
            Action::Update { .. } => CommandType::Update,
            Action::Delete { .. } => CommandType::Delete,
            Action::Move { .. } => CommandType::Move,
            Action::Batch { .. } => CommandType::Batch,
        }
    }

    /// Forward step: compute the next collection and capture prior state
    fn apply(&mut self, shapes: &[Shape]) -> Result<Vec<Shape>, CommandError> {
        match self {
            Action::Create { shape } => {
                ensure_valid(shape)?;
                if shapes.iter().any(|s| s.id == shape.id) {
                    return Err(CommandError::DuplicateShape(shape.id.clone()));
                }
                let mut next = shapes.to_vec();
                next.push(shape.clone());
                Ok(next)
            }
            Action::Update { shape_id, patch, previous } => {
                let idx = find(shapes, shape_id)?;
                let prior = shapes[idx].clone();
                let mut merged = prior.clone();
                patch.apply_to(&mut merged);
                ensure_valid(&merged)?;

                let mut next = shapes.to_vec();
                next[idx] = merged;
                *previous = Some(prior);
                Ok(next)
            }
            Action::Delete { shape_id, removed } => {
                let idx = find(shapes, shape_id)?;
                let mut next = shapes.to_vec();
                let shape = next.remove(idx);
                *removed = Some(RemovedShape { index: idx, shape });
                Ok(next)
            }
            Action::Move { shape_id, x, y, previous } => {
                let idx = find(shapes, shape_id)?;
                let mut errors = Vec::new();
                if !x.is_finite() {
                    errors.push("Shape x must be a valid number".to_string());
                }
                if !y.is_finite() {
                    errors.push("Shape y must be a valid number".to_string());
                }
                if !errors.is_empty() {
                    return Err(CommandError::InvalidShape(errors));
                }

                let mut next = shapes.to_vec();
                let shape = &mut next[idx];
                *previous = Some(Point { x: shape.x, y: shape.y });
                shape.x = *x;
                shape.y = *y;
                Ok(next)
            }
            Action::Batch { actions } => {
                let mut current = shapes.to_vec();
                for action in actions.iter_mut() {
                    current = action.apply(&current)?;
                }
                Ok(current)
            }
        }
    }

    /// Inverse step, driven by the captured prior state
    fn revert(&self, shapes: &[Shape]) -> Result<Vec<Shape>, CommandError> {
        let not_applied = || CommandError::NotApplied(self.command_type());
        match self {
            Action::Create { shape } => {
                let idx = find(shapes, &shape.id)?;
                let mut next = shapes.to_vec();
                next.remove(idx);
                Ok(next)
            }
            Action::Update { shape_id, previous, .. } => {
                let prior = previous.as_ref().ok_or_else(not_applied)?;
                let idx = find(shapes, shape_id)?;
                let mut next = shapes.to_vec();
                next[idx] = prior.clone();
                Ok(next)
            }
            Action::Delete { shape_id, removed } => {
                let removed = removed.as_ref().ok_or_else(not_applied)?;
                if shapes.iter().any(|s| &s.id == shape_id) {
                    return Err(CommandError::DuplicateShape(shape_id.clone()));
                }
                let mut next = shapes.to_vec();
                let idx = removed.index.min(next.len());
                next.insert(idx, removed.shape.clone());
                Ok(next)
            }
            Action::Move { shape_id, previous, .. } => {
                let prior = (*previous).ok_or_else(not_applied)?;
                let idx = find(shapes, shape_id)?;
                let mut next = shapes.to_vec();
                next[idx].x = prior.x;
                next[idx].y = prior.y;
                Ok(next)
            }
            Action::Batch { actions } => {
                let mut current = shapes.to_vec();
                for action in actions.iter().rev() {
                    current = action.revert(&current)?;
                }
                Ok(current)
            }
        }
    }

    /// Ids of every shape this action touches
    pub fn shape_ids(&self) -> Vec<&ShapeId> {
        match self {
            Action::Create { shape } => vec![&shape.id],
            Action::Update { shape_id, .. }
            | Action::Delete { shape_id, .. }
            | Action::Move { shape_id, .. } => vec![shape_id],
            Action::Batch { actions } => actions.iter().flat_map(Action::shape_ids).collect(),
        }
    }
}

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reversible unit of mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    id: CommandId,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    /// Whether the forward effect is currently in the document
    #[serde(default)]
    applied: bool,
    action: Action,
}

impl Command {
    pub fn new(action: Action) -> Self {
        Self {
            id: CommandId::new(),
            created_at: document::now(),
            author: None,
            applied: false,
            action,
        }
    }

    pub fn create(shape: Shape) -> Self {
        Self::new(Action::create(shape))
    }

    pub fn update(shape_id: ShapeId, patch: ShapePatch) -> Self {
        Self::new(Action::update(shape_id, patch))
    }

    pub fn delete(shape_id: ShapeId) -> Self {
        Self::new(Action::delete(shape_id))
    }

    pub fn move_to(shape_id: ShapeId, x: f64, y: f64) -> Self {
        Self::new(Action::move_to(shape_id, x, y))
    }

    pub fn batch(actions: Vec<Action>) -> Self {
        Self::new(Action::batch(actions))
    }

    /// Tag the command with the id of the user who issued it
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn id(&self) -> &CommandId {
        &self.id
    }

    pub fn command_type(&self) -> CommandType {
        self.action.command_type()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Apply the forward effect to `doc` and capture what undo needs.
    ///
    /// Captures are only kept if the whole step succeeds. Fails if the
    /// command is already applied, leaving its captures untouched.
    pub fn execute(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        if self.applied {
            return Err(CommandError::AlreadyApplied(self.command_type()));
        }
        let mut staged = self.action.clone();
        let next = staged.apply(doc.shapes())?;
        self.action = staged;
        self.applied = true;
        doc.commit(next);
        debug!(command = %self.id, kind = %self.command_type(), version = doc.version(), "executed command");
        Ok(())
    }

    /// Apply the inverse effect to `doc`
    pub fn undo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        if !self.applied {
            return Err(CommandError::NotApplied(self.command_type()));
        }
        let next = self.action.revert(doc.shapes())?;
        self.applied = false;
        doc.commit(next);
        debug!(command = %self.id, kind = %self.command_type(), version = doc.version(), "undid command");
        Ok(())
    }

    /// Re-apply the forward effect after an undo. Every action is
    /// deterministic given its inputs, so this is a plain re-execution.
    pub fn redo(&mut self, doc: &mut Document) -> Result<(), CommandError> {
        self.execute(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{create_circle, create_rectangle};

    fn doc_with_rect() -> (Document, ShapeId) {
        let mut doc = Document::new("test");
        let rect = create_rectangle(0.0, 0.0, 100.0, 50.0, ShapePatch::new());
        let id = rect.id.clone();
        Command::create(rect).execute(&mut doc).unwrap();
        (doc, id)
    }

    #[test]
    fn create_then_undo() {
        let mut doc = Document::new("test");
        let rect = create_rectangle(0.0, 0.0, 100.0, 50.0, ShapePatch::new());
        let mut cmd = Command::create(rect.clone());

        cmd.execute(&mut doc).unwrap();
        assert_eq!(doc.shapes(), &[rect][..]);
        assert_eq!(doc.version(), 2);

        cmd.undo(&mut doc).unwrap();
        assert!(doc.shapes().is_empty());
        assert_eq!(doc.version(), 3);
    }

    #[test]
    fn create_rejects_duplicates_and_invalid_shapes() {
        let (mut doc, id) = doc_with_rect();
        let mut dup = create_circle(0.0, 0.0, 1.0, 1.0, ShapePatch::new());
        dup.id = id.clone();
        let err = Command::create(dup).execute(&mut doc).unwrap_err();
        assert_eq!(err, CommandError::DuplicateShape(id));
        assert_eq!(err.class(), ErrorClass::Validation);

        let mut bad = create_circle(0.0, 0.0, 1.0, 1.0, ShapePatch::new());
        bad.width = -1.0;
        let err = Command::create(bad).execute(&mut doc).unwrap_err();
        assert!(matches!(err, CommandError::InvalidShape(_)));
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.shapes().len(), 1);
    }

    #[test]
    fn update_merges_and_restores_snapshot() {
        let (mut doc, id) = doc_with_rect();
        let before = doc.shape(&id).cloned().unwrap();
        let mut cmd = Command::update(id.clone(), ShapePatch::new().with_fill("#ff0000").with_opacity(0.25));

        cmd.execute(&mut doc).unwrap();
        let after = doc.shape(&id).unwrap();
        assert_eq!(after.fill(), Some("#ff0000"));
        assert_eq!(after.opacity, 0.25);
        assert_eq!(after.width, before.width);

        cmd.undo(&mut doc).unwrap();
        assert_eq!(doc.shape(&id), Some(&before));
    }

    #[test]
    fn update_rejects_invalid_result() {
        let (mut doc, id) = doc_with_rect();
        let snapshot = doc.clone();
        let mut cmd = Command::update(id, ShapePatch::new().with_opacity(2.0));
        assert!(matches!(cmd.execute(&mut doc), Err(CommandError::InvalidShape(_))));
        assert_eq!(doc, snapshot);
        assert!(!cmd.is_applied());
    }

    #[test]
    fn delete_restores_original_position() {
        let (mut doc, first) = doc_with_rect();
        let circle = create_circle(0.0, 0.0, 5.0, 5.0, ShapePatch::new());
        Command::create(circle).execute(&mut doc).unwrap();
        let before = doc.shapes().to_vec();

        let mut cmd = Command::delete(first.clone());
        cmd.execute(&mut doc).unwrap();
        assert!(!doc.contains_shape(&first));

        cmd.undo(&mut doc).unwrap();
        assert_eq!(doc.shapes(), &before[..]);
    }

    #[test]
    fn move_captures_only_position() {
        let (mut doc, id) = doc_with_rect();
        let mut cmd = Command::move_to(id.clone(), 20.0, 30.0);
        cmd.execute(&mut doc).unwrap();
        assert_eq!(doc.shape(&id).map(|s| (s.x, s.y)), Some((20.0, 30.0)));

        // an unrelated edit to the same shape survives the undo
        Command::update(id.clone(), ShapePatch::new().with_fill("#000000"))
            .execute(&mut doc)
            .unwrap();
        cmd.undo(&mut doc).unwrap();
        let shape = doc.shape(&id).unwrap();
        assert_eq!((shape.x, shape.y), (0.0, 0.0));
        assert_eq!(shape.fill(), Some("#000000"));
    }

    #[test]
    fn move_rejects_non_finite_coordinates() {
        let (mut doc, id) = doc_with_rect();
        let err = Command::move_to(id, f64::NAN, 1.0).execute(&mut doc).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn missing_shape_is_an_invariant_violation() {
        let mut doc = Document::new("empty");
        for mut cmd in [
            Command::update(ShapeId::from("nope"), ShapePatch::new()),
            Command::delete(ShapeId::from("nope")),
            Command::move_to(ShapeId::from("nope"), 1.0, 1.0),
        ] {
            let err = cmd.execute(&mut doc).unwrap_err();
            assert_eq!(err, CommandError::ShapeNotFound(ShapeId::from("nope")));
            assert!(err.is_invariant_violation());
        }
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn undo_before_execute_fails() {
        let (mut doc, id) = doc_with_rect();
        let version = doc.version();
        for mut cmd in [
            Command::create(create_circle(0.0, 0.0, 1.0, 1.0, ShapePatch::new())),
            Command::update(id.clone(), ShapePatch::new()),
            Command::delete(id.clone()),
            Command::move_to(id.clone(), 1.0, 1.0),
        ] {
            let kind = cmd.command_type();
            assert_eq!(cmd.undo(&mut doc), Err(CommandError::NotApplied(kind)));
        }
        assert_eq!(doc.version(), version);
    }

    #[test]
    fn undo_after_shape_vanished_fails_cleanly() {
        let (mut doc, id) = doc_with_rect();
        let mut mv = Command::move_to(id.clone(), 5.0, 5.0);
        mv.execute(&mut doc).unwrap();
        Command::delete(id.clone()).execute(&mut doc).unwrap();

        let snapshot = doc.clone();
        assert_eq!(mv.undo(&mut doc), Err(CommandError::ShapeNotFound(id)));
        assert_eq!(doc, snapshot);
        assert!(mv.is_applied());
    }

    #[test]
    fn redo_reapplies_forward_effect() {
        let (mut doc, id) = doc_with_rect();
        let mut cmd = Command::move_to(id.clone(), 7.0, 8.0);
        cmd.execute(&mut doc).unwrap();
        let after_execute = doc.shapes().to_vec();
        cmd.undo(&mut doc).unwrap();
        cmd.redo(&mut doc).unwrap();
        assert_eq!(doc.shapes(), &after_execute[..]);
    }

    #[test]
    fn reapplying_an_applied_command_fails() {
        let (mut doc, id) = doc_with_rect();
        let circle = create_circle(0.0, 0.0, 1.0, 1.0, ShapePatch::new());
        let circle_id = circle.id.clone();
        let commands = [
            Command::create(circle),
            Command::update(id.clone(), ShapePatch::new().with_fill("#ff0000")),
            Command::move_to(id.clone(), 20.0, 30.0),
            Command::batch(vec![Action::move_to(circle_id.clone(), 4.0, 4.0)]),
            Command::delete(circle_id.clone()),
        ];

        for mut cmd in commands {
            let before = doc.clone();
            cmd.execute(&mut doc).unwrap();
            let after = doc.clone();
            let kind = cmd.command_type();

            assert_eq!(cmd.execute(&mut doc), Err(CommandError::AlreadyApplied(kind)));
            assert_eq!(cmd.redo(&mut doc), Err(CommandError::AlreadyApplied(kind)));
            assert!(CommandError::AlreadyApplied(kind).is_invariant_violation());
            assert_eq!(doc, after);

            // captures from the first execution still drive the undo
            cmd.undo(&mut doc).unwrap();
            assert_eq!(doc.shapes(), before.shapes());
            cmd.redo(&mut doc).unwrap();
            assert_eq!(doc.shapes(), after.shapes());
        }
    }

    #[test]
    fn batch_is_atomic() {
        let (mut doc, id) = doc_with_rect();
        let snapshot = doc.clone();
        let mut cmd = Command::batch(vec![
            Action::move_to(id.clone(), 1.0, 1.0),
            Action::delete(ShapeId::from("missing")),
        ]);
        assert!(cmd.execute(&mut doc).is_err());
        assert_eq!(doc, snapshot);
        assert!(matches!(cmd.action(), Action::Batch { actions } if matches!(actions[0], Action::Move { previous: None, .. })));
    }

    #[test]
    fn batch_commits_once_and_undoes_in_reverse() {
        let (mut doc, id) = doc_with_rect();
        let before = doc.shapes().to_vec();
        let circle = create_circle(10.0, 10.0, 5.0, 5.0, ShapePatch::new());
        let circle_id = circle.id.clone();
        let mut cmd = Command::batch(vec![
            Action::create(circle),
            Action::move_to(circle_id.clone(), 50.0, 50.0),
            Action::delete(id.clone()),
        ]);

        let version = doc.version();
        cmd.execute(&mut doc).unwrap();
        assert_eq!(doc.version(), version + 1);
        assert_eq!(doc.shapes().len(), 1);
        assert_eq!(doc.shape(&circle_id).map(|s| s.x), Some(50.0));

        cmd.undo(&mut doc).unwrap();
        assert_eq!(doc.shapes(), &before[..]);
        assert_eq!(cmd.action().shape_ids().len(), 3);
    }

    #[test]
    fn author_and_log_serialization() {
        let (mut doc, id) = doc_with_rect();
        let mut cmd = Command::move_to(id, 3.0, 4.0).with_author("user-1");
        cmd.execute(&mut doc).unwrap();
        assert_eq!(cmd.author(), Some("user-1"));

        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"]["type"], "move");
        assert_eq!(value["action"]["previous"]["x"], 0.0);
        let back: Command = serde_json::from_value(value).unwrap();
        assert_eq!(back, cmd);
    }
}
