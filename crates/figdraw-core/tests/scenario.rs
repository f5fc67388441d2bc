use figdraw_core::{
    CommandError, Document, Editor, ShapeId, ShapePatch, create_rectangle, create_text, deserialize,
    serialize,
};

#[test]
fn move_undo_redo_delete_scenario() {
    let mut editor = Editor::new(Document::new("scenario"));
    let initial_version = editor.document().version();

    let rect = create_rectangle(0.0, 0.0, 100.0, 50.0, ShapePatch::new());
    assert_eq!(rect.fill(), Some("#3b82f6"));
    let a = editor.add_shape(rect).unwrap();

    editor.move_shape(a.clone(), 20.0, 30.0).unwrap();
    let after_move = editor.document().version();

    assert!(editor.undo().unwrap());
    let shape = editor.document().shape(&a).unwrap();
    assert_eq!((shape.x, shape.y), (0.0, 0.0));

    assert!(editor.redo().unwrap());
    let shape = editor.document().shape(&a).unwrap();
    assert_eq!((shape.x, shape.y), (20.0, 30.0));

    editor.delete_shape(a.clone()).unwrap();
    assert!(editor.document().shape(&a).is_none());

    assert!(editor.undo().unwrap());
    let shape = editor.document().shape(&a).unwrap();
    assert_eq!((shape.x, shape.y), (20.0, 30.0));
    assert_eq!(shape.fill(), Some("#3b82f6"));

    // undo, redo, delete, undo
    assert_eq!(editor.document().version(), after_move + 4);
    assert_eq!(editor.document().version(), initial_version + 6);
}

#[test]
fn branch_discard_after_undo() {
    let mut editor = Editor::new(Document::new("branch"));
    let ids: Vec<ShapeId> = (0..3)
        .map(|i| {
            editor
                .add_shape(create_rectangle(i as f64 * 10.0, 0.0, 5.0, 5.0, ShapePatch::new()))
                .unwrap()
        })
        .collect();

    editor.undo().unwrap();
    editor.undo().unwrap();
    assert!(editor.can_redo());

    editor.move_shape(ids[0].clone(), 99.0, 99.0).unwrap();
    assert!(!editor.can_redo());
    assert!(!editor.redo().unwrap());
    assert_eq!(editor.document().shapes().len(), 1);
    assert!(!editor.document().contains_shape(&ids[1]));
    assert!(!editor.document().contains_shape(&ids[2]));
}

#[test]
fn undo_with_nothing_to_undo_is_a_no_op() {
    let mut editor = Editor::new(Document::new("noop"));
    let version = editor.document().version();
    assert!(!editor.undo().unwrap());
    assert!(!editor.redo().unwrap());
    assert_eq!(editor.document().version(), version);
}

#[test]
fn version_and_timestamp_advance_together() {
    let mut editor = Editor::new(Document::new("ts"));
    let created = editor.document().created_at();
    let mut last = (editor.document().version(), editor.document().updated_at());

    let id = editor.add_shape(create_text(0.0, 0.0, "hi", ShapePatch::new())).unwrap();
    for step in 0..5 {
        editor.move_shape(id.clone(), step as f64, 0.0).unwrap();
        let now = (editor.document().version(), editor.document().updated_at());
        assert_eq!(now.0, last.0 + 1);
        assert!(now.1 >= last.1);
        last = now;
    }
    assert_eq!(editor.document().created_at(), created);

    // a failed command changes neither
    let err = editor.move_shape(ShapeId::from("missing"), 0.0, 0.0).unwrap_err();
    assert!(matches!(err, CommandError::ShapeNotFound(_)));
    assert_eq!(editor.document().version(), last.0);
    assert_eq!(editor.document().updated_at(), last.1);
}

#[test]
fn saved_session_reloads_identically() {
    let mut editor = Editor::new(Document::new("persist"));
    let id = editor
        .add_shape(create_rectangle(1.5, 2.5, 10.0, 20.0, ShapePatch::new().with_stroke("#111111", 2.0)))
        .unwrap();
    editor
        .update_shape(id, ShapePatch::new().with_rotation(45.0).with_opacity(0.3))
        .unwrap();

    let text = serialize(editor.document()).unwrap();
    let reloaded = deserialize(&text).unwrap();
    assert_eq!(&reloaded, editor.document());
    assert_eq!(reloaded.version(), 3);
}
