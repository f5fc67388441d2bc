//! Document <-> text codec.
//!
//! Pure transforms only: no file system access happens here. Callers hand
//! over text they read themselves and get a fully formed [`Document`] back.

use thiserror::Error;

use crate::document::{Document, DocumentError};
use crate::shapes::ShapeId;

/// Conventional suffix for persisted documents
pub const FILE_EXTENSION: &str = ".figma-clone.json";

/// Errors from decoding or encoding a document
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("malformed document: shape id {0} occurs more than once")]
    DuplicateShapeId(ShapeId),

    /// NaN and infinities have no JSON form and would be written as `null`
    #[error("invalid document geometry: {0}")]
    Geometry(#[from] DocumentError),
}

/// Render a document as pretty-printed JSON
pub fn serialize(document: &Document) -> Result<String, CodecError> {
    document.check_geometry()?;
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a document previously produced by [`serialize`]
pub fn deserialize(text: &str) -> Result<Document, CodecError> {
    let document: Document = serde_json::from_str(text)?;
    if let Some(id) = document.duplicate_shape_id() {
        return Err(CodecError::DuplicateShapeId(id.clone()));
    }
    document.check_geometry()?;
    Ok(document)
}

/// File name a document is saved under by default
pub fn default_file_name(document: &Document) -> String {
    let stem = if document.name().trim().is_empty() {
        "document"
    } else {
        document.name()
    };
    format!("{stem}{FILE_EXTENSION}")
}

/// Serde adapter for document timestamps: ISO-8601 UTC with millisecond
/// precision, e.g. `2024-01-01T00:00:00.000Z`.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artboards::Artboard;
    use crate::shapes::{ShapePatch, create_rectangle, create_text};

    fn sample() -> Document {
        let mut doc = Document::new("Sample").with_artboard(Artboard::new("Frame", 0.0, 0.0, 100.0, 100.0));
        let mut metadata = serde_json::Map::new();
        metadata.insert("layer".into(), serde_json::json!({"name": "bg", "tags": [1, 2]}));
        doc.commit(vec![
            create_rectangle(0.5, 1.25, 100.0, 50.0, ShapePatch::new().with_metadata(metadata)),
            create_text(3.0, 4.0, "héllo\n\"quoted\"", ShapePatch::new()),
        ]);
        doc
    }

    #[test]
    fn round_trip_is_exact() {
        let doc = sample();
        let text = serialize(&doc).unwrap();
        let back = deserialize(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn timestamps_use_fixed_iso_format() {
        let doc = sample();
        let value: serde_json::Value = serde_json::from_str(&serialize(&doc).unwrap()).unwrap();
        let created = value["createdAt"].as_str().unwrap();
        // YYYY-MM-DDTHH:MM:SS.mmmZ
        assert_eq!(created.len(), 24);
        assert!(created.ends_with('Z'));
        assert_eq!(value["version"], 2);
        assert_eq!(value["shapes"][0]["type"], "rectangle");
        assert_eq!(value["artboards"][0]["name"], "Frame");
    }

    #[test]
    fn accepts_offset_timestamps() {
        let doc = sample();
        let mut value: serde_json::Value = serde_json::from_str(&serialize(&doc).unwrap()).unwrap();
        value["createdAt"] = serde_json::json!("2024-03-01T12:00:00.123456+02:00");
        let back = deserialize(&value.to_string()).unwrap();
        assert_eq!(
            back.created_at().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2024-03-01T10:00:00.123Z"
        );
    }

    #[test]
    fn rejects_unparsable_text() {
        assert!(matches!(deserialize("{not json"), Err(CodecError::Malformed(_))));
        assert!(matches!(deserialize("{\"id\": \"x\"}"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn rejects_duplicate_shape_ids() {
        let mut doc = Document::new("dup");
        let rect = create_rectangle(0.0, 0.0, 1.0, 1.0, ShapePatch::new());
        doc.commit(vec![rect.clone(), rect]);
        let text = serialize(&doc).unwrap();
        assert!(matches!(deserialize(&text), Err(CodecError::DuplicateShapeId(_))));
    }

    #[test]
    fn non_finite_geometry_is_never_written() {
        let doc = Document::new("nan").with_artboard(Artboard::new("f", 0.0, f64::INFINITY, 1.0, 1.0));
        assert!(matches!(serialize(&doc), Err(CodecError::Geometry(_))));
    }

    #[test]
    fn rejects_non_positive_canvas_on_load() {
        let mut value: serde_json::Value = serde_json::from_str(&serialize(&sample()).unwrap()).unwrap();
        value["width"] = serde_json::json!(0.0);
        assert!(matches!(
            deserialize(&value.to_string()),
            Err(CodecError::Geometry(DocumentError::InvalidCanvasSize { .. }))
        ));

        value["width"] = serde_json::Value::Null;
        assert!(matches!(deserialize(&value.to_string()), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn default_file_name_uses_document_name() {
        assert_eq!(default_file_name(&Document::new("Logo")), "Logo.figma-clone.json");
        assert_eq!(default_file_name(&Document::new(" ")), "document.figma-clone.json");
    }
}
