//! Shape types, factories and validation.
//!
//! A [`Shape`] is the shared geometric/visual base plus a [`ShapeKind`]
//! carrying the variant-specific fields. The persisted form is flat: the
//! kind's fields sit next to the base fields under a `type` discriminator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default fill for rectangles and circles
pub const DEFAULT_FILL: &str = "#3b82f6";
/// Default fill for text
pub const DEFAULT_TEXT_FILL: &str = "#000000";
/// Default font stack for text
pub const DEFAULT_FONT_FAMILY: &str = "Inter, system-ui, sans-serif";
/// Default content when a text shape is created by type without content
pub const DEFAULT_TEXT_CONTENT: &str = "Text";

const DEFAULT_TEXT_WIDTH: f64 = 200.0;
const DEFAULT_TEXT_HEIGHT: f64 = 50.0;
const DEFAULT_FONT_SIZE: f64 = 16.0;
const DEFAULT_LINE_HEIGHT: f64 = 1.5;

/// Free-form extension data attached to a shape
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Shape identifier - opaque string, unique within a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Shape type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Circle,
    Text,
}

impl ShapeType {
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Text => "text",
        }
    }
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ShapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" | "rect" => Ok(ShapeType::Rectangle),
            "circle" => Ok(ShapeType::Circle),
            "text" => Ok(ShapeType::Text),
            other => Err(format!("Unknown shape type: {other}")),
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Font weight - either a CSS keyword (`"bold"`) or a numeric weight (`700`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u16),
    Keyword(String),
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::Keyword("normal".to_string())
    }
}

/// Variant-specific shape data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Rectangle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: f64,
        #[serde(default)]
        corner_radius: f64,
    },
    Circle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: f64,
    },
    Text {
        #[serde(rename = "text")]
        content: String,
        font_family: String,
        font_size: f64,
        #[serde(default)]
        font_weight: FontWeight,
        fill: String,
        #[serde(default)]
        text_align: TextAlign,
        #[serde(default)]
        vertical_align: VerticalAlign,
        line_height: f64,
    },
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Rectangle { .. } => ShapeType::Rectangle,
            ShapeKind::Circle { .. } => ShapeType::Circle,
            ShapeKind::Text { .. } => ShapeType::Text,
        }
    }
}

/// A drawable entity on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees
    pub rotation: f64,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f64,
    pub visible: bool,
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    /// Build a shape with default base styling around the given kind
    fn with_kind(x: f64, y: f64, width: f64, height: f64, kind: ShapeKind) -> Self {
        Self {
            id: ShapeId::new(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            locked: false,
            metadata: None,
            kind,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// Fill color, if the shape has one
    pub fn fill(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Rectangle { fill, .. } | ShapeKind::Circle { fill, .. } => fill.as_deref(),
            ShapeKind::Text { fill, .. } => Some(fill),
        }
    }

    /// Text content (text shapes only)
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// Partial set of shape fields.
///
/// Used both as the options overlay for the factories and as the partial
/// update applied by the update command. `None` leaves a field untouched.
/// Fields that do not exist on the target variant are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

impl ShapePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_stroke(mut self, stroke: impl Into<String>, width: f64) -> Self {
        self.stroke = Some(stroke.into());
        self.stroke_width = Some(width);
        self
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = Some(radius);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f64) -> Self {
        self.font_family = Some(family.into());
        self.font_size = Some(size);
        self
    }

    pub fn with_font_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = Some(weight);
        self
    }

    pub fn with_alignment(mut self, align: TextAlign, vertical: VerticalAlign) -> Self {
        self.text_align = Some(align);
        self.vertical_align = Some(vertical);
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = Some(line_height);
        self
    }

    /// True if applying this patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge the set fields onto `shape`
    pub fn apply_to(&self, shape: &mut Shape) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut shape.x, &self.x);
        set(&mut shape.y, &self.y);
        set(&mut shape.width, &self.width);
        set(&mut shape.height, &self.height);
        set(&mut shape.rotation, &self.rotation);
        set(&mut shape.opacity, &self.opacity);
        set(&mut shape.visible, &self.visible);
        set(&mut shape.locked, &self.locked);
        if self.metadata.is_some() {
            shape.metadata = self.metadata.clone();
        }

        match &mut shape.kind {
            ShapeKind::Rectangle { fill, stroke, stroke_width, corner_radius } => {
                if self.fill.is_some() {
                    *fill = self.fill.clone();
                }
                if self.stroke.is_some() {
                    *stroke = self.stroke.clone();
                }
                set(stroke_width, &self.stroke_width);
                set(corner_radius, &self.corner_radius);
            }
            ShapeKind::Circle { fill, stroke, stroke_width } => {
                if self.fill.is_some() {
                    *fill = self.fill.clone();
                }
                if self.stroke.is_some() {
                    *stroke = self.stroke.clone();
                }
                set(stroke_width, &self.stroke_width);
            }
            ShapeKind::Text {
                content,
                font_family,
                font_size,
                font_weight,
                fill,
                text_align,
                vertical_align,
                line_height,
            } => {
                set(content, &self.text);
                set(font_family, &self.font_family);
                set(font_size, &self.font_size);
                set(font_weight, &self.font_weight);
                set(fill, &self.fill);
                set(text_align, &self.text_align);
                set(vertical_align, &self.vertical_align);
                set(line_height, &self.line_height);
            }
        }
    }
}

// --- Factories ---

/// Create a rectangle with default styling, overlaid with `options`.
///
/// The explicit geometry always wins over geometry in `options`.
pub fn create_rectangle(x: f64, y: f64, width: f64, height: f64, options: ShapePatch) -> Shape {
    let mut shape = Shape::with_kind(
        x,
        y,
        width,
        height,
        ShapeKind::Rectangle {
            fill: Some(DEFAULT_FILL.to_string()),
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 0.0,
        },
    );
    options.apply_to(&mut shape);
    (shape.x, shape.y, shape.width, shape.height) = (x, y, width, height);
    shape
}

/// Create a circle (ellipse inscribed in the given box) with default styling
pub fn create_circle(x: f64, y: f64, width: f64, height: f64, options: ShapePatch) -> Shape {
    let mut shape = Shape::with_kind(
        x,
        y,
        width,
        height,
        ShapeKind::Circle {
            fill: Some(DEFAULT_FILL.to_string()),
            stroke: None,
            stroke_width: 0.0,
        },
    );
    options.apply_to(&mut shape);
    (shape.x, shape.y, shape.width, shape.height) = (x, y, width, height);
    shape
}

/// Create a text shape. Width/height default to 200x50 and may come from `options`.
pub fn create_text(x: f64, y: f64, text: impl Into<String>, options: ShapePatch) -> Shape {
    let text = text.into();
    let mut shape = Shape::with_kind(
        x,
        y,
        DEFAULT_TEXT_WIDTH,
        DEFAULT_TEXT_HEIGHT,
        ShapeKind::Text {
            content: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::default(),
            fill: DEFAULT_TEXT_FILL.to_string(),
            text_align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: DEFAULT_LINE_HEIGHT,
        },
    );
    options.apply_to(&mut shape);
    shape.x = x;
    shape.y = y;
    if let ShapeKind::Text { content, .. } = &mut shape.kind {
        *content = text;
    }
    shape
}

/// Create a shape by type. Text content is taken from `options.text`.
pub fn create_shape(
    shape_type: ShapeType,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    options: ShapePatch,
) -> Shape {
    match shape_type {
        ShapeType::Rectangle => create_rectangle(x, y, width, height, options),
        ShapeType::Circle => create_circle(x, y, width, height, options),
        ShapeType::Text => {
            let text = options
                .text
                .clone()
                .unwrap_or_else(|| DEFAULT_TEXT_CONTENT.to_string());
            create_text(x, y, text, options.with_size(width, height))
        }
    }
}

// --- Validation ---

/// Outcome of [`validate_shape`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

fn validate_base(shape: &Shape, errors: &mut Vec<String>) {
    if shape.id.as_str().trim().is_empty() {
        errors.push("Shape must have a valid id".to_string());
    }
    if !shape.x.is_finite() {
        errors.push("Shape x must be a valid number".to_string());
    }
    if !shape.y.is_finite() {
        errors.push("Shape y must be a valid number".to_string());
    }
    if !(shape.width.is_finite() && shape.width > 0.0) {
        errors.push("Shape width must be a positive number".to_string());
    }
    if !(shape.height.is_finite() && shape.height > 0.0) {
        errors.push("Shape height must be a positive number".to_string());
    }
    if !shape.rotation.is_finite() {
        errors.push("Shape rotation must be a valid number".to_string());
    }
    if !(0.0..=1.0).contains(&shape.opacity) {
        errors.push("Shape opacity must be between 0 and 1".to_string());
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Check a shape against the model rules. Pure: never mutates, never panics.
pub fn validate_shape(shape: &Shape) -> ValidationReport {
    let mut errors = Vec::new();
    validate_base(shape, &mut errors);

    match &shape.kind {
        ShapeKind::Rectangle { stroke_width, corner_radius, .. } => {
            if !non_negative(*stroke_width) {
                errors.push("Rectangle strokeWidth must be a non-negative number".to_string());
            }
            if !non_negative(*corner_radius) {
                errors.push("Rectangle cornerRadius must be a non-negative number".to_string());
            }
        }
        ShapeKind::Circle { stroke_width, .. } => {
            if !non_negative(*stroke_width) {
                errors.push("Circle strokeWidth must be a non-negative number".to_string());
            }
        }
        ShapeKind::Text { font_size, line_height, .. } => {
            if !positive(*font_size) {
                errors.push("Text fontSize must be a positive number".to_string());
            }
            if !positive(*line_height) {
                errors.push("Text lineHeight must be a positive number".to_string());
            }
        }
    }

    ValidationReport::from_errors(errors)
}
