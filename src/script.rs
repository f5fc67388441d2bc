//! Line-oriented edit scripts for `figdraw apply`.
//!
//! One statement per line, `#` starts a comment:
//!
//! ```text
//! rect 10 10 100 50 fill=#ff0000 cornerRadius=4
//! circle 200 10 80 80
//! text 10 100 Hello world
//! move $1 40 40
//! update $2 opacity=0.5 stroke=#000000 strokeWidth=2
//! select $1 $2
//! delete-selection
//! undo
//! ```
//!
//! `$N` names the N-th shape created by the script (1-based); any other
//! reference is taken as a literal shape id. Options are `key=value`
//! pairs using the persisted camelCase field names.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use figdraw_core::{Editor, ShapeId, ShapePatch, ShapeType, create_shape, create_text};
use tracing::debug;

/// Reference to a shape from a script
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRef {
    /// 1-based index into the shapes the script created
    Created(usize),
    Id(ShapeId),
}

impl FromStr for ShapeRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix('$') {
            Some(n) => {
                let n: usize = n.parse().with_context(|| format!("invalid reference {s:?}"))?;
                if n == 0 {
                    bail!("references start at $1");
                }
                Ok(ShapeRef::Created(n))
            }
            None => Ok(ShapeRef::Id(ShapeId::from(s))),
        }
    }
}

impl fmt::Display for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeRef::Created(n) => write!(f, "${n}"),
            ShapeRef::Id(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Create {
        shape_type: ShapeType,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        options: ShapePatch,
    },
    Text { x: f64, y: f64, content: String },
    Move { target: ShapeRef, x: f64, y: f64 },
    Update { target: ShapeRef, patch: ShapePatch },
    Delete { target: ShapeRef },
    Select { targets: Vec<ShapeRef> },
    DeleteSelection,
    Undo,
    Redo,
}

/// A statement with its 1-based source line
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub statement: Statement,
}

/// What running a script did
#[derive(Debug, Default)]
pub struct ScriptReport {
    pub statements: usize,
    pub created: Vec<ShapeId>,
    pub deleted: usize,
}

fn number(token: Option<&str>, what: &str) -> Result<f64> {
    let token = token.ok_or_else(|| anyhow!("missing {what}"))?;
    token
        .parse()
        .with_context(|| format!("{what} must be a number, got {token:?}"))
}

fn target(token: Option<&str>) -> Result<ShapeRef> {
    token.ok_or_else(|| anyhow!("missing shape reference"))?.parse()
}

/// Build a patch from `key=value` pairs.
///
/// Values are read as JSON when they parse as JSON and as plain strings
/// otherwise, so `opacity=0.5`, `visible=false` and `fill=#ff0000` all work.
pub fn parse_options<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<ShapePatch> {
    let mut fields = serde_json::Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {pair:?}"))?;
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    let keys: Vec<String> = fields.keys().cloned().collect();
    let patch: ShapePatch = serde_json::from_value(serde_json::Value::Object(fields))
        .context("invalid shape options")?;

    // unknown keys are dropped by serde; report them instead
    let known = serde_json::to_value(&patch)?;
    if let Some(unknown) = keys.iter().find(|k| known.get(k.as_str()).is_none()) {
        bail!("unknown option {unknown:?}");
    }
    Ok(patch)
}

fn parse_statement(line: &str) -> Result<Option<Statement>> {
    // a token starting with '#' opens a comment, so `fill=#ff0000` survives
    let mut tokens = line.split_whitespace().take_while(|t| !t.starts_with('#'));
    let Some(keyword) = tokens.next() else {
        return Ok(None);
    };

    let statement = match keyword {
        "rect" | "rectangle" | "circle" => Statement::Create {
            shape_type: keyword.parse().map_err(|e| anyhow!("{e}"))?,
            x: number(tokens.next(), "x")?,
            y: number(tokens.next(), "y")?,
            width: number(tokens.next(), "width")?,
            height: number(tokens.next(), "height")?,
            options: parse_options(tokens)?,
        },
        "text" => {
            let x = number(tokens.next(), "x")?;
            let y = number(tokens.next(), "y")?;
            let content = tokens.collect::<Vec<_>>().join(" ");
            if content.is_empty() {
                bail!("text needs content");
            }
            Statement::Text { x, y, content }
        }
        "move" => Statement::Move {
            target: target(tokens.next())?,
            x: number(tokens.next(), "x")?,
            y: number(tokens.next(), "y")?,
        },
        "update" => {
            let target = target(tokens.next())?;
            let patch = parse_options(tokens)?;
            if patch.is_empty() {
                bail!("update needs at least one key=value");
            }
            Statement::Update { target, patch }
        }
        "delete" => Statement::Delete {
            target: target(tokens.next())?,
        },
        "select" => Statement::Select {
            targets: tokens.map(str::parse::<ShapeRef>).collect::<Result<Vec<_>>>()?,
        },
        "delete-selection" => Statement::DeleteSelection,
        "undo" => Statement::Undo,
        "redo" => Statement::Redo,
        other => bail!("unknown statement {other:?}"),
    };
    Ok(Some(statement))
}

/// Parse a whole script, skipping blank lines and comments
pub fn parse(source: &str) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    for (idx, text) in source.lines().enumerate() {
        let number = idx + 1;
        if let Some(statement) = parse_statement(text).with_context(|| format!("line {number}"))? {
            lines.push(Line { number, statement });
        }
    }
    Ok(lines)
}

fn resolve(report: &ScriptReport, target: &ShapeRef) -> Result<ShapeId> {
    match target {
        ShapeRef::Created(n) => report
            .created
            .get(n - 1)
            .cloned()
            .ok_or_else(|| anyhow!("{target} does not exist yet ({} created)", report.created.len())),
        ShapeRef::Id(id) => Ok(id.clone()),
    }
}

fn run_statement(editor: &mut Editor, report: &mut ScriptReport, statement: &Statement) -> Result<()> {
    match statement {
        Statement::Create { shape_type, x, y, width, height, options } => {
            let shape = create_shape(*shape_type, *x, *y, *width, *height, options.clone());
            let id = editor.add_shape(shape)?;
            report.created.push(id);
        }
        Statement::Text { x, y, content } => {
            let id = editor.add_shape(create_text(*x, *y, content.as_str(), ShapePatch::new()))?;
            report.created.push(id);
        }
        Statement::Move { target, x, y } => {
            editor.move_shape(resolve(report, target)?, *x, *y)?;
        }
        Statement::Update { target, patch } => {
            editor.update_shape(resolve(report, target)?, patch.clone())?;
        }
        Statement::Delete { target } => {
            editor.delete_shape(resolve(report, target)?)?;
            report.deleted += 1;
        }
        Statement::Select { targets } => {
            let ids = targets
                .iter()
                .map(|t| resolve(report, t))
                .collect::<Result<Vec<_>>>()?;
            editor.deselect_all();
            editor.select_shapes(ids);
        }
        Statement::DeleteSelection => {
            report.deleted += editor.delete_selection()?;
        }
        Statement::Undo => {
            if !editor.undo()? {
                debug!("nothing to undo");
            }
        }
        Statement::Redo => {
            if !editor.redo()? {
                debug!("nothing to redo");
            }
        }
    }
    Ok(())
}

/// Run parsed statements against the editor, stopping at the first failure
pub fn run(editor: &mut Editor, lines: &[Line]) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();
    for line in lines {
        run_statement(editor, &mut report, &line.statement)
            .with_context(|| format!("line {}", line.number))?;
        report.statements += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figdraw_core::{Document, FontWeight, ShapeKind};

    fn run_source(source: &str) -> Result<(Editor, ScriptReport)> {
        let mut editor = Editor::new(Document::new("script"));
        let lines = parse(source)?;
        let report = run(&mut editor, &lines)?;
        Ok((editor, report))
    }

    #[test]
    fn parses_statements_and_skips_comments() {
        let lines = parse(
            "# header\n\nrect 1 2 3 4 fill=#ff0000\nmove $1 5 6 # trailing\nundo\n",
        )
        .unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 3);
        assert_eq!(
            lines[1].statement,
            Statement::Move { target: ShapeRef::Created(1), x: 5.0, y: 6.0 }
        );
        assert_eq!(lines[2].statement, Statement::Undo);
    }

    #[test]
    fn options_become_a_patch() {
        let patch = parse_options(["opacity=0.25", "visible=false", "fill=#00ff00", "fontWeight=700"])
            .unwrap();
        assert_eq!(patch.opacity, Some(0.25));
        assert_eq!(patch.visible, Some(false));
        assert_eq!(patch.fill.as_deref(), Some("#00ff00"));
        assert_eq!(patch.font_weight, Some(FontWeight::Numeric(700)));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let err = parse("rect 1 2 3 4\nrect 1 two 3 4").unwrap_err();
        assert!(format!("{err:#}").starts_with("line 2"));

        assert!(parse("spin $1").is_err());
        assert!(parse("move $0 1 1").is_err());
        assert!(parse("update $1").is_err());
        assert!(parse("rect 1 2 3 4 fill").is_err());
        assert!(parse("rect 1 2 3 4 colour=red").is_err());
    }

    #[test]
    fn runs_a_full_script() {
        let (editor, report) = run_source(
            "rect 0 0 100 50 cornerRadius=4\n\
             circle 10 10 20 20\n\
             text 5 5 Hello   world\n\
             move $1 40 40\n\
             update $2 opacity=0.5\n",
        )
        .unwrap();
        assert_eq!(report.statements, 5);
        assert_eq!(report.created.len(), 3);

        let doc = editor.document();
        assert_eq!(doc.shapes().len(), 3);
        assert_eq!((doc.shapes()[0].x, doc.shapes()[0].y), (40.0, 40.0));
        assert_eq!(doc.shapes()[1].opacity, 0.5);
        assert_eq!(doc.shapes()[2].text(), Some("Hello world"));
        assert!(matches!(
            doc.shapes()[0].kind,
            ShapeKind::Rectangle { corner_radius, .. } if corner_radius == 4.0
        ));
    }

    #[test]
    fn selection_delete_and_history() {
        let (editor, report) = run_source(
            "rect 0 0 1 1\nrect 1 0 1 1\nrect 2 0 1 1\n\
             select $1 $3\ndelete-selection\nundo\nredo\n",
        )
        .unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(editor.document().shapes().len(), 1);
        assert_eq!(editor.document().shapes()[0].id, report.created[1]);
        assert!(editor.can_undo());
    }

    #[test]
    fn run_stops_at_the_first_failure() {
        let err = run_source("rect 0 0 1 1\nmove $2 1 1\nrect 0 0 1 1").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        let err = run_source("rect 0 0 -1 1").unwrap_err();
        assert!(format!("{err:#}").contains("width"));
    }

    #[test]
    fn literal_ids_are_accepted() {
        let mut editor = Editor::new(Document::new("ids"));
        let lines = parse("rect 0 0 1 1").unwrap();
        let report = run(&mut editor, &lines).unwrap();
        let id = report.created[0].clone();

        let lines = parse(&format!("move {id} 9 9\ndelete {id}")).unwrap();
        run(&mut editor, &lines).unwrap();
        assert!(editor.document().shapes().is_empty());
    }
}
