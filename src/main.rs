mod config;
mod file_io;
mod script;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use figdraw_core::{Document, Editor, EditorConfig, ShapeType, validate_shape};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Vector design documents with undoable edits
#[derive(Parser, Debug)]
#[command(name = "figdraw")]
#[command(version, about, long_about = None)]
struct Args {
    /// Editor config file (defaults to $XDG_CONFIG_HOME/figdraw/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty document
    New {
        /// Document name
        #[arg(long, default_value = "Untitled")]
        name: String,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,

        /// Output file (defaults to <name>.figma-clone.json in the current directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Summarize a document
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check every shape in a document
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run an edit script against a document
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Write the result here instead of back to FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Run the script but do not write anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbose).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => config::load_from(path),
        None => Ok(config::load()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::New { name, width, height, output } => {
            let document = Document::with_size(
                name,
                width.unwrap_or(config.default_width),
                height.unwrap_or(config.default_height),
            )
            .context("Cannot create document")?
            .with_background(config.background_color.clone());
            let path = match output {
                Some(path) => path,
                None => file_io::default_path(Path::new("."), &document),
            };
            file_io::save_document(&document, &path)?;
            println!("{}", path.display());
        }
        Command::Info { file } => {
            let document = file_io::load_document(&file)?;
            print_info(&document);
        }
        Command::Validate { file } => {
            let document = file_io::load_document(&file)?;
            let mut invalid = 0;
            for shape in document.shapes() {
                let report = validate_shape(shape);
                if !report.valid {
                    invalid += 1;
                    println!("{} ({}):", shape.id, shape.shape_type());
                    for error in &report.errors {
                        println!("  {error}");
                    }
                }
            }
            if invalid > 0 {
                bail!("{invalid} of {} shapes are invalid", document.shapes().len());
            }
            println!("{} shapes OK", document.shapes().len());
        }
        Command::Apply { file, script, output, dry_run } => {
            let document = file_io::load_document(&file)?;
            let source = fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {:?}", script))?;
            let lines = script::parse(&source)
                .with_context(|| format!("Failed to parse script {:?}", script))?;

            let mut editor = Editor::with_config(document, &config);
            let report = script::run(&mut editor, &lines)
                .with_context(|| format!("Script {:?} failed", script))?;
            info!(
                statements = report.statements,
                created = report.created.len(),
                deleted = report.deleted,
                version = editor.document().version(),
                undoable = editor.history().undo_count(),
                redoable = editor.history().redo_count(),
                "script finished"
            );

            if dry_run {
                warn!("dry run, nothing written");
            } else {
                let target = output.unwrap_or(file);
                file_io::save_document(editor.document(), &target)?;
                println!("{}", target.display());
            }
            println!(
                "{} statements, {} created, {} deleted, version {}",
                report.statements,
                report.created.len(),
                report.deleted,
                editor.document().version()
            );
        }
    }

    Ok(())
}

fn print_info(document: &Document) {
    let count = |kind: ShapeType| {
        document
            .shapes()
            .iter()
            .filter(|s| s.shape_type() == kind)
            .count()
    };

    println!("name:       {}", document.name());
    println!("id:         {}", document.id());
    println!("size:       {} x {}", document.width(), document.height());
    if let Some(color) = document.background_color() {
        println!("background: {color}");
    }
    println!("version:    {}", document.version());
    println!("created:    {}", document.created_at().to_rfc3339());
    println!("updated:    {}", document.updated_at().to_rfc3339());
    println!(
        "shapes:     {} ({} rectangle, {} circle, {} text)",
        document.shapes().len(),
        count(ShapeType::Rectangle),
        count(ShapeType::Circle),
        count(ShapeType::Text)
    );
    for artboard in document.artboards() {
        println!(
            "artboard:   {} {} x {} ({} shapes)",
            artboard.name,
            artboard.width,
            artboard.height,
            artboard.shape_ids.len()
        );
    }
}
