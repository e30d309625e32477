//! Cluegen CLI - chapter files in, JSON out
//!
//! Commands: schemes, plan, validate, compose, generate
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cluegen_core::{
    compose, ChapterSpec, ConfigError, EncodingScheme, FsStore, GenerationPipeline, LayerPlan,
    PipelineError, SvgRenderer,
};

#[derive(Parser)]
#[command(name = "cluegen-cli")]
#[command(about = "Cluegen CLI - clue layer generation and consistency checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the schemes a chapter can name
    Schemes {
        /// Chapter file whose own schemes are listed too
        #[arg(short, long)]
        chapter: Option<PathBuf>,
    },

    /// Print the layer plan of a chapter
    Plan {
        #[arg(short, long)]
        chapter: PathBuf,
    },

    /// Check that every slot decodes to the answer
    Validate {
        #[arg(short, long)]
        chapter: PathBuf,
    },

    /// Print the draw list for one slot
    Compose {
        #[arg(short, long)]
        chapter: PathBuf,

        /// Slot id
        #[arg(short, long)]
        slot: String,
    },

    /// Validate, then write one SVG per slot
    Generate {
        #[arg(short, long)]
        chapter: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        /// Keep the first version of overwritten files as *_original.*
        #[arg(long)]
        backup: bool,

        /// Write nothing if any slot fails validation
        #[arg(long)]
        strict: bool,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => println!(r#"{{"success": false, "error": "{}"}}"#, e),
    }
}

fn fail(error: impl std::fmt::Display, code: u8) -> ExitCode {
    print_json(&json!({ "success": false, "error": error.to_string() }));
    ExitCode::from(code)
}

fn load_plan(path: &Path) -> Result<(ChapterSpec, cluegen_core::AnswerSpec, LayerPlan), String> {
    let chapter = ChapterSpec::load(path).map_err(|e| e.to_string())?;
    let answer = chapter.answer_spec().map_err(|e| e.to_string())?;
    let plan = chapter.plan(&answer).map_err(|e| e.to_string())?;
    Ok((chapter, answer, plan))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let pipeline = GenerationPipeline::new();

    match cli.command {
        Commands::Schemes { chapter } => {
            let registry = match chapter {
                Some(path) => match ChapterSpec::load(&path) {
                    Ok(c) => match c.registry() {
                        Ok(registry) => registry,
                        Err(e) => return fail(e, 1),
                    },
                    Err(e) => return fail(e, 1),
                },
                None => cluegen_core::SchemeRegistry::with_defaults(),
            };
            let schemes: Vec<_> = registry
                .list()
                .map(|(name, scheme)| {
                    json!({
                        "name": name,
                        "kind": scheme.kind(),
                        "mechanical": scheme.is_mechanical(),
                        "description": scheme.describe(),
                    })
                })
                .collect();
            print_json(&json!(schemes));
            ExitCode::SUCCESS
        }

        Commands::Plan { chapter } => match load_plan(&chapter) {
            Ok((chapter, _, plan)) => {
                print_json(&json!({
                    "success": true,
                    "collection_id": chapter.collection_id,
                    "plan": plan,
                }));
                ExitCode::SUCCESS
            }
            Err(e) => fail(e, 1),
        },

        Commands::Validate { chapter } => match load_plan(&chapter) {
            Ok((_, answer, plan)) => {
                let report = pipeline.validate_plan(&plan, &answer);
                print_json(&json!(report));
                if report.ok {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2) // Validation failure
                }
            }
            Err(e) => fail(e, 1),
        },

        Commands::Compose { chapter, slot } => match load_plan(&chapter) {
            Ok((chapter, _, plan)) => match plan.get(&slot) {
                Some(entry) => match compose(entry, &chapter.style) {
                    Ok(layout) => {
                        print_json(&json!(layout));
                        ExitCode::SUCCESS
                    }
                    Err(e) => fail(e, 1),
                },
                None => fail(
                    ConfigError::InvalidIdentifier(slot, "no such slot in plan".into()),
                    1,
                ),
            },
            Err(e) => fail(e, 1),
        },

        Commands::Generate {
            chapter,
            out,
            backup,
            strict,
        } => {
            let chapter = match ChapterSpec::load(&chapter) {
                Ok(c) => c,
                Err(e) => return fail(e, 1),
            };
            let store = FsStore::new(out).with_backup(backup);

            match pipeline
                .strict(strict)
                .run_chapter(&chapter, &store, &SvgRenderer)
            {
                Ok(report) => {
                    print_json(&json!({ "success": true, "report": report }));
                    ExitCode::SUCCESS
                }
                Err(e @ PipelineError::DecodeMismatch(_)) => fail(e, 2),
                Err(e) => fail(e, 1),
            }
        }
    }
}
