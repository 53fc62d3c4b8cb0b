//! Pagesmith CLI
//!
//! Commands: scan, validate, place
//! Outputs JSON to stdout
//! Returns exit code 2 on validation failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pagesmith_core::{
    run_pipeline, Document, NameResolver, PipelineOptions, RecordingImporter, RunOutcome,
    Session, Settings, Validator,
};
use pagesmith_core::document::Inventory;
use pagesmith_core::scan::collect_files;

#[derive(Parser)]
#[command(name = "pagesmith-cli")]
#[command(version = pagesmith_core::ENGINE_VERSION)]
#[command(about = "Pagesmith CLI - batch file-to-layout placement")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a settings JSON file (defaults are used when omitted)
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List input files with their resolved page, template, and division
    Scan {
        /// Input folder
        folder: PathBuf,
    },

    /// Validate the input set against a document without placing anything
    Validate {
        /// Input folder
        folder: PathBuf,

        /// Document spec JSON
        #[arg(short, long)]
        document: PathBuf,
    },

    /// Validate, then place every file
    Place {
        /// Input folder
        folder: PathBuf,

        /// Document spec JSON
        #[arg(short, long)]
        document: PathBuf,

        /// Write the mutated document back out as JSON
        #[arg(long)]
        out: Option<PathBuf>,

        /// Create stub master templates and division layers for missing names
        #[arg(long)]
        create_missing: bool,

        /// Proceed when the only errors are missing page numbers
        #[arg(long)]
        proceed_on_missing_numbers: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!(r#"{{"error": "Failed to load settings: {}"}}"#, e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    match cli.command {
        Commands::Scan { folder } => {
            let patterns = match settings.compile() {
                Ok(p) => p,
                Err(e) => return fail(&e),
            };
            let files = match collect_files(&folder, &patterns) {
                Ok(f) => f,
                Err(e) => return fail(&e),
            };
            let resolver = NameResolver::new(&patterns);
            let listing: Vec<_> = files
                .iter()
                .map(|f| {
                    let resolved = resolver.resolve(f);
                    serde_json::json!({
                        "path": &f.path,
                        "displayName": &f.display_name,
                        "pageKey": resolved.page_key,
                        "templateName": resolved.template_name,
                        "divisionName": resolved.division_name,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Validate { folder, document } => {
            let mut doc = match Document::load(&document) {
                Ok(d) => d,
                Err(e) => return fail(&e),
            };
            let mut session = match Session::new(settings, &folder, doc.page_count()) {
                Ok(s) => s,
                Err(e) => return fail(&e),
            };
            let files = match collect_files(&folder, &session.patterns) {
                Ok(f) => f,
                Err(e) => return fail(&e),
            };

            Validator::new().validate(&mut doc, &mut session, &files);

            let output = serde_json::json!({
                "valid": session.report.is_empty(),
                "errors": &session.report,
                "requiredPageCount": session.required_page_count,
                "missingMasterNames": &session.missing_master_names,
                "missingDivisionNames": &session.missing_division_names,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            if session.report.is_empty() {
                ExitCode::SUCCESS
            } else {
                eprintln!("{}", session.report.render());
                ExitCode::from(2)
            }
        }

        Commands::Place {
            folder,
            document,
            out,
            create_missing,
            proceed_on_missing_numbers,
        } => {
            let mut doc = match Document::load(&document) {
                Ok(d) => d,
                Err(e) => return fail(&e),
            };
            let mut session = match Session::new(settings, &folder, doc.page_count()) {
                Ok(s) => s,
                Err(e) => return fail(&e),
            };
            let files = match collect_files(&folder, &session.patterns) {
                Ok(f) => f,
                Err(e) => return fail(&e),
            };

            let options = PipelineOptions { create_missing, proceed_on_missing_numbers };
            let outcome = run_pipeline(
                &mut doc,
                &mut session,
                &files,
                RecordingImporter,
                &options,
            );

            println!("{}", serde_json::to_string_pretty(&outcome).unwrap());

            if let Some(path) = out {
                if let Err(e) = fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()) {
                    eprintln!(r#"{{"error": "Failed to write document: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            }

            match outcome {
                RunOutcome::Placed { .. } => ExitCode::SUCCESS,
                RunOutcome::Blocked { rendered, .. } => {
                    eprintln!("{rendered}");
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn fail(e: &dyn std::error::Error) -> ExitCode {
    eprintln!(r#"{{"error": "{}"}}"#, e);
    ExitCode::FAILURE
}
