//! paramflow CLI - expand parameters and run filter pipelines
//!
//! # Commands
//!
//! ```bash
//! paramflow expand query.size=10 sort.by=date       # Expand assignments to JSON
//! paramflow run pipeline.json --set steps.0.params.count=5
//! paramflow validate pipeline.json                  # Check a pipeline document
//! paramflow filters                                 # List the filter catalog
//! paramflow check "env == 'prod'" --data ctx.json   # Resolve a condition
//! paramflow serve                                   # Start HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use paramflow::{
    api::logs::LOG_BROADCASTER,
    apply_overrides, expand_assignments, run_document,
    validation::validate_pipeline,
    ConditionResolver, FilterRegistry, Settings,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "paramflow")]
#[command(about = "Expand parameters and run conditionally gated filter pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand path=value assignments over optional defaults
    Expand {
        /// Assignments such as `query.size=10`
        #[arg(required = true)]
        assignments: Vec<String>,

        /// JSON file with default values
        #[arg(short, long)]
        defaults: Option<PathBuf>,

        /// Token standing for a literal `.` in keys
        #[arg(short, long)]
        escape: Option<String>,
    },

    /// Run a pipeline document
    Run {
        /// Pipeline JSON file
        pipeline: PathBuf,

        /// JSON file replacing the pipeline's initial data
        #[arg(long)]
        data: Option<PathBuf>,

        /// Override a field of the document (repeatable)
        #[arg(short, long = "set", value_name = "PATH=VALUE")]
        set: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a pipeline document against the schema
    Validate {
        /// Pipeline JSON file
        pipeline: PathBuf,
    },

    /// Show available filters
    Filters,

    /// Resolve an `if` condition against a data context
    Check {
        /// Expression string or a JSON object of path/value pairs
        condition: String,

        /// JSON file with the data context
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PARAMFLOW_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Settings::from_env() {
        Ok(settings) => match cli.command {
            Commands::Expand {
                assignments,
                defaults,
                escape,
            } => cmd_expand(
                &assignments,
                defaults.as_deref(),
                escape.as_deref().unwrap_or(&settings.escape_token),
            ),

            Commands::Run {
                pipeline,
                data,
                set,
                output,
            } => cmd_run(&settings, &pipeline, data.as_deref(), &set, output.as_deref()),

            Commands::Validate { pipeline } => cmd_validate(&pipeline),

            Commands::Filters => cmd_filters(),

            Commands::Check { condition, data } => cmd_check(&condition, data.as_deref()),

            Commands::Serve { port } => cmd_serve(settings, port).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("✗ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_expand(assignments: &[String], defaults: Option<&Path>, escape: &str) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = match defaults {
        Some(path) => read_json(path)?,
        None => Value::Null,
    };

    let expanded = expand_assignments(&defaults, assignments, Some(escape))?;
    write_output(&serde_json::to_string_pretty(&expanded)?, None)
}

fn cmd_run(
    settings: &Settings,
    pipeline: &Path,
    data: Option<&Path>,
    overrides: &[String],
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Running pipeline: {}", pipeline.display());

    let mut options = settings.run_options();
    options.data = data.map(read_json).transpose()?;

    let doc = apply_overrides(&read_json(pipeline)?, overrides, &options.escape_token)?;
    let result = run_document(&FilterRegistry::standard(), &doc, &options)?;

    write_output(&serde_json::to_string_pretty(&result)?, output)
}

fn cmd_validate(pipeline: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Validating: {}", pipeline.display());

    let doc = read_json(pipeline)?;
    match validate_pipeline(&doc) {
        Ok(()) => {
            eprintln!("✓ Pipeline is valid");
            Ok(())
        }
        Err(errors) => {
            eprintln!("✗ {} error(s):", errors.len());
            for err in &errors {
                eprintln!("   - {}", err);
            }
            std::process::exit(1);
        }
    }
}

fn cmd_filters() -> Result<(), Box<dyn std::error::Error>> {
    let registry = FilterRegistry::standard();

    println!("Available filters:");
    for info in registry.describe() {
        let gate = if info.gated { "" } else { " (ignores `if`)" };
        println!("  {:<10} {}{}", info.name, info.description, gate);
    }

    Ok(())
}

fn cmd_check(condition: &str, data: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data = match data {
        Some(path) => read_json(path)?,
        None => json!({}),
    };

    let resolved = ConditionResolver::default().resolve(&condition_params(condition), &data)?;
    println!("{}", resolved);

    Ok(())
}

/// A JSON object argument is a path/value condition; anything else is an expression.
fn condition_params(condition: &str) -> paramflow::Params {
    let condition = match serde_json::from_str::<Value>(condition) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => Value::String(condition.to_string()),
    };

    let mut params = paramflow::Params::new();
    params.insert("if".to_string(), condition);
    params
}

async fn cmd_serve(settings: Settings, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match port {
        Some(port) => settings.with_port(port),
        None => settings,
    };

    // Entries are streamed over SSE; keep them on stderr too
    LOG_BROADCASTER.set_echo(true);
    paramflow::start_server(settings).await?;

    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&content)?)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
