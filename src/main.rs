use clap::{Parser, Subcommand};
use layout_expressions::shared_tests::{
    load_context_lists, load_functions, load_invalid, run_context_test, run_folder,
    run_function_test, RunSummary,
};
use layout_expressions::{evaluate_json, DataSources, ExprContext, FixtureError, NodeContext};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Evaluate layout expressions, or run a shared fixture corpus.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one expression and print the result as JSON
    Eval {
        /// Expression as JSON, e.g. '["equals", ["component", "age"], 18]'
        expression: String,
        /// JSON file with `dataModel`, `layouts`, `instanceContext`, `frontendSettings`
        #[arg(long)]
        context: Option<PathBuf>,
        /// Component the expression is evaluated for
        #[arg(long)]
        component: Option<String>,
        /// Repeating group row index, outermost first (repeatable)
        #[arg(long = "row")]
        rows: Vec<usize>,
        /// Active layout page
        #[arg(long)]
        layout: Option<String>,
    },
    /// Run every fixture under a corpus root and report failures
    Run {
        /// Directory holding `context-lists`, `functions` and `invalid`
        root: PathBuf,
    },
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let code = match args.command {
        Command::Eval {
            expression,
            context,
            component,
            rows,
            layout,
        } => eval(&expression, context, NodeContext {
            component,
            row_indices: rows,
            current_layout: layout,
        }),
        Command::Run { root } => run(&root),
    };
    std::process::exit(code);
}

fn eval(expression: &str, context: Option<PathBuf>, node: NodeContext) -> i32 {
    let expr: Value = match serde_json::from_str(expression) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid expression JSON: {e}");
            return 1;
        }
    };
    let sources = match context {
        Some(path) => match read_sources(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Invalid context file {}: {e}", path.display());
                return 1;
            }
        },
        None => DataSources::default(),
    };

    let ctx = ExprContext::new(&node, &sources);
    match evaluate_json(&expr, &ctx) {
        Ok(v) => {
            println!("{}", serde_json::to_string_pretty(&v).unwrap_or_else(|_| v.to_string()));
            0
        }
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            1
        }
    }
}

fn read_sources(path: &Path) -> Result<DataSources, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn run(root: &Path) -> i32 {
    let summary = match run_corpus(root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load fixtures: {e}");
            return 1;
        }
    };
    println!("{}", summary.report());
    i32::from(!summary.failures.is_empty())
}

fn run_corpus(root: &Path) -> Result<RunSummary, FixtureError> {
    let mut summary = run_folder(&load_context_lists(root)?, run_context_test);
    summary.merge(run_folder(&load_functions(root)?, run_function_test));
    summary.merge(run_folder(&load_invalid(root)?, run_function_test));
    Ok(summary)
}
