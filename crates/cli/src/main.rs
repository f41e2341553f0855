mod render;

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{LevelFilter, debug};
use posarg_core::{Allocator, CompletionOptions, SlotTable};
use posarg_diagnostics::{self as diag, Diagnostic, Severity};
use posarg_schema::{JsonBindings, Schema, load_schema_from_str};

use crate::render::{CommandLine, Format, print_summary, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "posarg",
    version,
    about = "Allocate and complete positional arguments against a slot schema"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Allocate tokens to slots and print the converted values.
    Parse {
        /// Path to the positional schema JSON.
        #[arg(long)]
        schema: String,
        /// Command-line tokens, after `--`.
        #[arg(last = true)]
        tokens: Vec<String>,
    },

    /// Print completion candidates for the next token.
    Complete {
        /// Path to the positional schema JSON.
        #[arg(long)]
        schema: String,
        /// The partially typed word under the cursor; filters candidates
        /// by prefix.
        #[arg(long)]
        current: Option<String>,
        /// Evaluate slots one after another on the calling thread.
        #[arg(long)]
        sequential: bool,
        /// Tokens already typed, after `--`.
        #[arg(last = true)]
        tokens: Vec<String>,
    },

    /// Print the resolved slot table.
    Table {
        /// Path to the positional schema JSON.
        #[arg(long)]
        schema: String,
    },

    /// Explain a diagnostic ID (e.g. PA1001).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Parse { schema, tokens } => cmd_parse(&schema, &tokens, format)?,
        Cmd::Complete {
            schema,
            current,
            sequential,
            tokens,
        } => cmd_complete(&schema, &tokens, current.as_deref(), sequential, format)?,
        Cmd::Table { schema } => cmd_table(&schema, format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_parse(schema_path: &str, tokens: &[String], format: Format) -> Result<()> {
    let (schema, table) = load_schema(schema_path, format)?;
    let mut bindings = JsonBindings::new(&schema);
    let result = Allocator::new(&table).allocate(tokens, &mut bindings);

    let (allocation, diagnostics) = match result {
        Ok(allocation) => (Some(allocation), Vec::new()),
        Err(e) => {
            debug!("allocation failed: {e}");
            (None, vec![e.to_diagnostic()])
        }
    };
    let values = bindings.into_json();

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": allocation.is_some(),
                "values": values,
                "claims": allocation.as_ref().map(|a| &a.claims),
                "remainder": allocation.as_ref().map(|a| &a.remainder),
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(allocation) = &allocation {
                println!("{}", serde_json::to_string_pretty(&values)?);
                if !allocation.remainder.is_empty() {
                    println!("remainder: {}", allocation.remainder.join(" "));
                }
            } else {
                render_diagnostics_pretty(&CommandLine::new(tokens), &schema.id, &diagnostics);
                print_summary(&diagnostics);
            }
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_complete(
    schema_path: &str,
    tokens: &[String],
    current: Option<&str>,
    sequential: bool,
    format: Format,
) -> Result<()> {
    let (schema, table) = load_schema(schema_path, format)?;
    let mut options = CompletionOptions::default();
    options.parallel = !sequential;
    let evaluator = schema.evaluator(&table).with_options(options);

    let completion = evaluator.complete(tokens);

    let eligible: Vec<&str> = completion
        .eligible
        .iter()
        .filter_map(|&i| table.get(i).map(|s| s.name.as_str()))
        .collect();
    let candidates: Vec<String> = completion
        .candidates
        .into_iter()
        .filter(|c| current.is_none_or(|prefix| c.starts_with(prefix)))
        .collect();

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "eligible": eligible,
                "candidates": candidates,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            for candidate in &candidates {
                println!("{candidate}");
            }
        }
    }
    Ok(())
}

fn cmd_table(schema_path: &str, format: Format) -> Result<()> {
    let (_, table) = load_schema(schema_path, format)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        Format::Pretty => {
            println!(
                "{:<4} {:<16} {:>4} {:>4} {:>9} {:>9}",
                "#", "name", "min", "max", "start_min", "start_max"
            );
            for slot in table.slots() {
                println!(
                    "{:<4} {:<16} {:>4} {:>4} {:>9} {:>9}",
                    slot.index,
                    slot.name,
                    slot.minimum,
                    slot.maximum.to_string(),
                    slot.start_min,
                    slot.start_max
                );
            }
            let total_max = table
                .total_max()
                .map_or_else(|| "*".to_string(), |n| n.to_string());
            println!("total: {}..{total_max}", table.total_min());
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let text = diag::explain(id);
            let out = serde_json::json!({
                "id": id,
                "explanation": text,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Explanation is the expected output, so it goes to stdout.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}

/// Read, validate and resolve a schema file.
///
/// I/O failures propagate; schema problems are reported as diagnostics and
/// exit with code 1.
fn load_schema(path: &str, format: Format) -> Result<(Schema, SlotTable)> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read schema '{path}'"))?;
    let loaded = load_schema_from_str(&text).and_then(|schema| {
        let table = schema.slot_table()?;
        Ok((schema, table))
    });
    match loaded {
        Ok(loaded) => Ok(loaded),
        Err(e) => {
            let diagnostics = vec![e.to_diagnostic()];
            match format {
                Format::Json => {
                    let out = serde_json::json!({
                        "ok": false,
                        "schema": path,
                        "diagnostics": diagnostics,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                Format::Pretty => {
                    render_diagnostics_pretty(&CommandLine::new(&[]), path, &diagnostics);
                    print_summary(&diagnostics);
                }
            }
            process::exit(1);
        }
    }
}
