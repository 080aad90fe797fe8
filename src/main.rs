//! Sable CLI - Command-line interface for the Sable configuration language

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::Level;

use sable::error::{format_eval_error, format_validation_error};
use sable::evaluator::Environment;
use sable::formatter::Formatter;
use sable::linter::{Linter, Severity};
use sable::validator::Validator;

#[derive(Parser)]
#[command(name = "sable")]
#[command(about = "Sable Configuration Language", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a Sable file and show the resulting bindings
    Eval {
        /// Path to configuration file
        path: PathBuf,

        /// Emit the bindings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Statically validate a Sable file without evaluating it
    Check {
        /// Path to configuration file
        path: PathBuf,

        /// Also run lint rules
        #[arg(long)]
        lint: bool,
    },

    /// Format a Sable file
    Fmt {
        /// Path to configuration file
        path: PathBuf,

        /// Rewrite the file in place instead of printing
        #[arg(long)]
        write: bool,
    },
}

/// Error-severity lint issues fail the check; warnings and info do not
fn has_lint_errors(issues: &[sable::linter::LintIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Eval { path, json } => {
            let source = std::fs::read_to_string(&path)?;
            let module = sable::parse_str(&source)?;
            let mut env = Environment::new();

            match env.evaluate(&module) {
                Ok(evaluated) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&evaluated.to_json())?);
                    } else {
                        let mut names: Vec<_> = evaluated.bindings.keys().collect();
                        names.sort();
                        for name in names {
                            println!("{} = {}", name, evaluated.bindings[name].to_string_repr());
                        }
                    }
                }
                Err(err) => {
                    eprint!("{}", format_eval_error(&err, &source));
                    std::process::exit(1);
                }
            }
        }

        Commands::Check { path, lint } => {
            let source = std::fs::read_to_string(&path)?;
            let module = sable::parse_str(&source)?;

            if let Err(errors) = Validator::new().check_module(&module) {
                for error in &errors {
                    eprint!("{}", format_validation_error(error, &source));
                }
                std::process::exit(1);
            }

            if lint {
                let issues = Linter::new().lint(&module)?;
                for issue in &issues {
                    let label = match issue.severity {
                        Severity::Error => "error".red().bold(),
                        Severity::Warning => "warning".yellow().bold(),
                        Severity::Info => "info".blue().bold(),
                    };
                    println!("{} [{}] {}", label, issue.rule, issue.message);
                    if let Some(suggestion) = &issue.suggestion {
                        println!("  {} {}", "Hint:".green().bold(), suggestion);
                    }
                }
                if has_lint_errors(&issues) {
                    std::process::exit(1);
                }
            }

            println!("{} {}", "✓".green(), path.display());
        }

        Commands::Fmt { path, write } => {
            let module = sable::parse_file(&path)?;
            let formatted = Formatter::new().format_module(&module)?;
            if write {
                std::fs::write(&path, formatted)?;
            } else {
                print!("{}", formatted);
            }
        }
    }

    Ok(())
}
