//! Backlog CLI - a prioritized work-item list for the command line.

use backlog::cli::{Cli, Commands};
use backlog::commands::{self, Output};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Workspace: --workspace flag > BLG_WORKSPACE env (via clap) > cwd
    let workspace = resolve_workspace(cli.workspace, human);

    // No subcommand behaves like `blg list`
    let command = cli.command.unwrap_or(Commands::List);

    if let Err(e) = run_command(command, &workspace, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve the workspace path from the explicit flag or fall back to the
/// current working directory.
fn resolve_workspace(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!(
                        "Error: Specified workspace path does not exist: {}",
                        path.display()
                    );
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!(
                                "Specified workspace path does not exist: {}",
                                path.display()
                            )
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn run_command(command: Commands, workspace: &Path, human: bool) -> Result<(), backlog::Error> {
    match command {
        Commands::Add { title, score, duration } => {
            let result = commands::add(workspace, &title, score, duration)?;
            output(&result, human);
        }

        Commands::Edit { id, title, score, duration } => {
            let result = commands::edit(workspace, &id, &title, score, duration)?;
            output(&result, human);
        }

        Commands::Delete { ids } => {
            let result = commands::delete(workspace, &ids)?;
            output(&result, human);
        }

        Commands::Show { id } => {
            let result = commands::show(workspace, &id)?;
            output(&result, human);
        }

        Commands::List => {
            let result = commands::list(workspace)?;
            output(&result, human);
        }

        Commands::Sort { column } => {
            let result = commands::sort(workspace, column)?;
            output(&result, human);
        }

        Commands::Name { new_name } => {
            let result = commands::name(workspace, new_name.as_deref())?;
            output(&result, human);
        }

        Commands::Scale { min, max } => {
            let result = commands::scale(workspace, min, max)?;
            output(&result, human);
        }

        Commands::Limits => {
            let result = commands::limits(workspace)?;
            output(&result, human);
        }

        Commands::Export { path } => {
            let result = commands::export(workspace, &path)?;
            output(&result, human);
        }

        Commands::Import { path } => {
            let result = commands::import(workspace, &path)?;
            output(&result, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
