//! CLI module for the question answering tool.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use std::path::{Path, PathBuf};

use crate::config::{CONFIG_DIR, Settings};

/// Load settings, from `--config` when given.
///
/// A custom file inside a `.lai` directory anchors the workspace at that
/// directory's parent; any other file anchors it at its own directory.
pub fn load_settings(cli_config: Option<&Path>) -> Result<Settings, Box<figment::Error>> {
    let Some(path) = cli_config else {
        return Settings::load();
    };

    let mut settings = Settings::load_from(path)?;
    if settings.workspace_root.is_none() {
        settings.workspace_root = config_workspace(path);
    }
    Ok(settings)
}

fn config_workspace(path: &Path) -> Option<PathBuf> {
    let dir = path.parent()?;
    let root = if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
        dir.parent()?
    } else {
        dir
    };
    Some(root.to_path_buf())
}

/// Run a parsed command.
pub fn dispatch(cli: Cli, config: &Settings) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(config),
        Commands::Index {
            pdfs,
            chunk_size,
            no_progress,
        } => commands::index::run(
            commands::index::IndexArgs {
                pdfs,
                chunk_size,
                progress: !no_progress,
            },
            config,
        ),
        Commands::Search { query, n, json } => commands::search::run(
            commands::search::SearchArgs {
                query,
                n_results: n,
                json,
            },
            config,
        ),
        Commands::Ask { query, pdfs, n } => commands::ask::run(
            commands::ask::AskArgs {
                query,
                pdfs,
                n_results: n,
            },
            config,
        ),
        Commands::Prompts => commands::prompts::run(config),
    }
}
