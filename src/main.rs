use clap::Parser;

use lai::cli::{self, Cli, Commands};
use lai::config::Settings;
use lai::logging;

fn main() {
    let cli = Cli::parse();

    let config = cli::load_settings(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        if matches!(cli.command, Commands::Init { .. }) {
            Settings::default()
        } else {
            std::process::exit(1);
        }
    });

    logging::init_with_config(&config.logging);
    tracing::debug!(target: "cli", "workspace root: {:?}", config.workspace_root);

    if let Err(e) = cli::dispatch(cli, &config) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
