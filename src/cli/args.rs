//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::num::NonZeroUsize;
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ lai init                              # Create .lai/settings.toml
  $ lai index wyrok_1.pdf wyrok_2.pdf     # Chunk, embed and store rulings
  $ lai search \"kradzież w sklepie\"       # Nearest chunks, no LLM needed
  $ lai ask \"Jaki wyrok zapadł?\"          # Answer from the stored rulings
  $ lai ask \"...\" --pdf wyrok.pdf         # Index a file, then answer";

/// Question answering over PDF court rulings
#[derive(Parser, Debug)]
#[command(
    name = "lai",
    version = env!("CARGO_PKG_VERSION"),
    about = "Retrieval-augmented question answering over PDF court rulings",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up .lai directory with default settings
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Load PDFs, chunk them and store the chunks
    Index {
        /// PDF files to index
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Sentences per chunk, at least 1 (overrides config)
        #[arg(long)]
        chunk_size: Option<NonZeroUsize>,

        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show the stored chunks closest to a query
    Search {
        query: String,

        /// Number of results, at least 1 (overrides config)
        #[arg(short, long)]
        n: Option<NonZeroUsize>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the stored rulings
    Ask {
        query: String,

        /// Index these PDFs before answering (files already in the collection are skipped)
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,

        /// Number of retrieved chunks, at least 1 (overrides config)
        #[arg(short, long)]
        n: Option<NonZeroUsize>,
    },

    /// List registered prompt templates
    Prompts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_pdfs() {
        let cli = Cli::try_parse_from([
            "lai", "ask", "Co orzekł sąd?", "--pdf", "a.pdf", "--pdf", "b.pdf", "-n", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask { query, pdfs, n } => {
                assert_eq!(query, "Co orzekł sąd?");
                assert_eq!(pdfs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert_eq!(n, NonZeroUsize::new(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_zero_counts_rejected() {
        assert!(Cli::try_parse_from(["lai", "search", "rower", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["lai", "ask", "Co orzekł sąd?", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["lai", "index", "a.pdf", "--chunk-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["lai", "search", "rower", "-n", "1"]).is_ok());
    }

    #[test]
    fn test_index_requires_files() {
        assert!(Cli::try_parse_from(["lai", "index"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["lai", "prompts", "--config", "custom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
