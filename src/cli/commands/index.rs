//! Index command - load PDFs, chunk them and store the chunks.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{Settings, StoreKind};
use crate::pipeline::{IndexProgress, build_indexer};

const BAR_TEMPLATE: &str = "{spinner:.green} {msg:<10} [{bar:40.cyan/blue}] {pos}/{len}";

/// Arguments for the index command.
pub struct IndexArgs {
    pub pdfs: Vec<PathBuf>,
    pub chunk_size: Option<NonZeroUsize>,
    pub progress: bool,
}

/// Run the index command.
pub fn run(args: IndexArgs, config: &Settings) -> anyhow::Result<()> {
    if config.store.kind == StoreKind::Ephemeral {
        bail!(
            "indexing into an ephemeral store keeps nothing; set store.kind = \"persistent\" or use 'lai ask --pdf'"
        );
    }

    let sentences_per_chunk = match args.chunk_size {
        Some(size) => size,
        None => config.sentences_per_chunk()?,
    };

    let mut indexer = build_indexer(config)?;
    let mut total_chunks = 0;

    for pdf in &args.pdfs {
        if indexer.is_indexed(pdf) {
            println!(
                "{} {} (already in collection '{}')",
                style("Skipped").yellow().bold(),
                pdf.display(),
                indexer.store().name()
            );
            continue;
        }

        let pages = indexer
            .load_file(pdf)
            .with_context(|| format!("failed to load {}", pdf.display()))?;

        let bar = args.progress.then(|| create_progress_bar(pages.len() as u64));
        let stored = indexer.insert_data_to_db_with_progress(
            &pages,
            sentences_per_chunk,
            |event| {
                if let Some(ref bar) = bar {
                    update_progress(bar, event);
                }
            },
        )?;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        println!(
            "{} {} ({} page(s), {} chunk(s))",
            style("Indexed").green().bold(),
            pdf.display(),
            pages.len(),
            stored
        );
        total_chunks += stored;
    }

    println!(
        "\n{total_chunks} chunk(s) added, collection '{}' now holds {}",
        indexer.store().name(),
        indexer.store().count()
    );
    Ok(())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(bar_style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        bar.set_style(bar_style.progress_chars("█▓▒░ "));
    }
    bar
}

fn update_progress(bar: &ProgressBar, event: IndexProgress) {
    match event {
        IndexProgress::ChunkingPage { current, total } => {
            bar.set_message("chunking");
            bar.set_length(total as u64);
            bar.set_position(current as u64);
        }
        IndexProgress::StoringChunks { current, total } => {
            bar.set_message("embedding");
            bar.set_length(total as u64);
            bar.set_position(current as u64);
        }
    }
}
