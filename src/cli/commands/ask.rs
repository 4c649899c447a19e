//! Ask command - retrieve context and generate an answer.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Context;
use console::style;

use crate::config::Settings;
use crate::pipeline::{PAGE_KEY, SOURCE_KEY, build_pipeline, build_prompt_registry};

/// Arguments for the ask command.
pub struct AskArgs {
    pub query: String,
    pub pdfs: Vec<PathBuf>,
    pub n_results: Option<NonZeroUsize>,
}

/// Run the ask command.
pub fn run(args: AskArgs, config: &Settings) -> anyhow::Result<()> {
    let prompts = build_prompt_registry(config)?;
    let mut pipeline = build_pipeline(config, &prompts)?;
    if let Some(n) = args.n_results {
        pipeline = pipeline.with_n_results(n.get());
    }

    let sentences_per_chunk = config.sentences_per_chunk()?;
    for pdf in &args.pdfs {
        if pipeline.is_indexed(pdf) {
            eprintln!("Skipped {} (already indexed)", pdf.display());
            continue;
        }
        let stored = pipeline
            .index_file(pdf, sentences_per_chunk)
            .with_context(|| format!("failed to index {}", pdf.display()))?;
        eprintln!("Indexed {} ({stored} chunk(s))", pdf.display());
    }

    if pipeline.store().count() == 0 {
        eprintln!("Warning: the collection is empty, the answer has no context.");
    }

    let answer = pipeline.answer(&args.query)?;
    println!("{}", answer.answer);

    let hits = answer.context.first_hits();
    if !hits.is_empty() {
        eprintln!("\n{}", style("Sources:").dim());
        for hit in hits {
            let page = hit
                .metadata
                .and_then(|m| m.get(PAGE_KEY))
                .map(|p| format!("page {p}"))
                .unwrap_or_else(|| format!("chunk {}", hit.id));
            let source = hit
                .metadata
                .and_then(|m| m.get(SOURCE_KEY))
                .map(|s| format!("{s}, "))
                .unwrap_or_default();
            eprintln!("  {}", style(format!("{source}{page} ({:.4})", hit.distance)).dim());
        }
    }
    Ok(())
}
