//! Search command - nearest stored chunks, without generation.

use std::num::NonZeroUsize;

use anyhow::bail;
use console::style;

use crate::config::{Settings, StoreKind};
use crate::pipeline::{PAGE_KEY, SOURCE_KEY, build_indexer};
use crate::vector::{QueryHit, QueryResult};

/// Arguments for the search command.
pub struct SearchArgs {
    pub query: String,
    pub n_results: Option<NonZeroUsize>,
    pub json: bool,
}

/// Run the search command.
pub fn run(args: SearchArgs, config: &Settings) -> anyhow::Result<()> {
    if config.store.kind == StoreKind::Ephemeral {
        bail!("an ephemeral store is empty at startup; set store.kind = \"persistent\"");
    }

    let indexer = build_indexer(config)?;
    if indexer.store().count() == 0 {
        eprintln!("Collection '{}' is empty. Run 'lai index <PDF>' first.", indexer.store().name());
    }

    let n_results = args.n_results.map_or(config.retrieval.n_results, NonZeroUsize::get);
    let result = indexer.query_db(&args.query, n_results)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits_to_json(&result))?);
        return Ok(());
    }

    let hits = result.first_hits();
    if hits.is_empty() {
        println!("No results found for query: {}", args.query);
        return Ok(());
    }

    println!("Found {} result(s) for query: '{}'\n", hits.len(), args.query);
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. {} {}",
            i + 1,
            style(location(hit)).cyan().bold(),
            style(format!("(distance: {:.4})", hit.distance)).dim()
        );
        println!("   {}\n", hit.document);
    }
    Ok(())
}

fn location(hit: &QueryHit<'_>) -> String {
    let metadata = hit.metadata;
    let source = metadata.and_then(|m| m.get(SOURCE_KEY)).map(ToString::to_string);
    let page = metadata.and_then(|m| m.get(PAGE_KEY)).map(ToString::to_string);
    match (source, page) {
        (Some(source), Some(page)) => format!("{source}, page {page}"),
        (None, Some(page)) => format!("page {page}"),
        (Some(source), None) => source,
        (None, None) => hit.id.to_string(),
    }
}

fn hits_to_json(result: &QueryResult) -> serde_json::Value {
    let hits: Vec<_> = result
        .first_hits()
        .into_iter()
        .map(|hit| {
            serde_json::json!({
                "id": hit.id,
                "document": hit.document,
                "metadata": hit.metadata,
                "distance": hit.distance,
            })
        })
        .collect();
    serde_json::Value::Array(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Metadata;

    fn sample_result() -> QueryResult {
        let mut metadata = Metadata::new();
        metadata.insert("page_nr".to_string(), 3i64.into());
        metadata.insert("source".to_string(), "wyrok.pdf".into());
        QueryResult {
            ids: vec![vec!["0".to_string(), "1".to_string()]],
            documents: vec![vec!["Sąd orzekł.".to_string(), "Bez metadanych.".to_string()]],
            metadatas: vec![vec![Some(metadata), None]],
            distances: vec![vec![0.125, 0.5]],
        }
    }

    #[test]
    fn test_location_prefers_source_and_page() {
        let result = sample_result();
        let hits = result.first_hits();
        assert_eq!(location(&hits[0]), "wyrok.pdf, page 3");
        assert_eq!(location(&hits[1]), "1");
    }

    #[test]
    fn test_hits_to_json() {
        let json = hits_to_json(&sample_result());
        let hits = json.as_array().unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["id"], "0");
        assert_eq!(hits[0]["metadata"]["page_nr"], 3);
        assert_eq!(hits[0]["distance"], 0.125);
        assert!(hits[1]["metadata"].is_null());
    }
}
