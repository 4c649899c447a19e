mod common;

use std::num::NonZeroUsize;

use common::{CannedGenerator, TopicEmbedder, WordTokenizer, write_pdf};
use lai::config::StoreKind;
use lai::error::{ConfigError, PipelineError};
use lai::model::LanguageModel;
use lai::pipeline::{PipelineState, build_pipeline};
use lai::prompts::{BIELIK_11B_INSTRUCT, PromptRegistry};
use lai::vector::{EphemeralCollection, MetadataValue};
use lai::{Language, Page, RagPipeline, Settings};
use tempfile::TempDir;

const THREE: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

fn pipeline<'p>(
    prompts: &'p PromptRegistry,
    model_id: &str,
    answer: &str,
) -> (RagPipeline<'p>, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
    let store = EphemeralCollection::new("lai_db", Box::new(TopicEmbedder));
    let (generator, seen) = CannedGenerator::new(answer);
    let model = LanguageModel::new(
        model_id,
        Box::new(WordTokenizer::default()),
        Box::new(generator),
    );
    let pipeline = RagPipeline::new(Box::new(store), model, prompts, Language::Polish);
    (pipeline, seen)
}

fn ruling_pages() -> Vec<Page> {
    vec![
        Page::new(
            0,
            "Sąd Rejonowy rozpoznał sprawę. Oskarżony ukradł rower. Rower był wart 900 zł. Pokrzywdzony odzyskał rower.",
        ),
        Page::new(1, "Oskarżony prowadził samochód. Był nietrzeźwy."),
    ]
}

#[test]
fn test_index_and_answer() {
    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, seen) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "Oskarżony ukradł rower.");
    assert_eq!(pipeline.state(), PipelineState::Idle);

    let stored = pipeline.insert_data_to_db(&ruling_pages(), THREE).unwrap();
    // 4 sentences on page 0 give two chunks, page 1 gives one
    assert_eq!(stored, 3);
    assert_eq!(pipeline.store().count(), 3);
    assert_eq!(pipeline.state(), PipelineState::Indexed);

    let answer = pipeline.answer("Co ukradł oskarżony? Czy był to rower?").unwrap();
    assert_eq!(answer.answer, "Oskarżony ukradł rower.");
    assert_eq!(pipeline.state(), PipelineState::Answered);

    let hits = answer.context.first_hits();
    assert_eq!(hits.len(), 3);
    // Both page 0 chunks mention the bicycle, the page 1 chunk does not
    assert_eq!(hits[2].id, "id_2");
    assert_eq!(
        hits[0].metadata.and_then(|m| m.get("page_nr")),
        Some(&MetadataValue::Int(0))
    );

    let prompts_seen = seen.lock().unwrap();
    assert_eq!(prompts_seen.len(), 1);
    assert!(prompts_seen[0].starts_with("<user> "));
    assert!(prompts_seen[0].contains("Co ukradł oskarżony? Czy był to rower?"));
    assert!(prompts_seen[0].contains("- Sąd Rejonowy rozpoznał sprawę."));
}

#[test]
fn test_chunk_ids_continue_across_batches() {
    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    pipeline.insert_data_to_db(&ruling_pages(), THREE).unwrap();
    pipeline
        .insert_data_to_db(&[Page::new(2, "Wyrok jest prawomocny.")], THREE)
        .unwrap();

    assert_eq!(pipeline.store().count(), 4);
    let result = pipeline.query_db("prawomocny", 4).unwrap();
    assert!(result.ids[0].contains(&"id_3".to_string()));
}

#[test]
fn test_blank_pages_add_nothing() {
    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    let stored = pipeline
        .insert_data_to_db(&[Page::new(0, ""), Page::new(1, "   ")], THREE)
        .unwrap();
    assert_eq!(stored, 0);
    assert_eq!(pipeline.store().count(), 0);
}

#[test]
fn test_answer_with_empty_store_still_prompts() {
    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, seen) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "Brak danych.");

    let answer = pipeline.prompt_with_rag("Jaki wyrok zapadł?").unwrap();
    assert_eq!(answer, "Brak danych.");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_missing_prompt_for_model() {
    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, seen) = pipeline(&prompts, "unknown/model", "never");
    pipeline.insert_data_to_db(&ruling_pages(), THREE).unwrap();

    let err = pipeline.answer("Co się stało?").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::MissingPrompt { .. })
    ));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_prepare_prompt_renders_context_list() {
    let prompts = PromptRegistry::with_builtin();
    let (pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    let prompt = pipeline
        .prepare_prompt("Pytanie?", &["Pierwszy fragment.", "Drugi fragment."])
        .unwrap();
    assert!(prompt.contains("- Pierwszy fragment.\n- Drugi fragment."));
    assert!(prompt.contains("Pytanie?"));
    assert!(!prompt.contains("{context}"));
    assert!(!prompt.contains("{query}"));
}

#[test]
fn test_index_pdf_records_source() {
    let temp_dir = TempDir::new().unwrap();
    let pdf_path = temp_dir.path().join("wyrok.pdf");
    write_pdf(&pdf_path, &["The court found the accused guilty. He stole a bicycle."]);

    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    let stored = pipeline.index_file(&pdf_path, THREE).unwrap();
    assert!(stored >= 1);

    let result = pipeline.query_db("bicycle", 1).unwrap();
    let hit = result.first_hits()[0];
    assert!(hit.document.contains("bicycle"));
    assert_eq!(
        hit.metadata.and_then(|m| m.get("source")),
        Some(&MetadataValue::Str("wyrok.pdf".to_string()))
    );
}

#[test]
fn test_chunks_keep_their_pdf_page() {
    let temp_dir = TempDir::new().unwrap();
    let pdf_path = temp_dir.path().join("wyrok.pdf");
    write_pdf(
        &pdf_path,
        &["The accused stole a bicycle.", "He drove a car while drunk."],
    );

    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    // One sentence per page, so each page becomes its own chunk
    let stored = pipeline.index_file(&pdf_path, THREE).unwrap();
    assert_eq!(stored, 2);

    let result = pipeline.query_db("car drunk", 1).unwrap();
    let hit = result.first_hits()[0];
    assert!(hit.document.contains("car"));
    assert!(!hit.document.contains("bicycle"));
    assert_eq!(
        hit.metadata.and_then(|m| m.get("page_nr")),
        Some(&MetadataValue::Int(1))
    );

    let result = pipeline.query_db("bicycle", 1).unwrap();
    assert_eq!(
        result.first_hits()[0].metadata.and_then(|m| m.get("page_nr")),
        Some(&MetadataValue::Int(0))
    );
}

#[test]
fn test_indexing_same_pdf_twice_adds_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let pdf_path = temp_dir.path().join("wyrok.pdf");
    write_pdf(&pdf_path, &["The accused stole a bicycle.", "He drove a car."]);

    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");
    assert!(!pipeline.is_indexed(&pdf_path));

    let first = pipeline.index_file(&pdf_path, THREE).unwrap();
    assert!(first >= 1);
    assert!(pipeline.is_indexed(&pdf_path));

    let second = pipeline.index_file(&pdf_path, THREE).unwrap();
    assert_eq!(second, 0);
    assert_eq!(pipeline.store().count(), first);
}

#[test]
fn test_source_travels_with_pages() {
    let temp_dir = TempDir::new().unwrap();
    let pdf_path = temp_dir.path().join("wyrok.pdf");
    write_pdf(&pdf_path, &["The accused stole a bicycle."]);

    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    pipeline.load_file(&pdf_path).unwrap();
    // Pages built by hand after a load carry no source
    pipeline
        .insert_data_to_db(&[Page::new(0, "He drove a car.")], THREE)
        .unwrap();

    let result = pipeline.query_db("car", 1).unwrap();
    let hit = result.first_hits()[0];
    assert!(hit.document.contains("car"));
    assert_eq!(hit.metadata.and_then(|m| m.get("source")), None);
}

#[test]
fn test_missing_pdf_is_a_load_error() {
    let prompts = PromptRegistry::with_builtin();
    let (mut pipeline, _) = pipeline(&prompts, BIELIK_11B_INSTRUCT, "ok");

    let err = pipeline.load_file("/nonexistent/ruling.pdf").unwrap_err();
    assert!(matches!(err, PipelineError::Load(_)));
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_build_pipeline_rejects_unsupported_language() {
    let mut settings = Settings::default();
    settings.language = "klingon".to_string();
    settings.store.kind = StoreKind::Ephemeral;

    let prompts = PromptRegistry::with_builtin();
    let err = build_pipeline(&settings, &prompts).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_build_pipeline_checks_prompt_before_loading_models() {
    let mut settings = Settings::default();
    settings.llm.model = "google/gemma-2b-it".to_string();
    settings.store.kind = StoreKind::Ephemeral;

    // Gemma only has an English template; the default language is Polish
    let prompts = PromptRegistry::with_builtin();
    let err = build_pipeline(&settings, &prompts).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::MissingPrompt { .. })
    ));
}
