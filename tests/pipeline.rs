use std::{cell::RefCell, path::Path, time::Duration};

use finqa::{
    Extraction,
    GenerationError,
    Generator,
    PipelineConfig,
    Session,
    generation::PROMPT_PREVIEW_CHARS,
    prompt::NO_CONTEXT_ENTRY,
};
use serde_json::json;

/// Generator that replays a fixed outcome and records what it was sent.
struct Scripted {
    outcome: fn() -> Result<String, GenerationError>,
    seen: RefCell<Vec<(String, String, Duration)>>,
}

impl Scripted {
    fn new(outcome: fn() -> Result<String, GenerationError>) -> Self {
        Self {
            outcome,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Generator for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(
        &self,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        self.seen
            .borrow_mut()
            .push((prompt.to_string(), model.to_string(), timeout));
        (self.outcome)()
    }
}

fn financial_statement() -> Extraction {
    Extraction {
        text_blocks: vec![
            "Total Revenue: 1,234,567".into(),
            "Net Income: 98,765".into(),
        ],
        ..Extraction::default()
    }
}

fn write_fixtures(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let statement = json!({
        "text_blocks": [
            "Total Revenue: 1,234,567",
            "Operating expenses rose to 456,000 in the fourth quarter."
        ],
        "tables": [
            [["Segment", "Revenue"], ["Retail", 400000], ["Wholesale", 834567]],
            []
        ],
        "metadata": {"pages": 3}
    });
    std::fs::write(
        dir.join("statement.json"),
        serde_json::to_string_pretty(&statement)?,
    )?;
    std::fs::write(dir.join("notes.txt"), "Dividends paid: 12,000")?;
    std::fs::write(dir.join("broken.json"), "{ not json")?;
    Ok(())
}

#[test]
fn retrieves_normalized_revenue_chunk() {
    let config = PipelineConfig {
        top_k: 1,
        ..PipelineConfig::default()
    };
    let mut session = Session::new(config);
    session.ingest(&[financial_statement()]);

    assert_eq!(session.corpus()[0].content, "Total Revenue: 1234567");

    let hits = session.retrieve("total revenue");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk_index, 0);
    assert!(hits[0].score > 0.0);
}

#[test]
fn long_block_is_split_with_overlap() {
    let mut session = Session::default();
    session.ingest(&[Extraction::from_text("A".repeat(1000))]);

    let lengths: Vec<usize> = session
        .corpus()
        .iter()
        .map(|c| c.content.chars().count())
        .collect();
    assert_eq!(lengths, vec![800, 400]);
}

#[test]
fn empty_corpus_prompt_reports_missing_context() {
    let session = Session::default();
    assert!(session.retrieve("revenue").is_empty());

    let prompt = session.prompt("revenue");
    assert!(prompt.contains(NO_CONTEXT_ENTRY));
    assert!(prompt.contains("QUESTION:\nrevenue"));
}

#[test]
fn timeout_becomes_diagnostic_answer() {
    let mut session = Session::default();
    // Enough text that the prompt runs past the preview length.
    let filler = "Segment revenue grew in every region. ".repeat(20);
    session.ingest(&[
        financial_statement(),
        Extraction::from_text(filler.clone()),
        Extraction::from_text(filler.clone()),
        Extraction::from_text(filler),
    ]);

    let generator = Scripted::new(|| {
        Err(GenerationError::TimedOut(Duration::from_secs(30)))
    });
    let question = "What was segment revenue?";
    let answer = session.answer(question, &generator);

    let prompt = session.prompt(question);
    assert!(prompt.chars().count() > PROMPT_PREVIEW_CHARS);
    let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();

    assert!(answer.starts_with("ERROR calling scripted:"));
    assert!(answer.contains("timed out"));
    assert!(answer.ends_with(&preview));
    assert!(!answer.contains(&prompt));
}

#[test]
fn answer_passes_prompt_model_and_timeout() {
    let config = PipelineConfig::from_parts(
        800,
        200,
        2,
        "mistral",
        5,
        Some("Answer in one sentence.".into()),
    )
    .unwrap();
    let mut session = Session::new(config);
    session.ingest(&[financial_statement()]);

    let generator = Scripted::new(|| Ok("Revenue was 1234567.".into()));
    let answer = session.answer("What was net income?", &generator);
    assert_eq!(answer, "Revenue was 1234567.");

    let seen = generator.seen.borrow();
    assert_eq!(seen.len(), 1);
    let (prompt, model, timeout) = &seen[0];
    assert_eq!(prompt, &session.prompt("What was net income?"));
    assert!(prompt.contains("Answer in one sentence."));
    assert!(prompt.contains("Net Income: 98765"));
    assert_eq!(model, "mistral");
    assert_eq!(*timeout, Duration::from_secs(5));
}

#[test]
fn ingest_paths_loads_directory_and_reports_failures() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixtures(tmp.path()).unwrap();

    let mut session = Session::default();
    let report = session.ingest_paths(&[tmp.path()]);

    assert_eq!(report.documents, 2);
    assert_eq!(report.text_blocks, 3);
    assert_eq!(report.tables_rendered, 1);
    assert_eq!(report.skipped_tables.len(), 1);
    assert_eq!(report.failed_documents.len(), 1);
    assert!(report.failed_documents[0].source.ends_with("broken.json"));
    assert_eq!(report.chunks, session.corpus().len());

    let results = session.search("dividends paid");
    assert!(!results.is_empty());
    assert_eq!(results[0].content, "Dividends paid: 12000");

    let table = session
        .corpus()
        .iter()
        .find(|c| c.content.starts_with("Table 0:"))
        .expect("rendered table chunk");
    assert!(table.content.contains("Wholesale"));
    assert!(table.content.contains("834567"));
}

#[test]
fn missing_input_is_reported_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let present = tmp.path().join("present.txt");
    std::fs::write(&present, "Cash: 1,000").unwrap();

    let mut session = Session::default();
    let report =
        session.ingest_paths(&[present, tmp.path().join("missing.json")]);

    assert_eq!(report.documents, 1);
    assert_eq!(report.failed_documents.len(), 1);
    assert_eq!(session.corpus()[0].content, "Cash: 1000");
}
