//! Loading of extraction results produced by the document parsers.
//!
//! A JSON file carries the full extraction contract (`text_blocks`,
//! `tables`, `metadata`); any other supported file is read as a single text
//! block. One unreadable document never stops the rest of a batch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::Result, table::Table, walker};

/// Text and tables extracted from one source document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Extraction {
    pub text_blocks: Vec<String>,
    pub tables: Vec<Table>,
    pub metadata: Map<String, Value>,
}

impl Extraction {
    /// An extraction holding `text` as its only block.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text_blocks: vec![text.into()],
            ..Self::default()
        }
    }

    /// Read an extraction from disk.
    ///
    /// `.json` files are parsed as the extraction contract; anything else
    /// becomes a single text block.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::from_text(contents))
        }
    }
}

/// A successfully loaded input.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source: PathBuf,
    pub extraction: Extraction,
}

/// An input that could not be loaded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Everything found under a set of input paths.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub documents: Vec<LoadedDocument>,
    pub failures: Vec<LoadFailure>,
}

/// Load every input path, descending into directories.
///
/// Files and directories are processed in the order given; failures are
/// collected and loading continues with the next input.
pub fn load_inputs<P: AsRef<Path>>(inputs: &[P]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            match walker::discover_files(input) {
                Ok(files) => {
                    for file in files {
                        load_one(&file.absolute_path, &mut outcome);
                    }
                }
                Err(err) => record_failure(input, &err, &mut outcome),
            }
        } else {
            load_one(input, &mut outcome);
        }
    }

    tracing::debug!(
        loaded = outcome.documents.len(),
        failed = outcome.failures.len(),
        "loaded extraction inputs"
    );
    outcome
}

fn load_one(path: &Path, outcome: &mut LoadOutcome) {
    match Extraction::load(path) {
        Ok(extraction) => outcome.documents.push(LoadedDocument {
            source: path.to_path_buf(),
            extraction,
        }),
        Err(err) => record_failure(path, &err, outcome),
    }
}

fn record_failure(
    path: &Path,
    err: &crate::error::Error,
    outcome: &mut LoadOutcome,
) {
    tracing::warn!(path = %path.display(), error = %err, "skipping input");
    outcome.failures.push(LoadFailure {
        source: path.to_path_buf(),
        error: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_full_contract() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("q4.json");
        std::fs::write(
            &path,
            json!({
                "text_blocks": ["Total Revenue: 1,234,567"],
                "tables": [[["Item", "Amount"], ["Revenue", 1234567]]],
                "metadata": {"pages": 3}
            })
            .to_string(),
        )
        .unwrap();

        let extraction = Extraction::load(&path).unwrap();
        assert_eq!(extraction.text_blocks, vec!["Total Revenue: 1,234,567"]);
        assert_eq!(extraction.tables.len(), 1);
        assert_eq!(extraction.tables[0].rows[1][1], json!(1234567));
        assert_eq!(extraction.metadata["pages"], json!(3));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let extraction: Extraction =
            serde_json::from_str(r#"{"text_blocks": ["x"]}"#).unwrap();
        assert!(extraction.tables.is_empty());
        assert!(extraction.metadata.is_empty());
    }

    #[test]
    fn text_files_become_one_block() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("memo.txt");
        std::fs::write(&path, "Net Income: 98,765\nOperating costs").unwrap();

        let extraction = Extraction::load(&path).unwrap();
        assert_eq!(
            extraction.text_blocks,
            vec!["Net Income: 98,765\nOperating costs"]
        );
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.txt");
        let bad = tmp.path().join("bad.json");
        let missing = tmp.path().join("missing.txt");
        std::fs::write(&good, "Revenue").unwrap();
        std::fs::write(&bad, "{not json").unwrap();

        let outcome = load_inputs(&[&bad, &missing, &good]);
        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.documents[0].source, good);
        let failed: Vec<&PathBuf> =
            outcome.failures.iter().map(|f| &f.source).collect();
        assert_eq!(failed, vec![&bad, &missing]);
        assert!(outcome.failures[0].error.starts_with("JSON error"));
    }

    #[test]
    fn directories_are_walked_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.txt"), "second").unwrap();
        std::fs::write(tmp.path().join("a.json"), r#"{"text_blocks":["first"]}"#)
            .unwrap();
        std::fs::write(tmp.path().join("ignored.csv"), "x,y").unwrap();

        let outcome = load_inputs(&[tmp.path()]);
        let blocks: Vec<&str> = outcome
            .documents
            .iter()
            .flat_map(|d| d.extraction.text_blocks.iter().map(String::as_str))
            .collect();
        assert_eq!(blocks, vec!["first", "second"]);
        assert!(outcome.failures.is_empty());
    }
}
