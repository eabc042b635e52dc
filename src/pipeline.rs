//! The ingestion-to-answer pipeline.
//!
//! A [`Session`] owns the corpus and the index derived from it. Both are
//! replaced together on every ingestion, so queries always run against an
//! index that matches the current corpus.

use std::path::Path;

use serde::Serialize;

use crate::{
    chunking::{Chunk, chunk_text_blocks},
    config::PipelineConfig,
    extraction::{Extraction, LoadFailure, load_inputs},
    generation::{Generator, generate_or_diagnostic},
    prompt::{ContextEntry, build_prompt, context_entries},
    retriever::{CorpusIndex, RetrievalHit},
    table::{SkippedTable, render_tables},
};

/// What happened during one ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents that contributed content.
    pub documents: usize,
    /// Text blocks taken from documents, before chunking.
    pub text_blocks: usize,
    /// Tables rendered into snippets.
    pub tables_rendered: usize,
    /// Tables left out, with reasons.
    pub skipped_tables: Vec<SkippedTable>,
    /// Inputs that could not be loaded.
    pub failed_documents: Vec<LoadFailure>,
    /// Size of the new corpus.
    pub chunks: usize,
}

/// A retrieved chunk, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk<'a> {
    pub chunk_index: usize,
    pub score: f32,
    pub block: usize,
    pub content: &'a str,
}

/// Caller-owned pipeline state: configuration, corpus and index.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: PipelineConfig,
    corpus: Vec<Chunk>,
    index: CorpusIndex,
}

impl Session {
    /// A session with an empty corpus.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            corpus: Vec::new(),
            index: CorpusIndex::empty(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn corpus(&self) -> &[Chunk] {
        &self.corpus
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    /// Replace the corpus with the content of `documents`.
    ///
    /// All text blocks come first, in document order, followed by the
    /// rendered tables of every document. Tables are numbered across the
    /// whole batch.
    pub fn ingest(&mut self, documents: &[Extraction]) -> IngestReport {
        let mut blocks: Vec<&str> = documents
            .iter()
            .flat_map(|doc| doc.text_blocks.iter().map(String::as_str))
            .collect();
        let text_blocks = blocks.len();

        let tables = render_tables(documents.iter().flat_map(|doc| &doc.tables));
        blocks.extend(tables.snippets.iter().map(String::as_str));

        let corpus = chunk_text_blocks(&blocks, &self.config.chunking);
        self.replace_corpus(corpus);

        let report = IngestReport {
            documents: documents.len(),
            text_blocks,
            tables_rendered: tables.snippets.len(),
            skipped_tables: tables.skipped,
            failed_documents: Vec::new(),
            chunks: self.corpus.len(),
        };
        tracing::info!(
            documents = report.documents,
            chunks = report.chunks,
            tables = report.tables_rendered,
            skipped_tables = report.skipped_tables.len(),
            "ingested documents"
        );
        report
    }

    /// Load the given files and directories, then ingest what loaded.
    ///
    /// Unreadable inputs are listed in the report and do not prevent the
    /// others from being ingested.
    pub fn ingest_paths<P: AsRef<Path>>(&mut self, inputs: &[P]) -> IngestReport {
        let outcome = load_inputs(inputs);
        let documents: Vec<Extraction> = outcome
            .documents
            .into_iter()
            .map(|doc| doc.extraction)
            .collect();

        let mut report = self.ingest(&documents);
        report.failed_documents = outcome.failures;
        report
    }

    fn replace_corpus(&mut self, corpus: Vec<Chunk>) {
        self.index = CorpusIndex::build(&corpus);
        self.corpus = corpus;
    }

    /// Rank the corpus against `question`, keeping the configured `top_k`.
    pub fn retrieve(&self, question: &str) -> Vec<RetrievalHit> {
        self.index.top_k(question, self.config.top_k)
    }

    /// Retrieved chunks with their text, in rank order.
    pub fn search(&self, question: &str) -> Vec<ScoredChunk<'_>> {
        self.retrieve(question)
            .into_iter()
            .filter_map(|hit| {
                self.corpus.get(hit.chunk_index).map(|chunk| ScoredChunk {
                    chunk_index: hit.chunk_index,
                    score: hit.score,
                    block: chunk.block,
                    content: &chunk.content,
                })
            })
            .collect()
    }

    /// The prompt that would be sent for `question`.
    pub fn prompt(&self, question: &str) -> String {
        let hits = self.retrieve(question);
        let contexts: Vec<ContextEntry<'_>> =
            context_entries(&self.corpus, &hits);
        build_prompt(&contexts, question, self.config.instructions.as_deref())
    }

    /// Answer `question` with `generator`.
    ///
    /// Always returns text: backend failures come back as a diagnostic
    /// that includes the start of the prompt.
    pub fn answer(&self, question: &str, generator: &dyn Generator) -> String {
        let prompt = self.prompt(question);
        generate_or_diagnostic(
            generator,
            &prompt,
            &self.config.model,
            self.config.timeout,
        )
    }
}
