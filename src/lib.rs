//! finqa - question answering over extracted financial documents.
//!
//! Extracted text blocks and tables are normalized and cut into
//! overlapping chunks, indexed with TF-IDF over uni-grams and bi-grams,
//! and ranked against each question by cosine similarity. The best chunks
//! are folded into a prompt for a local generation backend such as Ollama.
//!
//! # Quick start
//!
//! ```no_run
//! use finqa::{Extraction, OllamaCli, PipelineConfig, Session};
//!
//! let mut session = Session::new(PipelineConfig::default());
//! session.ingest(&[Extraction::from_text("Total Revenue: 1,234,567")]);
//!
//! for hit in session.search("total revenue") {
//!     println!("{} (score: {:.3})", hit.content, hit.score);
//! }
//!
//! let answer = session.answer("What was total revenue?", &OllamaCli::new());
//! println!("{answer}");
//! ```

pub mod analyzer;
pub mod chunking;
pub mod config;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod table;
pub mod walker;

pub use chunking::{Chunk, ChunkingConfig};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use extraction::Extraction;
pub use generation::{GenerationError, Generator, OllamaCli, OllamaHttp};
pub use pipeline::{IngestReport, Session};
pub use retriever::{CorpusIndex, RetrievalHit};
