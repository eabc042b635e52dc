//! Validated settings for a pipeline session.

use std::time::Duration;

use crate::{
    chunking::ChunkingConfig,
    error::{Error, Result},
    generation::{DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS},
    retriever::DEFAULT_TOP_K,
};

/// Settings for one ingestion-and-query session.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    /// Number of chunks placed in each prompt.
    pub top_k: usize,
    /// Model identifier handed to the generation backend.
    pub model: String,
    /// Upper bound for a single generation call.
    pub timeout: Duration,
    /// Extra instructions inserted after the fixed prompt header.
    pub instructions: Option<String>,
}

impl PipelineConfig {
    /// Assemble and validate a configuration from raw settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use finqa::config::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_parts(800, 200, 3, "llama2", 30, None).unwrap();
    /// assert_eq!(config.timeout.as_secs(), 30);
    ///
    /// assert!(PipelineConfig::from_parts(0, 200, 3, "llama2", 30, None).is_err());
    /// ```
    pub fn from_parts(
        max_chars: usize,
        overlap: usize,
        top_k: usize,
        model: &str,
        timeout_secs: u64,
        instructions: Option<String>,
    ) -> Result<Self> {
        let chunking = ChunkingConfig::new(max_chars, overlap)?;
        if top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".into()));
        }
        if model.trim().is_empty() {
            return Err(Error::Config("model name must not be empty".into()));
        }
        if timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least 1 second".into()));
        }

        Ok(Self {
            chunking,
            top_k,
            model: model.trim().to_string(),
            timeout: Duration::from_secs(timeout_secs),
            instructions,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            instructions: None,
        }
    }
}
