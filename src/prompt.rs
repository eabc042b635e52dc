//! Prompt assembly for the generation backend.

use crate::{chunking::Chunk, retriever::RetrievalHit};

/// Instruction header placed before the context section.
pub const SYSTEM_INSTRUCTION: &str = "You are a financial document assistant. \
     Use ONLY the provided CONTEXT to answer the question. If the requested \
     info is not in the context, say you cannot find it and suggest what \
     could help (specific rows/figures).";

/// Context entry used when retrieval produced nothing.
pub const NO_CONTEXT_ENTRY: &str = "No relevant extracted context found. \
     Provide the question and explain that no context exists.";

/// Separator between context entries.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Directive appended after the question.
pub const ANSWER_DIRECTIVE: &str = "Answer succinctly and show numeric values \
     when present. If multiple interpretations exist, list them.";

/// A retrieved chunk's text together with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry<'a> {
    pub content: &'a str,
    pub score: f32,
}

impl std::fmt::Display for ContextEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(score {:.3})\n{}", self.score, self.content)
    }
}

/// Pair retrieval hits with the chunk text they point at.
///
/// Hits whose index falls outside `corpus` are dropped.
pub fn context_entries<'a>(
    corpus: &'a [Chunk],
    hits: &[RetrievalHit],
) -> Vec<ContextEntry<'a>> {
    hits.iter()
        .filter_map(|hit| {
            corpus.get(hit.chunk_index).map(|chunk| ContextEntry {
                content: &chunk.content,
                score: hit.score,
            })
        })
        .collect()
}

/// Build the full prompt for `question`.
///
/// An empty `contexts` list is replaced by [`NO_CONTEXT_ENTRY`] so the
/// context section is never blank. Optional `instructions` are placed
/// after the fixed header.
///
/// # Examples
///
/// ```
/// use finqa::prompt::{build_prompt, NO_CONTEXT_ENTRY};
///
/// let prompt = build_prompt(&[], "What was revenue?", None);
/// assert!(prompt.contains(NO_CONTEXT_ENTRY));
/// assert!(prompt.contains("QUESTION:\nWhat was revenue?"));
/// ```
pub fn build_prompt(
    contexts: &[ContextEntry<'_>],
    question: &str,
    instructions: Option<&str>,
) -> String {
    let mut header = format!("{SYSTEM_INSTRUCTION}\n\n");
    if let Some(extra) = instructions.map(str::trim).filter(|s| !s.is_empty())
    {
        header.push_str(extra);
        header.push_str("\n\n");
    }

    let context = if contexts.is_empty() {
        NO_CONTEXT_ENTRY.to_string()
    } else {
        contexts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER)
    };

    format!(
        "{header}CONTEXT:\n{context}\n\nQUESTION:\n{question}\n\n{ANSWER_DIRECTIVE}"
    )
}
