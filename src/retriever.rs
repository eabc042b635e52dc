//! In-memory TF-IDF index over a chunk corpus with cosine top-k queries.
//!
//! The index is built once from the full corpus and never updated in
//! place: adding or removing chunks means building a new index.
//!
//! Weighting follows the usual smoothed scheme: a term's weight in a chunk
//! is its raw count times `ln((1 + n) / (1 + df)) + 1`, and every vector is
//! L2-normalized so the dot product of two vectors is their cosine
//! similarity.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::analyzer::Analyzer;

/// Default number of hits returned per query.
pub const DEFAULT_TOP_K: usize = 3;

/// A chunk matched by a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalHit {
    /// Position of the chunk in the corpus the index was built from.
    pub chunk_index: usize,
    /// Cosine similarity, always in `(0, 1]`.
    pub score: f32,
}

/// Sparse vector as `(term id, weight)` pairs sorted by term id.
type SparseVector = Vec<(usize, f32)>;

#[derive(Debug, Clone)]
struct TermSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    vectors: Vec<SparseVector>,
}

/// Read-only TF-IDF index over an ordered corpus.
///
/// # Examples
///
/// ```
/// use finqa::retriever::CorpusIndex;
///
/// let index = CorpusIndex::build(&[
///     "Total Revenue: 1234567",
///     "Net Income: 98765",
/// ]);
/// let hits = index.top_k("total revenue", 1);
/// assert_eq!(hits[0].chunk_index, 0);
/// assert!(hits[0].score > 0.0);
///
/// assert!(CorpusIndex::empty().top_k("revenue", 3).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    analyzer: Analyzer,
    space: Option<TermSpace>,
}

impl CorpusIndex {
    /// The index of an empty corpus. Every query returns no hits.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index over `documents`; positions in the slice become the
    /// `chunk_index` of returned hits.
    pub fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let analyzer = Analyzer::new();
        if documents.is_empty() {
            tracing::debug!("building index over empty corpus");
            return Self {
                analyzer,
                space: None,
            };
        }

        let term_lists: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| analyzer.terms(doc.as_ref()))
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in &term_lists {
            let unique: BTreeSet<&str> =
                terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        let n = documents.len() as f32;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (id, (term, df)) in doc_freq.iter().enumerate() {
            vocabulary.insert((*term).to_string(), id);
            idf.push(((1.0 + n) / (1.0 + *df as f32)).ln() + 1.0);
        }

        let vectors = term_lists
            .iter()
            .map(|terms| {
                weigh(
                    terms.iter().filter_map(|t| vocabulary.get(t).copied()),
                    &idf,
                )
            })
            .collect();

        if vocabulary.is_empty() {
            tracing::warn!(
                chunks = documents.len(),
                "corpus has no indexable terms"
            );
        }
        tracing::debug!(
            chunks = documents.len(),
            terms = vocabulary.len(),
            "built corpus index"
        );

        Self {
            analyzer,
            space: Some(TermSpace {
                vocabulary,
                idf,
                vectors,
            }),
        }
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.space.as_ref().map_or(0, |s| s.vectors.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct uni-gram and bi-gram terms seen at build time.
    pub fn vocabulary_len(&self) -> usize {
        self.space.as_ref().map_or(0, |s| s.vocabulary.len())
    }

    /// Return up to `k` chunks most similar to `query`.
    ///
    /// Hits are ordered by descending score, ties by ascending chunk
    /// index. Chunks with a score of zero are never returned, so the
    /// result may be shorter than `k` or empty.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<RetrievalHit> {
        let Some(space) = &self.space else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        // Terms unseen at build time carry no weight.
        let query_vec = weigh(
            self.analyzer
                .terms(query)
                .iter()
                .filter_map(|t| space.vocabulary.get(t).copied()),
            &space.idf,
        );
        if query_vec.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<RetrievalHit> = space
            .vectors
            .iter()
            .enumerate()
            .map(|(chunk_index, doc_vec)| RetrievalHit {
                chunk_index,
                score: cosine(&query_vec, doc_vec),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        hits.truncate(k);
        hits
    }
}

/// Turn a stream of term ids into an L2-normalized TF-IDF vector.
fn weigh(term_ids: impl Iterator<Item = usize>, idf: &[f32]) -> SparseVector {
    let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
    for id in term_ids {
        *counts.entry(id).or_default() += 1.0;
    }

    let mut vector: SparseVector = counts
        .into_iter()
        .map(|(id, count)| (id, count * idf[id]))
        .collect();

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut vector {
            *w /= norm;
        }
    }
    vector
}

/// Dot product of two normalized sparse vectors, clamped to `[0, 1]`.
fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0_f32;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot.clamp(0.0, 1.0)
}
