//! Term extraction shared by index build and query projection.

use tantivy::tokenizer::{
    LowerCaser,
    SimpleTokenizer,
    StopWordFilter,
    TextAnalyzer,
    TokenStream,
};

/// Function words that carry no retrieval signal.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am",
    "an", "and", "any", "are", "as", "at", "be", "because", "been", "before",
    "being", "below", "between", "both", "but", "by", "can", "could", "did",
    "do", "does", "doing", "down", "during", "each", "either", "else",
    "etc", "ever", "every", "few", "for", "from", "further", "had", "has",
    "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "may", "me", "might", "more", "most", "must",
    "my", "myself", "neither", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "otherwise", "our", "ours", "ourselves",
    "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "therefore", "these", "they", "this", "those", "though",
    "through", "thus", "to", "too", "under", "until", "up", "upon", "us",
    "very", "was", "we", "were", "what", "whatever", "when", "where",
    "whether", "which", "while", "who", "whom", "whose", "why", "will",
    "with", "within", "without", "would", "yet", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Tokens shorter than this many characters are dropped.
const MIN_TOKEN_CHARS: usize = 2;

/// Case-insensitive analyzer producing uni-gram and bi-gram terms.
///
/// Tokens are alphanumeric runs of at least two characters, lowercased,
/// with [`STOP_WORDS`] removed. Bi-grams join adjacent surviving tokens
/// with a single space.
#[derive(Clone)]
pub struct Analyzer {
    inner: TextAnalyzer,
}

impl Analyzer {
    pub fn new() -> Self {
        let inner = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(StopWordFilter::remove(
                STOP_WORDS.iter().map(|w| w.to_string()),
            ))
            .build();
        Self { inner }
    }

    /// Lowercased tokens of `text`, stop words removed.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        // token_stream needs exclusive access; analyzers are cheap to clone.
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            let token = &stream.token().text;
            if token.chars().count() >= MIN_TOKEN_CHARS {
                tokens.push(token.clone());
            }
        }
        tokens
    }

    /// All uni-gram and bi-gram terms of `text`, in order of appearance.
    ///
    /// # Examples
    ///
    /// ```
    /// use finqa::analyzer::Analyzer;
    ///
    /// let terms = Analyzer::new().terms("The Total Revenue");
    /// assert_eq!(terms, vec!["total", "revenue", "total revenue"]);
    /// ```
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens = self.tokens(text);
        let bigrams: Vec<String> = tokens
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect();

        let mut terms = tokens;
        terms.extend(bigrams);
        terms
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}
