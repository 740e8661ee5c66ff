// Similarity retrieval over the log window (hybrid mode)
// Wraps a vector-search collaborator; index internals stay behind the trait.

use async_trait::async_trait;
use cloudtracer_core::{LogEntry, LogWindow};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("retrieval unavailable: {0}")]
    Unavailable(String),

    #[error("search backend error: {0}")]
    Backend(String),
}

/// One hit from the search collaborator. `id` indexes into the corpus
/// the collaborator was built over; `score` is cosine-style similarity.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: usize,
    pub content: String,
    pub score: f32,
}

/// Vector-search collaborator contract
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>, RetrievalError>;

    /// Effective score cutoff for this backend's scale. The configured
    /// threshold assumes cosine-style scores; backends scoring on a
    /// different scale map it into their own range here.
    fn calibrate_threshold(&self, configured: f32) -> f32 {
        configured
    }
}

/// Retrieval stage: queries the collaborator and maps hits back onto
/// window entries, descending score order, at most top_k results.
pub struct SimilarityRetriever {
    backend: Box<dyn VectorSearch>,
    similarity_threshold: f32,
}

impl SimilarityRetriever {
    pub fn new(backend: Box<dyn VectorSearch>, similarity_threshold: f32) -> Self {
        let similarity_threshold = backend.calibrate_threshold(similarity_threshold);
        Self {
            backend,
            similarity_threshold,
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        window: &LogWindow,
    ) -> Result<Vec<(LogEntry, f32)>, RetrievalError> {
        let hits = self.backend.query(query, top_k).await?;

        let mut matched: Vec<(LogEntry, f32)> = hits
            .into_iter()
            .filter_map(|hit| {
                let score = hit.score.clamp(0.0, 1.0);
                if score < self.similarity_threshold {
                    return None;
                }
                window.entries().get(hit.id).map(|entry| (entry.clone(), score))
            })
            .collect();

        // window mapping can drop hits, so restore score order before truncating
        matched.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        matched.truncate(top_k);
        Ok(matched)
    }
}

/// In-process lexical search backend: weighted keyword overlap between the
/// query and each corpus line, normalized to [0,1]. Stands in for the
/// external vector index; identical query/corpus always rank identically.
pub struct LexicalIndex {
    docs: Vec<String>,
}

impl LexicalIndex {
    /// Cutoff on this backend's matched-fraction scale. Issue descriptions
    /// carry filler words no log line repeats, so a good hit covers only
    /// part of the query weight.
    pub const SCORE_THRESHOLD: f32 = 0.2;

    /// Index the window's entries. The entry's position in the window is its id.
    pub fn from_window(window: &LogWindow) -> Self {
        let docs = window
            .iter()
            .map(|entry| entry.context_line().to_lowercase())
            .collect();
        Self { docs }
    }

    // Matched fraction of the query's achievable weight: a doc matching
    // every query word scores 1.0 regardless of query length.
    fn keyword_score(query_words: &[&str], doc: &str) -> f32 {
        let mut achievable = 0.0;
        let mut matched = 0.0;

        for word in query_words {
            // boost failure vocabulary
            let weight = match *word {
                "error" | "fail" | "failed" | "failing" | "exception" => 2.0,
                "warn" | "warning" | "timeout" | "expired" => 1.5,
                "critical" | "fatal" | "crash" => 2.5,
                _ => 1.0,
            };
            achievable += weight;
            if doc.contains(word) {
                matched += weight;
            }
        }

        if achievable == 0.0 {
            0.0
        } else {
            matched / achievable
        }
    }
}

#[async_trait]
impl VectorSearch for LexicalIndex {
    // Lower thresholds stay honored so callers can still tighten or loosen.
    fn calibrate_threshold(&self, configured: f32) -> f32 {
        configured.min(Self::SCORE_THRESHOLD)
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if self.docs.is_empty() {
            return Err(RetrievalError::Unavailable("index is empty".to_string()));
        }

        let query_lower = text.to_lowercase();
        let query_words: Vec<&str> = query_lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();

        let mut hits: Vec<SearchHit> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(id, doc)| {
                let score = Self::keyword_score(&query_words, doc);
                if score > 0.0 {
                    Some(SearchHit {
                        id,
                        content: doc.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        // score descending, id ascending as tiebreak so ranking is stable
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}
