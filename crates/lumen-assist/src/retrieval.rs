//! Semantic retrieval fallback: an in-memory vector index over the
//! serialized catalog records.
//!
//! The index is rebuilt from the catalog at startup; there is no on-disk
//! persistence. Retrieval only runs after the structured resolver has
//! declined a question.

use anyhow::Result;
use tracing::info;

use crate::catalog::Catalog;
use crate::types::RetrievedDocument;

/// How many records the fallback hands to the generative model.
pub const DEFAULT_TOP_K: usize = 3;

/// Embedding backends the index can be built over. Query and document
/// embedding are separate entry points because some models prepend
/// different task prefixes for each.
pub trait EmbeddingModel: Send + Sync {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_document(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_document(t)).collect()
    }

    fn dimension(&self) -> usize;
}

/// Deterministic hashed bag-of-words embedder. Tokens are FNV-1a hashed
/// into a fixed number of buckets and the vector is L2-normalized, so
/// cosine similarity reduces to a dot product. No model download, no
/// tokenizer files; good enough for a catalog of a few hundred records.
pub struct HashedBowEmbedder {
    dimension: usize,
}

impl HashedBowEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashedBowEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingModel for HashedBowEmbedder {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// The built index: one embedding per catalog record, searched by brute
/// force. Catalog sizes here never justify an ANN structure.
pub struct SemanticIndex<E: EmbeddingModel> {
    embedder: E,
    documents: Vec<RetrievedDocument>,
    embeddings: Vec<Vec<f32>>,
}

impl<E: EmbeddingModel> SemanticIndex<E> {
    /// Embed every serialized catalog record. An empty catalog yields an
    /// empty index, which simply retrieves nothing.
    pub fn build(catalog: &Catalog, embedder: E) -> Result<Self> {
        let documents = catalog.documents();
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = embedder.embed_documents(&texts)?;
        info!(documents = documents.len(), "semantic index built");
        Ok(Self {
            embedder,
            documents,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The `k` records most similar to the query, best first. Fewer than
    /// `k` documents in the index just means a shorter result.
    pub fn top_k(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        if self.documents.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed_query(query)?;
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, dot(&query_embedding, e)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.documents[i].clone())
            .collect())
    }
}

/// Format retrieved records as the context block handed to the generative
/// model: one "Converter <key>:" paragraph per record.
pub fn format_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| format!("Converter {}:\n{}", d.source, d.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        let raw = json!({
            "C1": {
                "ARTNR": 111111,
                "CONVERTER DESCRIPTION:": "LED CONVERTER 24V DC 100W IP20",
                "DIMMABILITY": "1-10V"
            },
            "C2": {
                "ARTNR": 222222,
                "CONVERTER DESCRIPTION:": "LED CONVERTER 350mA 20W IP67",
                "DIMMABILITY": "DALI"
            },
            "C3": {
                "ARTNR": 333333,
                "CONVERTER DESCRIPTION:": "EMERGENCY LIGHTING MODULE",
                "DIMMABILITY": "NOT DIMMABLE"
            }
        });
        Catalog::from_raw(raw.as_object().unwrap())
    }

    #[test]
    fn embeddings_are_normalized_and_deterministic() {
        let embedder = HashedBowEmbedder::new(64);
        let a = embedder.embed_query("led converter 24v").unwrap();
        let b = embedder.embed_query("led converter 24v").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn top_k_prefers_overlapping_vocabulary() {
        let index = SemanticIndex::build(&catalog(), HashedBowEmbedder::new(256)).unwrap();
        let hits = index.top_k("dali dimmable converter 350ma", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "C2");
    }

    #[test]
    fn top_k_caps_at_index_size() {
        let index = SemanticIndex::build(&catalog(), HashedBowEmbedder::new(64)).unwrap();
        assert_eq!(index.len(), 3);
        let hits = index.top_k("converter", 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(index.top_k("converter", 0).unwrap().is_empty());
    }

    #[test]
    fn empty_catalog_builds_an_empty_index() {
        let empty = Catalog::default();
        let index = SemanticIndex::build(&empty, HashedBowEmbedder::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.top_k("anything", 3).unwrap().is_empty());
    }

    #[test]
    fn context_formatting_names_each_record() {
        let docs = vec![
            RetrievedDocument {
                source: "C1".into(),
                content: "ARTNR: 111111".into(),
            },
            RetrievedDocument {
                source: "C2".into(),
                content: "ARTNR: 222222".into(),
            },
        ];
        let context = format_context(&docs);
        assert!(context.starts_with("Converter C1:\nARTNR: 111111"));
        assert!(context.contains("\n\nConverter C2:\n"));
    }
}
