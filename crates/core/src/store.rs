use crate::embeddings::Embedder;
use crate::models::{RetrievedPassage, TextChunk};
use crate::traits::Retriever;
use crate::SearchError;
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: TextChunk,
    embedding: Vec<f32>,
    magnitude: f32,
}

/// In-memory vector index ranking chunks by cosine similarity.
/// Built once per process; nothing is persisted.
pub struct MemoryVectorStore<E> {
    embedder: E,
    entries: Vec<IndexedChunk>,
    dimensions: Option<usize>,
}

impl<E> MemoryVectorStore<E>
where
    E: Embedder,
{
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            dimensions: None,
        }
    }

    pub async fn from_chunks(chunks: Vec<TextChunk>, embedder: E) -> Result<Self, SearchError> {
        let mut store = Self::new(embedder);
        store.add_chunks(chunks).await?;
        Ok(store)
    }

    pub async fn add_chunks(&mut self, chunks: Vec<TextChunk>) -> Result<(), SearchError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts = chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect::<Vec<_>>();
        let embeddings = self.embedder.embed_documents(&texts).await?;

        if chunks.len() != embeddings.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            let expected = *self.dimensions.get_or_insert(embedding.len());
            if embedding.len() != expected {
                return Err(SearchError::DimensionMismatch {
                    expected,
                    found: embedding.len(),
                });
            }

            self.entries.push(IndexedChunk {
                magnitude: magnitude(&embedding),
                chunk,
                embedding,
            });
        }

        debug!(indexed = self.entries.len(), "vector store updated");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, SearchError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;
        if let Some(expected) = self.dimensions {
            if query_vector.len() != expected {
                return Err(SearchError::DimensionMismatch {
                    expected,
                    found: query_vector.len(),
                });
            }
        }

        let query_magnitude = magnitude(&query_vector);
        let mut scored = self
            .entries
            .iter()
            .map(|entry| {
                let score =
                    cosine_similarity(&query_vector, query_magnitude, &entry.embedding, entry.magnitude);
                (score, entry)
            })
            .collect::<Vec<_>>();

        scored.sort_by(|left, right| right.0.total_cmp(&left.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| RetrievedPassage {
                chunk_id: entry.chunk.chunk_id.clone(),
                page: entry.chunk.page,
                score,
                text: entry.chunk.text.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl<E> Retriever for MemoryVectorStore<E>
where
    E: Embedder,
{
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, SearchError> {
        self.similarity_search(query, k).await
    }
}

fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

fn cosine_similarity(left: &[f32], left_magnitude: f32, right: &[f32], right_magnitude: f32) -> f32 {
    if left_magnitude == 0.0 || right_magnitude == 0.0 {
        return 0.0;
    }

    let dot = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| a * b)
        .sum::<f32>();
    dot / (left_magnitude * right_magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;

    fn chunk(index: u64, text: &str) -> TextChunk {
        TextChunk {
            chunk_id: format!("chunk-{index}"),
            source_path: "/tmp/doc.pdf".to_string(),
            page: 1,
            chunk_index: index,
            text: text.to_string(),
        }
    }

    struct FixedEmbedder {
        documents: Vec<Vec<f32>>,
        query: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
            Ok(self.documents.clone())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
            Ok(self.query.clone())
        }
    }

    #[tokio::test]
    async fn results_are_ranked_by_cosine_similarity() {
        let embedder = FixedEmbedder {
            documents: vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
            query: vec![1.0, 0.1],
        };
        let store = MemoryVectorStore::from_chunks(
            vec![chunk(0, "north"), chunk(1, "east"), chunk(2, "north-east")],
            embedder,
        )
        .await
        .unwrap();

        let hits = store.similarity_search("anything", 2).await.unwrap();
        let texts = hits.iter().map(|hit| hit.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["east", "north-east"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let embedder = FixedEmbedder {
            documents: vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
            query: vec![1.0, 0.0],
        };
        let store = MemoryVectorStore::from_chunks(
            vec![
                chunk(0, "off-topic"),
                chunk(1, "first twin"),
                chunk(2, "also off-topic"),
                chunk(3, "second twin"),
            ],
            embedder,
        )
        .await
        .unwrap();

        let hits = store.similarity_search("anything", 3).await.unwrap();
        let ids = hits.iter().map(|hit| hit.chunk_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["chunk-1", "chunk-3", "chunk-0"]);
        assert_eq!(hits[0].score, hits[1].score);
    }

    #[tokio::test]
    async fn search_is_bounded_by_k_and_store_size() {
        let store = MemoryVectorStore::from_chunks(
            vec![chunk(0, "gum up the machinery"), chunk(1, "misplace the files")],
            CharacterNgramEmbedder::default(),
        )
        .await
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.search("machinery", 5).await.unwrap().len(), 2);
        assert_eq!(store.search("machinery", 1).await.unwrap().len(), 1);
        assert!(store.search("machinery", 0).await.unwrap().is_empty());
        assert_eq!(
            store.search("gum up the machinery", 1).await.unwrap()[0].chunk_id,
            "chunk-0"
        );
    }

    #[tokio::test]
    async fn empty_query_still_returns_passages() {
        let store = MemoryVectorStore::from_chunks(
            vec![chunk(0, "first"), chunk(1, "second")],
            CharacterNgramEmbedder::default(),
        )
        .await
        .unwrap();

        let hits = store.search("", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "first");
    }

    #[tokio::test]
    async fn inconsistent_dimensions_are_rejected() {
        let embedder = FixedEmbedder {
            documents: vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
            query: vec![1.0, 0.0],
        };
        let result =
            MemoryVectorStore::from_chunks(vec![chunk(0, "a"), chunk(1, "b")], embedder).await;
        assert!(matches!(
            result,
            Err(SearchError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }
}
