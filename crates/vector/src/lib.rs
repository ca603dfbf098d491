pub mod embeddings;
pub mod search;
pub mod store;

pub use embeddings::{CacheStats, EMBEDDING_DIMENSIONS, Embedder, EmbeddingCache, HfEmbedder};
pub use search::{DiseaseMatch, SEARCH_LIMIT, SimilarityHit, SimilarityRetriever, TreatmentPlan};
pub use store::{NeighborQuery, QdrantStore, VectorMatch, VectorStore};
