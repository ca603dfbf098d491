use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// all-MiniLM-L6-v2 output width. Stored vectors and query vectors must
/// agree on this.
pub const EMBEDDING_DIMENSIONS: usize = 384;

const CACHE_MAX_SIZE: usize = 1000;
const RETRY_DELAY: Duration = Duration::from_secs(2);

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Bounded embedding cache. Keys are digests of the normalized text, so
/// "Diabetes " and "diabetes" share an entry. Once full, the oldest
/// inserted entry is evicted first.
pub struct EmbeddingCache {
    entries: DashMap<String, Vec<f32>>,
    insertion_order: Mutex<VecDeque<String>>,
    max_entries: usize,
}

impl EmbeddingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            insertion_order: Mutex::new(VecDeque::new()),
            max_entries,
        }
    }

    fn cache_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.trim().to_lowercase().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.entries
            .get(&Self::cache_key(text))
            .map(|r| r.value().clone())
    }

    pub fn insert(&self, text: &str, embedding: Vec<f32>) {
        let key = Self::cache_key(text);

        let mut order = self.insertion_order.lock().unwrap();

        // Refreshing an existing key keeps its original queue slot.
        if self.entries.contains_key(&key) {
            self.entries.insert(key, embedding);
            return;
        }

        while self.entries.len() >= self.max_entries {
            match order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.entries.insert(key.clone(), embedding);
        order.push_back(key);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_entries,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

/// HuggingFace Inference API client for the feature-extraction pipeline.
#[derive(Clone)]
pub struct HfEmbedder {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    cache: std::sync::Arc<EmbeddingCache>,
}

#[derive(Serialize)]
struct FeatureExtractionRequest {
    inputs: String,
}

impl HfEmbedder {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url,
            model,
            api_key,
            client: reqwest::Client::new(),
            cache: std::sync::Arc::new(EmbeddingCache::new(CACHE_MAX_SIZE)),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "https://api-inference.huggingface.co".to_string(),
            "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            String::new(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/models/{}", self.base_url, self.model);

        let request = FeatureExtractionRequest {
            inputs: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Embedding request failed: {}", response.status());
        }

        let value: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        parse_embedding(&value)
    }
}

#[async_trait]
impl Embedder for HfEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(hit);
        }

        let embedding = match self.request_embedding(text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                // One retry after a fixed pause; the hosted model may still
                // be loading.
                warn!(error = %e, "embedding request failed, retrying once");
                tokio::time::sleep(RETRY_DELAY).await;
                self.request_embedding(text).await?
            }
        };

        self.cache.insert(text, embedding.clone());
        Ok(embedding)
    }
}

/// The inference API answers either a flat vector or a singleton batch.
/// Unwrap one nesting level when present.
fn parse_embedding(value: &serde_json::Value) -> Result<Vec<f32>> {
    let array = value.as_array().context("Embedding response is not an array")?;

    let inner = match array.first() {
        Some(serde_json::Value::Array(first)) => first,
        _ => array,
    };

    let embedding = inner
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .context("Embedding response holds non-numeric values")?;

    if embedding.is_empty() {
        anyhow::bail!("Embedding response is empty");
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_normalization() {
        let cache = EmbeddingCache::new(10);
        cache.insert("  Diabetes Mellitus ", vec![0.5, 0.5]);

        assert_eq!(cache.get("diabetes mellitus"), Some(vec![0.5, 0.5]));
        assert_eq!(cache.get("DIABETES MELLITUS"), Some(vec![0.5, 0.5]));
        assert_eq!(cache.get("something else"), None);
    }

    #[test]
    fn test_cache_evicts_oldest_first() {
        let cache = EmbeddingCache::new(2);
        cache.insert("first", vec![1.0]);
        cache.insert("second", vec![2.0]);
        cache.insert("third", vec![3.0]);

        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(vec![2.0]));
        assert_eq!(cache.get("third"), Some(vec![3.0]));
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_cache_refresh_keeps_slot() {
        let cache = EmbeddingCache::new(2);
        cache.insert("first", vec![1.0]);
        cache.insert("second", vec![2.0]);
        cache.insert("first", vec![1.5]);
        cache.insert("third", vec![3.0]);

        // "first" stayed oldest despite the refresh, so it is the one evicted.
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(vec![2.0]));
        assert_eq!(cache.get("third"), Some(vec![3.0]));
    }

    #[test]
    fn test_parse_flat_embedding() {
        let value = json!([0.1, 0.2, 0.3]);
        assert_eq!(parse_embedding(&value).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_parse_nested_embedding() {
        let value = json!([[0.1, 0.2, 0.3]]);
        assert_eq!(parse_embedding(&value).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_parse_rejects_bad_responses() {
        assert!(parse_embedding(&json!({"error": "loading"})).is_err());
        assert!(parse_embedding(&json!([])).is_err());
        assert!(parse_embedding(&json!(["a", "b"])).is_err());
    }
}
