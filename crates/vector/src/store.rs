use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use classify::ContentType;

/// Parameters for one nearest-neighbor lookup.
#[derive(Debug, Clone)]
pub struct NeighborQuery {
    pub content_type: Option<ContentType>,
    pub limit: usize,
    pub min_similarity: f32,
}

/// One stored vector the query landed near, with its indexing payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    pub entity_id: String,
    pub content_type: String,
    pub text: String,
    pub similarity: f32,
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest stored vectors by cosine similarity, best first. Honors the
    /// content-type filter, the limit, and the similarity floor.
    async fn nearest_neighbors(
        &self,
        embedding: &[f32],
        params: &NeighborQuery,
    ) -> Result<Vec<VectorMatch>>;
}

/// Qdrant REST client. Point payloads carry the graph entity id, the content
/// type, and the text that was embedded.
pub struct QdrantStore {
    base_url: String,
    collection: String,
    client: reqwest::Client,
}

impl QdrantStore {
    pub fn new(base_url: String, collection: String) -> Self {
        Self {
            base_url,
            collection,
            client: reqwest::Client::new(),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:6333".to_string(),
            "medical_entities".to_string(),
        )
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn search_body(embedding: &[f32], params: &NeighborQuery) -> serde_json::Value {
    let mut body = json!({
        "vector": embedding,
        "limit": params.limit,
        "with_payload": true,
        "score_threshold": params.min_similarity,
    });

    if let Some(content_type) = params.content_type {
        body["filter"] = json!({
            "must": [
                { "key": "content_type", "match": { "value": content_type.as_str() } }
            ]
        });
    }

    body
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn nearest_neighbors(
        &self,
        embedding: &[f32],
        params: &NeighborQuery,
    ) -> Result<Vec<VectorMatch>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );

        let response = self
            .client
            .post(&url)
            .json(&search_body(embedding, params))
            .send()
            .await
            .context("Failed to send search request to vector store")?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Vector search failed: {}", error_text);
        }

        let result: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse vector store response")?;

        let points = result["result"]
            .as_array()
            .context("Invalid vector store response format")?;

        let mut matches = Vec::new();
        for point in points {
            let score = point["score"].as_f64().unwrap_or(0.0) as f32;
            let payload = point["payload"].as_object().context("Missing payload")?;

            let entity_id = payload
                .get("neo4j_id")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let content_type = payload
                .get("content_type")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let text = payload
                .get("content_text")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let metadata = payload
                .get("metadata")
                .cloned()
                .unwrap_or(serde_json::Value::Null);

            matches.push(VectorMatch {
                entity_id,
                content_type,
                text,
                similarity: score,
                metadata,
            });
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body_without_filter() {
        let params = NeighborQuery {
            content_type: None,
            limit: 5,
            min_similarity: 0.3,
        };
        let body = search_body(&[0.1, 0.2], &params);

        assert_eq!(body["limit"], 5);
        assert_eq!(body["with_payload"], true);
        assert!((body["score_threshold"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(body.get("filter").is_none());
    }

    #[test]
    fn test_search_body_with_content_type_filter() {
        let params = NeighborQuery {
            content_type: Some(ContentType::Disease),
            limit: 3,
            min_similarity: 0.4,
        };
        let body = search_body(&[0.1], &params);

        assert_eq!(body["filter"]["must"][0]["key"], "content_type");
        assert_eq!(body["filter"]["must"][0]["match"]["value"], "disease");
    }
}
