use anyhow::{Context, Result};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use classify::ContentType;
use graph::{GraphContext, MedicalGraph, TreatmentOption};

use crate::embeddings::Embedder;
use crate::store::{NeighborQuery, VectorMatch, VectorStore};

/// Hits returned per hybrid question.
pub const SEARCH_LIMIT: usize = 5;

const SEARCH_THRESHOLD: f32 = 0.3;
const RELATED_THRESHOLD: f32 = 0.4;
const TREATMENT_DISEASE_LIMIT: usize = 3;

/// A similarity match with its graph neighborhood attached.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityHit {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
    pub similarity: f32,
    pub metadata: serde_json::Value,
    pub graph_context: Option<GraphContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiseaseMatch {
    pub id: String,
    pub name: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreatmentPlan {
    pub diseases: Vec<DiseaseMatch>,
    pub drugs: Vec<TreatmentOption>,
}

/// Embedding search over the vector store, enriched from the graph store.
pub struct SimilarityRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    graph: Arc<dyn MedicalGraph>,
}

impl SimilarityRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        graph: Arc<dyn MedicalGraph>,
    ) -> Self {
        Self {
            embedder,
            store,
            graph,
        }
    }

    /// Embed the question, pull the nearest neighbors, attach graph context
    /// to each hit.
    pub async fn search(
        &self,
        query: &str,
        content_type: Option<ContentType>,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>> {
        info!(query = query, content_type = ?content_type, "similarity search");

        let embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let matches = self
            .store
            .nearest_neighbors(
                &embedding,
                &NeighborQuery {
                    content_type,
                    limit,
                    min_similarity: SEARCH_THRESHOLD,
                },
            )
            .await
            .context("Vector search failed")?;

        if matches.is_empty() {
            info!("no similar items found");
            return Ok(Vec::new());
        }

        Ok(self.enrich(matches).await)
    }

    /// Patients whose condition profile reads like the given patient's.
    /// The store is asked for one extra neighbor because the source patient
    /// is usually their own best match.
    pub async fn find_similar_patients(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>> {
        let Some(context) = self.graph.patient_context(patient_id).await? else {
            return Ok(Vec::new());
        };

        let search_text = format!(
            "Patient with {} taking {}",
            context.diseases.join(", "),
            context.medications.join(", ")
        );

        let embedding = self
            .embedder
            .embed(&search_text)
            .await
            .context("Failed to embed patient profile")?;

        let matches = self
            .store
            .nearest_neighbors(
                &embedding,
                &NeighborQuery {
                    content_type: Some(ContentType::Patient),
                    limit: limit + 1,
                    min_similarity: RELATED_THRESHOLD,
                },
            )
            .await?;

        let others = matches
            .into_iter()
            .filter(|m| m.entity_id != patient_id)
            .collect();

        let mut hits = self.enrich(others).await;
        hits.truncate(limit);
        Ok(hits)
    }

    /// Treatment options for a described condition: nearest diseases first,
    /// then the drugs treating any of them.
    pub async fn find_treatment_options(
        &self,
        condition: &str,
        limit: usize,
    ) -> Result<TreatmentPlan> {
        let embedding = self
            .embedder
            .embed(condition)
            .await
            .context("Failed to embed condition")?;

        let similar_diseases = self
            .store
            .nearest_neighbors(
                &embedding,
                &NeighborQuery {
                    content_type: Some(ContentType::Disease),
                    limit: TREATMENT_DISEASE_LIMIT,
                    min_similarity: RELATED_THRESHOLD,
                },
            )
            .await?;

        if similar_diseases.is_empty() {
            return Ok(TreatmentPlan {
                diseases: Vec::new(),
                drugs: Vec::new(),
            });
        }

        let disease_ids: Vec<String> = similar_diseases
            .iter()
            .map(|d| d.entity_id.clone())
            .collect();

        let mut drugs = self.graph.treatments_for_diseases(&disease_ids).await?;
        drugs.truncate(limit);

        let diseases = similar_diseases
            .into_iter()
            .map(|d| DiseaseMatch {
                id: d.entity_id,
                name: d.text,
                similarity: round3(d.similarity),
            })
            .collect();

        Ok(TreatmentPlan { diseases, drugs })
    }

    /// Attach graph context to every match concurrently. A failed context
    /// fetch downgrades that one hit to no context instead of failing the
    /// batch.
    async fn enrich(&self, matches: Vec<VectorMatch>) -> Vec<SimilarityHit> {
        join_all(matches.into_iter().map(|m| self.enrich_one(m))).await
    }

    async fn enrich_one(&self, m: VectorMatch) -> SimilarityHit {
        let graph_context = match self.fetch_context(&m.content_type, &m.entity_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(
                    content_type = %m.content_type,
                    entity = %m.entity_id,
                    error = %e,
                    "hit enrichment failed"
                );
                None
            }
        };

        SimilarityHit {
            id: m.entity_id,
            content_type: m.content_type,
            text: m.text,
            similarity: round3(m.similarity),
            metadata: m.metadata,
            graph_context,
        }
    }

    /// Allergen hits have no context template and stay bare.
    async fn fetch_context(
        &self,
        content_type: &str,
        entity_id: &str,
    ) -> Result<Option<GraphContext>> {
        let context = match content_type {
            "disease" => self
                .graph
                .disease_context(entity_id)
                .await?
                .map(GraphContext::Disease),
            "drug" => self.graph.drug_context(entity_id).await?.map(GraphContext::Drug),
            "symptom" => self
                .graph
                .symptom_context(entity_id)
                .await?
                .map(GraphContext::Symptom),
            "patient" => self
                .graph
                .patient_context(entity_id)
                .await?
                .map(GraphContext::Patient),
            _ => None,
        };

        Ok(context)
    }
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
