use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use classify::QuestionProfile;
use graph::StructuredRetriever;
use vector::{SEARCH_LIMIT, SimilarityRetriever};

use crate::completion::{CompletionModel, SYSTEM_PROMPT};
use crate::error::ChatError;
use crate::guard::{self, Role};
use crate::prompt;

/// One incoming chat question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub role: String,
    pub user_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// Which retrieval path produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Graph,
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
    pub similarity: f32,
}

/// The answer envelope handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub source: ResponseSource,
    pub query_type: String,
    pub patient_id: Option<String>,
    pub data_found: bool,
    pub records_retrieved: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_items: Option<Vec<SimilarItem>>,
}

/// Orchestrates one question end to end: validation, access guard,
/// retrieval, prompt assembly, completion.
///
/// The similarity retriever is optional. When it is absent, every question
/// takes the structured path even if it reads like a similarity question.
pub struct ChatPipeline {
    retriever: StructuredRetriever,
    similarity: Option<Arc<SimilarityRetriever>>,
    model: Arc<dyn CompletionModel>,
}

impl ChatPipeline {
    pub fn new(
        retriever: StructuredRetriever,
        similarity: Option<Arc<SimilarityRetriever>>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        Self {
            retriever,
            similarity,
            model,
        }
    }

    pub fn similarity_enabled(&self) -> bool {
        self.similarity.is_some()
    }

    pub async fn handle_chat(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        if request.question.trim().is_empty()
            || request.role.trim().is_empty()
            || request.user_id.trim().is_empty()
        {
            return Err(ChatError::InvalidRequest);
        }

        let role: Role = request.role.parse()?;
        let profile = classify::profile_question(&request.question);

        if profile.wants_similarity {
            if let Some(similarity) = self.similarity.as_deref() {
                return self.answer_hybrid(similarity, request, role, &profile).await;
            }
        }

        self.answer_structured(request, role, &profile).await
    }

    async fn answer_structured(
        &self,
        request: &ChatRequest,
        role: Role,
        profile: &QuestionProfile,
    ) -> Result<ChatResponse, ChatError> {
        let patient_id = guard::resolve_target(
            role,
            &request.user_id,
            request.patient_id.as_deref(),
            profile.patient_id.as_deref(),
        )?;
        let intent = profile.intent;

        info!(role = %role, patient = %patient_id, intent = %intent, "structured chat");

        let records = self
            .retriever
            .retrieve(intent, &patient_id)
            .await
            .map_err(ChatError::Retrieval)?;

        if records.is_empty() {
            return Ok(ChatResponse {
                answer: format!(
                    "No {intent} data found for patient {patient_id}. Please verify the patient ID."
                ),
                source: ResponseSource::Graph,
                query_type: intent.as_str().to_string(),
                patient_id: Some(patient_id),
                data_found: false,
                records_retrieved: 0,
                similar_items: None,
            });
        }

        let records_retrieved = records.len();
        let user_prompt =
            prompt::build_structured_prompt(&request.question, intent, &patient_id, &records);
        let answer = self
            .model
            .complete(SYSTEM_PROMPT, &user_prompt)
            .await
            .map_err(ChatError::Completion)?;

        Ok(ChatResponse {
            answer,
            source: ResponseSource::Graph,
            query_type: intent.as_str().to_string(),
            patient_id: Some(patient_id),
            data_found: true,
            records_retrieved,
            similar_items: None,
        })
    }

    async fn answer_hybrid(
        &self,
        similarity: &SimilarityRetriever,
        request: &ChatRequest,
        role: Role,
        profile: &QuestionProfile,
    ) -> Result<ChatResponse, ChatError> {
        let patient_id = guard::resolve_context_target(
            role,
            &request.user_id,
            request.patient_id.as_deref(),
            profile.patient_id.as_deref(),
        );

        info!(role = %role, patient = ?patient_id, content_type = ?profile.content_type, "hybrid chat");

        let hits = similarity
            .search(&request.question, profile.content_type, SEARCH_LIMIT)
            .await
            .map_err(ChatError::Retrieval)?;

        // Patient context is best effort here. A missing or unreadable
        // profile still leaves the similarity hits worth answering from.
        let patient_context = match patient_id.as_deref() {
            Some(id) => match self.retriever.full_profile(id).await {
                Ok(full) => Some(full),
                Err(e) => {
                    warn!(patient = id, error = %e, "hybrid answer goes out without patient context");
                    None
                }
            },
            None => None,
        };

        let user_prompt =
            prompt::build_hybrid_prompt(&request.question, &hits, patient_context.as_ref());
        let answer = self
            .model
            .complete(SYSTEM_PROMPT, &user_prompt)
            .await
            .map_err(ChatError::Completion)?;

        let similar_items: Vec<SimilarItem> = hits
            .iter()
            .map(|hit| SimilarItem {
                content_type: hit.content_type.clone(),
                text: hit.text.clone(),
                similarity: hit.similarity,
            })
            .collect();

        Ok(ChatResponse {
            answer,
            source: ResponseSource::Hybrid,
            query_type: "semantic_search".to_string(),
            patient_id,
            data_found: !hits.is_empty(),
            records_retrieved: hits.len(),
            similar_items: Some(similar_items),
        })
    }
}
