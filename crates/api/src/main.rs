use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use chat::{ChatPipeline, ChatRequest, ChatResponse, GroqClient};
use classify::ContentType;
use graph::{
    DoctorPatient, DoctorRecord, GraphView, InteractionRecord, MedicalGraph, Neo4jGraph,
    PatientProfile, PatientSummary, StructuredRetriever,
};
use vector::{
    CacheStats, HfEmbedder, QdrantStore, SEARCH_LIMIT, SimilarityHit, SimilarityRetriever,
    TreatmentPlan,
};

use crate::config::Config;
use crate::error::ApiError;

mod config;
mod error;

#[derive(Clone)]
struct AppState {
    neo4j: Arc<Neo4jGraph>,
    pipeline: Arc<ChatPipeline>,
    similarity: Option<Arc<SimilarityRetriever>>,
    embedder: Option<HfEmbedder>,
    config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    config.validate();

    // Connect to Neo4j
    let graph = neo4rs::Graph::new(
        &config.neo4j.uri,
        &config.neo4j.user,
        &config.neo4j.password,
    )
    .await
    .context("Failed to connect to Neo4j")?;
    let neo4j = Arc::new(Neo4jGraph::new(graph));

    // Similarity search is wired in only when embeddings are enabled.
    let (similarity, embedder) = if config.embeddings_enabled {
        let embedder = HfEmbedder::new(
            "https://api-inference.huggingface.co".to_string(),
            config.huggingface.model.clone(),
            config.huggingface.api_key.clone(),
        );
        let store = QdrantStore::new(config.qdrant.url.clone(), config.qdrant.collection.clone());
        let similarity = Arc::new(SimilarityRetriever::new(
            Arc::new(embedder.clone()),
            Arc::new(store),
            neo4j.clone(),
        ));
        (Some(similarity), Some(embedder))
    } else {
        (None, None)
    };

    let model = Arc::new(GroqClient::new(
        "https://api.groq.com".to_string(),
        config.groq.model.clone(),
        config.groq.api_key.clone(),
        config.groq.temperature,
        config.groq.max_tokens,
    ));

    let pipeline = Arc::new(ChatPipeline::new(
        StructuredRetriever::new(neo4j.clone()),
        similarity.clone(),
        model,
    ));

    let state = Arc::new(AppState {
        neo4j,
        pipeline,
        similarity,
        embedder,
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/chat", post(chat_message))
        .route("/api/users/doctors", get(all_doctors))
        .route("/api/users/doctors/:doctor_id", get(doctor_by_id))
        .route("/api/users/doctors/:doctor_id/patients", get(doctor_patients))
        .route("/api/users/patients", get(all_patients))
        .route("/api/users/patients/:patient_id", get(patient_by_id))
        .route(
            "/api/users/patients/:patient_id/interactions",
            get(patient_interactions),
        )
        .route("/api/graph", get(full_graph))
        .route("/api/graph/patients/:patient_id", get(patient_graph))
        .route("/api/graph/doctors/:doctor_id", get(doctor_graph))
        .route("/api/search", post(semantic_search))
        .route("/api/search/treatments", post(find_treatments))
        .route("/api/search/patients/:patient_id/similar", get(similar_patients))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        port = config.port,
        model = %config.groq.model,
        embeddings = config.embeddings_enabled,
        "Medical chat API listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    services: ServicesStatus,
}

#[derive(Serialize)]
struct ServicesStatus {
    llm: LlmStatus,
    database: DatabaseStatus,
    embeddings: EmbeddingsStatus,
    vector_db: VectorDbStatus,
}

#[derive(Serialize)]
struct LlmStatus {
    provider: String,
    model: String,
}

#[derive(Serialize)]
struct DatabaseStatus {
    #[serde(rename = "type")]
    kind: String,
    connected: bool,
}

#[derive(Serialize)]
struct EmbeddingsStatus {
    enabled: bool,
    provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<CacheStats>,
}

#[derive(Serialize)]
struct VectorDbStatus {
    #[serde(rename = "type")]
    kind: String,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connected = match state.neo4j.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "graph store health check failed");
            false
        }
    };

    let enabled = state.config.embeddings_enabled;
    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServicesStatus {
            llm: LlmStatus {
                provider: "groq".to_string(),
                model: state.config.groq.model.clone(),
            },
            database: DatabaseStatus {
                kind: "neo4j".to_string(),
                connected,
            },
            embeddings: EmbeddingsStatus {
                enabled,
                provider: if enabled { "huggingface" } else { "disabled" }.to_string(),
                model: state.embedder.as_ref().map(|e| e.model().to_string()),
                cache: state.embedder.as_ref().map(|e| e.cache_stats()),
            },
            vector_db: VectorDbStatus {
                kind: if enabled { "qdrant" } else { "disabled" }.to_string(),
            },
        },
    })
}

#[derive(Serialize)]
struct ChatEnvelope {
    success: bool,
    #[serde(flatten)]
    result: ChatResponse,
}

async fn chat_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatEnvelope>, ApiError> {
    let span = info_span!("chat_request", id = %Uuid::new_v4());

    async {
        info!(
            role = %request.role,
            user = %request.user_id,
            question = %request.question,
            "chat request"
        );

        let result = state.pipeline.handle_chat(&request).await?;

        info!(
            source = ?result.source,
            data_found = result.data_found,
            records = result.records_retrieved,
            "chat answered"
        );

        Ok(Json(ChatEnvelope {
            success: true,
            result,
        }))
    }
    .instrument(span)
    .await
}

#[derive(Serialize)]
struct DoctorsResponse {
    success: bool,
    doctors: Vec<DoctorRecord>,
    count: usize,
}

#[derive(Serialize)]
struct DoctorResponse {
    success: bool,
    doctor: DoctorRecord,
}

#[derive(Serialize)]
struct DoctorPatientsResponse {
    success: bool,
    doctor_id: String,
    patients: Vec<DoctorPatient>,
    count: usize,
}

#[derive(Serialize)]
struct PatientsResponse {
    success: bool,
    patients: Vec<PatientSummary>,
    count: usize,
}

#[derive(Serialize)]
struct PatientResponse {
    success: bool,
    patient: PatientProfile,
}

#[derive(Serialize)]
struct InteractionsResponse {
    success: bool,
    patient_id: String,
    interactions: Vec<InteractionRecord>,
    count: usize,
}

async fn all_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let doctors = state.neo4j.all_doctors().await?;
    let count = doctors.len();
    Ok(Json(DoctorsResponse {
        success: true,
        doctors,
        count,
    }))
}

async fn doctor_by_id(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<DoctorResponse>, ApiError> {
    let doctor = state
        .neo4j
        .doctor_by_id(&doctor_id)
        .await?
        .ok_or(ApiError::NotFound("Doctor not found"))?;
    Ok(Json(DoctorResponse {
        success: true,
        doctor,
    }))
}

async fn doctor_patients(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<DoctorPatientsResponse>, ApiError> {
    let patients = state.neo4j.doctor_patients(&doctor_id).await?;
    let count = patients.len();
    Ok(Json(DoctorPatientsResponse {
        success: true,
        doctor_id,
        patients,
        count,
    }))
}

async fn all_patients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let patients = state.neo4j.all_patients().await?;
    let count = patients.len();
    Ok(Json(PatientsResponse {
        success: true,
        patients,
        count,
    }))
}

async fn patient_by_id(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientResponse>, ApiError> {
    let patient = state
        .neo4j
        .patient_profile(&patient_id)
        .await?
        .ok_or(ApiError::NotFound("Patient not found"))?;
    Ok(Json(PatientResponse {
        success: true,
        patient,
    }))
}

async fn patient_interactions(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<InteractionsResponse>, ApiError> {
    let interactions = state.neo4j.drug_interactions(&patient_id).await?;
    let count = interactions.len();
    Ok(Json(InteractionsResponse {
        success: true,
        patient_id,
        interactions,
        count,
    }))
}

#[derive(Serialize)]
struct GraphResponse {
    success: bool,
    graph: GraphView,
    #[serde(rename = "nodeTypes")]
    node_types: HashMap<String, usize>,
    stats: GraphStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphStats {
    total_nodes: usize,
    total_edges: usize,
}

fn graph_response(view: GraphView) -> GraphResponse {
    let stats = GraphStats {
        total_nodes: view.nodes.len(),
        total_edges: view.links.len(),
    };
    let node_types = view.node_types.clone();
    GraphResponse {
        success: true,
        graph: view,
        node_types,
        stats,
    }
}

async fn full_graph(State(state): State<Arc<AppState>>) -> Result<Json<GraphResponse>, ApiError> {
    let view = state.neo4j.graph_overview().await?;
    info!(nodes = view.nodes.len(), edges = view.links.len(), "graph overview");
    Ok(Json(graph_response(view)))
}

async fn patient_graph(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<GraphResponse>, ApiError> {
    let view = state.neo4j.patient_subgraph(&patient_id).await?;
    Ok(Json(graph_response(view)))
}

async fn doctor_graph(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<GraphResponse>, ApiError> {
    let view = state.neo4j.doctor_subgraph(&doctor_id).await?;
    Ok(Json(graph_response(view)))
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default, rename = "type")]
    content_type: Option<ContentType>,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Deserialize)]
struct TreatmentRequest {
    condition: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Deserialize)]
struct SimilarQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    SEARCH_LIMIT
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    query: String,
    #[serde(rename = "type")]
    content_type: String,
    results: Vec<SimilarityHit>,
    count: usize,
}

#[derive(Serialize)]
struct TreatmentResponse {
    success: bool,
    condition: String,
    #[serde(flatten)]
    plan: TreatmentPlan,
}

#[derive(Serialize)]
struct SimilarPatientsResponse {
    success: bool,
    patient_id: String,
    similar_patients: Vec<SimilarityHit>,
    count: usize,
}

fn require_similarity<'a>(
    state: &'a AppState,
    message: &str,
) -> Result<&'a SimilarityRetriever, ApiError> {
    state
        .similarity
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

async fn semantic_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let similarity = require_similarity(
        &state,
        "Vector search is disabled. Set ENABLE_EMBEDDINGS=yes in .env to enable.",
    )?;
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query is required".to_string()));
    }

    let results = similarity
        .search(&request.query, request.content_type, request.limit)
        .await?;
    let count = results.len();

    Ok(Json(SearchResponse {
        success: true,
        query: request.query,
        content_type: request
            .content_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "all".to_string()),
        results,
        count,
    }))
}

async fn find_treatments(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TreatmentRequest>,
) -> Result<Json<TreatmentResponse>, ApiError> {
    let similarity = require_similarity(
        &state,
        "Treatment search is disabled. Set ENABLE_EMBEDDINGS=yes in .env to enable.",
    )?;
    if request.condition.trim().is_empty() {
        return Err(ApiError::BadRequest("Condition is required".to_string()));
    }

    let plan = similarity
        .find_treatment_options(&request.condition, request.limit)
        .await?;

    Ok(Json(TreatmentResponse {
        success: true,
        condition: request.condition,
        plan,
    }))
}

async fn similar_patients(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Query(params): Query<SimilarQuery>,
) -> Result<Json<SimilarPatientsResponse>, ApiError> {
    let similarity = require_similarity(
        &state,
        "Similarity search is disabled. Set ENABLE_EMBEDDINGS=yes in .env to enable.",
    )?;

    let hits = similarity
        .find_similar_patients(&patient_id, params.limit)
        .await?;
    let count = hits.len();

    Ok(Json(SimilarPatientsResponse {
        success: true,
        patient_id,
        similar_patients: hits,
        count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::GraphNode;

    #[test]
    fn test_graph_payload_keeps_node_types_beside_graph() {
        let view = GraphView {
            nodes: vec![GraphNode {
                id: "4:abc:17".to_string(),
                node_type: "Patient".to_string(),
                label: "P001".to_string(),
                props: serde_json::Map::new(),
            }],
            links: Vec::new(),
            node_types: HashMap::from([("Patient".to_string(), 1)]),
        };

        let value = serde_json::to_value(graph_response(view)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["nodeTypes"]["Patient"], 1);
        assert!(value["graph"].get("nodeTypes").is_none());
        assert_eq!(value["graph"]["nodes"][0]["type"], "Patient");
        assert_eq!(value["stats"]["totalNodes"], 1);
        assert_eq!(value["stats"]["totalEdges"], 0);
    }
}
