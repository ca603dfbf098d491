use tracing::warn;

/// Runtime configuration read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub neo4j: Neo4jConfig,
    pub qdrant: QdrantConfig,
    pub groq: GroqConfig,
    pub huggingface: HuggingFaceConfig,
    pub embeddings_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_or(std::env::var("PORT").ok(), 3001),
            neo4j: Neo4jConfig {
                uri: env_or("NEO4J_URI", "bolt://localhost:7687"),
                user: env_or("NEO4J_USER", "neo4j"),
                password: env_or("NEO4J_PASSWORD", ""),
            },
            qdrant: QdrantConfig {
                url: env_or("QDRANT_URL", "http://localhost:6333"),
                collection: env_or("QDRANT_COLLECTION", "medical_entities"),
            },
            groq: GroqConfig {
                api_key: env_or("GROQ_API_KEY", ""),
                model: env_or("GROQ_MODEL", "openai/gpt-oss-120b"),
                temperature: parse_or(std::env::var("GROQ_TEMPERATURE").ok(), 0.0),
                max_tokens: parse_or(std::env::var("GROQ_MAX_TOKENS").ok(), 1024),
            },
            huggingface: HuggingFaceConfig {
                api_key: env_or("HUGGINGFACE_API_KEY", ""),
                model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            },
            embeddings_enabled: flag_is_yes(std::env::var("ENABLE_EMBEDDINGS").ok()),
        }
    }

    /// Warn about missing settings without refusing to start. The server
    /// stays usable for whatever its configured collaborators can reach.
    pub fn validate(&self) -> bool {
        let mut missing = Vec::new();
        if self.neo4j.password.is_empty() {
            missing.push("NEO4J_PASSWORD");
        }
        if self.groq.api_key.is_empty() {
            missing.push("GROQ_API_KEY");
        }
        if !missing.is_empty() {
            warn!(vars = %missing.join(", "), "Missing required env vars");
        }

        if self.embeddings_enabled && self.huggingface.api_key.is_empty() {
            warn!("Embeddings enabled but HUGGINGFACE_API_KEY is not set");
        }

        missing.is_empty()
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn flag_is_yes(value: Option<String>) -> bool {
    value.map(|v| v.to_lowercase() == "yes").unwrap_or(false)
}
