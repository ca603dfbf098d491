pub mod entities;
pub mod intent;

pub use entities::{ContentType, detect_content_type, extract_patient_id, needs_similarity_search};
pub use intent::{QueryIntent, determine_intent};

/// Everything the rest of the pipeline needs to know about a question,
/// derived in one pass with no I/O.
#[derive(Debug, Clone)]
pub struct QuestionProfile {
    pub patient_id: Option<String>,
    pub intent: QueryIntent,
    pub wants_similarity: bool,
    pub content_type: Option<ContentType>,
}

pub fn profile_question(question: &str) -> QuestionProfile {
    QuestionProfile {
        patient_id: extract_patient_id(question),
        intent: determine_intent(question),
        wants_similarity: needs_similarity_search(question),
        content_type: detect_content_type(question),
    }
}
