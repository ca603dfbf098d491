use classify::QueryIntent;
use graph::{FullProfile, RecordSet};
use vector::SimilarityHit;

/// Prompt for the structured path: the retrieved rows rendered as JSON
/// between fixed markers, then the question and answer instructions.
pub fn build_structured_prompt(
    question: &str,
    intent: QueryIntent,
    patient_id: &str,
    records: &RecordSet,
) -> String {
    let data =
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"PATIENT DATA FROM MEDICAL GRAPH STORE:
==========================================
Patient ID: {patient_id}
Query Type: {intent}

Data Retrieved:
{data}
==========================================

USER QUESTION: {question}

Based ONLY on the patient data above, provide a clear and helpful answer.
If specific information is not available in the data, state that clearly.
Format your response in a professional, easy-to-read manner."#
    )
}

/// Prompt for the hybrid path: similarity hits as a bulleted list with
/// their graph context inline, followed by the patient's full profile
/// when one was retrievable.
pub fn build_hybrid_prompt(
    question: &str,
    hits: &[SimilarityHit],
    patient_context: Option<&FullProfile>,
) -> String {
    let hits_block = if hits.is_empty() {
        "No similar items found".to_string()
    } else {
        hits.iter().map(render_hit).collect::<Vec<_>>().join("\n")
    };

    let context_block = match patient_context {
        Some(profile) => {
            serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string())
        }
        None => "No specific patient context".to_string(),
    };

    format!(
        r#"MEDICAL KNOWLEDGE BASE - HYBRID SEARCH RESULTS:
================================================
SIMILARITY SEARCH RESULTS:
{hits_block}

PATIENT CONTEXT (from medical graph store):
{context_block}
================================================

USER QUESTION: {question}

Based on the search results and patient context above:
1. Analyze the semantically similar medical information found
2. Consider the patient's current conditions if available
3. Provide a comprehensive, evidence-based response

Be specific about which information comes from the search results vs patient records.
Format your response professionally for medical staff."#
    )
}

fn render_hit(hit: &SimilarityHit) -> String {
    let mut line = format!(
        "- [{}] {} (similarity: {:.3})",
        hit.content_type, hit.text, hit.similarity
    );
    if let Some(context) = &hit.graph_context {
        if let Ok(json) = serde_json::to_string(context) {
            line.push_str("\n  Graph Data: ");
            line.push_str(&json);
        }
    }
    line
}
