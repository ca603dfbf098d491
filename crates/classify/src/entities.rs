use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of clinical entity a similarity hit refers to. Mirrors the
/// `content_type` payload field stored alongside each embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Disease,
    Drug,
    Symptom,
    Patient,
    Allergen,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Disease => "disease",
            ContentType::Drug => "drug",
            ContentType::Symptom => "symptom",
            ContentType::Patient => "patient",
            ContentType::Allergen => "allergen",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull a patient identifier out of free text. Identifiers are the letter P
/// followed by at least three digits; the first occurrence wins and is
/// reported uppercased so downstream lookups see one canonical form.
pub fn extract_patient_id(question: &str) -> Option<String> {
    let re = Regex::new(r"(?i)p\d{3,}").unwrap();
    re.find(question).map(|m| m.as_str().to_uppercase())
}

/// Phrases that signal the question wants similarity search rather than a
/// direct record lookup.
const SIMILARITY_TRIGGERS: &[&str] = &[
    "similar",
    "like",
    "related",
    "recommend",
    "suggest",
    "find",
    "search",
    "what treats",
    "treatment for",
    "drugs for",
    "medicine for",
    "patients with",
    "cases like",
    "comparable",
    "alternative",
];

pub fn needs_similarity_search(question: &str) -> bool {
    let lower = question.to_lowercase();
    SIMILARITY_TRIGGERS.iter().any(|t| lower.contains(t))
}

/// Content-type table in precedence order, scanned the same way as the
/// intent table.
const CONTENT_KEYWORDS: &[(ContentType, &[&str])] = &[
    (ContentType::Disease, &["disease", "condition", "diagnosis"]),
    (ContentType::Drug, &["drug", "medication", "medicine"]),
    (ContentType::Symptom, &["symptom"]),
    (ContentType::Patient, &["patient"]),
    (ContentType::Allergen, &["allerg"]),
];

/// Guess which entity kind a similarity question is about, or `None` to
/// search across every kind.
pub fn detect_content_type(question: &str) -> Option<ContentType> {
    let lower = question.to_lowercase();

    for (content_type, keywords) in CONTENT_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return Some(*content_type);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_extraction() {
        assert_eq!(extract_patient_id("What about P001?"), Some("P001".to_string()));
        assert_eq!(extract_patient_id("meds for p0023"), Some("P0023".to_string()));
        assert_eq!(extract_patient_id("no id here"), None);
        // Two digits is not an identifier.
        assert_eq!(extract_patient_id("room P42"), None);
    }

    #[test]
    fn test_first_id_wins() {
        assert_eq!(
            extract_patient_id("compare P001 with P250"),
            Some("P001".to_string())
        );
    }

    #[test]
    fn test_similarity_triggers() {
        assert!(needs_similarity_search("find patients with diabetes"));
        assert!(needs_similarity_search("What treats hypertension?"));
        assert!(needs_similarity_search("any alternative to metformin"));
        assert!(!needs_similarity_search("what diseases does P001 have"));
    }

    #[test]
    fn test_content_type_precedence() {
        assert_eq!(detect_content_type("similar diseases"), Some(ContentType::Disease));
        assert_eq!(detect_content_type("drugs like metformin"), Some(ContentType::Drug));
        assert_eq!(detect_content_type("related symptoms"), Some(ContentType::Symptom));
        assert_eq!(detect_content_type("cases like this patient"), Some(ContentType::Patient));
        assert_eq!(detect_content_type("similar allergens"), Some(ContentType::Allergen));
        // "condition" beats "medication" because the disease bucket scans first.
        assert_eq!(
            detect_content_type("medication for this condition"),
            Some(ContentType::Disease)
        );
        assert_eq!(detect_content_type("anything comparable?"), None);
    }
}
