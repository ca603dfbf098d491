use serde::{Deserialize, Serialize};

/// What slice of a patient's record the question is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Profile,
    Diseases,
    Medications,
    Symptoms,
    Treatments,
    LabResults,
    Allergies,
    History,
    Full,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Profile => "profile",
            QueryIntent::Diseases => "diseases",
            QueryIntent::Medications => "medications",
            QueryIntent::Symptoms => "symptoms",
            QueryIntent::Treatments => "treatments",
            QueryIntent::LabResults => "lab_results",
            QueryIntent::Allergies => "allergies",
            QueryIntent::History => "history",
            QueryIntent::Full => "full",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table in precedence order. The first bucket with a hit wins,
/// so "what condition is he taking medication for" reads as a disease
/// question, not a medication one.
const INTENT_KEYWORDS: &[(QueryIntent, &[&str])] = &[
    (QueryIntent::Diseases, &["disease", "diagnosis", "condition", "suffering"]),
    (QueryIntent::Medications, &["medication", "drug", "medicine", "taking", "prescribed"]),
    (QueryIntent::Symptoms, &["symptom", "feeling", "pain", "experiencing"]),
    (QueryIntent::Treatments, &["treatment", "therapy", "cure"]),
    (QueryIntent::LabResults, &["lab", "test", "result", "report"]),
    (QueryIntent::Allergies, &["allerg"]),
    (QueryIntent::History, &["history", "past", "previous"]),
    (QueryIntent::Profile, &["profile", "info", "detail", "who is"]),
];

/// Classify a question by scanning its lowercased text against the keyword
/// table. Questions matching no bucket fall back to the full record.
pub fn determine_intent(question: &str) -> QueryIntent {
    let lower = question.to_lowercase();

    for (intent, keywords) in INTENT_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *intent;
        }
    }

    QueryIntent::Full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_buckets() {
        assert_eq!(determine_intent("What diseases does P001 have?"), QueryIntent::Diseases);
        assert_eq!(determine_intent("List current medications"), QueryIntent::Medications);
        assert_eq!(determine_intent("Is she experiencing pain?"), QueryIntent::Symptoms);
        assert_eq!(determine_intent("What therapy was given?"), QueryIntent::Treatments);
        assert_eq!(determine_intent("Show the latest lab report"), QueryIntent::LabResults);
        assert_eq!(determine_intent("Any allergies on file?"), QueryIntent::Allergies);
        assert_eq!(determine_intent("Past illnesses for P002"), QueryIntent::History);
        assert_eq!(determine_intent("Who is patient P003?"), QueryIntent::Profile);
    }

    #[test]
    fn test_precedence_is_fixed() {
        // "medication" and "profile" both appear; the medications bucket
        // is scanned first.
        assert_eq!(
            determine_intent("Show the medication section of her profile"),
            QueryIntent::Medications
        );
        // "condition" outranks "taking".
        assert_eq!(
            determine_intent("What condition is he taking this for?"),
            QueryIntent::Diseases
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(determine_intent("DIAGNOSIS for P001"), QueryIntent::Diseases);
    }

    #[test]
    fn test_fallback_is_full() {
        assert_eq!(determine_intent("Tell me about P001"), QueryIntent::Full);
        assert_eq!(determine_intent(""), QueryIntent::Full);
    }

    #[test]
    fn test_allergy_stem_matches_variants() {
        assert_eq!(determine_intent("allergic to anything?"), QueryIntent::Allergies);
        assert_eq!(determine_intent("known allergens"), QueryIntent::Allergies);
    }
}
