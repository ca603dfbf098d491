use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use classify::QueryIntent;

use crate::MedicalGraph;
use crate::records::{
    AllergyRecord, DiseaseRecord, FullProfile, HistoryRecord, LabResultRecord, MedicationRecord,
    PatientProfile, SymptomRecord, TreatmentRecord,
};

/// Rows produced by one structured retrieval. Serialized untagged so the
/// prompt sees the plain rows (or the composite object) with no wrapper.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RecordSet {
    Profile(Option<PatientProfile>),
    Diseases(Vec<DiseaseRecord>),
    Medications(Vec<MedicationRecord>),
    Symptoms(Vec<SymptomRecord>),
    Treatments(Vec<TreatmentRecord>),
    LabResults(Vec<LabResultRecord>),
    Allergies(Vec<AllergyRecord>),
    History(Vec<HistoryRecord>),
    Full(FullProfile),
}

impl RecordSet {
    /// The composite counts as empty exactly when the profile is absent,
    /// even if stray record rows exist for the id.
    pub fn is_empty(&self) -> bool {
        match self {
            RecordSet::Profile(profile) => profile.is_none(),
            RecordSet::Diseases(rows) => rows.is_empty(),
            RecordSet::Medications(rows) => rows.is_empty(),
            RecordSet::Symptoms(rows) => rows.is_empty(),
            RecordSet::Treatments(rows) => rows.is_empty(),
            RecordSet::LabResults(rows) => rows.is_empty(),
            RecordSet::Allergies(rows) => rows.is_empty(),
            RecordSet::History(rows) => rows.is_empty(),
            RecordSet::Full(full) => full.patient.is_none(),
        }
    }

    /// Row count for list intents; a present profile or composite is one
    /// record.
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Profile(profile) => {
                if profile.is_some() { 1 } else { 0 }
            }
            RecordSet::Diseases(rows) => rows.len(),
            RecordSet::Medications(rows) => rows.len(),
            RecordSet::Symptoms(rows) => rows.len(),
            RecordSet::Treatments(rows) => rows.len(),
            RecordSet::LabResults(rows) => rows.len(),
            RecordSet::Allergies(rows) => rows.len(),
            RecordSet::History(rows) => rows.len(),
            RecordSet::Full(full) => {
                if full.patient.is_some() { 1 } else { 0 }
            }
        }
    }
}

/// Dispatches an intent to the matching store read.
pub struct StructuredRetriever {
    graph: Arc<dyn MedicalGraph>,
}

impl StructuredRetriever {
    pub fn new(graph: Arc<dyn MedicalGraph>) -> Self {
        Self { graph }
    }

    pub async fn retrieve(&self, intent: QueryIntent, patient_id: &str) -> Result<RecordSet> {
        debug!(patient = patient_id, intent = %intent, "structured retrieval");

        let records = match intent {
            QueryIntent::Profile => {
                RecordSet::Profile(self.graph.patient_profile(patient_id).await?)
            }
            QueryIntent::Diseases => {
                RecordSet::Diseases(self.graph.patient_diseases(patient_id).await?)
            }
            QueryIntent::Medications => {
                RecordSet::Medications(self.graph.patient_medications(patient_id).await?)
            }
            QueryIntent::Symptoms => {
                RecordSet::Symptoms(self.graph.patient_symptoms(patient_id).await?)
            }
            QueryIntent::Treatments => {
                RecordSet::Treatments(self.graph.patient_treatments(patient_id).await?)
            }
            QueryIntent::LabResults => {
                RecordSet::LabResults(self.graph.patient_lab_results(patient_id).await?)
            }
            QueryIntent::Allergies => {
                RecordSet::Allergies(self.graph.patient_allergies(patient_id).await?)
            }
            QueryIntent::History => {
                RecordSet::History(self.graph.patient_history(patient_id).await?)
            }
            QueryIntent::Full => RecordSet::Full(self.full_profile(patient_id).await?),
        };

        Ok(records)
    }

    /// Assemble the composite profile with one concurrent fan-out. A failure
    /// in any branch fails the whole read.
    pub async fn full_profile(&self, patient_id: &str) -> Result<FullProfile> {
        let (patient, diseases, medications, symptoms, lab_results, allergies) = tokio::try_join!(
            self.graph.patient_profile(patient_id),
            self.graph.patient_diseases(patient_id),
            self.graph.patient_medications(patient_id),
            self.graph.patient_symptoms(patient_id),
            self.graph.patient_lab_results(patient_id),
            self.graph.patient_allergies(patient_id),
        )?;

        Ok(FullProfile {
            patient,
            diseases,
            medications,
            symptoms,
            lab_results,
            allergies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::records::{
        DiseaseContext, DrugContext, InteractionRecord, PatientContext, SymptomContext,
        TreatmentOption,
    };

    /// In-memory store holding one patient's records.
    struct FakeGraph {
        patient_id: String,
        profile: Option<PatientProfile>,
        diseases: Vec<DiseaseRecord>,
        medications: Vec<MedicationRecord>,
    }

    impl FakeGraph {
        fn with_patient(patient_id: &str) -> Self {
            Self {
                patient_id: patient_id.to_string(),
                profile: Some(PatientProfile {
                    id: patient_id.to_string(),
                    name: "Jane Roe".to_string(),
                    age: 52,
                    gender: "female".to_string(),
                    blood_type: "A+".to_string(),
                }),
                diseases: vec![DiseaseRecord {
                    disease: "Hypertension".to_string(),
                    icd_code: "I10".to_string(),
                    diagnosed_date: "2022-03-14".to_string(),
                    status: "active".to_string(),
                    severity: "moderate".to_string(),
                }],
                medications: vec![
                    MedicationRecord {
                        medication: "Lisinopril".to_string(),
                        dosage: "10mg".to_string(),
                        frequency: "daily".to_string(),
                        start_date: "2022-03-20".to_string(),
                        prescribed_by: "D001".to_string(),
                    },
                    MedicationRecord {
                        medication: "Metformin".to_string(),
                        dosage: "500mg".to_string(),
                        frequency: "twice daily".to_string(),
                        start_date: "2021-11-02".to_string(),
                        prescribed_by: "D001".to_string(),
                    },
                ],
            }
        }

        fn known(&self, patient_id: &str) -> bool {
            patient_id == self.patient_id
        }
    }

    #[async_trait]
    impl MedicalGraph for FakeGraph {
        async fn patient_profile(&self, patient_id: &str) -> Result<Option<PatientProfile>> {
            Ok(if self.known(patient_id) {
                self.profile.clone()
            } else {
                None
            })
        }

        async fn patient_diseases(&self, patient_id: &str) -> Result<Vec<DiseaseRecord>> {
            Ok(if self.known(patient_id) {
                self.diseases.clone()
            } else {
                Vec::new()
            })
        }

        async fn patient_medications(&self, patient_id: &str) -> Result<Vec<MedicationRecord>> {
            Ok(if self.known(patient_id) {
                self.medications.clone()
            } else {
                Vec::new()
            })
        }

        async fn patient_symptoms(&self, _patient_id: &str) -> Result<Vec<SymptomRecord>> {
            Ok(Vec::new())
        }

        async fn patient_treatments(&self, _patient_id: &str) -> Result<Vec<TreatmentRecord>> {
            Ok(Vec::new())
        }

        async fn patient_lab_results(&self, _patient_id: &str) -> Result<Vec<LabResultRecord>> {
            Ok(Vec::new())
        }

        async fn patient_allergies(&self, _patient_id: &str) -> Result<Vec<AllergyRecord>> {
            Ok(Vec::new())
        }

        async fn patient_history(&self, _patient_id: &str) -> Result<Vec<HistoryRecord>> {
            Ok(Vec::new())
        }

        async fn drug_interactions(&self, _patient_id: &str) -> Result<Vec<InteractionRecord>> {
            Ok(Vec::new())
        }

        async fn disease_context(&self, _disease_id: &str) -> Result<Option<DiseaseContext>> {
            Ok(None)
        }

        async fn drug_context(&self, _drug_id: &str) -> Result<Option<DrugContext>> {
            Ok(None)
        }

        async fn symptom_context(&self, _symptom_id: &str) -> Result<Option<SymptomContext>> {
            Ok(None)
        }

        async fn patient_context(&self, _patient_id: &str) -> Result<Option<PatientContext>> {
            Ok(None)
        }

        async fn treatments_for_diseases(
            &self,
            _disease_ids: &[String],
        ) -> Result<Vec<TreatmentOption>> {
            Ok(Vec::new())
        }
    }

    fn retriever() -> StructuredRetriever {
        StructuredRetriever::new(Arc::new(FakeGraph::with_patient("P001")))
    }

    #[tokio::test]
    async fn test_dispatch_matches_intent() {
        let records = retriever()
            .retrieve(QueryIntent::Medications, "P001")
            .await
            .unwrap();

        match records {
            RecordSet::Medications(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected medications, got {other:?}"),
        }

        let records = retriever()
            .retrieve(QueryIntent::Diseases, "P001")
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records.is_empty());
    }

    #[tokio::test]
    async fn test_full_fan_out_merges_sections() {
        let records = retriever().retrieve(QueryIntent::Full, "P001").await.unwrap();

        let RecordSet::Full(full) = &records else {
            panic!("expected composite");
        };
        assert!(full.patient.is_some());
        assert_eq!(full.diseases.len(), 1);
        assert_eq!(full.medications.len(), 2);
        assert!(full.symptoms.is_empty());

        // The composite is one record regardless of section sizes.
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_patient_is_empty() {
        let records = retriever()
            .retrieve(QueryIntent::Diseases, "P999")
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(records.len(), 0);

        // Composite with no profile row counts as empty too.
        let records = retriever().retrieve(QueryIntent::Full, "P999").await.unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_serialized_shape_is_unwrapped() {
        let rows = RecordSet::Diseases(vec![DiseaseRecord {
            disease: "Asthma".to_string(),
            icd_code: "J45".to_string(),
            diagnosed_date: "2020-01-01".to_string(),
            status: "active".to_string(),
            severity: "mild".to_string(),
        }]);

        let value = serde_json::to_value(&rows).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["disease"], "Asthma");

        let absent = RecordSet::Profile(None);
        assert!(serde_json::to_value(&absent).unwrap().is_null());
    }
}
