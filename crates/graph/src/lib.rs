pub mod neo4j;
pub mod records;
pub mod retriever;
pub mod view;

pub use neo4j::Neo4jGraph;
pub use records::{
    AllergyRecord, DiseaseContext, DiseaseRecord, DoctorPatient, DoctorRecord, DrugContext,
    FullProfile, GraphContext, HistoryRecord, InteractionRecord, LabResultRecord,
    MedicationRecord, PatientContext, PatientProfile, PatientSummary, SymptomContext,
    SymptomRecord, TreatmentOption, TreatmentRecord,
};
pub use retriever::{RecordSet, StructuredRetriever};
pub use view::{GraphLink, GraphNode, GraphView};

use anyhow::Result;
use async_trait::async_trait;

/// Read contract against the medical graph store. Every patient-scoped read
/// is parameterized by one patient id and never crosses into another
/// patient's subgraph. The concrete Neo4j client implements this; tests
/// substitute in-memory fakes.
#[async_trait]
pub trait MedicalGraph: Send + Sync {
    async fn patient_profile(&self, patient_id: &str) -> Result<Option<PatientProfile>>;
    async fn patient_diseases(&self, patient_id: &str) -> Result<Vec<DiseaseRecord>>;
    async fn patient_medications(&self, patient_id: &str) -> Result<Vec<MedicationRecord>>;
    async fn patient_symptoms(&self, patient_id: &str) -> Result<Vec<SymptomRecord>>;
    async fn patient_treatments(&self, patient_id: &str) -> Result<Vec<TreatmentRecord>>;
    async fn patient_lab_results(&self, patient_id: &str) -> Result<Vec<LabResultRecord>>;
    async fn patient_allergies(&self, patient_id: &str) -> Result<Vec<AllergyRecord>>;
    async fn patient_history(&self, patient_id: &str) -> Result<Vec<HistoryRecord>>;

    /// Pairwise interaction warnings among the patient's current medications.
    async fn drug_interactions(&self, patient_id: &str) -> Result<Vec<InteractionRecord>>;

    // Neighborhood summaries for similarity-hit enrichment.
    async fn disease_context(&self, disease_id: &str) -> Result<Option<DiseaseContext>>;
    async fn drug_context(&self, drug_id: &str) -> Result<Option<DrugContext>>;
    async fn symptom_context(&self, symptom_id: &str) -> Result<Option<SymptomContext>>;
    async fn patient_context(&self, patient_id: &str) -> Result<Option<PatientContext>>;

    /// Drugs treating any of the given diseases, with what each one treats.
    async fn treatments_for_diseases(&self, disease_ids: &[String])
    -> Result<Vec<TreatmentOption>>;
}
