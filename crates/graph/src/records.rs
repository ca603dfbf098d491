use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub blood_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub disease: String,
    pub icd_code: String,
    pub diagnosed_date: String,
    pub status: String,
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: String,
    pub prescribed_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub disease: String,
    pub symptom: String,
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentRecord {
    pub disease: String,
    pub treatment: String,
    pub dosage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResultRecord {
    pub test: String,
    pub value: String,
    pub unit: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyRecord {
    pub allergen: String,
    pub reaction: String,
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub disease: String,
    pub start_date: String,
    pub end_date: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub drug1: String,
    pub drug2: String,
    pub severity: String,
    pub interaction: String,
}

/// Composite record assembled by the six-way profile fan-out. Treatments and
/// past history are intent-specific reads and stay out of the composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullProfile {
    pub patient: Option<PatientProfile>,
    pub diseases: Vec<DiseaseRecord>,
    pub medications: Vec<MedicationRecord>,
    pub symptoms: Vec<SymptomRecord>,
    pub lab_results: Vec<LabResultRecord>,
    pub allergies: Vec<AllergyRecord>,
}

// First-order neighborhood summaries used to enrich similarity hits.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseContext {
    pub name: String,
    pub icd_code: String,
    pub affected_patients: Vec<String>,
    pub treating_drugs: Vec<String>,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugContext {
    pub name: String,
    pub dosage: String,
    pub category: String,
    pub treats_diseases: Vec<String>,
    pub prescribed_to: Vec<String>,
    pub interactions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomContext {
    pub name: String,
    pub severity: String,
    pub associated_diseases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContext {
    pub name: String,
    pub diseases: Vec<String>,
    pub medications: Vec<String>,
}

/// Graph neighborhood attached to a similarity hit. Serialized untagged so
/// each variant appears as its plain summary object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphContext {
    Disease(DiseaseContext),
    Drug(DrugContext),
    Symptom(SymptomContext),
    Patient(PatientContext),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentOption {
    pub name: String,
    pub dosage: String,
    pub category: String,
    pub treats: Vec<String>,
}

// Listing rows for the directory endpoints.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub phone: String,
    pub email: String,
    pub license_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorPatient {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub blood_type: String,
    pub treating_since: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub blood_type: String,
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
}
