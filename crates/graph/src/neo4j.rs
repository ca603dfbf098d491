use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{Graph, Query};

use crate::MedicalGraph;
use crate::records::{
    AllergyRecord, DiseaseContext, DiseaseRecord, DoctorPatient, DoctorRecord, DrugContext,
    HistoryRecord, InteractionRecord, LabResultRecord, MedicationRecord, PatientContext,
    PatientProfile, PatientSummary, SymptomContext, SymptomRecord, TreatmentOption,
    TreatmentRecord,
};

/// Neo4j-backed store client. One parameterized Cypher template per read;
/// row columns are aliased to match the record field names.
pub struct Neo4jGraph {
    pub(crate) graph: Graph,
}

impl Neo4jGraph {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Cheap connectivity check for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        let query = Query::new("RETURN 1 AS ok".to_string());
        let mut result = self
            .graph
            .execute(query)
            .await
            .context("Graph store unreachable")?;
        result.next().await?;
        Ok(())
    }

    pub async fn all_doctors(&self) -> Result<Vec<DoctorRecord>> {
        let query = Query::new(
            r#"
            MATCH (d:Doctor)
            RETURN d.doctor_id AS id, d.name AS name, d.specialty AS specialty,
                   d.phone AS phone, d.email AS email, d.license_number AS license_number
            ORDER BY d.name
            "#
            .to_string(),
        );

        let mut result = self.graph.execute(query).await?;

        let mut doctors = Vec::new();
        while let Some(row) = result.next().await? {
            doctors.push(DoctorRecord {
                id: row.get("id")?,
                name: row.get("name")?,
                specialty: row.get("specialty").unwrap_or_else(|_| String::new()),
                phone: row.get("phone").unwrap_or_else(|_| String::new()),
                email: row.get("email").unwrap_or_else(|_| String::new()),
                license_number: row.get("license_number").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(doctors)
    }

    pub async fn doctor_by_id(&self, doctor_id: &str) -> Result<Option<DoctorRecord>> {
        let query = Query::new(
            r#"
            MATCH (d:Doctor {doctor_id: $doctor_id})
            RETURN d.doctor_id AS id, d.name AS name, d.specialty AS specialty,
                   d.phone AS phone, d.email AS email, d.license_number AS license_number
            "#
            .to_string(),
        )
        .param("doctor_id", doctor_id.to_string());

        let mut result = self.graph.execute(query).await?;

        if let Some(row) = result.next().await? {
            Ok(Some(DoctorRecord {
                id: row.get("id")?,
                name: row.get("name")?,
                specialty: row.get("specialty").unwrap_or_else(|_| String::new()),
                phone: row.get("phone").unwrap_or_else(|_| String::new()),
                email: row.get("email").unwrap_or_else(|_| String::new()),
                license_number: row.get("license_number").unwrap_or_else(|_| String::new()),
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn doctor_patients(&self, doctor_id: &str) -> Result<Vec<DoctorPatient>> {
        let query = Query::new(
            r#"
            MATCH (d:Doctor {doctor_id: $doctor_id})-[r:TREATS]->(p:Patient)
            RETURN p.patient_id AS id, p.name AS name, p.age AS age,
                   p.gender AS gender, p.blood_type AS blood_type,
                   r.since AS treating_since, r.primary AS is_primary
            ORDER BY p.name
            "#
            .to_string(),
        )
        .param("doctor_id", doctor_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut patients = Vec::new();
        while let Some(row) = result.next().await? {
            patients.push(DoctorPatient {
                id: row.get("id")?,
                name: row.get("name")?,
                age: row.get("age").unwrap_or(0),
                gender: row.get("gender").unwrap_or_else(|_| String::new()),
                blood_type: row.get("blood_type").unwrap_or_else(|_| String::new()),
                treating_since: row.get("treating_since").unwrap_or_else(|_| String::new()),
                is_primary: row.get("is_primary").unwrap_or(false),
            });
        }

        Ok(patients)
    }

    pub async fn all_patients(&self) -> Result<Vec<PatientSummary>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient)
            OPTIONAL MATCH (d:Doctor)-[:TREATS]->(p)
            RETURN p.patient_id AS id, p.name AS name, p.age AS age,
                   p.gender AS gender, p.blood_type AS blood_type,
                   d.doctor_id AS doctor_id, d.name AS doctor_name
            ORDER BY p.name
            "#
            .to_string(),
        );

        let mut result = self.graph.execute(query).await?;

        let mut patients = Vec::new();
        while let Some(row) = result.next().await? {
            patients.push(PatientSummary {
                id: row.get("id")?,
                name: row.get("name")?,
                age: row.get("age").unwrap_or(0),
                gender: row.get("gender").unwrap_or_else(|_| String::new()),
                blood_type: row.get("blood_type").unwrap_or_else(|_| String::new()),
                doctor_id: row.get::<Option<String>>("doctor_id").unwrap_or(None),
                doctor_name: row.get::<Option<String>>("doctor_name").unwrap_or(None),
            });
        }

        Ok(patients)
    }
}

#[async_trait]
impl MedicalGraph for Neo4jGraph {
    async fn patient_profile(&self, patient_id: &str) -> Result<Option<PatientProfile>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})
            RETURN p.patient_id AS id, p.name AS name, p.age AS age,
                   p.gender AS gender, p.blood_type AS blood_type
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        if let Some(row) = result.next().await? {
            Ok(Some(PatientProfile {
                id: row.get("id")?,
                name: row.get("name")?,
                age: row.get("age").unwrap_or(0),
                gender: row.get("gender").unwrap_or_else(|_| String::new()),
                blood_type: row.get("blood_type").unwrap_or_else(|_| String::new()),
            }))
        } else {
            Ok(None)
        }
    }

    async fn patient_diseases(&self, patient_id: &str) -> Result<Vec<DiseaseRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[r:HAS_DISEASE]->(d:Disease)
            RETURN d.name AS disease, d.icd_code AS icd_code,
                   r.diagnosed_date AS diagnosed_date, r.status AS status,
                   r.severity AS severity
            ORDER BY r.diagnosed_date DESC
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut diseases = Vec::new();
        while let Some(row) = result.next().await? {
            diseases.push(DiseaseRecord {
                disease: row.get("disease")?,
                icd_code: row.get("icd_code").unwrap_or_else(|_| String::new()),
                diagnosed_date: row.get("diagnosed_date").unwrap_or_else(|_| String::new()),
                status: row.get("status").unwrap_or_else(|_| String::new()),
                severity: row.get("severity").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(diseases)
    }

    async fn patient_medications(&self, patient_id: &str) -> Result<Vec<MedicationRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[r:CURRENTLY_TAKING]->(drug:Drug)
            RETURN drug.name AS medication, drug.dosage AS dosage,
                   drug.frequency AS frequency, r.start_date AS start_date,
                   r.prescribed_by AS prescribed_by
            ORDER BY r.start_date DESC
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut medications = Vec::new();
        while let Some(row) = result.next().await? {
            medications.push(MedicationRecord {
                medication: row.get("medication")?,
                dosage: row.get("dosage").unwrap_or_else(|_| String::new()),
                frequency: row.get("frequency").unwrap_or_else(|_| String::new()),
                start_date: row.get("start_date").unwrap_or_else(|_| String::new()),
                prescribed_by: row.get("prescribed_by").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(medications)
    }

    async fn patient_symptoms(&self, patient_id: &str) -> Result<Vec<SymptomRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[:HAS_DISEASE]->(d:Disease)-[:PRESENTS_WITH]->(s:Symptom)
            RETURN d.name AS disease, s.name AS symptom, s.severity AS severity
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut symptoms = Vec::new();
        while let Some(row) = result.next().await? {
            symptoms.push(SymptomRecord {
                disease: row.get("disease")?,
                symptom: row.get("symptom")?,
                severity: row.get("severity").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(symptoms)
    }

    async fn patient_treatments(&self, patient_id: &str) -> Result<Vec<TreatmentRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[:HAS_DISEASE]->(d:Disease)
            MATCH (drug:Drug)-[:TREATS]->(d)
            RETURN d.name AS disease, drug.name AS treatment, drug.dosage AS dosage
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut treatments = Vec::new();
        while let Some(row) = result.next().await? {
            treatments.push(TreatmentRecord {
                disease: row.get("disease")?,
                treatment: row.get("treatment")?,
                dosage: row.get("dosage").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(treatments)
    }

    async fn patient_lab_results(&self, patient_id: &str) -> Result<Vec<LabResultRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[:HAS_LAB_RESULT]->(lab:LabResult)
            RETURN lab.test_name AS test, lab.value AS value, lab.unit AS unit,
                   lab.date AS date, lab.status AS status
            ORDER BY lab.date DESC
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut labs = Vec::new();
        while let Some(row) = result.next().await? {
            labs.push(LabResultRecord {
                test: row.get("test")?,
                value: row.get("value").unwrap_or_else(|_| String::new()),
                unit: row.get("unit").unwrap_or_else(|_| String::new()),
                date: row.get("date").unwrap_or_else(|_| String::new()),
                status: row.get("status").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(labs)
    }

    async fn patient_allergies(&self, patient_id: &str) -> Result<Vec<AllergyRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[:ALLERGIC_TO]->(a:Allergen)
            RETURN a.name AS allergen, a.reaction AS reaction, a.severity AS severity
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut allergies = Vec::new();
        while let Some(row) = result.next().await? {
            allergies.push(AllergyRecord {
                allergen: row.get("allergen")?,
                reaction: row.get("reaction").unwrap_or_else(|_| String::new()),
                severity: row.get("severity").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(allergies)
    }

    async fn patient_history(&self, patient_id: &str) -> Result<Vec<HistoryRecord>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[r:HAD_DISEASE]->(d:Disease)
            RETURN d.name AS disease, r.start_date AS start_date,
                   r.end_date AS end_date, r.outcome AS outcome
            ORDER BY r.start_date DESC
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut history = Vec::new();
        while let Some(row) = result.next().await? {
            history.push(HistoryRecord {
                disease: row.get("disease")?,
                start_date: row.get("start_date").unwrap_or_else(|_| String::new()),
                end_date: row.get("end_date").unwrap_or_else(|_| String::new()),
                outcome: row.get("outcome").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(history)
    }

    async fn drug_interactions(&self, patient_id: &str) -> Result<Vec<InteractionRecord>> {
        // d1.name < d2.name keeps each undirected pair once.
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})-[:CURRENTLY_TAKING]->(d1:Drug)
            MATCH (p)-[:CURRENTLY_TAKING]->(d2:Drug)
            MATCH (d1)-[r:INTERACTS_WITH]-(d2)
            WHERE d1.name < d2.name
            RETURN d1.name AS drug1, d2.name AS drug2,
                   r.severity AS severity, r.description AS interaction
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        let mut interactions = Vec::new();
        while let Some(row) = result.next().await? {
            interactions.push(InteractionRecord {
                drug1: row.get("drug1")?,
                drug2: row.get("drug2")?,
                severity: row.get("severity").unwrap_or_else(|_| String::new()),
                interaction: row.get("interaction").unwrap_or_else(|_| String::new()),
            });
        }

        Ok(interactions)
    }

    async fn disease_context(&self, disease_id: &str) -> Result<Option<DiseaseContext>> {
        let query = Query::new(
            r#"
            MATCH (d:Disease {disease_id: $id})
            OPTIONAL MATCH (d)<-[:HAS_DISEASE]-(p:Patient)
            OPTIONAL MATCH (dr:Drug)-[:TREATS]->(d)
            OPTIONAL MATCH (d)-[:PRESENTS_WITH]->(s:Symptom)
            RETURN d.name AS name, d.icd_code AS icd_code,
                   collect(DISTINCT p.name) AS affected_patients,
                   collect(DISTINCT dr.name) AS treating_drugs,
                   collect(DISTINCT s.name) AS symptoms
            "#
            .to_string(),
        )
        .param("id", disease_id.to_string());

        let mut result = self.graph.execute(query).await?;

        if let Some(row) = result.next().await? {
            Ok(Some(DiseaseContext {
                name: row.get("name")?,
                icd_code: row.get("icd_code").unwrap_or_else(|_| String::new()),
                affected_patients: row.get("affected_patients").unwrap_or_default(),
                treating_drugs: row.get("treating_drugs").unwrap_or_default(),
                symptoms: row.get("symptoms").unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    async fn drug_context(&self, drug_id: &str) -> Result<Option<DrugContext>> {
        let query = Query::new(
            r#"
            MATCH (dr:Drug {drug_id: $id})
            OPTIONAL MATCH (dr)-[:TREATS]->(d:Disease)
            OPTIONAL MATCH (p:Patient)-[:CURRENTLY_TAKING]->(dr)
            OPTIONAL MATCH (dr)-[:INTERACTS_WITH]-(other:Drug)
            RETURN dr.name AS name, dr.dosage AS dosage, dr.category AS category,
                   collect(DISTINCT d.name) AS treats_diseases,
                   collect(DISTINCT p.name) AS prescribed_to,
                   collect(DISTINCT other.name) AS interactions
            "#
            .to_string(),
        )
        .param("id", drug_id.to_string());

        let mut result = self.graph.execute(query).await?;

        if let Some(row) = result.next().await? {
            Ok(Some(DrugContext {
                name: row.get("name")?,
                dosage: row.get("dosage").unwrap_or_else(|_| String::new()),
                category: row.get("category").unwrap_or_else(|_| String::new()),
                treats_diseases: row.get("treats_diseases").unwrap_or_default(),
                prescribed_to: row.get("prescribed_to").unwrap_or_default(),
                interactions: row.get("interactions").unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    async fn symptom_context(&self, symptom_id: &str) -> Result<Option<SymptomContext>> {
        let query = Query::new(
            r#"
            MATCH (s:Symptom {symptom_id: $id})
            OPTIONAL MATCH (d:Disease)-[:PRESENTS_WITH]->(s)
            RETURN s.name AS name, s.severity AS severity,
                   collect(DISTINCT d.name) AS associated_diseases
            "#
            .to_string(),
        )
        .param("id", symptom_id.to_string());

        let mut result = self.graph.execute(query).await?;

        if let Some(row) = result.next().await? {
            Ok(Some(SymptomContext {
                name: row.get("name")?,
                severity: row.get("severity").unwrap_or_else(|_| String::new()),
                associated_diseases: row.get("associated_diseases").unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    async fn patient_context(&self, patient_id: &str) -> Result<Option<PatientContext>> {
        let query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $id})
            OPTIONAL MATCH (p)-[:HAS_DISEASE]->(d:Disease)
            OPTIONAL MATCH (p)-[:CURRENTLY_TAKING]->(dr:Drug)
            RETURN p.name AS name,
                   collect(DISTINCT d.name) AS diseases,
                   collect(DISTINCT dr.name) AS medications
            "#
            .to_string(),
        )
        .param("id", patient_id.to_string());

        let mut result = self.graph.execute(query).await?;

        if let Some(row) = result.next().await? {
            Ok(Some(PatientContext {
                name: row.get("name")?,
                diseases: row.get("diseases").unwrap_or_default(),
                medications: row.get("medications").unwrap_or_default(),
            }))
        } else {
            Ok(None)
        }
    }

    async fn treatments_for_diseases(
        &self,
        disease_ids: &[String],
    ) -> Result<Vec<TreatmentOption>> {
        if disease_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new(
            r#"
            MATCH (dr:Drug)-[:TREATS]->(d:Disease)
            WHERE d.disease_id IN $disease_ids
            RETURN DISTINCT dr.name AS name, dr.dosage AS dosage,
                   dr.category AS category, collect(d.name) AS treats
            "#
            .to_string(),
        )
        .param("disease_ids", disease_ids.to_vec());

        let mut result = self.graph.execute(query).await?;

        let mut options = Vec::new();
        while let Some(row) = result.next().await? {
            options.push(TreatmentOption {
                name: row.get("name")?,
                dosage: row.get("dosage").unwrap_or_else(|_| String::new()),
                category: row.get("category").unwrap_or_else(|_| String::new()),
                treats: row.get("treats").unwrap_or_default(),
            });
        }

        Ok(options)
    }
}
