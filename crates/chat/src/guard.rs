use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Caller roles the access guard recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(ChatError::InvalidRole(other.to_string())),
        }
    }
}

/// Effective patient id for a structured retrieval.
///
/// Patients are confined to their own record: the caller id wins no
/// matter which ids the question or request body mention. Doctors reach
/// the patient named in the question first, then the one supplied in
/// the request, and get an error when neither exists.
pub fn resolve_target(
    role: Role,
    caller_id: &str,
    supplied_patient_id: Option<&str>,
    extracted_patient_id: Option<&str>,
) -> Result<String, ChatError> {
    match role {
        Role::Patient => Ok(caller_id.to_string()),
        Role::Doctor => extracted_patient_id
            .or(supplied_patient_id)
            .map(|id| id.to_string())
            .ok_or(ChatError::MissingPatientTarget),
    }
}

/// Best-effort variant for the hybrid path. A doctor with no derivable
/// patient simply gets no patient context instead of an error.
pub fn resolve_context_target(
    role: Role,
    caller_id: &str,
    supplied_patient_id: Option<&str>,
    extracted_patient_id: Option<&str>,
) -> Option<String> {
    match role {
        Role::Patient => Some(caller_id.to_string()),
        Role::Doctor => extracted_patient_id
            .or(supplied_patient_id)
            .map(|id| id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!("patient".parse::<Role>().unwrap(), Role::Patient);
    }

    #[test]
    fn rejects_unknown_roles() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert!(matches!(err, ChatError::InvalidRole(ref role) if role == "admin"));
        // Role strings are exact; no case folding.
        assert!("Doctor".parse::<Role>().is_err());
    }

    #[test]
    fn patient_is_confined_to_own_record() {
        let target = resolve_target(Role::Patient, "P002", Some("P005"), Some("P005")).unwrap();
        assert_eq!(target, "P002");
    }

    #[test]
    fn doctor_prefers_the_id_mentioned_in_the_question() {
        let target = resolve_target(Role::Doctor, "D001", Some("P009"), Some("P003")).unwrap();
        assert_eq!(target, "P003");

        let target = resolve_target(Role::Doctor, "D001", Some("P009"), None).unwrap();
        assert_eq!(target, "P009");
    }

    #[test]
    fn doctor_without_a_patient_is_rejected() {
        let err = resolve_target(Role::Doctor, "D001", None, None).unwrap_err();
        assert!(matches!(err, ChatError::MissingPatientTarget));
    }

    #[test]
    fn context_target_is_optional_for_doctors() {
        assert_eq!(resolve_context_target(Role::Doctor, "D001", None, None), None);
        assert_eq!(
            resolve_context_target(Role::Doctor, "D001", None, Some("P003")),
            Some("P003".to_string())
        );
        assert_eq!(
            resolve_context_target(Role::Patient, "P002", None, Some("P005")),
            Some("P002".to_string())
        );
    }
}
