use thiserror::Error;

/// Failure kinds a chat request can surface to the caller.
///
/// Validation problems carry their own message. Collaborator failures
/// keep the underlying report so the handler can log the chain while
/// the response body stays a single message line.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Missing required fields: question, role, user_id")]
    InvalidRequest,

    #[error("Invalid role '{0}'. Must be 'doctor' or 'patient'")]
    InvalidRole(String),

    #[error("Doctor must specify or mention a patient ID")]
    MissingPatientTarget,

    #[error("Retrieval failed: {0}")]
    Retrieval(anyhow::Error),

    #[error("Completion failed: {0}")]
    Completion(anyhow::Error),
}

impl ChatError {
    /// True for errors caused by the request itself rather than a
    /// collaborator outage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChatError::InvalidRequest | ChatError::InvalidRole(_) | ChatError::MissingPatientTarget
        )
    }
}
