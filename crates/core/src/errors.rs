use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("product `{0}` not found")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("unprocessable payload: {errors}")]
    Unprocessable { errors: ValidationErrors, correlation_id: String },
    #[error("not found")]
    NotFound { correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Body text that is safe to hand to a client.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unprocessable { .. } => "The payload failed validation.",
            Self::NotFound { .. } => "",
            Self::Internal { .. } => "something wrong happened",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Unprocessable { correlation_id, .. }
            | Self::NotFound { correlation_id }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Validation(errors) => {
                Self::Unprocessable { errors, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::NotFound(_) => {
                Self::NotFound { correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Persistence(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
