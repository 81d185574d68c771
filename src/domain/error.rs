use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed for `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl DomainError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
