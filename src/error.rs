use std::fmt;

/// Crate-wide error type. Validation failures carry the entity and field
/// they were raised for so callers can react without parsing messages.
#[derive(Debug)]
pub enum AppError {
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
    TypeMismatch {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },
    InvalidEnum {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    DanglingReference {
        entity: &'static str,
        field: &'static str,
    },
    UniquenessViolation(String),
    StoreUnavailable(String),
    Serialization(String),
    Deserialization(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingField { entity, field } => {
                write!(f, "Missing field: {}.{} is required", entity, field)
            }
            AppError::TypeMismatch {
                entity,
                field,
                expected,
            } => {
                write!(f, "Type mismatch: {}.{} must be a {}", entity, field, expected)
            }
            AppError::InvalidEnum {
                entity,
                field,
                value,
            } => {
                write!(f, "Invalid value: {}.{} does not allow '{}'", entity, field, value)
            }
            AppError::DanglingReference { entity, field } => {
                write!(f, "Dangling reference: {}.{} does not resolve", entity, field)
            }
            AppError::UniquenessViolation(msg) => write!(f, "Uniqueness violation: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AppError::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// True for errors raised by the derive/validate pipeline rather than
    /// by the underlying store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::MissingField { .. }
                | AppError::TypeMismatch { .. }
                | AppError::InvalidEnum { .. }
                | AppError::DanglingReference { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
