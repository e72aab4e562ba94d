//! Error taxonomy shared by every Clubhouse crate.

use thiserror::Error;

/// Reason reported when a custom field value targets a member whose
/// category is outside the field's applicable set.
pub const FIELD_NOT_APPLICABLE: &str = "field not applicable to category";

/// Errors produced by repository, engine and adapter operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClubError {
    /// Missing or malformed required input.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Custom-field/category mismatch.
    #[error("{0}")]
    Constraint(String),

    /// Stale id on read, update or delete.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The database could not be reached.
    #[error("database unreachable: {0}")]
    Connection(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),

    /// The uploaded workbook could not be read or written.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
}

/// Convenience alias used throughout the workspace.
pub type ClubResult<T> = Result<T, ClubError>;

impl ClubError {
    /// Create a validation error for a named input.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The constraint error raised for a field outside its categories.
    pub fn not_applicable() -> Self {
        Self::Constraint(FIELD_NOT_APPLICABLE.to_string())
    }

    pub fn member_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "member",
            id: i64::from(id),
        }
    }

    pub fn field_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "custom field",
            id: i64::from(id),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ClubError::Validation { .. } => "validation",
            ClubError::Constraint(_) => "constraint",
            ClubError::NotFound { .. } => "not_found",
            ClubError::Connection(_) => "connection",
            ClubError::Database(_) => "database",
            ClubError::Spreadsheet(_) => "spreadsheet",
        }
    }

    /// Input name for validation errors, used to place the message next to
    /// the offending form field.
    pub fn field(&self) -> Option<&str> {
        match self {
            ClubError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_applicable_message() {
        assert_eq!(
            ClubError::not_applicable().to_string(),
            "field not applicable to category"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = ClubError::member_not_found(42);
        assert_eq!(err.to_string(), "member 42 not found");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_validation_field() {
        let err = ClubError::validation("last_name", "is required");
        assert_eq!(err.field(), Some("last_name"));
        assert_eq!(err.to_string(), "last_name: is required");
        assert_eq!(ClubError::Constraint("x".into()).field(), None);
    }
}
