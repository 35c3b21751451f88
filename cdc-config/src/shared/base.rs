use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A field holds a value outside its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A required run parameter was supplied neither by configuration nor by flags.
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),
    /// Two columns of the record layout share a name.
    #[error("column `{0}` appears more than once in the record layout")]
    DuplicateColumn(String),
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, constraint: &str) -> Self {
        ValidationError::InvalidFieldValue {
            field: field.to_string(),
            constraint: constraint.to_string(),
        }
    }
}
