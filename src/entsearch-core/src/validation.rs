//! Pre-flight document validation
//!
//! Documents are checked against a [`FieldRequirements`] before any request is
//! built. A document must carry every required field and nothing outside the
//! required and optional sets.

use crate::models::Document;

pub const REQUIRED_FIELDS: &[&str] = &["id", "title", "body", "url"];
pub const OPTIONAL_FIELDS: &[&str] = &["created_at", "updated_at", "type"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid fields: {}", .fields.join(", "))]
    InvalidFields { fields: Vec<String> },
}

impl ValidationError {
    /// Names of the offending fields
    pub fn fields(&self) -> &[String] {
        match self {
            ValidationError::MissingFields { fields } | ValidationError::InvalidFields { fields } => {
                fields
            }
        }
    }
}

/// Recognized field set for a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirements {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl FieldRequirements {
    pub fn new(
        required: impl IntoIterator<Item = impl Into<String>>,
        optional: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            optional: optional.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_recognized(&self, field: &str) -> bool {
        self.required.iter().chain(self.optional.iter()).any(|f| f == field)
    }
}

impl Default for FieldRequirements {
    fn default() -> Self {
        Self::new(REQUIRED_FIELDS.iter().copied(), OPTIONAL_FIELDS.iter().copied())
    }
}

/// Validate a single document.
///
/// Missing fields are reported first, in requirement order. Only a document
/// with every required field is checked for unrecognized ones, which are
/// reported sorted by name.
pub fn validate_document(
    document: &Document,
    requirements: &FieldRequirements,
) -> Result<(), ValidationError> {
    let missing: Vec<String> = requirements
        .required
        .iter()
        .filter(|field| !document.contains(field))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }

    let mut invalid: Vec<String> = document
        .field_names()
        .filter(|field| !requirements.is_recognized(field))
        .map(str::to_string)
        .collect();

    if !invalid.is_empty() {
        invalid.sort();
        return Err(ValidationError::InvalidFields { fields: invalid });
    }

    Ok(())
}

/// Validate a batch, stopping at the first invalid document.
///
/// On failure returns the position of that document along with its error.
pub fn validate_documents(
    documents: &[Document],
    requirements: &FieldRequirements,
) -> Result<(), (usize, ValidationError)> {
    for (index, document) in documents.iter().enumerate() {
        validate_document(document, requirements).map_err(|e| (index, e))?;
    }
    Ok(())
}
