//! Input validation for dashboard fields.

use std::fmt;

/// Validation error types.
///
/// Every variant names the form field it belongs to so the dashboard can show
/// the message next to that field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field name not recognised for the target record.
    UnknownField(String),
    /// Value is not one of the allowed choices.
    InvalidChoice {
        field: String,
        value: String,
        allowed: Vec<&'static str>,
    },
    /// Empty value where one is required.
    Empty(String),
    /// Value does not have the expected shape.
    InvalidFormat { field: String, reason: String },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// File is not one of the accepted document types.
    UnsupportedFileType { file_name: String, content_type: String },
}

impl ValidationError {
    /// Form field the error should be displayed on.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::UnknownField(field)
            | ValidationError::Empty(field)
            | ValidationError::InvalidChoice { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::TooLong { field, .. } => field,
            ValidationError::UnsupportedFileType { .. } => "file",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownField(field) => write!(f, "Unknown field: {}", field),
            ValidationError::InvalidChoice {
                field,
                value,
                allowed,
            } => write!(
                f,
                "Invalid {} '{}' (expected one of: {})",
                field,
                value,
                allowed.join(", ")
            ),
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidFormat { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::UnsupportedFileType {
                file_name,
                content_type,
            } => write!(
                f,
                "{} is not a PDF document (type '{}')",
                file_name, content_type
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// MIME type accepted for knowledge documents.
pub const ACCEPTED_DOCUMENT_TYPE: &str = "application/pdf";

/// Maximum allowed length for a stored file name.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Check that an uploaded file is a PDF.
///
/// Browsers report the MIME type; when none is reported the extension decides.
pub fn validate_document_type(file_name: &str, content_type: &str) -> Result<(), ValidationError> {
    let name = file_name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("file".to_string()));
    }

    if name.len() > MAX_FILE_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "file".to_string(),
            max: MAX_FILE_NAME_LENGTH,
            actual: name.len(),
        });
    }

    let content_type = content_type.trim();
    let accepted = if content_type.is_empty() {
        name.to_ascii_lowercase().ends_with(".pdf")
    } else {
        content_type.eq_ignore_ascii_case(ACCEPTED_DOCUMENT_TYPE)
    };

    if accepted {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFileType {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
        })
    }
}
