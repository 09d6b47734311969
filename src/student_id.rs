use serde::Serialize;
use std::fmt;

/// Identifier of the student a transaction is charged to.
///
/// Not unique per transaction: a student appears once per meal served.
/// Numeric ids read from the database are kept as their decimal text so
/// that `1001` and `"1001"` compare equal. Any other text is kept as is,
/// commas included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Creates a student id from its textual form.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns an error if the id is empty or contains control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, StudentIdError> {
        let id = id.into();
        let trimmed = id.trim();
        Self::validate(trimmed)?;
        Ok(StudentId(trimmed.to_string()))
    }

    fn validate(id: &str) -> Result<(), StudentIdError> {
        if id.is_empty() {
            return Err(StudentIdError::EmptyId);
        }

        if id.chars().any(|c| c.is_control()) {
            return Err(StudentIdError::InvalidCharacters);
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when validating a student id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentIdError {
    /// The id is empty (or whitespace only)
    EmptyId,
    /// The id contains a control character
    InvalidCharacters,
}

impl fmt::Display for StudentIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentIdError::EmptyId => write!(f, "Student id cannot be empty"),
            StudentIdError::InvalidCharacters => {
                write!(f, "Student id contains invalid characters")
            }
        }
    }
}

impl std::error::Error for StudentIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_id_creation_valid() {
        let id = StudentId::new("ETS0123/14").unwrap();
        assert_eq!(id.as_str(), "ETS0123/14");
    }

    #[test]
    fn test_student_id_is_trimmed() {
        let id = StudentId::new("  1001 ").unwrap();
        assert_eq!(id.as_str(), "1001");
        assert_eq!(id, StudentId::new("1001").unwrap());
    }

    #[test]
    fn test_student_id_empty() {
        assert_eq!(StudentId::new("").unwrap_err(), StudentIdError::EmptyId);
        assert_eq!(StudentId::new("   ").unwrap_err(), StudentIdError::EmptyId);
    }

    #[test]
    fn test_student_id_keeps_commas() {
        let id = StudentId::new("ETS01,15").unwrap();
        assert_eq!(id.as_str(), "ETS01,15");
    }

    #[test]
    fn test_student_id_invalid_characters() {
        assert_eq!(
            StudentId::new("a\nb").unwrap_err(),
            StudentIdError::InvalidCharacters
        );
    }

    #[test]
    fn test_student_id_display() {
        let id = StudentId::new("s1").unwrap();
        assert_eq!(format!("{}", id), "s1");
    }

    #[test]
    fn test_student_id_serializes_as_plain_string() {
        let id = StudentId::new("s1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"s1\"");
    }
}
