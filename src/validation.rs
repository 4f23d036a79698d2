use crate::error::{AppError, Result};

/// Validates a class identifier.
///
/// # Arguments
///
/// * `class_id` - The class identifier to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the identifier is valid.
pub fn validate_class_id(class_id: &str) -> Result<()> {
    if class_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Class id cannot be empty".to_string(),
        ));
    }

    if class_id.len() > 64 {
        return Err(AppError::Validation(
            "Class id must be at most 64 characters".to_string(),
        ));
    }

    if !class_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Class id can only contain letters, numbers, underscores, and hyphens".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_class_ids() {
        assert!(validate_class_id("CS101").is_ok());
        assert!(validate_class_id("math-2026_spring").is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_ids() {
        assert!(validate_class_id("").is_err());
        assert!(validate_class_id("   ").is_err());
        assert!(validate_class_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn rejects_separator_characters() {
        assert!(validate_class_id("CS 101").is_err());
        assert!(validate_class_id("CS/101").is_err());
    }
}
