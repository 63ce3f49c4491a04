//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a multiple-choice question has options and that `answer_index` points at one.
///
/// # Examples
///
/// ```ignore
/// validate_choice(&["a".into(), "b".into()], 1) // Ok
/// validate_choice(&["a".into(), "b".into()], 2) // Err - out of range
/// validate_choice(&[], 0)                       // Err - no options
/// ```
pub fn validate_choice(options: &[String], answer_index: usize) -> Result<(), ValidationError> {
    if options.len() < 2 {
        let mut err = ValidationError::new("choice_options");
        err.message = Some(
            format!(
                "A multiple-choice question needs at least 2 options (got {})",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    if answer_index >= options.len() {
        let mut err = ValidationError::new("answer_index_range");
        err.message = Some(
            format!(
                "Answer index {answer_index} is out of range for {} options",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Largest point override a question may carry.
pub const MAX_QUESTION_POINTS: u32 = 1_000;

/// Validates a question's point override against `1..=MAX_QUESTION_POINTS`.
pub fn validate_points(points: u32) -> Result<(), ValidationError> {
    if !(1..=MAX_QUESTION_POINTS).contains(&points) {
        let mut err = ValidationError::new("range");
        err.message = Some(
            format!("Points must be between 1 and {MAX_QUESTION_POINTS} (got {points})").into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates that a text is not blank.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(count: usize) -> Vec<String> {
        (0..count).map(|n| format!("option {n}")).collect()
    }

    #[test]
    fn test_validate_choice_valid() {
        assert!(validate_choice(&options(2), 0).is_ok());
        assert!(validate_choice(&options(4), 3).is_ok());
    }

    #[test]
    fn test_validate_choice_out_of_range() {
        assert!(validate_choice(&options(4), 4).is_err());
        assert!(validate_choice(&options(2), 7).is_err());
    }

    #[test]
    fn test_validate_choice_too_few_options() {
        assert!(validate_choice(&[], 0).is_err());
        assert!(validate_choice(&options(1), 0).is_err());
    }

    #[test]
    fn test_validate_points_bounds() {
        assert!(validate_points(1).is_ok());
        assert!(validate_points(MAX_QUESTION_POINTS).is_ok());
        assert!(validate_points(0).is_err());
        assert!(validate_points(MAX_QUESTION_POINTS + 1).is_err());
        assert!(validate_points(u32::MAX).is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Owls").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }
}
