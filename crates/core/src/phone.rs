//! Phone numbers
//!
//! Russian mobile numbers are the login identifier. Every stored phone has the form
//! `+7` followed by ten digits.

use crate::errors::ValidationError;

/// Normalise a Russian phone number to `+7XXXXXXXXXX`.
///
/// Spaces, brackets and dashes are ignored. A leading `8` or `7` on an eleven-digit
/// number and a bare ten-digit number are all read as `+7`.
///
/// # Errors
///
/// Returns [`ValidationError::Phone`] for anything else.
pub fn normalize(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let explicit_plus = trimmed.starts_with('+');

    if trimmed
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')')))
    {
        return Err(ValidationError::Phone);
    }

    if trimmed.chars().skip(1).any(|c| c == '+') {
        return Err(ValidationError::Phone);
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    let national = match (digits.len(), digits.strip_prefix('7'), digits.strip_prefix('8')) {
        (11, Some(rest), _) => rest,
        (11, None, Some(rest)) if !explicit_plus => rest,
        (10, ..) if !explicit_plus => digits.as_str(),
        _ => return Err(ValidationError::Phone),
    };

    Ok(format!("+7{national}"))
}
