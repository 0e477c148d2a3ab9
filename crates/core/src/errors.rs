//! Errors

use thiserror::Error;

/// Broad failure class shared by every error the storefront reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced product, offer, method, order or cart line does not exist.
    NotFound,

    /// The input was malformed (bad quantity, malformed code, blank field).
    InvalidInput,

    /// The target exists but cannot be used right now (expired or cancelled
    /// offer, inactive product or method).
    Unavailable,

    /// A concurrent write won a uniqueness race.
    Conflict,

    /// A promo code rule rejected the request.
    ValidationFailed,

    /// The caller is not authenticated.
    Unauthorized,

    /// The caller is authenticated but not allowed to do this.
    Forbidden,

    /// Storage or other infrastructure failure.
    Internal,
}

/// Field-level rejection of an input struct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quantity below one or too large to store.
    #[error("quantity must be between 1 and 2147483647")]
    Quantity,

    /// A line must reference exactly one product, offer or inline offer.
    #[error("exactly one item reference must be set")]
    ItemReference,

    /// Required text was empty or whitespace.
    #[error("{field} must not be blank")]
    Blank {
        /// Field name
        field: &'static str,
    },

    /// Text exceeded its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name
        field: &'static str,

        /// Maximum number of characters
        max: usize,
    },

    /// Promo code contained characters outside `A-Z`, `0-9`, `-` and `_`.
    #[error("promo code format is invalid")]
    PromoCodeFormat,

    /// Phone number did not normalise to `+7` and ten digits.
    #[error("phone number is invalid")]
    Phone,

    /// Email address is not of the form `local@domain`.
    #[error("email address is invalid")]
    Email,

    /// Amount must be positive.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Field name
        field: &'static str,
    },

    /// Percentage outside `(0, 100]` or with more than two decimal places.
    #[error("percentage must be greater than 0 and at most 100, with at most 2 decimal places")]
    Percentage,

    /// An offer was flagged both original and analog.
    #[error("an offer cannot be both original and analog")]
    OriginalAndAnalog,

    /// A timestamp that must lie in the future does not.
    #[error("{field} must be in the future")]
    NotInFuture {
        /// Field name
        field: &'static str,
    },

    /// A range whose lower bound exceeds its upper bound.
    #[error("{field} range is inverted")]
    InvertedRange {
        /// Field name
        field: &'static str,
    },

    /// A collection that must not be empty was.
    #[error("{field} must contain at least one entry")]
    Empty {
        /// Field name
        field: &'static str,
    },
}

impl ValidationError {
    /// Validation failures are always caller input errors.
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Trim `value` and reject it when blank or longer than `max` characters.
///
/// # Errors
///
/// Returns [`ValidationError::Blank`] or [`ValidationError::TooLong`].
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_string())
}

/// Like [`required_text`], but blank input becomes `None`.
///
/// # Errors
///
/// Returns [`ValidationError::TooLong`].
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => required_text(field, trimmed, max).map(Some),
    }
}

/// Minimal `local@domain.tld` shape check.
///
/// # Errors
///
/// Returns [`ValidationError::Email`].
pub fn email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ValidationError::Email);
    };

    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !trimmed.chars().any(char::is_whitespace);

    if valid {
        Ok(trimmed.to_lowercase())
    } else {
        Err(ValidationError::Email)
    }
}
