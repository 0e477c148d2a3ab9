//! Timestamp parsing for request bodies.

use jiff::Timestamp;
use salvo::prelude::StatusError;

use crate::extensions::*;

pub(crate) trait TimestampExt {
    /// Parse an optional RFC 3339 timestamp field.
    fn into_timestamp(self, field: &str) -> Result<Option<Timestamp>, StatusError>;
}

impl TimestampExt for Option<String> {
    fn into_timestamp(self, field: &str) -> Result<Option<Timestamp>, StatusError> {
        self.map(|value| value.parse::<Timestamp>())
            .transpose()
            .or_400(&format!("could not parse \"{field}\" timestamp"))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_present_values_only() -> TestResult {
        assert_eq!(None::<String>.into_timestamp("expires_at")?, None);

        let parsed = Some("2026-03-01T10:00:00Z".to_string()).into_timestamp("expires_at")?;

        assert_eq!(parsed, Some("2026-03-01T10:00:00Z".parse()?));
        assert!(
            Some("tomorrow".to_string()).into_timestamp("expires_at").is_err(),
            "garbage is rejected"
        );

        Ok(())
    }
}
