//! One-time login codes.

use async_trait::async_trait;
use mockall::automock;
use rand::{Rng, rngs::OsRng};
use sha2::{Digest, Sha256};
use tracing::info;

/// Number of digits in a code.
pub const OTP_DIGITS: usize = 6;

/// Generate a zero-padded six-digit code.
#[must_use]
pub fn generate_code() -> String {
    format!("{:0width$}", OsRng.gen_range(0..1_000_000_u32), width = OTP_DIGITS)
}

/// Digest stored for `code` sent to `phone`.
#[must_use]
pub fn code_digest(phone: &str, code: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{phone}:{code}").as_bytes()))
}

/// Sends login codes to customers.
#[automock]
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn deliver(&self, phone: &str, code: &str);
}

/// Writes codes to the log; SMS transport lives outside this service.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOtpDelivery;

#[async_trait]
impl OtpDelivery for LogOtpDelivery {
    async fn deliver(&self, phone: &str, code: &str) {
        info!(phone, code, "login code issued");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();

            assert_eq!(code.len(), OTP_DIGITS, "{code}");
            assert!(code.chars().all(|c| c.is_ascii_digit()), "{code}");
        }
    }

    #[test]
    fn digest_binds_phone() {
        assert_ne!(
            code_digest("+79990000001", "123456"),
            code_digest("+79990000002", "123456")
        );
    }
}
