//! One-time mobile verification codes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::domain::PhoneNumber;

pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(600);
const CODE_DIGITS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("no verification code issued for this mobile")]
    NotIssued,

    #[error("verification code expired")]
    Expired,

    #[error("verification code does not match")]
    Mismatch,

    #[error("verification code store lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct IssuedCode {
    code: String,
    expires_at: Instant,
}

/// Issued codes keyed by `SMS:<mobile>:LOGIN`; a newer code replaces the older one.
#[derive(Debug)]
pub struct VerificationCodes {
    ttl: Duration,
    codes: Mutex<HashMap<String, IssuedCode>>,
}

fn key(mobile: &PhoneNumber) -> String {
    format!("SMS:{}:LOGIN", mobile.national())
}

pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

impl VerificationCodes {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            codes: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate and store a fresh code for `mobile`.
    pub fn issue(&self, mobile: &PhoneNumber) -> Result<String, VerificationError> {
        let code = generate_code();
        self.store(mobile, code.clone())?;
        Ok(code)
    }

    fn store(&self, mobile: &PhoneNumber, code: String) -> Result<(), VerificationError> {
        let mut codes = self.codes.lock().map_err(|_| VerificationError::Poisoned)?;
        let now = Instant::now();
        codes.retain(|_, issued| issued.expires_at > now);
        codes.insert(
            key(mobile),
            IssuedCode {
                code,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    /// Consume the code on a match; mismatches leave it in place.
    pub fn match_code(&self, mobile: &PhoneNumber, code: &str) -> Result<(), VerificationError> {
        let mut codes = self.codes.lock().map_err(|_| VerificationError::Poisoned)?;
        let key = key(mobile);
        let issued = codes.get(&key).ok_or(VerificationError::NotIssued)?;
        if issued.expires_at <= Instant::now() {
            codes.remove(&key);
            return Err(VerificationError::Expired);
        }
        if issued.code != code.trim() {
            return Err(VerificationError::Mismatch);
        }
        codes.remove(&key);
        Ok(())
    }

    /// Drop the stored code for `mobile` if it is still `code`; a newer code is kept.
    pub fn revoke(&self, mobile: &PhoneNumber, code: &str) -> Result<(), VerificationError> {
        let mut codes = self.codes.lock().map_err(|_| VerificationError::Poisoned)?;
        let key = key(mobile);
        if codes.get(&key).is_some_and(|issued| issued.code == code) {
            codes.remove(&key);
        }
        Ok(())
    }
}

impl Default for VerificationCodes {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile() -> PhoneNumber {
        PhoneNumber::parse_cn("13812345678").unwrap()
    }

    #[test]
    fn generated_codes_are_four_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 4);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn matching_consumes_the_code() {
        let codes = VerificationCodes::default();
        let code = codes.issue(&mobile()).unwrap();

        let wrong = if code == "0000" { "1111" } else { "0000" };
        assert_eq!(
            codes.match_code(&mobile(), wrong),
            Err(VerificationError::Mismatch)
        );
        assert_eq!(codes.match_code(&mobile(), &code), Ok(()));
        assert_eq!(
            codes.match_code(&mobile(), &code),
            Err(VerificationError::NotIssued)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn codes_expire_after_ttl() {
        let codes = VerificationCodes::new(Duration::from_secs(600));
        let code = codes.issue(&mobile()).unwrap();

        tokio::time::advance(Duration::from_secs(599)).await;
        codes.store(&mobile(), code.clone()).unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        assert_eq!(
            codes.match_code(&mobile(), &code),
            Err(VerificationError::Expired)
        );
    }

    #[tokio::test]
    async fn revoke_removes_code() {
        let codes = VerificationCodes::default();
        let code = codes.issue(&mobile()).unwrap();
        codes.revoke(&mobile(), &code).unwrap();
        assert_eq!(
            codes.match_code(&mobile(), "1234"),
            Err(VerificationError::NotIssued)
        );
    }

    #[tokio::test]
    async fn revoke_keeps_a_newer_code() {
        let codes = VerificationCodes::default();
        codes.store(&mobile(), "1111".to_owned()).unwrap();
        codes.store(&mobile(), "2222".to_owned()).unwrap();

        codes.revoke(&mobile(), "1111").unwrap();
        assert_eq!(codes.match_code(&mobile(), "2222"), Ok(()));
    }
}
