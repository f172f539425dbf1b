//! Per-process CSRF token for state-changing requests

use std::fmt;

use uuid::Uuid;

/// Form field carrying the token on rendered pages
pub const CSRF_FIELD: &str = "csrf_token";

#[derive(Clone)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a submitted token
    pub fn verify(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(CsrfToken::generate().as_str(), CsrfToken::generate().as_str());
    }

    #[test]
    fn verify_matches_only_exact_token() {
        let token = CsrfToken::generate();
        assert!(token.verify(token.as_str()));
        assert!(!token.verify(""));
        assert!(!token.verify(&token.as_str().to_uppercase()));
        assert!(!token.verify(&format!("{}x", token.as_str())));
    }

    #[test]
    fn debug_hides_token() {
        let token = CsrfToken::generate();
        assert!(!format!("{:?}", token).contains(token.as_str()));
    }
}
