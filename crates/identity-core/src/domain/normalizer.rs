//! Lookup key normalization

/// Produces the normalized form stored next to names and emails and used
/// for every lookup.
pub trait LookupNormalizer: Send + Sync {
    fn normalize_name(&self, name: &str) -> String;
    fn normalize_email(&self, email: &str) -> String;
}

/// Upper-cases keys, so `alice`, `Alice` and `ALICE` share one lookup key.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperInvariantLookupNormalizer;

impl LookupNormalizer for UpperInvariantLookupNormalizer {
    fn normalize_name(&self, name: &str) -> String {
        name.to_uppercase()
    }

    fn normalize_email(&self, email: &str) -> String {
        email.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_invariant() {
        let n = UpperInvariantLookupNormalizer;
        assert_eq!(n.normalize_name("Admin"), "ADMIN");
        assert_eq!(n.normalize_email("a@x.com"), "A@X.COM");
    }
}
