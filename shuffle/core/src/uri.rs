//! Metadata URI resolution for issued tokens.

use crate::error::{ShuffleError, ShuffleResult};
use crate::issuer::BatchIssuer;

const PLACEHOLDER: &str = "{}";

/// Maps identities to metadata URIs.
///
/// `base_uri` may contain a `{}` placeholder that is replaced by the
/// identity; without one, the identity is appended. Tokens whose batch has
/// not been issued yet resolve to `hidden_uri` when one is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUri {
    base_uri: String,
    hidden_uri: Option<String>,
}

impl TokenUri {
    /// Create a resolver with no hidden URI.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            hidden_uri: None,
        }
    }

    /// Set the URI returned for unrevealed tokens.
    pub fn with_hidden_uri(mut self, hidden_uri: impl Into<String>) -> Self {
        self.hidden_uri = Some(hidden_uri.into());
        self
    }

    /// The base URI template.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Format the URI of an identity.
    pub fn for_identity(&self, identity: u64) -> String {
        if self.base_uri.contains(PLACEHOLDER) {
            self.base_uri.replacen(PLACEHOLDER, &identity.to_string(), 1)
        } else {
            format!("{}{}", self.base_uri, identity)
        }
    }

    /// Resolve the URI of sequence number `seq`.
    pub fn resolve(&self, issuer: &BatchIssuer, seq: u64) -> ShuffleResult<String> {
        match (issuer.identity(seq), &self.hidden_uri) {
            (Ok(identity), _) => Ok(self.for_identity(identity)),
            (Err(ShuffleError::OffsetNotSet { .. }), Some(hidden)) => Ok(hidden.clone()),
            (Err(e), _) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[test]
    fn test_placeholder() {
        let uri = TokenUri::new("https://placeholder.com/{}.json");
        assert_eq!(uri.for_identity(42), "https://placeholder.com/42.json");
    }

    #[test]
    fn test_append_without_placeholder() {
        let uri = TokenUri::new("ipfs://songs/");
        assert_eq!(uri.for_identity(7), "ipfs://songs/7");
    }

    #[test]
    fn test_resolve_issued_and_hidden() {
        let mut issuer = BatchIssuer::new(PoolConfig::new(20, 4)).unwrap();
        issuer.record_offset(0, 10).unwrap();

        let uri = TokenUri::new("https://placeholder.com/{}.json")
            .with_hidden_uri("https://placeholder.com/hidden.json");

        assert_eq!(
            uri.resolve(&issuer, 1).unwrap(),
            "https://placeholder.com/41.json"
        );
        assert_eq!(
            uri.resolve(&issuer, 4).unwrap(),
            "https://placeholder.com/hidden.json"
        );
    }

    #[test]
    fn test_resolve_without_hidden_uri() {
        let issuer = BatchIssuer::new(PoolConfig::new(20, 4)).unwrap();
        let uri = TokenUri::new("https://placeholder.com/{}.json");
        assert_eq!(
            uri.resolve(&issuer, 4),
            Err(ShuffleError::OffsetNotSet { batch_start: 4 })
        );
    }
}
