use std::collections::HashSet;

/// Result of validating a caller token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
    Invalid,
}

/// Validates caller tokens before registration or attendance operations.
pub trait Authenticator: Send + Sync {
    fn validate(&self, token: &str) -> TokenStatus;
}

/// Accepts a fixed set of tokens. Everything else is invalid.
#[derive(Debug, Default, Clone)]
pub struct StaticTokens {
    tokens: HashSet<String>,
}

impl StaticTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }
}

impl Authenticator for StaticTokens {
    fn validate(&self, token: &str) -> TokenStatus {
        if self.tokens.contains(token) {
            TokenStatus::Valid
        } else {
            TokenStatus::Invalid
        }
    }
}
