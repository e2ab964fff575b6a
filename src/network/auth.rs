use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Decides whether a request may reach the dataset.
pub trait CredentialCheck: Send + Sync {
    fn is_authorized(&self, headers: &HeaderMap) -> bool;
}

/// Shared secret compared verbatim against the `authorization` header.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialCheck for StaticToken {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == self.token)
    }
}
