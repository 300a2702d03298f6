use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use http::header::{HeaderName, InvalidHeaderName};
use http::request::Parts;

use crate::application::todo_service::TodoService;
use crate::domain::todo::OwnerId;
use crate::http::routes::todos::AppState;
use crate::http::types::ApiError;

/// Resolves the verified caller of a request. Credential checks happen
/// upstream; implementations only read their outcome.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, parts: &Parts) -> Option<OwnerId>;
}

/// Trusts an identity header set by the gateway that verified the caller.
#[derive(Debug, Clone)]
pub struct TrustedHeaderAuthenticator {
    header: HeaderName,
}

impl TrustedHeaderAuthenticator {
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self { header: HeaderName::from_bytes(header.to_ascii_lowercase().as_bytes())? })
    }
}

impl Authenticator for TrustedHeaderAuthenticator {
    fn authenticate(&self, parts: &Parts) -> Option<OwnerId> {
        parts
            .headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .and_then(OwnerId::parse)
    }
}

pub type SharedAuthenticator = Arc<dyn Authenticator>;

/// Extractor for the authenticated owner; rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct Caller(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for Caller
where
    S: TodoService + Clone,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        match state.authenticator.authenticate(parts) {
            Some(owner) => Ok(Caller(owner)),
            None => {
                tracing::debug!(path = %parts.uri.path(), "request without caller identity");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<(&str, &str)>) -> Parts {
        let mut builder = Request::builder().uri("/todos");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_configured_header() {
        let auth = TrustedHeaderAuthenticator::new("X-User-Id").unwrap();
        assert_eq!(auth.authenticate(&parts(Some(("x-user-id", "u1")))), Some(OwnerId::new("u1")));
        assert_eq!(auth.authenticate(&parts(Some(("x-user-id", "  ")))), None);
        assert_eq!(auth.authenticate(&parts(None)), None);
    }

    #[test]
    fn rejects_invalid_header_names() {
        assert!(TrustedHeaderAuthenticator::new("bad header").is_err());
    }
}
