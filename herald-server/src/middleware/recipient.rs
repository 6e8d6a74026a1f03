//! Recipient identity extractor
//!
//! Authentication happens upstream (reverse proxy or gateway), which forwards
//! the authenticated user id in a header. Requests without it are rejected.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use herald_core::RecipientId;

/// Header carrying the authenticated recipient id
pub const RECIPIENT_HEADER: &str = "x-recipient-id";

/// The authenticated recipient of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient(pub RecipientId);

#[async_trait]
impl<S> FromRequestParts<S> for Recipient
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(RECIPIENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match value {
            Some(id) => Ok(Recipient(RecipientId::new(id))),
            None => Err((StatusCode::UNAUTHORIZED, "missing recipient identity")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Recipient, (StatusCode, &'static str)> {
        let (mut parts, _) = request.into_parts();
        Recipient::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn header_yields_recipient() {
        let request = Request::builder()
            .header(RECIPIENT_HEADER, "alice")
            .body(())
            .unwrap();

        let recipient = extract(request).await.unwrap();
        assert_eq!(recipient.0, RecipientId::from("alice"));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();

        let (status, _) = extract(request).await.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blank_header_is_unauthorized() {
        let request = Request::builder()
            .header(RECIPIENT_HEADER, "  ")
            .body(())
            .unwrap();

        assert!(extract(request).await.is_err());
    }
}
