use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

const MAX_TAG_LEN: usize = 256;

/// Free-form description of who is downloading, taken from `User-Agent`.
///
/// ESP32 OTA clients send e.g. `ESP32-http-Update`. Missing or non-UTF-8
/// headers yield `None`; the tag is informational and never rejects a request.
pub struct CallerTag(pub Option<String>);

impl CallerTag {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for CallerTag
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tag = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.chars().take(MAX_TAG_LEN).collect());

        Ok(CallerTag(tag))
    }
}
