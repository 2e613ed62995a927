//! Buffered API response.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// Maximum number of body characters carried into an error message.
pub(crate) const ERROR_BODY_LIMIT: usize = 500;

/// A response with the body already read into memory.
///
/// Buffering up front keeps the retry loop simple and lets callers decode
/// the body without holding a connection open.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response, returning the body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Body as UTF-8 text, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::with_source(
                ErrorKind::Response {
                    status: self.status,
                    body: truncate_body(&self.body),
                },
                e,
            )
        })
    }

    /// Body truncated for inclusion in error messages.
    pub(crate) fn error_body(&self) -> String {
        truncate_body(&self.body)
    }
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(ERROR_BODY_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response::new(status, HeaderMap::new(), Bytes::copy_from_slice(body.as_bytes()))
    }

    #[test]
    fn test_json_decoding() {
        #[derive(serde::Deserialize)]
        struct Payload {
            id: u64,
        }
        let payload: Payload = response(200, r#"{"id": 7}"#).json().unwrap();
        assert_eq!(payload.id, 7);
    }

    #[test]
    fn test_json_decode_failure_carries_body() {
        let err = response(200, "<html>oops</html>")
            .json::<serde_json::Value>()
            .unwrap_err();
        match err.kind {
            ErrorKind::Response { status, body } => {
                assert_eq!(status, 200);
                assert!(body.contains("oops"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_error_body_truncated_to_limit() {
        let long = "x".repeat(2_000);
        let truncated = response(500, &long).error_body();
        assert_eq!(truncated.chars().count(), ERROR_BODY_LIMIT);
    }
}
