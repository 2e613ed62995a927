//! Request description, decoupled from the HTTP engine.
//!
//! A [`Request`] owns everything needed to issue an attempt, so the
//! transport can rebuild the wire request on every retry. This matters for
//! multipart bodies, which reqwest consumes on send.

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// An owned multipart form.
///
/// reqwest's `multipart::Form` is not cloneable, so we keep the parts in
/// buffered form and materialize a fresh `Form` per attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    parts: Vec<FilePart>,
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a file part.
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FilePart {
            name: name.into(),
            filename: filename.into(),
            content_type,
            data: data.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.parts.is_empty()
    }

    /// Build a fresh reqwest form from the buffered parts.
    pub(crate) fn to_form(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for part in &self.parts {
            let mut p = reqwest::multipart::Part::stream(reqwest::Body::from(part.data.clone()))
                .file_name(part.filename.clone());
            if let Some(ct) = &part.content_type {
                p = p.mime_str(ct).map_err(|e| {
                    Error::with_source(
                        ErrorKind::InvalidInput(format!("invalid content type {:?}", ct)),
                        e,
                    )
                })?;
            }
            form = form.part(part.name.clone(), p);
        }
        Ok(form)
    }
}

/// A fully described API request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Request {
    /// Start building a request for `path`, relative to the API base URL.
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            request: Request {
                method,
                path: path.into(),
                query: Vec::new(),
                headers: Vec::new(),
                body: Body::Empty,
            },
        }
    }

    pub fn get(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Delete, path)
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((name.into(), value.into()));
        self
    }

    /// Append query parameters from an iterator.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a header for this request only, overriding the client defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            Error::with_source(
                ErrorKind::InvalidInput("request body is not serializable".to_string()),
                e,
            )
        })?;
        self.request.body = Body::Json(value);
        Ok(self)
    }

    /// Use an already-built JSON value as the payload.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.request.body = Body::Json(body);
        self
    }

    /// Use a multipart form as the payload.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.request.body = Body::Multipart(form);
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_query_and_headers() {
        let request = Request::get("/api/v1/apps/demo/database/tasks/")
            .query("status", "open")
            .query("page", "2")
            .header("X-Request-ID", "r1")
            .build();

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/api/v1/apps/demo/database/tasks/");
        assert_eq!(
            request.query,
            vec![
                ("status".to_string(), "open".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(request.headers.len(), 1);
        assert!(matches!(request.body, Body::Empty));
    }

    #[test]
    fn test_json_body() {
        let request = Request::post("/api/v1/auth/token/")
            .json(&serde_json::json!({"token": "abc"}))
            .unwrap()
            .build();
        match request.body {
            Body::Json(value) => assert_eq!(value["token"], "abc"),
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_multipart_form_rebuilds() {
        let form = MultipartForm::new()
            .text("paths", "[\"a.txt\"]")
            .file("files", "a.txt", Some("text/plain".to_string()), &b"hi"[..]);
        assert!(!form.is_empty());
        // Two separate materializations from the same description.
        form.to_form().unwrap();
        form.to_form().unwrap();
    }
}
