//! HTTP transport: URL assembly, header application, retries, and error
//! classification.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::config::TaruviConfig;
use crate::error::{error_from_status, Error, ErrorKind, Result};
use crate::request::{Body, Method, Request};
use crate::response::Response;
use crate::retry::RetryPolicy;
use crate::USER_AGENT;

/// Asynchronous transport bound to one [`TaruviConfig`].
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    config: TaruviConfig,
}

impl HttpTransport {
    /// Build a transport from a resolved configuration.
    pub fn new(config: TaruviConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.pool_max_idle())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                Error::with_source(
                    ErrorKind::Configuration("failed to build HTTP client".to_string()),
                    e,
                )
            })?;
        Ok(Self { http, config })
    }

    /// The configuration this transport was built from.
    pub fn config(&self) -> &TaruviConfig {
        &self.config
    }

    /// Send a request, retrying timeouts and connection failures with
    /// exponential backoff. Server responses are never retried.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.path))]
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let mut policy = RetryPolicy::from_config(&self.config);
        loop {
            match self.send_once(request).await {
                Ok(response) => return self.check_status(request, response),
                Err(err) if err.is_retryable() => match policy.next_delay() {
                    Some(delay) => {
                        warn!(
                            attempt = policy.attempts(),
                            delay_ms = delay.as_millis() as u64,
                            "transient failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, request: &Request) -> Result<Response> {
        let url = format!("{}{}", self.config.api_url(), request.path);
        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .headers(self.request_headers(request)?);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            // Rebuilt per attempt; reqwest consumes the form on send.
            Body::Multipart(form) => builder.multipart(form.to_form()?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| classify_send_error(e, request.method, &request.path))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body: Bytes = response.bytes().await.map_err(|e| {
            Error::with_source(
                ErrorKind::Network(format!(
                    "failed to read response body from {} {}",
                    request.method.as_str(),
                    request.path
                )),
                e,
            )
        })?;

        debug!(status, bytes = body.len(), "response received");
        Ok(Response::new(status, headers, body))
    }

    fn request_headers(&self, request: &Request) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.config.headers() {
            // Multipart bodies carry their own boundary content type.
            if matches!(request.body, Body::Multipart(_)) && name.eq_ignore_ascii_case("content-type")
            {
                continue;
            }
            insert_header(&mut headers, &name, &value)?;
        }
        for (name, value) in &request.headers {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }

    fn check_status(&self, request: &Request, response: Response) -> Result<Response> {
        let status = response.status();
        if status < 400 {
            return Ok(response);
        }

        if status == 401 && !self.config.is_authenticated() {
            return Err(Error::new(ErrorKind::NotAuthenticated(format!(
                "request to {} requires authentication and no credential is configured",
                request.path
            ))));
        }

        let (message, details) = parse_error_body(&response);
        Err(error_from_status(status, message, details))
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::new(ErrorKind::InvalidInput(format!("invalid header name {:?}", name))))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::new(ErrorKind::InvalidInput(format!("invalid value for header {}", name))))?;
    headers.insert(name, value);
    Ok(())
}

fn classify_send_error(err: reqwest::Error, method: Method, path: &str) -> Error {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout {
            method: method.as_str().to_string(),
            path: path.to_string(),
        }
    } else if err.is_connect() {
        ErrorKind::Connection {
            method: method.as_str().to_string(),
            path: path.to_string(),
        }
    } else {
        ErrorKind::Network(format!("request to {} {} failed", method.as_str(), path))
    };
    Error::with_source(kind, err)
}

/// Pull a human-readable message and structured details out of an error
/// body. Falls back to the truncated raw body when it is not JSON.
fn parse_error_body(response: &Response) -> (String, Option<serde_json::Value>) {
    match response.json::<serde_json::Value>() {
        Ok(value) => {
            let message = value
                .get("detail")
                .or_else(|| value.get("message"))
                .or_else(|| value.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| response.error_body());
            (message, Some(value))
        }
        Err(_) => (response.error_body(), None),
    }
}
