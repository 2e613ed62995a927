//! Core HTTP plumbing for the Taruvi SDK.
//!
//! This crate owns configuration resolution, credential handling, runtime
//! detection, and the retrying transport. The typed API surface lives in
//! `taruvi-api`.

pub mod config;
pub mod credential;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod runtime;
pub mod transport;

pub use config::{TaruviConfig, TaruviConfigBuilder};
pub use credential::{Credential, TokenType};
pub use error::{Error, ErrorKind, Result};
pub use request::{Body, Method, MultipartForm, Request, RequestBuilder};
pub use response::Response;
pub use retry::RetryPolicy;
pub use runtime::{detect_runtime, FunctionContext, RuntimeMode};
pub use transport::HttpTransport;

/// User agent reported on every request.
pub const USER_AGENT: &str = concat!("taruvi-rust/", env!("CARGO_PKG_VERSION"));
