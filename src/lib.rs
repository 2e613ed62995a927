//! Rust SDK for the Taruvi cloud platform.
//!
//! This crate re-exports the full SDK surface: the async [`Client`] and its
//! module facades from `taruvi-api`, and the configuration, credential, and
//! error types from `taruvi-client`.
//!
//! ```no_run
//! use taruvi::{Client, TokenType};
//!
//! # async fn run() -> taruvi::Result<()> {
//! let client = Client::new("https://api.taruvi.example", "my-app")?;
//! let client = client.auth().sign_in_with_token("token", TokenType::ApiKey)?;
//!
//! let secrets = client.secrets().list().await?;
//! # let _ = secrets;
//! # Ok(())
//! # }
//! ```
//!
//! Inside the managed function runtime, [`Client::from_env`] picks up the
//! injected endpoint, app, and credential automatically.

pub use taruvi_api::{
    analytics, blocking, database, functions, storage, Bucket, BucketSettings, CheckResourcesResponse,
    Client, ClientBuilder, DeleteSelector, ExecuteOptions, Function, Invocation,
    InvocationFilter, ListEnvelope, NewUser, QueryBuilder, ResourceCheck, ResourceCheckResult,
    Role, Secret, SortOrder, StorageObject, StorageQuery, TaskResult, TaskStatus, UploadFile,
    User, UserFilter, UserUpdate,
};
pub use taruvi_client::{
    Credential, Error, ErrorKind, FunctionContext, Result, RuntimeMode, TaruviConfig, TokenType,
};
