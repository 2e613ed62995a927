//! Typed resource clients for the Taruvi platform API.
//!
//! The entry point is [`Client`]; each platform area is reached through a
//! borrowing facade:
//!
//! ```no_run
//! use taruvi_api::Client;
//!
//! # async fn run() -> taruvi_client::Result<()> {
//! let client = Client::new("https://api.taruvi.example", "my-app")?;
//! let client = client.auth().sign_in_with_password("ada", "secret").await?;
//!
//! let open_tasks = client
//!     .database()
//!     .query("tasks")
//!     .filter("status", "eq", "open")
//!     .sort("created_at", taruvi_api::database::SortOrder::Desc)
//!     .get()
//!     .await?;
//! # let _ = open_tasks;
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod app;
pub mod auth;
pub mod blocking;
pub mod client;
pub mod database;
pub mod functions;
pub mod policy;
pub mod secrets;
pub mod settings;
pub mod storage;
pub mod types;
pub mod users;

pub use client::{Client, ClientBuilder};
pub use database::{DeleteSelector, QueryBuilder, SortOrder};
pub use functions::{ExecuteOptions, InvocationFilter};
pub use storage::{Bucket, BucketSettings, StorageQuery, UploadFile};
pub use types::{
    CheckResourcesResponse, Function, Invocation, ListEnvelope, NewUser, ResourceCheck,
    ResourceCheckResult, Role, Secret, StorageObject, TaskResult, TaskStatus, User, UserUpdate,
};
pub use users::UserFilter;
