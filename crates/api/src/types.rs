//! Typed API models.
//!
//! Response payloads the SDK decodes into structs. Anything the backend
//! leaves schemaless (record data, function params, metadata) stays a
//! `serde_json::Value`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Standard list envelope: `data` plus an optional `total` count.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// A named secret scoped to the current app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A stored object as returned by the storage listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageObject {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// An application role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Option<serde_json::Value>,
}

/// A platform user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub date_joined: Option<String>,
}

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Partial update for an existing user; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Lifecycle states of an asynchronous function invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
    Retry,
}

impl TaskStatus {
    /// True once the task will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }
}

/// Result record for an asynchronous invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub traceback: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_done: Option<String>,
}

/// A deployed function.
#[derive(Debug, Clone, Deserialize)]
pub struct Function {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One recorded invocation of a function.
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub id: String,
    #[serde(default)]
    pub function_slug: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

/// One resource submitted to a policy check.
#[derive(Debug, Clone)]
pub struct ResourceCheck {
    pub kind: String,
    pub id: String,
    pub actions: Vec<String>,
    pub attr: Option<serde_json::Value>,
}

impl ResourceCheck {
    pub fn new<I, S>(kind: impl Into<String>, id: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            id: id.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            attr: None,
        }
    }

    pub fn with_attr(mut self, attr: serde_json::Value) -> Self {
        self.attr = Some(attr);
        self
    }
}

/// Outcome of a policy check across all submitted resources.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckResourcesResponse {
    #[serde(default, alias = "requestId")]
    pub request_id: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<ResourceCheckResult>,
}

/// Per-resource action effects from a policy check.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceCheckResult {
    pub resource: ResourceRef,
    /// Action name to effect, `EFFECT_ALLOW` or `EFFECT_DENY`.
    #[serde(default)]
    pub actions: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    pub id: String,
}

impl ResourceCheckResult {
    /// True iff `action` resolved to an allow effect.
    pub fn is_allowed(&self, action: &str) -> bool {
        self.actions
            .get(action)
            .is_some_and(|effect| effect == "EFFECT_ALLOW")
    }
}
