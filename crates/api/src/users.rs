//! Platform user management.

use serde_json::json;
use taruvi_client::{Request, Result};
use urlencoding::encode;

use crate::client::Client;
use crate::types::{ListEnvelope, NewUser, User, UserUpdate};

/// Filters for [`Users::list`]. Unset filters are omitted.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    /// Comma-separated role names.
    pub roles: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserFilter {
    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((name.to_string(), value));
            }
        };
        push("search", self.search.clone());
        push("is_active", self.is_active.map(|v| v.to_string()));
        push("is_staff", self.is_staff.map(|v| v.to_string()));
        push("roles", self.roles.clone());
        push("ordering", self.ordering.clone());
        push("page", self.page.map(|v| v.to_string()));
        push("page_size", self.page_size.map(|v| v.to_string()));
        pairs
    }
}

/// Users facade; obtained from [`Client::users`].
pub struct Users<'a> {
    client: &'a Client,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn user_path(username: &str) -> String {
        format!("/api/users/{}/", encode(username))
    }

    /// List users matching the filter.
    pub async fn list(&self, filter: UserFilter) -> Result<Vec<User>> {
        let request = Request::get("/api/users/")
            .query_pairs(filter.query_pairs())
            .build();
        let envelope: ListEnvelope<User> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    pub async fn get(&self, username: &str) -> Result<User> {
        let request = Request::get(Self::user_path(username)).build();
        self.client.transport().send(&request).await?.json()
    }

    pub async fn create(&self, user: NewUser) -> Result<User> {
        let request = Request::post("/api/users/").json(&user)?.build();
        self.client.transport().send(&request).await?.json()
    }

    pub async fn update(&self, username: &str, update: UserUpdate) -> Result<User> {
        let request = Request::patch(Self::user_path(username)).json(&update)?.build();
        self.client.transport().send(&request).await?.json()
    }

    pub async fn delete(&self, username: &str) -> Result<()> {
        let request = Request::delete(Self::user_path(username)).build();
        self.client.transport().send(&request).await?;
        Ok(())
    }

    /// Grant roles to a set of users in one call. `expires_at` is an
    /// ISO 8601 timestamp after which the grant lapses.
    pub async fn assign_roles(
        &self,
        roles: Vec<String>,
        usernames: Vec<String>,
        expires_at: Option<String>,
    ) -> Result<()> {
        let mut body = json!({"roles": roles, "usernames": usernames});
        if let Some(expires_at) = expires_at {
            body["expires_at"] = json!(expires_at);
        }
        let request = Request::post("/api/assign/roles/").json_value(body).build();
        self.client.transport().send(&request).await?;
        Ok(())
    }

    /// Revoke roles from a set of users in one call.
    pub async fn revoke_roles(&self, roles: Vec<String>, usernames: Vec<String>) -> Result<()> {
        let request = Request::post("/api/revoke/roles/")
            .json_value(json!({"roles": roles, "usernames": usernames}))
            .build();
        self.client.transport().send(&request).await?;
        Ok(())
    }
}
