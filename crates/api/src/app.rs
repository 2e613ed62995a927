//! App-level metadata.

use taruvi_client::{Request, Result};
use urlencoding::encode;

use crate::client::Client;
use crate::types::{ListEnvelope, Role};

/// App facade; obtained from [`Client::app`].
pub struct App<'a> {
    client: &'a Client,
}

impl<'a> App<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List the roles defined for an app. `app_slug` defaults to the
    /// client's configured app.
    pub async fn roles(&self, app_slug: Option<&str>) -> Result<Vec<Role>> {
        let slug = app_slug.unwrap_or_else(|| self.client.app_slug());
        let request = Request::get(format!("/api/app/{}/roles", encode(slug))).build();
        let envelope: ListEnvelope<Role> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }
}
