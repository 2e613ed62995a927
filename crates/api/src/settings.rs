//! Platform settings metadata.

use serde_json::Value;
use taruvi_client::{Request, Result};

use crate::client::Client;

/// Settings facade; obtained from [`Client::settings`].
pub struct Settings<'a> {
    client: &'a Client,
}

impl<'a> Settings<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetch the platform settings metadata document. The shape is owned
    /// by the backend and varies across deployments.
    pub async fn get(&self) -> Result<Value> {
        let request = Request::get("/api/settings/metadata/").build();
        self.client.transport().send(&request).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_settings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/settings/metadata/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"features": {"storage": true}, "version": "2.4"}),
            ))
            .mount(&server)
            .await;

        let client = Client::builder()
            .api_url(server.uri())
            .app_slug("demo")
            .build()
            .unwrap();
        let settings = client.settings().get().await.unwrap();
        assert_eq!(settings["version"], "2.4");
    }
}
