//! App-scoped secrets.

use serde_json::json;
use taruvi_client::{Request, Result};
use urlencoding::encode;

use crate::client::Client;
use crate::types::{ListEnvelope, Secret};

/// Secrets facade; obtained from [`Client::secrets`].
pub struct Secrets<'a> {
    client: &'a Client,
}

impl<'a> Secrets<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List the secrets visible to the current credential.
    pub async fn list(&self) -> Result<Vec<Secret>> {
        let request = Request::get("/api/secrets/").build();
        let envelope: ListEnvelope<Secret> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    /// Fetch one secret, value included.
    pub async fn get(&self, key: &str) -> Result<Secret> {
        let request = Request::get(format!("/api/secrets/{}/", encode(key))).build();
        self.client.transport().send(&request).await?.json()
    }

    /// Set a secret's value.
    pub async fn update(&self, key: &str, value: &str) -> Result<Secret> {
        let request = Request::put(format!("/api/secrets/{}/", encode(key)))
            .json_value(json!({"value": value}))
            .build();
        self.client.transport().send(&request).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> Client {
        Client::builder()
            .api_url(server.uri())
            .app_slug("demo")
            .api_key("k1")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/secrets/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"key": "SMTP_HOST"}, {"key": "SMTP_PASSWORD"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/secrets/SMTP_HOST/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"key": "SMTP_HOST", "value": "mail.example.com"}),
            ))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let secrets = client.secrets().list().await.unwrap();
        assert_eq!(secrets.len(), 2);

        let secret = client.secrets().get("SMTP_HOST").await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("mail.example.com"));
    }

    #[tokio::test]
    async fn test_update_puts_value() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/secrets/SMTP_HOST/"))
            .and(body_json(serde_json::json!({"value": "smtp.example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"key": "SMTP_HOST", "value": "smtp.example.com"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let updated = client
            .secrets()
            .update("SMTP_HOST", "smtp.example.com")
            .await
            .unwrap();
        assert_eq!(updated.value.as_deref(), Some("smtp.example.com"));
    }
}
