//! Saved analytics query execution.

use serde_json::{json, Value};
use taruvi_client::{Request, Result};
use tracing::debug;
use urlencoding::encode;

use crate::client::Client;

/// Analytics facade; obtained from [`Client::analytics`].
pub struct Analytics<'a> {
    client: &'a Client,
}

impl<'a> Analytics<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Execute a saved analytics query and return its result rows.
    ///
    /// `params` fills the query's placeholders (date ranges, filters,
    /// grouping); `app_slug` runs the query under a different app than the
    /// client's configured one.
    pub async fn execute(
        &self,
        query_slug: &str,
        params: Option<Value>,
        app_slug: Option<&str>,
    ) -> Result<Value> {
        let path = format!(
            "/api/apps/{}/analytics/queries/{}/execute/",
            encode(app_slug.unwrap_or_else(|| self.client.app_slug())),
            encode(query_slug)
        );
        debug!(query_slug, "executing analytics query");
        let request = Request::post(path)
            .json_value(json!({"params": params.unwrap_or_else(|| json!({}))}))
            .build();
        let body: Value = self.client.transport().send(&request).await?.json()?;
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
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
    async fn test_execute_posts_params_and_unwraps_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/apps/demo/analytics/queries/monthly-revenue/execute/"))
            .and(body_json(serde_json::json!({
                "params": {"start_date": "2024-01-01", "end_date": "2024-12-31"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"month": "2024-01", "revenue": 1200}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let result = client
            .analytics()
            .execute(
                "monthly-revenue",
                Some(serde_json::json!({
                    "start_date": "2024-01-01",
                    "end_date": "2024-12-31",
                })),
                None,
            )
            .await
            .unwrap();
        assert_eq!(result[0]["revenue"], 1200);
    }

    #[tokio::test]
    async fn test_execute_defaults_params_and_honors_app_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/apps/other/analytics/queries/user-signups/execute/"))
            .and(body_json(serde_json::json!({"params": {}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let result = client
            .analytics()
            .execute("user-signups", None, Some("other"))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!([]));
    }
}
