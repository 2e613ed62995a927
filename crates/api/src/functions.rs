//! Function execution and invocation history.

use serde_json::{json, Value};
use taruvi_client::{Error, ErrorKind, Request, Result};
use tracing::debug;
use urlencoding::encode;

use crate::client::Client;
use crate::types::{Function, Invocation, ListEnvelope, TaskResult};

/// Options for [`Functions::execute`].
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Run under a different app than the client's configured one.
    pub app_slug: Option<String>,
    /// Queue the function and return a task id instead of waiting for the
    /// result.
    pub is_async: bool,
}

/// Filters for [`Functions::list_invocations`].
#[derive(Debug, Clone)]
pub struct InvocationFilter {
    pub function_slug: Option<String>,
    pub status: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for InvocationFilter {
    fn default() -> Self {
        Self {
            function_slug: None,
            status: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Functions facade; obtained from [`Client::functions`].
pub struct Functions<'a> {
    client: &'a Client,
}

impl<'a> Functions<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn base_path(&self, app_slug: Option<&str>) -> String {
        format!(
            "/api/apps/{}/functions/",
            encode(app_slug.unwrap_or_else(|| self.client.app_slug()))
        )
    }

    /// Execute a function and return the backend's execution payload.
    ///
    /// With `is_async` set, the payload carries the queued task id at
    /// `invocation.celery_task_id`; see [`Functions::execute_async`].
    pub async fn execute(
        &self,
        slug: &str,
        params: Option<Value>,
        options: ExecuteOptions,
    ) -> Result<Value> {
        let path = format!(
            "{}{}/execute/",
            self.base_path(options.app_slug.as_deref()),
            encode(slug)
        );
        debug!(slug, is_async = options.is_async, "executing function");
        let request = Request::post(path)
            .json_value(json!({
                "params": params.unwrap_or_else(|| json!({})),
                "async": options.is_async,
            }))
            .build();
        self.client.transport().send(&request).await?.json()
    }

    /// Queue a function and return the task id to poll with
    /// [`Functions::get_result`].
    pub async fn execute_async(&self, slug: &str, params: Option<Value>) -> Result<String> {
        let payload = self
            .execute(
                slug,
                params,
                ExecuteOptions {
                    is_async: true,
                    ..ExecuteOptions::default()
                },
            )
            .await?;
        payload
            .pointer("/invocation/celery_task_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(ErrorKind::Response {
                    status: 200,
                    body: "execute response did not contain invocation.celery_task_id"
                        .to_string(),
                })
            })
    }

    /// Look up the result of a queued execution. There is no built-in
    /// poll loop; callers decide their own cadence.
    pub async fn get_result(&self, task_id: &str) -> Result<TaskResult> {
        let request = Request::get(format!("/api/result/{}/", encode(task_id))).build();
        self.client.transport().send(&request).await?.json()
    }

    /// List the app's functions.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Function>> {
        let request = Request::get(self.base_path(None))
            .query("limit", limit.to_string())
            .query("offset", offset.to_string())
            .build();
        let envelope: ListEnvelope<Function> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    /// Fetch one function's details.
    pub async fn get(&self, slug: &str) -> Result<Function> {
        let request = Request::get(format!("{}{}/", self.base_path(None), encode(slug))).build();
        self.client.transport().send(&request).await?.json()
    }

    /// Fetch one recorded invocation.
    pub async fn get_invocation(&self, invocation_id: &str) -> Result<Invocation> {
        let path = format!(
            "/api/apps/{}/invocations/{}/",
            encode(self.client.app_slug()),
            encode(invocation_id)
        );
        let request = Request::get(path).build();
        self.client.transport().send(&request).await?.json()
    }

    /// List recorded invocations, newest first.
    pub async fn list_invocations(&self, filter: InvocationFilter) -> Result<Vec<Invocation>> {
        let path = format!("/api/apps/{}/invocations/", encode(self.client.app_slug()));
        let mut builder = Request::get(path)
            .query("limit", filter.limit.to_string())
            .query("offset", filter.offset.to_string());
        if let Some(slug) = &filter.function_slug {
            builder = builder.query("function_slug", slug.clone());
        }
        if let Some(status) = &filter.status {
            builder = builder.query("status", status.clone());
        }
        let envelope: ListEnvelope<Invocation> = self
            .client
            .transport()
            .send(&builder.build())
            .await?
            .json()?;
        Ok(envelope.data)
    }
}
