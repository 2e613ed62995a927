//! Policy checks against the platform's authorization engine.

use serde_json::{json, Value};
use taruvi_client::{Request, Result};
use urlencoding::encode;

use crate::client::Client;
use crate::types::{CheckResourcesResponse, ResourceCheck};

/// Policy facade; obtained from [`Client::policy`].
pub struct Policy<'a> {
    client: &'a Client,
}

impl<'a> Policy<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Evaluate the requested actions on each resource.
    ///
    /// `principal` overrides the authenticated user; `aux_data` is passed
    /// through to policy evaluation verbatim.
    pub async fn check_resources(
        &self,
        resources: Vec<ResourceCheck>,
        principal: Option<Value>,
        aux_data: Option<Value>,
    ) -> Result<CheckResourcesResponse> {
        let resources: Vec<Value> = resources
            .iter()
            .map(|check| {
                let mut resource = json!({"kind": check.kind, "id": check.id});
                if let Some(attr) = &check.attr {
                    resource["attr"] = attr.clone();
                }
                json!({"resource": resource, "actions": check.actions})
            })
            .collect();

        let mut body = json!({"resources": resources});
        if let Some(principal) = principal {
            body["principal"] = principal;
        }
        if let Some(aux_data) = aux_data {
            body["auxData"] = aux_data;
        }

        let path = format!("/api/apps/{}/check/resources", encode(self.client.app_slug()));
        let request = Request::post(path).json_value(body).build();
        self.client.transport().send(&request).await?.json()
    }
}
