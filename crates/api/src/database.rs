//! Datatable access and the fluent query builder.

use serde_json::Value;
use taruvi_client::{Error, ErrorKind, Request, Result};
use urlencoding::encode;

use crate::client::Client;
use crate::types::ListEnvelope;

/// Database facade; obtained from [`Client::database`].
pub struct Database<'a> {
    client: &'a Client,
}

impl<'a> Database<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn table_path(&self, table: &str) -> String {
        format!(
            "/api/apps/{}/datatables/{}/data/",
            encode(self.client.app_slug()),
            encode(table)
        )
    }

    fn record_path(&self, table: &str, id: &str) -> String {
        format!("{}{}/", self.table_path(table), encode(id))
    }

    /// Start a query against `table`. No I/O happens until a terminal
    /// method runs.
    pub fn query(&self, table: impl Into<String>) -> QueryBuilder<'a> {
        QueryBuilder::new(self.client, table.into())
    }

    /// Fetch a single record by id.
    pub async fn get(&self, table: &str, id: impl std::fmt::Display) -> Result<Value> {
        let request = Request::get(self.record_path(table, &id.to_string())).build();
        self.client.transport().send(&request).await?.json()
    }

    /// Create one record (object) or many (array).
    pub async fn create(&self, table: &str, data: Value) -> Result<Value> {
        if !data.is_object() && !data.is_array() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "create expects a record object or an array of records".to_string(),
            )));
        }
        let request = Request::post(self.table_path(table)).json_value(data).build();
        self.client.transport().send(&request).await?.json()
    }

    /// Partially update one record.
    pub async fn update(
        &self,
        table: &str,
        id: impl std::fmt::Display,
        data: Value,
    ) -> Result<Value> {
        let request = Request::patch(self.record_path(table, &id.to_string()))
            .json_value(data)
            .build();
        self.client.transport().send(&request).await?.json()
    }

    /// Bulk-update records; every element must carry its own `id`.
    pub async fn update_bulk(&self, table: &str, records: Vec<Value>) -> Result<Value> {
        if records.iter().any(|r| r.get("id").is_none()) {
            return Err(Error::new(ErrorKind::InvalidInput(
                "bulk update requires an id on every record".to_string(),
            )));
        }
        let request = Request::patch(self.table_path(table))
            .json_value(Value::Array(records))
            .build();
        self.client.transport().send(&request).await?.json()
    }

    /// Delete by id, by id list, or by filter.
    pub async fn delete(&self, table: &str, selector: DeleteSelector) -> Result<Value> {
        let request = match selector.into_exactly_one()? {
            DeleteBy::Id(id) => Request::delete(self.record_path(table, &id)).build(),
            DeleteBy::Ids(ids) => Request::delete(self.table_path(table))
                .query("ids", ids.join(","))
                .build(),
            DeleteBy::Filter(filter) => Request::delete(self.table_path(table))
                .query("filter", serde_json::to_string(&filter)?)
                .build(),
        };
        let response = self.client.transport().send(&request).await?;
        if response.bytes().is_empty() {
            return Ok(Value::Null);
        }
        response.json()
    }
}

/// Which records a [`Database::delete`] call targets.
///
/// Exactly one of the three selectors must be set; anything else is
/// rejected before any HTTP traffic.
#[derive(Debug, Clone, Default)]
pub struct DeleteSelector {
    pub record_id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub filter: Option<Value>,
}

enum DeleteBy {
    Id(String),
    Ids(Vec<String>),
    Filter(Value),
}

impl DeleteSelector {
    pub fn id(id: impl std::fmt::Display) -> Self {
        Self {
            record_id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn ids<I: IntoIterator<Item = T>, T: std::fmt::Display>(ids: I) -> Self {
        Self {
            ids: Some(ids.into_iter().map(|id| id.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn filter(filter: Value) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    fn into_exactly_one(self) -> Result<DeleteBy> {
        let set = usize::from(self.record_id.is_some())
            + usize::from(self.ids.is_some())
            + usize::from(self.filter.is_some());
        if set != 1 {
            return Err(Error::new(ErrorKind::InvalidInput(format!(
                "delete requires exactly one of record_id, ids, or filter; {} were set",
                set
            ))));
        }
        if let Some(id) = self.record_id {
            Ok(DeleteBy::Id(id))
        } else if let Some(ids) = self.ids {
            Ok(DeleteBy::Ids(ids))
        } else {
            Ok(DeleteBy::Filter(self.filter.unwrap_or(Value::Null)))
        }
    }
}

/// Sort direction for [`QueryBuilder::sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Fluent, I/O-free query description.
///
/// Filters use the backend's double-underscore operator convention:
/// `filter("age", "gte", 18)` becomes `age__gte=18`, while the `eq`
/// operator collapses to a bare `age=18`. Operators are passed through
/// verbatim; the server owns the vocabulary.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    client: &'a Client,
    table: String,
    app_slug: Option<String>,
    filters: Vec<(String, String)>,
    sort: Option<(String, SortOrder)>,
    page: Option<u32>,
    page_size: Option<u32>,
    populate: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    fn new(client: &'a Client, table: String) -> Self {
        Self {
            client,
            table,
            app_slug: None,
            filters: Vec::new(),
            sort: None,
            page: None,
            page_size: None,
            populate: None,
        }
    }

    /// Query a table under a different app than the client's configured one.
    pub fn app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.app_slug = Some(app_slug.into());
        self
    }

    /// Add a filter. Repeated calls are ANDed by the server.
    pub fn filter(mut self, field: &str, op: &str, value: impl Into<Value>) -> Self {
        let key = if op == "eq" {
            field.to_string()
        } else {
            format!("{}__{}", field, op)
        };
        self.filters.push((key, render_query_value(&value.into())));
        self
    }

    /// Shorthand for an equality filter.
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, "eq", value)
    }

    /// Sort by `field` in `order`.
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }

    /// Select a 1-indexed page. Page 1 is the default and is omitted from
    /// the request, so `page(5)` followed by `page(1)` sends no page param.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Expand the named relation fields in the returned records.
    pub fn populate<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.populate = Some(joined);
        self
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        if let Some((field, order)) = &self.sort {
            pairs.push(("_sort".to_string(), field.clone()));
            pairs.push(("_order".to_string(), order.as_str().to_string()));
        }
        match self.page {
            None | Some(1) => {}
            Some(page) => pairs.push(("page".to_string(), page.to_string())),
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(populate) = &self.populate {
            pairs.push(("populate".to_string(), populate.clone()));
        }
        pairs
    }

    fn request(&self, extra: Vec<(String, String)>) -> Request {
        let app_slug = self
            .app_slug
            .as_deref()
            .unwrap_or_else(|| self.client.app_slug());
        let path = format!(
            "/api/apps/{}/datatables/{}/data/",
            encode(app_slug),
            encode(&self.table)
        );
        let mut pairs = self.query_pairs();
        pairs.extend(extra);
        Request::get(path).query_pairs(pairs).build()
    }

    /// Fetch the matching records.
    pub async fn get(self) -> Result<Vec<Value>> {
        let request = self.request(Vec::new());
        let envelope: ListEnvelope<Value> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    /// Fetch only the first matching record.
    pub async fn first(self) -> Result<Option<Value>> {
        let mut records = self.page_size(1).get().await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    /// Count the matching records without fetching them.
    pub async fn count(self) -> Result<u64> {
        let request = self.request(vec![("_count".to_string(), "true".to_string())]);
        let envelope: ListEnvelope<Value> =
            self.client.transport().send(&request).await?.json()?;
        envelope.total.ok_or_else(|| {
            Error::new(ErrorKind::Response {
                status: 200,
                body: "count response did not contain a total".to_string(),
            })
        })
    }
}

/// Render a JSON value as a query-string value. Strings go through bare,
/// everything else uses its JSON form.
fn render_query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
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
    async fn test_filter_operator_encoding() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .and(query_param("age__gte", "18"))
            .and(query_param("name", "ada"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let records = client
            .database()
            .query("people")
            .filter("age", "gte", 18)
            .eq("name", "ada")
            .get()
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_page_one_is_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .and(query_param_is_missing("page"))
            .and(query_param("page_size", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        client
            .database()
            .query("people")
            .page(5)
            .page(1)
            .page_size(20)
            .get()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sort_and_populate_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/demo/datatables/tasks/data/"))
            .and(query_param("_sort", "created_at"))
            .and(query_param("_order", "desc"))
            .and(query_param("populate", "owner,project"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        client
            .database()
            .query("tasks")
            .sort("created_at", SortOrder::Desc)
            .populate(["owner", "project"])
            .page(2)
            .get()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_app_slug_override_changes_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/other/datatables/people/data/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        client
            .database()
            .query("people")
            .app_slug("other")
            .get()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_returns_none_on_empty_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .and(query_param("page_size", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let first = client.database().query("people").first().await.unwrap();
        assert!(first.is_none());
    }

    #[tokio::test]
    async fn test_count_reads_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .and(query_param("_count", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [], "total": 42})),
            )
            .mount(&server)
            .await;

        let client = client(&server).await;
        let total = client.database().query("people").count().await.unwrap();
        assert_eq!(total, 42);
    }

    #[tokio::test]
    async fn test_create_rejects_scalars() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        let err = client
            .database()
            .create("people", json!("not a record"))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_selector_validation() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let err = client
            .database()
            .delete("people", DeleteSelector::default())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));

        let both = DeleteSelector {
            record_id: Some("1".into()),
            ids: Some(vec!["2".into()]),
            filter: None,
        };
        let err = client.database().delete("people", both).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_by_ids_joins_with_commas() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .and(query_param("ids", "1,2,3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let result = client
            .database()
            .delete("people", DeleteSelector::ids([1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(result["deleted"], 3);
    }

    #[tokio::test]
    async fn test_delete_by_filter_sends_json() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        client
            .database()
            .delete("people", DeleteSelector::filter(json!({"status": "stale"})))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap();
        assert!(query.starts_with("filter="));
        let decoded: serde_json::Value = serde_json::from_str(
            &urlencoding::decode(query.trim_start_matches("filter=")).unwrap(),
        )
        .unwrap();
        assert_eq!(decoded, json!({"status": "stale"}));
    }

    #[tokio::test]
    async fn test_delete_by_id_hits_record_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/apps/demo/datatables/people/data/7/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let result = client
            .database()
            .delete("people", DeleteSelector::id(7))
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_update_bulk_requires_ids() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        let err = client
            .database()
            .update_bulk("people", vec![json!({"name": "no id"})])
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_crud_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/apps/demo/datatables/people/data/9/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/apps/demo/datatables/people/data/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10})))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/apps/demo/datatables/people/data/9/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "b"})))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let db = client.database();
        assert_eq!(db.get("people", 9).await.unwrap()["id"], 9);
        assert_eq!(
            db.create("people", json!({"name": "a"})).await.unwrap()["id"],
            10
        );
        assert_eq!(
            db.update("people", 9, json!({"name": "b"})).await.unwrap()["name"],
            "b"
        );
    }
}
