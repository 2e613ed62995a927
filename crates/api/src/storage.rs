//! File storage: object queries, batch upload/delete, and bucket
//! management.

use bytes::Bytes;
use serde_json::{json, Value};
use taruvi_client::{Error, ErrorKind, MultipartForm, Request, Result};
use tracing::debug;
use urlencoding::encode;

use crate::client::Client;
use crate::types::{ListEnvelope, StorageObject};

/// Storage facade; obtained from [`Client::storage`].
pub struct Storage<'a> {
    client: &'a Client,
}

/// A bucket's configuration as returned by the bucket endpoints.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Bucket {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub file_size_limit: Option<u64>,
    #[serde(default)]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
    #[serde(default)]
    pub max_objects: Option<u64>,
}

/// Fields accepted when creating or updating a bucket. Unset fields are
/// omitted from the request body.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BucketSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_objects: Option<u64>,
}

impl<'a> Storage<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn buckets_path(&self) -> String {
        format!("/api/apps/{}/storage/buckets/", encode(self.client.app_slug()))
    }

    /// Select a bucket to operate on.
    pub fn bucket(&self, bucket: impl Into<String>) -> StorageQuery<'a> {
        StorageQuery::new(self.client, bucket.into())
    }

    /// List the app's buckets.
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let request = Request::get(self.buckets_path()).build();
        let envelope: ListEnvelope<Bucket> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    /// Create a bucket named `name`.
    pub async fn create_bucket(&self, name: &str, settings: BucketSettings) -> Result<Bucket> {
        let mut body = serde_json::to_value(&settings)?;
        body["name"] = Value::String(name.to_string());
        let request = Request::post(self.buckets_path()).json_value(body).build();
        self.client.transport().send(&request).await?.json()
    }

    pub async fn get_bucket(&self, slug: &str) -> Result<Bucket> {
        let request = Request::get(format!("{}{}/", self.buckets_path(), encode(slug))).build();
        self.client.transport().send(&request).await?.json()
    }

    pub async fn update_bucket(&self, slug: &str, settings: BucketSettings) -> Result<Bucket> {
        let request = Request::patch(format!("{}{}/", self.buckets_path(), encode(slug)))
            .json(&settings)?
            .build();
        self.client.transport().send(&request).await?.json()
    }

    /// Delete a bucket and every object in it.
    pub async fn delete_bucket(&self, slug: &str) -> Result<()> {
        let request = Request::delete(format!("{}{}/", self.buckets_path(), encode(slug))).build();
        self.client.transport().send(&request).await?;
        Ok(())
    }
}

/// A file queued for [`StorageQuery::upload`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Operations on one bucket, with optional listing filters.
#[derive(Debug, Clone)]
pub struct StorageQuery<'a> {
    client: &'a Client,
    bucket: String,
    app_slug: Option<String>,
    filters: Vec<(String, String)>,
}

impl<'a> StorageQuery<'a> {
    fn new(client: &'a Client, bucket: String) -> Self {
        Self {
            client,
            bucket,
            app_slug: None,
            filters: Vec::new(),
        }
    }

    /// Operate on a bucket under a different app than the client's
    /// configured one.
    pub fn app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.app_slug = Some(app_slug.into());
        self
    }

    fn objects_path(&self) -> String {
        let app_slug = self
            .app_slug
            .as_deref()
            .unwrap_or_else(|| self.client.app_slug());
        format!(
            "/api/apps/{}/storage/buckets/{}/objects/",
            encode(app_slug),
            encode(&self.bucket)
        )
    }

    fn object_path(&self, file_path: &str) -> String {
        // Object paths contain directory separators; the backend expects
        // them unescaped.
        format!("{}{}/", self.objects_path(), file_path)
    }

    fn with_filter(mut self, name: &str, value: impl ToString) -> Self {
        self.filters.push((name.to_string(), value.to_string()));
        self
    }

    /// Full-text search over object names.
    pub fn search(self, term: &str) -> Self {
        self.with_filter("search", term)
    }

    pub fn mimetype(self, mimetype: &str) -> Self {
        self.with_filter("mimetype", mimetype)
    }

    /// Broad type filter, e.g. `image` or `video`.
    pub fn mimetype_category(self, category: &str) -> Self {
        self.with_filter("mimetype_category", category)
    }

    pub fn visibility(self, visibility: &str) -> Self {
        self.with_filter("visibility", visibility)
    }

    /// Sort order, e.g. `-created_at`.
    pub fn ordering(self, ordering: &str) -> Self {
        self.with_filter("ordering", ordering)
    }

    pub fn page(self, page: u32) -> Self {
        self.with_filter("page", page)
    }

    pub fn page_size(self, page_size: u32) -> Self {
        self.with_filter("page_size", page_size)
    }

    /// List objects matching the current filters.
    pub async fn list(self) -> Result<Vec<StorageObject>> {
        let request = Request::get(self.objects_path())
            .query_pairs(self.filters.clone())
            .build();
        let envelope: ListEnvelope<StorageObject> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    /// Upload a batch of files.
    ///
    /// `paths` gives the destination path for each file, in order, and
    /// must have the same length as `files`; so must `metadata` when
    /// present.
    pub async fn upload(
        &self,
        files: Vec<UploadFile>,
        paths: Vec<String>,
        metadata: Option<Vec<Value>>,
    ) -> Result<Vec<StorageObject>> {
        if files.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "upload requires at least one file".to_string(),
            )));
        }
        if paths.len() != files.len() {
            return Err(Error::new(ErrorKind::InvalidInput(format!(
                "paths length ({}) must match files length ({})",
                paths.len(),
                files.len()
            ))));
        }
        if let Some(metadata) = &metadata {
            if metadata.len() != files.len() {
                return Err(Error::new(ErrorKind::InvalidInput(format!(
                    "metadata length ({}) must match files length ({})",
                    metadata.len(),
                    files.len()
                ))));
            }
        }

        debug!(bucket = %self.bucket, count = files.len(), "uploading batch");
        let mut form = MultipartForm::new().text("paths", serde_json::to_string(&paths)?);
        if let Some(metadata) = &metadata {
            form = form.text("metadata", serde_json::to_string(metadata)?);
        }
        for file in files {
            let content_type = file
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            form = form.file("files", file.filename, Some(content_type), file.data);
        }

        let request = Request::post(format!("{}batch-upload/", self.objects_path()))
            .multipart(form)
            .build();
        let envelope: ListEnvelope<StorageObject> =
            self.client.transport().send(&request).await?.json()?;
        Ok(envelope.data)
    }

    /// Download one object's raw bytes.
    pub async fn download(&self, file_path: &str) -> Result<Bytes> {
        let request = Request::get(self.object_path(file_path)).build();
        let response = self.client.transport().send(&request).await?;
        Ok(response.into_bytes())
    }

    /// Update an object's metadata and/or visibility.
    pub async fn update(
        &self,
        file_path: &str,
        metadata: Option<Value>,
        visibility: Option<&str>,
    ) -> Result<StorageObject> {
        let mut body = serde_json::Map::new();
        if let Some(metadata) = metadata {
            body.insert("metadata".to_string(), metadata);
        }
        if let Some(visibility) = visibility {
            body.insert("visibility".to_string(), Value::String(visibility.to_string()));
        }
        let request = Request::put(self.object_path(file_path))
            .json_value(Value::Object(body))
            .build();
        self.client.transport().send(&request).await?.json()
    }

    /// Delete a batch of objects by path.
    pub async fn delete(&self, paths: Vec<String>) -> Result<()> {
        let request = Request::post(format!("{}batch-delete/", self.objects_path()))
            .json_value(json!({"paths": paths}))
            .build();
        self.client.transport().send(&request).await?;
        Ok(())
    }

    /// Copy an object, optionally into another bucket.
    pub async fn copy(
        &self,
        source_path: &str,
        destination_path: &str,
        destination_bucket: Option<&str>,
    ) -> Result<StorageObject> {
        let mut body = json!({
            "source_path": source_path,
            "destination_path": destination_path,
        });
        if let Some(bucket) = destination_bucket {
            body["destination_bucket"] = Value::String(bucket.to_string());
        }
        let request = Request::post(format!("{}copy/", self.objects_path()))
            .json_value(body)
            .build();
        self.client.transport().send(&request).await?.json()
    }

    /// Move or rename an object within the bucket. Implemented server-side
    /// as copy-then-delete, so large objects take a while.
    pub async fn move_(&self, source_path: &str, destination_path: &str) -> Result<StorageObject> {
        let request = Request::post(format!("{}move/", self.objects_path()))
            .json_value(json!({
                "source_path": source_path,
                "destination_path": destination_path,
            }))
            .build();
        self.client.transport().send(&request).await?.json()
    }
}
