//! Blocking wrapper over the async client.
//!
//! The async implementation is the only implementation; this module owns a
//! current-thread tokio runtime and drives it to completion per call.
//! Construct these outside any async context, use the async [`crate::Client`]
//! inside one.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use taruvi_client::{Error, ErrorKind, Result, TaruviConfig, TokenType};

use crate::database::{DeleteSelector, SortOrder};
use crate::functions::{ExecuteOptions, InvocationFilter};
use crate::storage::{Bucket, BucketSettings, UploadFile};
use crate::types::{
    CheckResourcesResponse, Function, Invocation, NewUser, ResourceCheck, Role, Secret,
    StorageObject, TaskResult, User, UserUpdate,
};
use crate::users::UserFilter;

/// Blocking client for one Taruvi app.
#[derive(Debug, Clone)]
pub struct Client {
    runtime: Arc<tokio::runtime::Runtime>,
    inner: crate::Client,
}

impl Client {
    pub fn new(api_url: impl Into<String>, app_slug: impl Into<String>) -> Result<Self> {
        Self::wrap(crate::Client::new(api_url, app_slug)?)
    }

    pub fn from_env() -> Result<Self> {
        Self::wrap(crate::Client::from_env()?)
    }

    pub fn from_config(config: TaruviConfig) -> Result<Self> {
        Self::wrap(crate::Client::from_config(config)?)
    }

    fn wrap(inner: crate::Client) -> Result<Self> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::new(ErrorKind::Configuration(
                "the blocking client cannot be constructed inside an async runtime; \
                 use the async client instead"
                    .to_string(),
            )));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::with_source(
                    ErrorKind::Configuration("failed to start blocking runtime".to_string()),
                    e,
                )
            })?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    fn adopt(&self, inner: crate::Client) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            inner,
        }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The underlying async client.
    pub fn inner(&self) -> &crate::Client {
        &self.inner
    }

    pub fn config(&self) -> &TaruviConfig {
        self.inner.config()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn database(&self) -> Database<'_> {
        Database { client: self }
    }

    pub fn storage(&self) -> Storage<'_> {
        Storage { client: self }
    }

    pub fn secrets(&self) -> Secrets<'_> {
        Secrets { client: self }
    }

    pub fn policy(&self) -> Policy<'_> {
        Policy { client: self }
    }

    pub fn functions(&self) -> Functions<'_> {
        Functions { client: self }
    }

    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    pub fn analytics(&self) -> Analytics<'_> {
        Analytics { client: self }
    }

    pub fn settings(&self) -> Settings<'_> {
        Settings { client: self }
    }

    pub fn app(&self) -> App<'_> {
        App { client: self }
    }
}

pub struct Auth<'a> {
    client: &'a Client,
}

impl Auth<'_> {
    pub fn sign_in_with_token(
        &self,
        token: impl Into<String>,
        token_type: TokenType,
    ) -> Result<Client> {
        let inner = self.client.inner.auth().sign_in_with_token(token, token_type)?;
        Ok(self.client.adopt(inner))
    }

    pub fn sign_in_with_password(
        &self,
        identifier: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<Client> {
        let inner = self.client.block_on(
            self.client
                .inner
                .auth()
                .sign_in_with_password(identifier, password),
        )?;
        Ok(self.client.adopt(inner))
    }

    pub fn refresh_token(&self, refresh: impl AsRef<str>) -> Result<Client> {
        let inner = self
            .client
            .block_on(self.client.inner.auth().refresh_token(refresh))?;
        Ok(self.client.adopt(inner))
    }

    pub fn sign_out(&self) -> Result<Client> {
        let inner = self.client.inner.auth().sign_out()?;
        Ok(self.client.adopt(inner))
    }

    pub fn current_user(&self) -> Result<User> {
        self.client.block_on(self.client.inner.auth().current_user())
    }
}

pub struct Database<'a> {
    client: &'a Client,
}

impl<'a> Database<'a> {
    /// Start a blocking query against `table`.
    pub fn query(&self, table: impl Into<String>) -> Query<'a> {
        Query {
            client: self.client,
            inner: self.client.inner.database().query(table),
        }
    }

    pub fn get(&self, table: &str, id: impl std::fmt::Display) -> Result<Value> {
        self.client.block_on(self.client.inner.database().get(table, id))
    }

    pub fn create(&self, table: &str, data: Value) -> Result<Value> {
        self.client
            .block_on(self.client.inner.database().create(table, data))
    }

    pub fn update(&self, table: &str, id: impl std::fmt::Display, data: Value) -> Result<Value> {
        self.client
            .block_on(self.client.inner.database().update(table, id, data))
    }

    pub fn update_bulk(&self, table: &str, records: Vec<Value>) -> Result<Value> {
        self.client
            .block_on(self.client.inner.database().update_bulk(table, records))
    }

    pub fn delete(&self, table: &str, selector: DeleteSelector) -> Result<Value> {
        self.client
            .block_on(self.client.inner.database().delete(table, selector))
    }
}

/// Blocking face of the database query builder.
pub struct Query<'a> {
    client: &'a Client,
    inner: crate::database::QueryBuilder<'a>,
}

impl<'a> Query<'a> {
    pub fn app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.inner = self.inner.app_slug(app_slug);
        self
    }

    pub fn filter(mut self, field: &str, op: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.filter(field, op, value);
        self
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.eq(field, value);
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.inner = self.inner.sort(field, order);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.inner = self.inner.page(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.inner = self.inner.page_size(page_size);
        self
    }

    pub fn populate<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner = self.inner.populate(fields);
        self
    }

    pub fn get(self) -> Result<Vec<Value>> {
        self.client.block_on(self.inner.get())
    }

    pub fn first(self) -> Result<Option<Value>> {
        self.client.block_on(self.inner.first())
    }

    pub fn count(self) -> Result<u64> {
        self.client.block_on(self.inner.count())
    }
}

pub struct Storage<'a> {
    client: &'a Client,
}

impl<'a> Storage<'a> {
    pub fn bucket(&self, bucket: impl Into<String>) -> StorageQuery<'a> {
        StorageQuery {
            client: self.client,
            inner: self.client.inner.storage().bucket(bucket),
        }
    }

    pub fn list_buckets(&self) -> Result<Vec<Bucket>> {
        self.client.block_on(self.client.inner.storage().list_buckets())
    }

    pub fn create_bucket(&self, name: &str, settings: BucketSettings) -> Result<Bucket> {
        self.client
            .block_on(self.client.inner.storage().create_bucket(name, settings))
    }

    pub fn get_bucket(&self, slug: &str) -> Result<Bucket> {
        self.client.block_on(self.client.inner.storage().get_bucket(slug))
    }

    pub fn update_bucket(&self, slug: &str, settings: BucketSettings) -> Result<Bucket> {
        self.client
            .block_on(self.client.inner.storage().update_bucket(slug, settings))
    }

    pub fn delete_bucket(&self, slug: &str) -> Result<()> {
        self.client
            .block_on(self.client.inner.storage().delete_bucket(slug))
    }
}

pub struct StorageQuery<'a> {
    client: &'a Client,
    inner: crate::storage::StorageQuery<'a>,
}

impl StorageQuery<'_> {
    pub fn app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.inner = self.inner.app_slug(app_slug);
        self
    }

    pub fn search(mut self, term: &str) -> Self {
        self.inner = self.inner.search(term);
        self
    }

    pub fn mimetype(mut self, mimetype: &str) -> Self {
        self.inner = self.inner.mimetype(mimetype);
        self
    }

    pub fn mimetype_category(mut self, category: &str) -> Self {
        self.inner = self.inner.mimetype_category(category);
        self
    }

    pub fn visibility(mut self, visibility: &str) -> Self {
        self.inner = self.inner.visibility(visibility);
        self
    }

    pub fn ordering(mut self, ordering: &str) -> Self {
        self.inner = self.inner.ordering(ordering);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.inner = self.inner.page(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.inner = self.inner.page_size(page_size);
        self
    }

    pub fn list(self) -> Result<Vec<StorageObject>> {
        self.client.block_on(self.inner.list())
    }

    pub fn upload(
        &self,
        files: Vec<UploadFile>,
        paths: Vec<String>,
        metadata: Option<Vec<Value>>,
    ) -> Result<Vec<StorageObject>> {
        self.client.block_on(self.inner.upload(files, paths, metadata))
    }

    pub fn download(&self, file_path: &str) -> Result<Bytes> {
        self.client.block_on(self.inner.download(file_path))
    }

    pub fn update(
        &self,
        file_path: &str,
        metadata: Option<Value>,
        visibility: Option<&str>,
    ) -> Result<StorageObject> {
        self.client
            .block_on(self.inner.update(file_path, metadata, visibility))
    }

    pub fn delete(&self, paths: Vec<String>) -> Result<()> {
        self.client.block_on(self.inner.delete(paths))
    }

    pub fn copy(
        &self,
        source_path: &str,
        destination_path: &str,
        destination_bucket: Option<&str>,
    ) -> Result<StorageObject> {
        self.client
            .block_on(self.inner.copy(source_path, destination_path, destination_bucket))
    }

    pub fn move_(&self, source_path: &str, destination_path: &str) -> Result<StorageObject> {
        self.client
            .block_on(self.inner.move_(source_path, destination_path))
    }
}

pub struct Secrets<'a> {
    client: &'a Client,
}

impl Secrets<'_> {
    pub fn list(&self) -> Result<Vec<Secret>> {
        self.client.block_on(self.client.inner.secrets().list())
    }

    pub fn get(&self, key: &str) -> Result<Secret> {
        self.client.block_on(self.client.inner.secrets().get(key))
    }

    pub fn update(&self, key: &str, value: &str) -> Result<Secret> {
        self.client
            .block_on(self.client.inner.secrets().update(key, value))
    }
}

pub struct Policy<'a> {
    client: &'a Client,
}

impl Policy<'_> {
    pub fn check_resources(
        &self,
        resources: Vec<ResourceCheck>,
        principal: Option<Value>,
        aux_data: Option<Value>,
    ) -> Result<CheckResourcesResponse> {
        self.client.block_on(
            self.client
                .inner
                .policy()
                .check_resources(resources, principal, aux_data),
        )
    }
}

pub struct Functions<'a> {
    client: &'a Client,
}

impl Functions<'_> {
    pub fn execute(
        &self,
        slug: &str,
        params: Option<Value>,
        options: ExecuteOptions,
    ) -> Result<Value> {
        self.client
            .block_on(self.client.inner.functions().execute(slug, params, options))
    }

    pub fn execute_async(&self, slug: &str, params: Option<Value>) -> Result<String> {
        self.client
            .block_on(self.client.inner.functions().execute_async(slug, params))
    }

    pub fn get_result(&self, task_id: &str) -> Result<TaskResult> {
        self.client
            .block_on(self.client.inner.functions().get_result(task_id))
    }

    pub fn list(&self, limit: u32, offset: u32) -> Result<Vec<Function>> {
        self.client
            .block_on(self.client.inner.functions().list(limit, offset))
    }

    pub fn get(&self, slug: &str) -> Result<Function> {
        self.client.block_on(self.client.inner.functions().get(slug))
    }

    pub fn get_invocation(&self, invocation_id: &str) -> Result<Invocation> {
        self.client
            .block_on(self.client.inner.functions().get_invocation(invocation_id))
    }

    pub fn list_invocations(&self, filter: InvocationFilter) -> Result<Vec<Invocation>> {
        self.client
            .block_on(self.client.inner.functions().list_invocations(filter))
    }
}

pub struct Users<'a> {
    client: &'a Client,
}

impl Users<'_> {
    pub fn list(&self, filter: UserFilter) -> Result<Vec<User>> {
        self.client.block_on(self.client.inner.users().list(filter))
    }

    pub fn get(&self, username: &str) -> Result<User> {
        self.client.block_on(self.client.inner.users().get(username))
    }

    pub fn create(&self, user: NewUser) -> Result<User> {
        self.client.block_on(self.client.inner.users().create(user))
    }

    pub fn update(&self, username: &str, update: UserUpdate) -> Result<User> {
        self.client
            .block_on(self.client.inner.users().update(username, update))
    }

    pub fn delete(&self, username: &str) -> Result<()> {
        self.client.block_on(self.client.inner.users().delete(username))
    }

    pub fn assign_roles(
        &self,
        roles: Vec<String>,
        usernames: Vec<String>,
        expires_at: Option<String>,
    ) -> Result<()> {
        self.client.block_on(
            self.client
                .inner
                .users()
                .assign_roles(roles, usernames, expires_at),
        )
    }

    pub fn revoke_roles(&self, roles: Vec<String>, usernames: Vec<String>) -> Result<()> {
        self.client
            .block_on(self.client.inner.users().revoke_roles(roles, usernames))
    }
}

pub struct Analytics<'a> {
    client: &'a Client,
}

impl Analytics<'_> {
    pub fn execute(
        &self,
        query_slug: &str,
        params: Option<Value>,
        app_slug: Option<&str>,
    ) -> Result<Value> {
        self.client.block_on(
            self.client
                .inner
                .analytics()
                .execute(query_slug, params, app_slug),
        )
    }
}

pub struct Settings<'a> {
    client: &'a Client,
}

impl Settings<'_> {
    pub fn get(&self) -> Result<Value> {
        self.client.block_on(self.client.inner.settings().get())
    }
}

pub struct App<'a> {
    client: &'a Client,
}

impl App<'_> {
    pub fn roles(&self, app_slug: Option<&str>) -> Result<Vec<Role>> {
        self.client.block_on(self.client.inner.app().roles(app_slug))
    }
}
