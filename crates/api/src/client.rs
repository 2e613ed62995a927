//! The top-level SDK client.

use taruvi_client::{Credential, HttpTransport, Result, TaruviConfig, TaruviConfigBuilder};

use crate::analytics::Analytics;
use crate::app::App;
use crate::auth::Auth;
use crate::database::Database;
use crate::functions::Functions;
use crate::policy::Policy;
use crate::secrets::Secrets;
use crate::settings::Settings;
use crate::storage::Storage;
use crate::users::Users;

/// A client for one Taruvi app.
///
/// Cloning is cheap and shares the underlying connection pool. Module
/// accessors return borrowing facades, so the usual shape is
/// `client.database().query("tasks").get().await`.
///
/// Clients are immutable with respect to authentication: the operations on
/// [`Auth`] return a new `Client` rather than changing this one.
#[derive(Debug, Clone)]
pub struct Client {
    transport: HttpTransport,
}

impl Client {
    /// Connect to `api_url` scoped to `app_slug`, resolving everything else
    /// from the environment.
    pub fn new(api_url: impl Into<String>, app_slug: impl Into<String>) -> Result<Self> {
        Self::builder().api_url(api_url).app_slug(app_slug).build()
    }

    /// Build a client entirely from `TARUVI_*` environment variables, or
    /// from the managed function runtime when running inside one.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::default().build()
    }

    /// Start a client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Construct a client from an already-resolved configuration.
    ///
    /// No validation or environment reads happen here; the config was
    /// validated when it was resolved.
    pub fn from_config(config: TaruviConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// The resolved configuration backing this client.
    pub fn config(&self) -> &TaruviConfig {
        self.transport.config()
    }

    /// True iff a credential is configured.
    pub fn is_authenticated(&self) -> bool {
        self.config().is_authenticated()
    }

    /// The app slug all unqualified operations are scoped to.
    pub fn app_slug(&self) -> &str {
        self.config().app_slug()
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// New client identical to this one apart from the credential.
    ///
    /// The clone gets its own connection pool; connections negotiated under
    /// the old credential are never reused for the new one.
    pub(crate) fn with_credential(&self, credential: Option<Credential>) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(self.config().with_credential(credential))?,
        })
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth::new(self)
    }

    pub fn database(&self) -> Database<'_> {
        Database::new(self)
    }

    pub fn storage(&self) -> Storage<'_> {
        Storage::new(self)
    }

    pub fn secrets(&self) -> Secrets<'_> {
        Secrets::new(self)
    }

    pub fn policy(&self) -> Policy<'_> {
        Policy::new(self)
    }

    pub fn functions(&self) -> Functions<'_> {
        Functions::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn analytics(&self) -> Analytics<'_> {
        Analytics::new(self)
    }

    pub fn settings(&self) -> Settings<'_> {
        Settings::new(self)
    }

    pub fn app(&self) -> App<'_> {
        App::new(self)
    }
}

/// Builder for [`Client`]; a thin wrapper over the config builder.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: TaruviConfigBuilder,
}

impl ClientBuilder {
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config = self.config.api_url(api_url);
        self
    }

    pub fn app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.config = self.config.app_slug(app_slug);
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.config = self.config.credential(credential);
        self
    }

    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credential(Credential::ApiKey(key.into()))
    }

    pub fn jwt(self, token: impl Into<String>) -> Self {
        self.credential(Credential::Jwt(token.into()))
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config = self.config.max_retries(max_retries);
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.config = self.config.backoff_factor(factor);
        self
    }

    /// Resolve the configuration and build the client.
    pub fn build(self) -> Result<Client> {
        Client::from_config(self.config.resolve()?)
    }
}
