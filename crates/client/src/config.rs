//! SDK configuration.
//!
//! Resolution precedence, highest to lowest: explicit builder value,
//! `TARUVI_*` environment variable, managed-runtime injected value, default.

use std::collections::HashMap;
use std::time::Duration;

use crate::credential::Credential;
use crate::error::{Error, ErrorKind, Result};
use crate::runtime::{detect_runtime, FunctionContext, RuntimeInjected, RuntimeMode};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of retry attempts after the initial request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default exponential backoff factor in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.5;
/// Default connection pool size.
pub const DEFAULT_POOL_MAX_IDLE: usize = 10;

/// Fully resolved SDK configuration.
///
/// Constructed once per client via [`TaruviConfig::builder`]. Authentication
/// changes never mutate a configuration; [`TaruviConfig::with_credential`]
/// produces a new one.
#[derive(Clone)]
pub struct TaruviConfig {
    api_url: String,
    app_slug: String,
    credential: Option<Credential>,
    timeout: Duration,
    max_retries: u32,
    backoff_factor: f64,
    pool_max_idle: usize,
    runtime_mode: RuntimeMode,
    function_context: Option<FunctionContext>,
}

impl std::fmt::Debug for TaruviConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaruviConfig")
            .field("api_url", &self.api_url)
            .field("app_slug", &self.app_slug)
            .field("credential", &self.credential)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("runtime_mode", &self.runtime_mode)
            .finish_non_exhaustive()
    }
}

impl TaruviConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TaruviConfigBuilder {
        TaruviConfigBuilder::default()
    }

    /// Resolve a configuration entirely from the environment.
    pub fn from_env() -> Result<Self> {
        Self::builder().resolve()
    }

    /// API base URL, without trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Application slug used to scope operations.
    pub fn app_slug(&self) -> &str {
        &self.app_slug
    }

    /// The configured credential, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// True iff a credential is configured.
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Per-attempt request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of retry attempts after the initial request.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Exponential backoff factor in seconds.
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Maximum idle pooled connections per host.
    pub fn pool_max_idle(&self) -> usize {
        self.pool_max_idle
    }

    /// Runtime mode detected at resolution time.
    pub fn runtime_mode(&self) -> RuntimeMode {
        self.runtime_mode
    }

    /// Execution-trace context when running inside the function runtime.
    pub fn function_context(&self) -> Option<&FunctionContext> {
        self.function_context.as_ref()
    }

    /// Produce a new configuration with only the credential changed.
    ///
    /// Everything else, including the already-passed validation, carries
    /// over; no environment reads or network calls happen here.
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        Self {
            credential,
            ..self.clone()
        }
    }

    /// Default HTTP headers derived from this configuration.
    ///
    /// A pure function of the config: JSON content negotiation, at most
    /// one auth header, plus trace headers inside the function runtime.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        if let Some(credential) = &self.credential {
            let (name, value) = credential.header();
            headers.insert(name.to_string(), value);
        }

        if let Some(ctx) = &self.function_context {
            if let Some(execution_id) = &ctx.execution_id {
                headers.insert("X-Execution-ID".to_string(), execution_id.clone());
            }
            if let Some(function_id) = &ctx.function_id {
                headers.insert("X-Function-ID".to_string(), function_id.clone());
            }
        }

        headers
    }
}

/// Builder for [`TaruviConfig`].
///
/// Unset fields fall back to environment variables, then to values
/// injected by the managed function runtime, then to defaults.
#[derive(Debug, Default)]
pub struct TaruviConfigBuilder {
    api_url: Option<String>,
    app_slug: Option<String>,
    credential: Option<Credential>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    backoff_factor: Option<f64>,
    pool_max_idle: Option<usize>,
}

impl TaruviConfigBuilder {
    /// Set the API base URL.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Set the application slug.
    pub fn app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.app_slug = Some(app_slug.into());
        self
    }

    /// Set the credential.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the number of retry attempts after the initial request.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the exponential backoff factor in seconds.
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = Some(factor);
        self
    }

    /// Set the maximum idle pooled connections per host.
    pub fn pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle = Some(max);
        self
    }

    /// Resolve and validate the configuration.
    pub fn resolve(self) -> Result<TaruviConfig> {
        let runtime_mode = detect_runtime();
        let injected = RuntimeInjected::from_env();

        let api_url = self
            .api_url
            .or_else(|| env_opt("TARUVI_API_URL"))
            .or(injected.api_url)
            .unwrap_or_default();

        let app_slug = self
            .app_slug
            .or_else(|| env_opt("TARUVI_APP_SLUG"))
            .or(injected.app_slug)
            .unwrap_or_default();

        let credential = self
            .credential
            .or_else(credential_from_env)
            .or_else(|| injected.function_key.map(Credential::Jwt));

        let timeout = self
            .timeout
            .or_else(|| env_parse("TARUVI_TIMEOUT").map(Duration::from_secs))
            .unwrap_or(DEFAULT_TIMEOUT);

        let max_retries = self
            .max_retries
            .or_else(|| env_parse("TARUVI_MAX_RETRIES"))
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let backoff_factor = self.backoff_factor.unwrap_or(DEFAULT_BACKOFF_FACTOR);
        let pool_max_idle = self.pool_max_idle.unwrap_or(DEFAULT_POOL_MAX_IDLE);

        if api_url.is_empty() {
            return Err(Error::new(ErrorKind::Configuration(
                "api_url is required. Provide it explicitly or via TARUVI_API_URL".to_string(),
            )));
        }
        if app_slug.is_empty() {
            return Err(Error::new(ErrorKind::Configuration(
                "app_slug is required. Provide it explicitly or via TARUVI_APP_SLUG".to_string(),
            )));
        }
        url::Url::parse(&api_url)?;

        Ok(TaruviConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            app_slug,
            credential,
            timeout,
            max_retries,
            backoff_factor,
            pool_max_idle,
            runtime_mode,
            function_context: FunctionContext::from_env(),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_opt(name).and_then(|v| v.parse().ok())
}

fn credential_from_env() -> Option<Credential> {
    if let Some(key) = env_opt("TARUVI_API_KEY") {
        return Some(Credential::ApiKey(key));
    }
    if let Some(jwt) = env_opt("TARUVI_JWT") {
        return Some(Credential::Jwt(jwt));
    }
    env_opt("TARUVI_SESSION_TOKEN").map(Credential::SessionToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests::EnvGuard;
    use crate::runtime::{ENV_FUNCTION_RUNTIME, ENV_LOCAL_DEV};

    fn clean_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_FUNCTION_RUNTIME, ""),
            (ENV_LOCAL_DEV, ""),
            ("TARUVI_API_URL", ""),
            ("TARUVI_APP_SLUG", ""),
            ("TARUVI_API_KEY", ""),
            ("TARUVI_JWT", ""),
            ("TARUVI_SESSION_TOKEN", ""),
            ("TARUVI_TIMEOUT", ""),
            ("TARUVI_MAX_RETRIES", ""),
            ("TARUVI_FUNCTION_KEY", ""),
        ]
    }

    #[test]
    fn test_explicit_values_resolve() {
        let _guard = EnvGuard::set(&clean_env());
        let config = TaruviConfig::builder()
            .api_url("http://localhost:8000/")
            .app_slug("demo")
            .resolve()
            .unwrap();

        assert_eq!(config.api_url(), "http://localhost:8000");
        assert_eq!(config.app_slug(), "demo");
        assert!(!config.is_authenticated());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.runtime_mode(), RuntimeMode::External);
    }

    #[test]
    fn test_missing_api_url_fails() {
        let _guard = EnvGuard::set(&clean_env());
        let err = TaruviConfig::builder()
            .app_slug("demo")
            .resolve()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Configuration(_)));
    }

    #[test]
    fn test_missing_app_slug_fails() {
        let _guard = EnvGuard::set(&clean_env());
        let err = TaruviConfig::builder()
            .api_url("http://localhost:8000")
            .resolve()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Configuration(_)));
    }

    #[test]
    fn test_explicit_beats_env() {
        let mut env = clean_env();
        env.retain(|(name, _)| *name != "TARUVI_API_URL");
        env.push(("TARUVI_API_URL", "http://from-env:8000"));
        let _guard = EnvGuard::set(&env);

        let config = TaruviConfig::builder()
            .api_url("http://explicit:9000")
            .app_slug("demo")
            .resolve()
            .unwrap();
        assert_eq!(config.api_url(), "http://explicit:9000");
    }

    #[test]
    fn test_env_beats_runtime_injected() {
        let mut env = clean_env();
        env.retain(|(name, _)| *name != ENV_FUNCTION_RUNTIME && *name != "TARUVI_JWT");
        env.push((ENV_FUNCTION_RUNTIME, "true"));
        env.push(("TARUVI_API_URL", "http://env:8000"));
        env.push(("TARUVI_APP_SLUG", "env-app"));
        env.push(("TARUVI_JWT", "env-jwt"));
        env.push(("TARUVI_FUNCTION_KEY", "fn-jwt"));
        let _guard = EnvGuard::set(&env);

        let config = TaruviConfig::from_env().unwrap();
        assert_eq!(config.runtime_mode(), RuntimeMode::Function);
        assert_eq!(config.credential(), Some(&Credential::Jwt("env-jwt".into())));
    }

    #[test]
    fn test_function_runtime_autoconfiguration() {
        let mut env = clean_env();
        env.retain(|(name, _)| *name != ENV_FUNCTION_RUNTIME);
        env.push((ENV_FUNCTION_RUNTIME, "true"));
        env.push(("TARUVI_API_URL", "http://api.internal:8000"));
        env.push(("TARUVI_APP_SLUG", "demo"));
        env.push(("TARUVI_FUNCTION_KEY", "fn-jwt"));
        env.push(("TARUVI_EXECUTION_ID", "exec-1"));
        env.push(("TARUVI_FUNCTION_ID", "fn-9"));
        let _guard = EnvGuard::set(&env);

        let config = TaruviConfig::from_env().unwrap();
        assert_eq!(config.runtime_mode(), RuntimeMode::Function);
        assert_eq!(config.credential(), Some(&Credential::Jwt("fn-jwt".into())));

        let headers = config.headers();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer fn-jwt");
        assert_eq!(headers.get("X-Execution-ID").unwrap(), "exec-1");
        assert_eq!(headers.get("X-Function-ID").unwrap(), "fn-9");
    }

    #[test]
    fn test_header_derivation_per_credential() {
        let _guard = EnvGuard::set(&clean_env());
        let base = TaruviConfig::builder()
            .api_url("http://localhost:8000")
            .app_slug("demo")
            .resolve()
            .unwrap();

        let anon = base.headers();
        assert_eq!(anon.get("Content-Type").unwrap(), "application/json");
        assert_eq!(anon.get("Accept").unwrap(), "application/json");
        assert!(!anon.contains_key("Authorization"));
        assert!(!anon.contains_key("X-Session-Token"));

        let with_key = base.with_credential(Some(Credential::ApiKey("k1".into())));
        assert_eq!(with_key.headers().get("Authorization").unwrap(), "Api-Key k1");

        let with_session = base.with_credential(Some(Credential::SessionToken("s1".into())));
        let headers = with_session.headers();
        assert_eq!(headers.get("X-Session-Token").unwrap(), "s1");
        assert!(!headers.contains_key("Authorization"));
    }

    #[test]
    fn test_with_credential_is_immutable_update() {
        let _guard = EnvGuard::set(&clean_env());
        let base = TaruviConfig::builder()
            .api_url("http://localhost:8000")
            .app_slug("demo")
            .credential(Credential::Jwt("t1".into()))
            .resolve()
            .unwrap();

        let signed_out = base.with_credential(None);
        assert!(!signed_out.is_authenticated());
        // Original untouched.
        assert_eq!(base.credential(), Some(&Credential::Jwt("t1".into())));
        assert_eq!(signed_out.api_url(), base.api_url());
        assert_eq!(signed_out.app_slug(), base.app_slug());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let _guard = EnvGuard::set(&clean_env());
        let err = TaruviConfig::builder()
            .api_url("not a url")
            .app_slug("demo")
            .resolve()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_credential() {
        let _guard = EnvGuard::set(&clean_env());
        let config = TaruviConfig::builder()
            .api_url("http://localhost:8000")
            .app_slug("demo")
            .credential(Credential::ApiKey("topsecret".into()))
            .resolve()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("topsecret"));
    }
}
