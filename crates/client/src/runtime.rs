//! Managed-runtime detection.
//!
//! Code using this SDK may run inside the platform's own function sandbox,
//! which injects connection and trace parameters through `TARUVI_*`
//! environment variables. Detection happens once at configuration
//! resolution time; nothing here keeps process-wide state.

/// Environment flag marking the managed function runtime.
pub const ENV_FUNCTION_RUNTIME: &str = "TARUVI_FUNCTION_RUNTIME";
/// Environment flag marking local development.
pub const ENV_LOCAL_DEV: &str = "TARUVI_LOCAL_DEV";

/// Where the SDK is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// External application (the default).
    External,
    /// Inside the platform's managed function sandbox.
    Function,
    /// Local development/testing.
    LocalDev,
}

/// Detect the current runtime environment from process env vars.
pub fn detect_runtime() -> RuntimeMode {
    if env_flag(ENV_FUNCTION_RUNTIME) {
        return RuntimeMode::Function;
    }
    if env_flag(ENV_LOCAL_DEV) {
        return RuntimeMode::LocalDev;
    }
    RuntimeMode::External
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "true").unwrap_or(false)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Execution-trace context injected by the function runtime.
///
/// All fields are optional; the runtime injects whichever it knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionContext {
    pub function_id: Option<String>,
    pub function_name: Option<String>,
    pub execution_id: Option<String>,
    pub tenant: Option<String>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
}

impl FunctionContext {
    /// Read the trace context from the environment.
    ///
    /// Returns `None` when not running inside the managed runtime.
    pub fn from_env() -> Option<Self> {
        if detect_runtime() != RuntimeMode::Function {
            return None;
        }
        Some(Self {
            function_id: env_opt("TARUVI_FUNCTION_ID"),
            function_name: env_opt("TARUVI_FUNCTION_NAME"),
            execution_id: env_opt("TARUVI_EXECUTION_ID"),
            tenant: env_opt("TARUVI_TENANT"),
            user_id: env_opt("TARUVI_USER_ID"),
            user_email: env_opt("TARUVI_USER_EMAIL"),
        })
    }
}

/// Connection parameters injected by the function runtime, used as the
/// lowest-precedence configuration layer (above defaults only).
#[derive(Debug, Clone, Default)]
pub(crate) struct RuntimeInjected {
    pub api_url: Option<String>,
    pub app_slug: Option<String>,
    /// The function's own JWT, injected as `TARUVI_FUNCTION_KEY`.
    pub function_key: Option<String>,
}

impl RuntimeInjected {
    pub(crate) fn from_env() -> Self {
        if detect_runtime() != RuntimeMode::Function {
            return Self::default();
        }
        Self {
            api_url: env_opt("TARUVI_API_URL"),
            app_slug: env_opt("TARUVI_APP_SLUG"),
            function_key: env_opt("TARUVI_FUNCTION_KEY"),
        }
    }
}
