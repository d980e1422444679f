//! Client configuration and transform hooks
//!
//! A [`ClientConfig`] bundles the serializable transport defaults, the
//! optional [`TransformHooks`] supplied by the application, and the
//! client-level [`RequestOptions`] defaults. Hooks are plain synchronous
//! functions; presence is a statically-typed `Option`, absence means "pass
//! through unchanged".

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HttpError, Result};
use crate::request::{RawResponse, RequestDescriptor};

/// Transport-level defaults (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL joined with relative descriptor URLs
    #[serde(default)]
    pub base_url: Option<String>,

    /// Headers applied to every request unless the descriptor overrides them
    #[serde(default)]
    pub default_headers: Vec<(String, String)>,

    /// Request timeout
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_headers: Vec::new(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

// Default value functions for serde
fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("relay-http/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-request options; a per-call value overrides the client-level default
/// field by field
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestOptions {
    /// Suppress duplicate-cancellation tracking for this request
    #[serde(default)]
    pub ignore_dedup: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate-cancellation opt-out
    pub fn with_ignore_dedup(mut self, ignore: bool) -> Self {
        self.ignore_dedup = Some(ignore);
        self
    }

    /// Merge a per-call override over these defaults; per-call wins
    pub fn merged(&self, per_call: Option<RequestOptions>) -> RequestOptions {
        let per_call = per_call.unwrap_or_default();
        RequestOptions {
            ignore_dedup: per_call.ignore_dedup.or(self.ignore_dedup),
        }
    }
}

/// Outcome of the response transform hook
///
/// Tagged replacement for an in-band sentinel error value: `Failure` marks a
/// 2xx transport response whose payload represents an application-level
/// failure, and always rejects the request with [`HttpError::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The application-shaped success value the request resolves to
    Success(Value),
    /// Application-level failure despite transport success; the reason becomes
    /// the rejection message
    Failure(String),
}

pub type BeforeRequestHook =
    Arc<dyn Fn(RequestDescriptor, &RequestOptions) -> Result<RequestDescriptor> + Send + Sync>;
pub type TransformResponseHook =
    Arc<dyn Fn(&RawResponse, &RequestOptions) -> Result<TransformOutcome> + Send + Sync>;
pub type TransformErrorHook = Arc<dyn Fn(HttpError) -> HttpError + Send + Sync>;
pub type RequestInterceptorHook =
    Arc<dyn Fn(RequestDescriptor) -> Result<RequestDescriptor> + Send + Sync>;
pub type ResponseInterceptorHook = Arc<dyn Fn(RawResponse) -> Result<RawResponse> + Send + Sync>;
pub type InterceptErrorHook = Arc<dyn Fn(HttpError) -> HttpError + Send + Sync>;

/// Caller-supplied transform hooks, each optional
///
/// When no bundle is configured at all the pipeline registers nothing and
/// degrades to a pass-through, including duplicate tracking.
#[derive(Clone, Default)]
pub struct TransformHooks {
    /// Mutate the descriptor before encoding and dispatch
    pub before_request: Option<BeforeRequestHook>,
    /// Turn a raw transport response into the application-shaped result
    pub transform_response: Option<TransformResponseHook>,
    /// Map a transport or logical error before it reaches the caller
    pub transform_error: Option<TransformErrorHook>,
    /// Request-stage interceptor, run after dedup registration
    pub request_interceptor: Option<RequestInterceptorHook>,
    /// Maps request-interceptor failures
    pub on_request_intercept_error: Option<InterceptErrorHook>,
    /// Response-stage interceptor, run after dedup removal
    pub response_interceptor: Option<ResponseInterceptorHook>,
    /// Maps response-stage failures, including transport errors
    pub on_response_intercept_error: Option<InterceptErrorHook>,
}

impl TransformHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_request(
        mut self,
        hook: impl Fn(RequestDescriptor, &RequestOptions) -> Result<RequestDescriptor>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.before_request = Some(Arc::new(hook));
        self
    }

    pub fn with_transform_response(
        mut self,
        hook: impl Fn(&RawResponse, &RequestOptions) -> Result<TransformOutcome>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.transform_response = Some(Arc::new(hook));
        self
    }

    pub fn with_transform_error(
        mut self,
        hook: impl Fn(HttpError) -> HttpError + Send + Sync + 'static,
    ) -> Self {
        self.transform_error = Some(Arc::new(hook));
        self
    }

    pub fn with_request_interceptor(
        mut self,
        hook: impl Fn(RequestDescriptor) -> Result<RequestDescriptor> + Send + Sync + 'static,
    ) -> Self {
        self.request_interceptor = Some(Arc::new(hook));
        self
    }

    pub fn with_on_request_intercept_error(
        mut self,
        hook: impl Fn(HttpError) -> HttpError + Send + Sync + 'static,
    ) -> Self {
        self.on_request_intercept_error = Some(Arc::new(hook));
        self
    }

    pub fn with_response_interceptor(
        mut self,
        hook: impl Fn(RawResponse) -> Result<RawResponse> + Send + Sync + 'static,
    ) -> Self {
        self.response_interceptor = Some(Arc::new(hook));
        self
    }

    pub fn with_on_response_intercept_error(
        mut self,
        hook: impl Fn(HttpError) -> HttpError + Send + Sync + 'static,
    ) -> Self {
        self.on_response_intercept_error = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for TransformHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformHooks")
            .field("before_request", &self.before_request.is_some())
            .field("transform_response", &self.transform_response.is_some())
            .field("transform_error", &self.transform_error.is_some())
            .field("request_interceptor", &self.request_interceptor.is_some())
            .field(
                "on_request_intercept_error",
                &self.on_request_intercept_error.is_some(),
            )
            .field("response_interceptor", &self.response_interceptor.is_some())
            .field(
                "on_response_intercept_error",
                &self.on_response_intercept_error.is_some(),
            )
            .finish()
    }
}

/// Full client configuration: transport defaults, hooks, request defaults
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    /// Transform hook bundle; `None` disables interceptors and duplicate
    /// tracking entirely
    pub hooks: Option<TransformHooks>,
    /// Client-level request option defaults
    pub request_defaults: RequestOptions,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.transport.base_url = Some(base_url.into());
        self
    }

    pub fn with_hooks(mut self, hooks: TransformHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_request_defaults(mut self, defaults: RequestOptions) -> Self {
        self.request_defaults = defaults;
        self
    }
}
