//! HTTP client facade
//!
//! `HttpClient` owns one transport binding and one configuration, and drives
//! every request through the same stages: default-header merge, the
//! `before_request` hook, conditional form encoding, the interceptor pipeline
//! (duplicate tracking + transport dispatch), and finally the response/error
//! transform hooks. Constructed and owned explicitly; wrap it in an `Arc` to
//! share it, there is no process-wide instance.

use std::sync::{Arc, RwLock};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{ClientConfig, RequestOptions, TransformHooks, TransformOutcome};
use crate::error::{HttpError, Result};
use crate::form;
use crate::pending::PendingRequestRegistry;
use crate::pipeline::InterceptorPipeline;
use crate::request::{MultipartForm, RawResponse, RequestBody, RequestDescriptor, UploadParams};
use crate::transport::{ReqwestTransport, Transport};

/// What a transformed request resolves to
#[derive(Debug, Clone)]
pub enum Reply {
    /// Output of the `transform_response` hook
    Value(Value),
    /// Raw transport response, when no transform hook is configured
    Raw(RawResponse),
}

impl Reply {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Reply::Value(value) => Some(value),
            Reply::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<RawResponse> {
        match self {
            Reply::Raw(response) => Some(response),
            Reply::Value(_) => None,
        }
    }

    /// Decode either variant as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Reply::Value(value) => Ok(serde_json::from_value(value.clone())?),
            Reply::Raw(response) => response.json(),
        }
    }
}

/// One transport binding: replaced wholesale by `configure`, while in-flight
/// requests keep Arc clones of the old one and settle against it
struct Binding {
    transport: Arc<dyn Transport>,
    pipeline: Arc<InterceptorPipeline>,
    config: ClientConfig,
}

impl Binding {
    fn build(config: ClientConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config.transport)?);
        Ok(Self::with_transport(config, transport))
    }

    fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let registry = Arc::new(PendingRequestRegistry::new());
        let pipeline = Arc::new(InterceptorPipeline::new(config.hooks.clone(), registry));
        Self {
            transport,
            pipeline,
            config,
        }
    }
}

/// Snapshot of the binding taken at the start of a request, so the request
/// runs to completion against one consistent configuration
struct Snapshot {
    transport: Arc<dyn Transport>,
    pipeline: Arc<InterceptorPipeline>,
    hooks: Option<TransformHooks>,
    defaults: RequestOptions,
    default_headers: Vec<(String, String)>,
}

/// The request pipeline facade
pub struct HttpClient {
    binding: RwLock<Binding>,
}

impl HttpClient {
    /// Create a client with a reqwest-backed transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            binding: RwLock::new(Binding::build(config)?),
        })
    }

    /// Create a client around an injected transport (tests, custom stacks)
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            binding: RwLock::new(Binding::with_transport(config, transport)),
        }
    }

    /// Create a client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Atomically replace the transport binding
    ///
    /// In-flight requests are not migrated; they settle against the binding
    /// they dispatched through. New calls use the new binding.
    pub fn configure(&self, config: ClientConfig) -> Result<()> {
        let binding = Binding::build(config)?;
        *self.binding.write().unwrap() = binding;
        Ok(())
    }

    /// Merge headers into the default header set; caller-supplied names win
    pub fn set_default_headers(&self, headers: Vec<(String, String)>) {
        let mut binding = self.binding.write().unwrap();
        let defaults = &mut binding.config.transport.default_headers;
        for (name, value) in headers {
            match defaults
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(&name))
            {
                Some(entry) => entry.1 = value,
                None => defaults.push((name, value)),
            }
        }
    }

    /// Number of tracked in-flight requests
    pub fn pending_requests(&self) -> usize {
        self.binding.read().unwrap().pipeline.pending_count()
    }

    /// Cancel every tracked in-flight request; used on teardown
    pub fn cancel_all_pending(&self) {
        self.binding.read().unwrap().pipeline.cancel_all();
    }

    fn snapshot(&self) -> Snapshot {
        let binding = self.binding.read().unwrap();
        Snapshot {
            transport: binding.transport.clone(),
            pipeline: binding.pipeline.clone(),
            hooks: binding.config.hooks.clone(),
            defaults: binding.config.request_defaults,
            default_headers: binding.config.transport.default_headers.clone(),
        }
    }

    /// The central operation: drive one request through the full pipeline
    pub async fn request(
        &self,
        descriptor: RequestDescriptor,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        let snapshot = self.snapshot();
        let merged = snapshot.defaults.merged(options);

        let mut descriptor = descriptor;
        descriptor.merge_default_headers(&snapshot.default_headers);

        if let Some(hook) = snapshot.hooks.as_ref().and_then(|h| h.before_request.as_ref()) {
            descriptor = hook(descriptor, &merged)?;
        }

        let descriptor = form::support_form_data(descriptor);
        debug!(method = %descriptor.method, url = %descriptor.url, "request entering pipeline");

        match snapshot
            .pipeline
            .dispatch(&snapshot.transport, descriptor, &merged)
            .await
        {
            Ok(response) => {
                match snapshot
                    .hooks
                    .as_ref()
                    .and_then(|h| h.transform_response.as_ref())
                {
                    Some(transform) => match transform(&response, &merged)? {
                        TransformOutcome::Success(value) => Ok(Reply::Value(value)),
                        TransformOutcome::Failure(reason) => Err(HttpError::Rejected(reason)),
                    },
                    None => Ok(Reply::Raw(response)),
                }
            }
            // A superseded request stays distinguishable from a failure.
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                match snapshot
                    .hooks
                    .as_ref()
                    .and_then(|h| h.transform_error.as_ref())
                {
                    Some(transform) => Err(transform(err)),
                    None => Err(err),
                }
            }
        }
    }

    /// GET shortcut
    pub async fn get(
        &self,
        mut descriptor: RequestDescriptor,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        descriptor.method = Method::GET;
        self.request(descriptor, options).await
    }

    /// POST shortcut
    pub async fn post(
        &self,
        mut descriptor: RequestDescriptor,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        descriptor.method = Method::POST;
        self.request(descriptor, options).await
    }

    /// PUT shortcut
    pub async fn put(
        &self,
        mut descriptor: RequestDescriptor,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        descriptor.method = Method::PUT;
        self.request(descriptor, options).await
    }

    /// DELETE shortcut
    pub async fn delete(
        &self,
        mut descriptor: RequestDescriptor,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        descriptor.method = Method::DELETE;
        self.request(descriptor, options).await
    }

    /// POST structured parameters as a urlencoded form body
    pub async fn post_form(
        &self,
        url: impl Into<String>,
        params: Map<String, Value>,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        let descriptor = RequestDescriptor::post(url)
            .with_header("Content-Type", form::FORM_URLENCODED)
            .with_params(params);
        self.request(descriptor, options).await
    }

    /// POST a prebuilt multipart form through the full request path
    pub async fn post_file(
        &self,
        url: impl Into<String>,
        parts: MultipartForm,
        options: Option<RequestOptions>,
    ) -> Result<Reply> {
        let mut descriptor = RequestDescriptor::post(url);
        descriptor.body = RequestBody::Multipart(parts);
        self.request(descriptor, options).await
    }

    /// Upload a file as multipart form data
    ///
    /// Builds the multipart descriptor (forced POST, multipart content type,
    /// duplicate tracking opted out), runs it through the interceptor
    /// pipeline, and returns the raw response untransformed; upload responses
    /// are usually handled specially by the caller.
    pub async fn upload_file(
        &self,
        descriptor: RequestDescriptor,
        params: UploadParams,
    ) -> Result<RawResponse> {
        let snapshot = self.snapshot();

        let mut descriptor = descriptor;
        descriptor.merge_default_headers(&snapshot.default_headers);
        let descriptor = form::build_multipart(descriptor, params);

        snapshot
            .pipeline
            .dispatch(&snapshot.transport, descriptor, &snapshot.defaults)
            .await
    }
}
