//! Configurable HTTP request pipeline
//!
//! Sits between application call sites and a raw HTTP transport so that every
//! outbound request passes through the same cross-cutting behaviors.
//!
//! ## Features
//!
//! - **Duplicate cancellation**: in-flight requests are fingerprinted; a newer
//!   identical request cancels the older one, per-request opt-out available
//! - **Transform hooks**: pluggable pre-request mutation, response-to-result
//!   and error-to-result transformation per client instance
//! - **Interceptor stages**: request/response interceptors with separate
//!   success and error handlers around the transport
//! - **Form encoding**: urlencoded bodies with bracket-style arrays, multipart
//!   file uploads
//! - **Trait-shaped transport**: mockable via [`Transport`]; a reqwest-backed
//!   implementation is provided
//!
//! ## Example
//!
//! ```no_run
//! use relay_http::{
//!     ClientConfig, HttpClient, RequestDescriptor, TransformHooks, TransformOutcome,
//! };
//!
//! # async fn run() -> relay_http::Result<()> {
//! let hooks = TransformHooks::new().with_transform_response(|response, _options| {
//!     let envelope: serde_json::Value = response.json()?;
//!     Ok(match envelope["code"].as_i64() {
//!         Some(0) => TransformOutcome::Success(envelope["data"].clone()),
//!         _ => TransformOutcome::Failure("request error".to_string()),
//!     })
//! });
//!
//! let client = HttpClient::new(
//!     ClientConfig::new()
//!         .with_base_url("https://api.example.com")
//!         .with_hooks(hooks),
//! )?;
//!
//! let user = client
//!     .request(RequestDescriptor::get("/user/1"), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod pending;
pub mod pipeline;
pub mod request;
pub mod transport;

pub use client::{HttpClient, Reply};
pub use config::{
    ClientConfig, RequestOptions, TransformHooks, TransformOutcome, TransportConfig,
};
pub use error::{HttpError, Result};
pub use pending::{fingerprint, PendingRequestRegistry};
pub use pipeline::InterceptorPipeline;
pub use request::{
    MultipartForm, MultipartPart, RawResponse, RequestBody, RequestDescriptor, UploadParams,
};
pub use transport::{ReqwestTransport, Transport};

/// Re-export commonly used types
pub use reqwest::{header, Method, StatusCode};
