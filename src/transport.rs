//! Transport abstraction and the reqwest-backed implementation
//!
//! The pipeline only ever talks to [`Transport::execute`]; everything below
//! that seam (TCP/TLS/HTTP framing, timeouts) belongs to the transport. The
//! trait keeps the pipeline mockable in tests.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use crate::config::TransportConfig;
use crate::error::{HttpError, Result};
use crate::form;
use crate::request::{RawResponse, RequestBody, RequestDescriptor};

/// The single network primitive the pipeline dispatches through
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request and return the raw response
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse>;
}

/// Production transport backed by reqwest
pub struct ReqwestTransport {
    inner: reqwest::Client,
    base_url: Option<Url>,
}

impl ReqwestTransport {
    /// Build a transport bound to the given defaults
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| Url::parse(raw).map_err(|e| HttpError::InvalidUrl(e.to_string())))
            .transpose()?;

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| HttpError::BuildClient(e.to_string()))?;

        Ok(Self { inner, base_url })
    }

    fn resolve_url(&self, raw: &str) -> Result<Url> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(raw)
                    .map_err(|e| HttpError::InvalidUrl(e.to_string())),
                None => Err(HttpError::InvalidUrl(format!(
                    "relative URL without a configured base: {raw}"
                ))),
            },
            Err(e) => Err(HttpError::InvalidUrl(e.to_string())),
        }
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| HttpError::InvalidHeader(value.clone()))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn multipart_form(form: &crate::request::MultipartForm) -> reqwest::multipart::Form {
    let mut out = reqwest::multipart::Form::new();
    for part in &form.parts {
        let piece = match &part.filename {
            Some(filename) => {
                reqwest::multipart::Part::bytes(part.data.clone()).file_name(filename.clone())
            }
            None => reqwest::multipart::Part::text(String::from_utf8_lossy(&part.data).into_owned()),
        };
        out = out.part(part.name.clone(), piece);
    }
    out
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse> {
        let url = self.resolve_url(&request.url)?;
        debug!(method = %request.method, url = %url, "dispatching request");

        // For multipart bodies the wire content type (with boundary) comes
        // from the multipart encoder, not the descriptor.
        let headers: Vec<(String, String)> = match &request.body {
            RequestBody::Multipart(_) => request
                .headers
                .iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case("content-type"))
                .cloned()
                .collect(),
            _ => request.headers.clone(),
        };

        let mut builder = self
            .inner
            .request(request.method.clone(), url)
            .headers(header_map(&headers)?);

        if !request.query.is_empty() {
            builder = builder.query(&form::to_pairs(&request.query));
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Params(params) => builder.json(params),
            RequestBody::Raw(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            return Err(HttpError::Status {
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(RawResponse {
            status,
            headers,
            body,
            request,
        })
    }
}
