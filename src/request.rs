//! Request and response value types
//!
//! `RequestDescriptor` is the logical description of one outbound request. It
//! is built by the caller, handed to [`crate::HttpClient::request`] by value,
//! and owned by the pipeline from then on, so a caller-held copy can never be
//! mutated mid-flight. `RawResponse` is the transport-shaped result and always
//! carries the descriptor that produced it, which the pipeline needs to key
//! duplicate-tracking removal.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Result;

/// Logical description of a single outbound HTTP request
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Target URL, absolute or relative to the configured base URL
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Header names kept case-sensitive as provided; lookups are
    /// case-insensitive
    pub headers: Vec<(String, String)>,
    /// Query parameters (ordered map, so serialization is key-order stable)
    pub query: Map<String, Value>,
    /// Request body
    pub body: RequestBody,
    /// Per-request duplicate-cancellation opt-out; takes precedence over the
    /// client-level default when set
    pub ignore_dedup: Option<bool>,
}

impl RequestDescriptor {
    /// Create a descriptor for the given method and URL
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            query: Map::new(),
            body: RequestBody::Empty,
            ignore_dedup: None,
        }
    }

    /// Shorthand for a GET descriptor
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Shorthand for a POST descriptor
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set a header, replacing any existing value under the same
    /// (case-insensitive) name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set a structured-parameter body
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.body = RequestBody::Params(params);
        self
    }

    /// Set a pre-encoded body
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Raw(body);
        self
    }

    /// Set the per-request duplicate-cancellation opt-out
    pub fn with_ignore_dedup(mut self, ignore: bool) -> Self {
        self.ignore_dedup = Some(ignore);
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace-or-append a header by case-insensitive name
    pub fn set_header(&mut self, name: String, value: String) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Fill in default headers without overriding anything the descriptor
    /// already carries
    pub fn merge_default_headers(&mut self, defaults: &[(String, String)]) {
        for (name, value) in defaults {
            if self.header(name).is_none() {
                self.headers.push((name.clone(), value.clone()));
            }
        }
    }
}

/// Request body payload
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// No body
    Empty,
    /// Structured parameters; dispatched as JSON unless the form encoder
    /// rewrites them first
    Params(Map<String, Value>),
    /// Pre-encoded payload sent as-is
    Raw(Vec<u8>),
    /// Multipart form payload
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// Transport-agnostic multipart form description
///
/// Mapped to the transport's native multipart encoding at dispatch time; the
/// boundary is a transport concern.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub parts: Vec<MultipartPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            filename: None,
            data: value.into().into_bytes(),
        });
        self
    }

    /// Append a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            filename: Some(filename.into()),
            data,
        });
        self
    }
}

/// One part of a multipart form
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    /// Present for file parts, absent for plain fields
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Parameters for [`crate::HttpClient::upload_file`]
#[derive(Debug, Clone)]
pub struct UploadParams {
    /// Extra form fields appended before the file; array values are appended
    /// one part per element under a bracketed key
    pub data: Option<Map<String, Value>>,
    /// Form field name for the file part; defaults to `"file"`
    pub field_name: Option<String>,
    /// Filename reported for the file part
    pub filename: String,
    /// File content
    pub file: Vec<u8>,
}

/// Raw transport response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// The descriptor this response answers; interceptor chains may have
    /// mutated it relative to what the caller submitted
    pub request: RequestDescriptor,
}

impl RawResponse {
    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let descriptor =
            RequestDescriptor::post("/upload").with_header("Content-Type", "application/json");

        assert_eq!(descriptor.header("content-type"), Some("application/json"));
        assert_eq!(descriptor.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(descriptor.header("accept"), None);
    }

    #[test]
    fn test_set_header_replaces_by_case_insensitive_name() {
        let mut descriptor =
            RequestDescriptor::post("/a").with_header("content-type", "text/plain");
        descriptor.set_header("Content-Type".to_string(), "application/json".to_string());

        assert_eq!(descriptor.headers.len(), 1);
        assert_eq!(descriptor.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_merge_default_headers_keeps_descriptor_values() {
        let mut descriptor = RequestDescriptor::get("/a").with_header("Accept", "text/html");
        descriptor.merge_default_headers(&[
            ("accept".to_string(), "application/json".to_string()),
            ("X-Client".to_string(), "relay".to_string()),
        ]);

        assert_eq!(descriptor.header("accept"), Some("text/html"));
        assert_eq!(descriptor.header("x-client"), Some("relay"));
    }

    #[test]
    fn test_raw_response_json() {
        let response = RawResponse {
            status: StatusCode::OK,
            headers: vec![],
            body: br#"{"id": 1}"#.to_vec(),
            request: RequestDescriptor::get("/user/1"),
        };

        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value, json!({"id": 1}));
    }

    #[test]
    fn test_multipart_form_builders() {
        let form = MultipartForm::new()
            .text("tag", "x")
            .file("file", "a.png", vec![1, 2, 3]);

        assert_eq!(form.parts.len(), 2);
        assert_eq!(form.parts[0].name, "tag");
        assert_eq!(form.parts[0].filename, None);
        assert_eq!(form.parts[1].filename.as_deref(), Some("a.png"));
    }
}
