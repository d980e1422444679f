//! Content-type-aware body encoding
//!
//! Two encoders: `support_form_data` rewrites structured parameters into a
//! `application/x-www-form-urlencoded` body when the descriptor asks for that
//! content type, and `build_multipart` assembles the multipart descriptor used
//! by file uploads. Array values use the bracket convention
//! (`key[]=v1&key[]=v2`) in both encodings.

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::request::{MultipartForm, RequestBody, RequestDescriptor, UploadParams};

/// `application/x-www-form-urlencoded` content type
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data` content type
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
/// `application/json` content type
pub const APPLICATION_JSON: &str = "application/json";

/// Default form field name for the uploaded file part
pub const DEFAULT_FILE_FIELD: &str = "file";

/// Expand a parameter map into key/value pairs, arrays under bracketed keys
pub fn to_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((format!("{key}[]"), value_to_string(item)));
                }
            }
            other => pairs.push((key.clone(), value_to_string(other))),
        }
    }
    pairs
}

/// Serialize a parameter map as a urlencoded body
pub fn urlencode(params: &Map<String, Value>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(to_pairs(params))
        .finish()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Rewrite a structured-parameter body into a urlencoded one when the
/// descriptor's content type asks for it
///
/// Applies only when the content type is exactly
/// `application/x-www-form-urlencoded`, the method is not GET, and the body
/// holds structured parameters; any other descriptor passes through unchanged.
pub fn support_form_data(mut descriptor: RequestDescriptor) -> RequestDescriptor {
    let wants_form = descriptor
        .header("content-type")
        .map(|ct| ct == FORM_URLENCODED)
        .unwrap_or(false);

    if !wants_form || descriptor.method == Method::GET {
        return descriptor;
    }

    let params = match &descriptor.body {
        RequestBody::Params(params) => params.clone(),
        _ => return descriptor,
    };

    debug!(url = %descriptor.url, "encoding request body as urlencoded form");
    descriptor.body = RequestBody::Raw(urlencode(&params).into_bytes());
    descriptor
}

/// Build the multipart upload descriptor
///
/// Scalar fields become text parts, array fields one part per element under a
/// bracketed key, and the file part is appended last under `field_name`
/// (default `"file"`). Forces the method to POST, the content type to
/// multipart, and opts the request out of duplicate tracking: upload bodies
/// are not comparable by fingerprint and uploads are user-initiated one-offs.
pub fn build_multipart(
    mut descriptor: RequestDescriptor,
    params: UploadParams,
) -> RequestDescriptor {
    let mut form = MultipartForm::new();

    if let Some(data) = &params.data {
        for (name, value) in to_pairs(data) {
            form = form.text(name, value);
        }
    }

    let field_name = params
        .field_name
        .unwrap_or_else(|| DEFAULT_FILE_FIELD.to_string());
    form = form.file(field_name, params.filename, params.file);

    debug!(url = %descriptor.url, parts = form.parts.len(), "built multipart upload body");

    descriptor.method = Method::POST;
    descriptor.set_header("Content-Type".to_string(), MULTIPART_FORM_DATA.to_string());
    descriptor.ignore_dedup = Some(true);
    descriptor.body = RequestBody::Multipart(form);
    descriptor
}
