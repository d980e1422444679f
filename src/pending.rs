//! Duplicate-request tracking and cancellation
//!
//! Every dispatching request (unless opted out) registers its fingerprint
//! here. A colliding fingerprint cancels the older in-flight request
//! synchronously at registration time, so the newer request wins before the
//! older one's response can resolve.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::{AbortHandle, AbortRegistration};
use tracing::{debug, warn};

use crate::request::{RequestBody, RequestDescriptor};

/// Deterministic identity of a request: method + URL + canonicalized query
/// and body parameters
///
/// Parameter maps are key-ordered, so insertion order never changes the
/// fingerprint; headers never participate. Note that two requests to the same
/// target with the same parameters collide even when issued with different
/// intent (say, a poll loop and a user-triggered refresh); callers mixing both
/// patterns should opt the background request out of duplicate tracking.
pub fn fingerprint(descriptor: &RequestDescriptor) -> String {
    let query = canonical(&descriptor.query);
    let body = match &descriptor.body {
        RequestBody::Empty => String::new(),
        RequestBody::Params(params) => canonical(params),
        RequestBody::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        // Upload bodies are not comparable byte-wise; part names are enough,
        // uploads opt out of tracking anyway.
        RequestBody::Multipart(form) => form
            .parts
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(","),
    };
    format!("{}|{}|{}|{}", descriptor.method, descriptor.url, query, body)
}

/// Key-sorted serialization, independent of map insertion order
fn canonical(params: &serde_json::Map<String, serde_json::Value>) -> String {
    let ordered: std::collections::BTreeMap<&String, &serde_json::Value> = params.iter().collect();
    serde_json::to_string(&ordered).unwrap_or_default()
}

/// Registry of in-flight, non-opted-out requests
///
/// At most one non-cancelled in-flight request exists per fingerprint; the
/// newer registrant cancels the older one.
#[derive(Debug, Default)]
pub struct PendingRequestRegistry {
    entries: Mutex<HashMap<String, AbortHandle>>,
}

impl PendingRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request about to dispatch
    ///
    /// Cancels and replaces any older in-flight request with the same
    /// fingerprint. Returns the fingerprint and the abort registration the
    /// caller wraps its transport future with.
    pub fn add_pending(&self, descriptor: &RequestDescriptor) -> (String, AbortRegistration) {
        let key = fingerprint(descriptor);
        let (handle, registration) = AbortHandle::new_pair();

        let mut entries = self.entries.lock().unwrap();
        if let Some(previous) = entries.insert(key.clone(), handle) {
            warn!(fingerprint = %key, "cancelling older duplicate in-flight request");
            previous.abort();
        } else {
            debug!(fingerprint = %key, "tracking in-flight request");
        }

        (key, registration)
    }

    /// Remove the entry for a settled request; removing an absent entry is a
    /// no-op
    pub fn remove_pending(&self, descriptor: &RequestDescriptor) {
        let key = fingerprint(descriptor);
        if self.entries.lock().unwrap().remove(&key).is_some() {
            debug!(fingerprint = %key, "in-flight request settled");
        }
    }

    /// Cancel every tracked request and clear the registry; used on teardown
    pub fn remove_all(&self) {
        let mut entries = self.entries.lock().unwrap();
        if !entries.is_empty() {
            warn!(count = entries.len(), "cancelling all in-flight requests");
        }
        for (_, handle) in entries.drain() {
            handle.abort();
        }
    }

    /// Number of currently tracked in-flight requests
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
