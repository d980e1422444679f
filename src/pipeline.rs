//! Interceptor stages around transport dispatch
//!
//! The pipeline wires duplicate tracking and the caller-supplied interceptor
//! hooks around [`Transport::execute`]. Stage order is load-bearing: the dedup
//! registration runs before the request hook, and the dedup removal runs
//! before the response hook, so a hook that inspects pending-request state
//! always sees it already cleaned up. With no hook bundle configured the
//! pipeline is a pure pass-through, duplicate tracking included.

use std::sync::Arc;

use futures::future::{Abortable, Aborted};
use tracing::debug;

use crate::config::{RequestOptions, TransformHooks};
use crate::error::{HttpError, Result};
use crate::pending::PendingRequestRegistry;
use crate::request::{RawResponse, RequestDescriptor};
use crate::transport::Transport;

/// Request/response interceptor stages sharing one pending-request registry
pub struct InterceptorPipeline {
    hooks: Option<TransformHooks>,
    registry: Arc<PendingRequestRegistry>,
}

impl InterceptorPipeline {
    pub fn new(hooks: Option<TransformHooks>, registry: Arc<PendingRequestRegistry>) -> Self {
        Self { hooks, registry }
    }

    /// Number of tracked in-flight requests
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Cancel every tracked in-flight request
    pub fn cancel_all(&self) {
        self.registry.remove_all();
    }

    /// Drive one request through the interceptor stages and the transport
    pub async fn dispatch(
        &self,
        transport: &Arc<dyn Transport>,
        descriptor: RequestDescriptor,
        options: &RequestOptions,
    ) -> Result<RawResponse> {
        let hooks = match &self.hooks {
            Some(hooks) => hooks,
            None => return transport.execute(descriptor).await,
        };

        // Per-request flag wins over the merged client-level default.
        let dedup = !descriptor
            .ignore_dedup
            .or(options.ignore_dedup)
            .unwrap_or(false);

        let registration = if dedup {
            Some(self.registry.add_pending(&descriptor))
        } else {
            None
        };

        // Request stage: dedup registration above happens first, then the
        // caller's interceptor replaces the working descriptor.
        let mut descriptor = descriptor;
        if let Some(interceptor) = &hooks.request_interceptor {
            let registered = descriptor.clone();
            descriptor = match interceptor(descriptor) {
                Ok(next) => next,
                Err(err) => {
                    // Never dispatched; the fresh entry must not linger.
                    if dedup {
                        self.registry.remove_pending(&registered);
                    }
                    return Err(match &hooks.on_request_intercept_error {
                        Some(catch) => catch(err),
                        None => err,
                    });
                }
            };
        }

        let settled_key = descriptor.clone();
        let result = match registration {
            Some((fingerprint, registration)) => {
                match Abortable::new(transport.execute(descriptor), registration).await {
                    Ok(result) => result,
                    Err(Aborted) => {
                        debug!(%fingerprint, "request superseded by newer duplicate");
                        // The superseding request already replaced the
                        // registry entry; nothing to remove here.
                        return Err(HttpError::Cancelled { fingerprint });
                    }
                }
            }
            None => transport.execute(descriptor).await,
        };

        match result {
            Ok(mut response) => {
                // Response stage: key the removal off the response's own
                // descriptor, which is the one the transport actually saw.
                if dedup {
                    self.registry.remove_pending(&response.request);
                }
                if let Some(interceptor) = &hooks.response_interceptor {
                    response = match interceptor(response) {
                        Ok(next) => next,
                        Err(err) => {
                            return Err(match &hooks.on_response_intercept_error {
                                Some(catch) => catch(err),
                                None => err,
                            })
                        }
                    };
                }
                Ok(response)
            }
            Err(err) => {
                // Settled with an error; the entry is removed either way.
                if dedup {
                    self.registry.remove_pending(&settled_key);
                }
                Err(match &hooks.on_response_intercept_error {
                    Some(catch) => catch(err),
                    None => err,
                })
            }
        }
    }
}
