//! `fetch`-backed network client.

use offline_host::{FetchError, NetworkClient, NetworkFuture, OutgoingRequest, ResponseSnapshot};

#[derive(Debug, Clone, Copy, Default)]
/// Network client that issues requests with the worker-global `fetch`.
///
/// Submission bodies are re-encoded as `multipart/form-data` with the captured field.
pub struct WebNetworkClient;

impl NetworkClient for WebNetworkClient {
    fn fetch<'a>(
        &'a self,
        request: &'a OutgoingRequest,
    ) -> NetworkFuture<'a, Result<ResponseSnapshot, FetchError>> {
        Box::pin(async move { crate::bridge::network_fetch(request).await })
    }
}
