//! Network transport contract and a scriptable in-memory adapter.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use thiserror::Error;

use crate::http::{Method, OutgoingRequest, ResponseSnapshot};

/// Object-safe boxed future used by [`NetworkClient`].
pub type NetworkFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Transport-level failure; HTTP error statuses are responses, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The host could not reach the network or the server.
    #[error("network unreachable: {0}")]
    Unreachable(String),
    /// The transfer was aborted before a response arrived.
    #[error("request aborted: {0}")]
    Aborted(String),
    /// The request could not be constructed for the transport.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Returns whether the failure is attributable to missing connectivity.
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Aborted(_))
    }
}

/// Host transport that performs real network requests.
pub trait NetworkClient {
    /// Sends `request` and resolves to the full response snapshot.
    fn fetch<'a>(
        &'a self,
        request: &'a OutgoingRequest,
    ) -> NetworkFuture<'a, Result<ResponseSnapshot, FetchError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Transport for targets without network access; every request is unreachable.
pub struct OfflineNetworkClient;

impl NetworkClient for OfflineNetworkClient {
    fn fetch<'a>(
        &'a self,
        request: &'a OutgoingRequest,
    ) -> NetworkFuture<'a, Result<ResponseSnapshot, FetchError>> {
        Box::pin(async move { Err(FetchError::Unreachable(request.url.clone())) })
    }
}

type RouteKey = (Method, String);

#[derive(Debug, Default)]
struct MemoryNetworkState {
    routes: HashMap<RouteKey, ResponseSnapshot>,
    scripted: HashMap<RouteKey, VecDeque<Result<ResponseSnapshot, FetchError>>>,
    requests: Vec<OutgoingRequest>,
}

/// Scriptable in-memory transport used by tests.
///
/// Requests are answered, in order, from one-shot scripted outcomes, then from fixed routes,
/// then with `404`. While offline every request fails with [`FetchError::Unreachable`] and no
/// scripted outcome is consumed. Every attempt is recorded.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    online: Rc<Cell<bool>>,
    state: Rc<RefCell<MemoryNetworkState>>,
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self {
            online: Rc::new(Cell::new(true)),
            state: Rc::new(RefCell::new(MemoryNetworkState::default())),
        }
    }
}

impl MemoryNetwork {
    /// Toggles simulated connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    /// Serves `response` for every `method url` request.
    pub fn route(&self, method: Method, url: &str, response: ResponseSnapshot) {
        self.state
            .borrow_mut()
            .routes
            .insert((method, url.to_string()), response);
    }

    /// Serves a `200 text/plain` body for `GET url`.
    pub fn route_text(&self, url: &str, body: &str) {
        self.route(Method::Get, url, ResponseSnapshot::text(200, body));
    }

    /// Queues a one-shot outcome for the next `method url` request.
    pub fn script(
        &self,
        method: Method,
        url: &str,
        outcome: Result<ResponseSnapshot, FetchError>,
    ) {
        self.state
            .borrow_mut()
            .scripted
            .entry((method, url.to_string()))
            .or_default()
            .push_back(outcome);
    }

    /// Every request attempted so far, including failed ones.
    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.state.borrow().requests.clone()
    }

    /// Number of attempts made for `method url`.
    pub fn request_count(&self, method: &Method, url: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|request| &request.method == method && request.url == url)
            .count()
    }

    /// Forgets recorded requests.
    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }
}

impl NetworkClient for MemoryNetwork {
    fn fetch<'a>(
        &'a self,
        request: &'a OutgoingRequest,
    ) -> NetworkFuture<'a, Result<ResponseSnapshot, FetchError>> {
        Box::pin(async move {
            let mut state = self.state.borrow_mut();
            state.requests.push(request.clone());
            if !self.online.get() {
                return Err(FetchError::Unreachable(format!(
                    "offline: {} {}",
                    request.method.as_str(),
                    request.url
                )));
            }

            let key = (request.method.clone(), request.url.clone());
            if let Some(outcome) = state.scripted.get_mut(&key).and_then(VecDeque::pop_front) {
                return outcome;
            }
            Ok(state
                .routes
                .get(&key)
                .cloned()
                .unwrap_or_else(|| ResponseSnapshot::text(404, "not found")))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn memory_network_serves_routes_scripts_and_404() {
        let network = MemoryNetwork::default();
        network.route_text("https://app.local/", "shell");
        network.script(
            Method::Get,
            "https://app.local/",
            Err(FetchError::Aborted("reset".to_string())),
        );

        let first = block_on(network.fetch(&OutgoingRequest::get("https://app.local/")));
        assert_eq!(first, Err(FetchError::Aborted("reset".to_string())));
        let second = block_on(network.fetch(&OutgoingRequest::get("https://app.local/")))
            .expect("route");
        assert_eq!(second.body_text(), "shell");
        let missing = block_on(network.fetch(&OutgoingRequest::get("https://app.local/nope")))
            .expect("404");
        assert_eq!(missing.status, 404);
        assert_eq!(network.request_count(&Method::Get, "https://app.local/"), 2);
    }

    #[test]
    fn memory_network_offline_fails_without_consuming_scripts() {
        let network = MemoryNetwork::default();
        network.script(
            Method::Get,
            "https://app.local/a",
            Ok(ResponseSnapshot::text(200, "scripted")),
        );
        network.set_online(false);
        let err = block_on(network.fetch(&OutgoingRequest::get("https://app.local/a")))
            .expect_err("offline");
        assert!(err.is_connectivity());

        network.set_online(true);
        let ok = block_on(network.fetch(&OutgoingRequest::get("https://app.local/a")))
            .expect("online");
        assert_eq!(ok.body_text(), "scripted");
        assert_eq!(network.requests().len(), 2);
    }

    #[test]
    fn invalid_request_is_not_a_connectivity_failure() {
        assert!(!FetchError::InvalidRequest("bad".to_string()).is_connectivity());
        let err = block_on(OfflineNetworkClient.fetch(&OutgoingRequest::get("https://x.test/")))
            .expect_err("offline client");
        assert!(err.is_connectivity());
    }
}
