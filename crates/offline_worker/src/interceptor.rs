//! Fetch interception: routes every request to a cache strategy, the submission path, or the
//! network.

use std::rc::Rc;

use log::{debug, info, warn};
use offline_host::{
    CacheKey, ClientMessageKind, FetchError, NetworkClient, OutgoingRequest, ResponseSnapshot,
};

use crate::notifier::ClientNotifier;
use crate::queue::SubmissionQueue;
use crate::routing::{Route, RouteTable};
use crate::strategy::{cache_first, network_first, Served};
use crate::submission::{classify_submission, offline_response, queued_response, SubmissionOutcome};
use crate::tiers::{Tier, TieredCache};

/// Body of the synthesized response for an uncached request while offline.
pub const OFFLINE_FALLBACK_TEXT: &str = "Offline - Please check your connection";

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Answer the page with this response.
    Respond(ResponseSnapshot),
    /// Let the request reach the network untouched.
    Passthrough,
}

/// Request router for one worker version.
#[derive(Clone)]
pub struct Interceptor {
    routes: Rc<RouteTable>,
    tiers: TieredCache,
    queue: SubmissionQueue,
    notifier: ClientNotifier,
    network: Rc<dyn NetworkClient>,
    shell: CacheKey,
}

impl Interceptor {
    /// Creates an interceptor that falls back to `shell` for offline navigations.
    pub fn new(
        routes: Rc<RouteTable>,
        tiers: TieredCache,
        queue: SubmissionQueue,
        notifier: ClientNotifier,
        network: Rc<dyn NetworkClient>,
        shell: CacheKey,
    ) -> Self {
        Self {
            routes,
            tiers,
            queue,
            notifier,
            network,
            shell,
        }
    }

    /// Decides how `request` is answered.
    pub async fn handle(&self, request: &OutgoingRequest) -> FetchDisposition {
        let route = self.routes.classify(request);
        let result = match &route {
            Route::StaticAsset(key) => {
                cache_first(&self.tiers, Tier::Static, key, request, self.network.as_ref()).await
            }
            Route::ResultAsset(key) => {
                cache_first(&self.tiers, Tier::Results, key, request, self.network.as_ref()).await
            }
            Route::Dynamic(key) => {
                network_first(&self.tiers, key, request, self.network.as_ref()).await
            }
            Route::Submission => return FetchDisposition::Respond(self.submit(request).await),
            Route::Bypass => return FetchDisposition::Passthrough,
        };
        match result {
            Ok(Served { response, .. }) => FetchDisposition::Respond(response),
            Err(err) => FetchDisposition::Respond(self.fallback(request, &err).await),
        }
    }

    async fn fallback(&self, request: &OutgoingRequest, err: &FetchError) -> ResponseSnapshot {
        debug!("{} unavailable: {err}", request.url);
        if request.is_navigation() {
            if let Some(shell) = self.tiers.match_in(Tier::Static, &self.shell).await {
                return shell;
            }
        }
        ResponseSnapshot::text(503, OFFLINE_FALLBACK_TEXT)
    }

    async fn submit(&self, request: &OutgoingRequest) -> ResponseSnapshot {
        let reason = match classify_submission(self.network.fetch(request).await) {
            SubmissionOutcome::Accepted(response) => {
                self.notifier.notify(ClientMessageKind::UploadSuccess).await;
                return response;
            }
            SubmissionOutcome::Rejected(response) => return response,
            SubmissionOutcome::Deferred(reason) => reason,
        };

        let Some(payload) = request.submission_payload() else {
            warn!("submission to {} failed ({reason}) with no capturable payload", request.url);
            return offline_response();
        };
        match self.queue.enqueue(payload.clone()).await {
            Ok(entry) => {
                info!("submission deferred as {}: {reason}", entry.id);
                self.notifier.notify(ClientMessageKind::UploadOffline).await;
                queued_response(&entry.id)
            }
            Err(err) => {
                warn!("submission could not be queued: {err}");
                offline_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use offline_host::{
        ManualClock, MemoryClientChannel, MemoryNetwork, MemoryQueueStore, MemoryTierStore, Method,
        RequestBody, SubmissionPayload,
    };
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;
    use crate::config::RoutesConfig;
    use crate::manifest::AssetManifest;
    use crate::tiers::TierNames;

    struct Harness {
        tiers: MemoryTierStore,
        queue: MemoryQueueStore,
        network: MemoryNetwork,
        clients: MemoryClientChannel,
        interceptor: Interceptor,
    }

    fn harness() -> Harness {
        let scope = Url::parse("https://app.local/").expect("scope");
        let manifest = AssetManifest::new("1", &["/".to_string(), "/app.css".to_string()], &scope)
            .expect("manifest");
        let routes = Rc::new(RouteTable::new(&scope, manifest, &RoutesConfig::default()));
        let tier_store = MemoryTierStore::default();
        let queue_store = MemoryQueueStore::default();
        let network = MemoryNetwork::default();
        let clients = MemoryClientChannel::default();
        let clock = Rc::new(ManualClock::at(9));
        let tiers = TieredCache::new(Rc::new(tier_store.clone()), TierNames::new("app", "1"), clock.clone());
        let queue = SubmissionQueue::new(Rc::new(queue_store.clone()), clock.clone(), 60_000);
        let notifier = ClientNotifier::new(Rc::new(clients.clone()), clock);
        let interceptor = Interceptor::new(
            routes,
            tiers,
            queue,
            notifier,
            Rc::new(network.clone()),
            CacheKey::get("https://app.local/").expect("shell"),
        );
        Harness {
            tiers: tier_store,
            queue: queue_store,
            network,
            clients,
            interceptor,
        }
    }

    fn respond(disposition: FetchDisposition) -> ResponseSnapshot {
        match disposition {
            FetchDisposition::Respond(response) => response,
            FetchDisposition::Passthrough => panic!("expected a response"),
        }
    }

    fn upload() -> OutgoingRequest {
        OutgoingRequest::submission(
            "https://app.local/upload",
            SubmissionPayload::image("capture.jpg", "image/jpeg", vec![0xff, 0xd8]),
        )
    }

    #[test]
    fn offline_navigation_falls_back_to_cached_shell() {
        let h = harness();
        h.network.route_text("https://app.local/", "<html>shell</html>");
        respond(block_on(h.interceptor.handle(&OutgoingRequest::navigate("https://app.local/"))));

        h.network.set_online(false);
        let response = respond(block_on(
            h.interceptor.handle(&OutgoingRequest::navigate("https://app.local/history")),
        ));
        assert_eq!(response.body_text(), "<html>shell</html>");
    }

    #[test]
    fn offline_subresource_miss_is_synthesized_503() {
        let h = harness();
        h.network.set_online(false);
        let response = respond(block_on(
            h.interceptor.handle(&OutgoingRequest::get("https://app.local/api/history")),
        ));
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
        assert_eq!(response.body_text(), OFFLINE_FALLBACK_TEXT);
    }

    #[test]
    fn results_are_cached_on_first_fetch() {
        let h = harness();
        let url = "https://app.local/results/crop_1.jpg";
        h.network.route_text(url, "jpeg");
        respond(block_on(h.interceptor.handle(&OutgoingRequest::get(url))));
        h.network.set_online(false);
        let response = respond(block_on(h.interceptor.handle(&OutgoingRequest::get(url))));
        assert_eq!(response.body_text(), "jpeg");
        assert_eq!(h.tiers.entry_count("app-results-v1"), Some(1));
        assert_eq!(h.tiers.entry_count("app-dynamic-v1"), None);
    }

    #[test]
    fn submission_connectivity_failure_is_queued() {
        let h = harness();
        h.network.set_online(false);
        let response = respond(block_on(h.interceptor.handle(&upload())));
        assert_eq!(response.status, 503);
        assert_eq!(h.queue.len(), 1);
        assert_eq!(h.clients.delivered_tags(), vec!["upload-offline"]);
        assert_eq!(h.network.request_count(&Method::Post, "https://app.local/upload"), 1);
    }

    #[test]
    fn submission_application_error_is_not_queued() {
        let h = harness();
        h.network.route(
            Method::Post,
            "https://app.local/upload",
            ResponseSnapshot::text(400, "No image provided"),
        );
        let response = respond(block_on(h.interceptor.handle(&upload())));
        assert_eq!(response.status, 400);
        assert!(h.queue.is_empty());
        assert!(h.clients.delivered().is_empty());
    }

    #[test]
    fn opaque_submission_body_cannot_be_queued() {
        let h = harness();
        h.network.set_online(false);
        let mut request = upload();
        request.body = Some(RequestBody::Bytes(vec![1, 2, 3]));
        let response = respond(block_on(h.interceptor.handle(&request)));
        assert_eq!(response.status, 503);
        assert!(h.queue.is_empty());
    }

    #[test]
    fn other_methods_pass_through() {
        let h = harness();
        let mut request = OutgoingRequest::get("https://app.local/history/3");
        request.method = Method::Delete;
        assert_eq!(block_on(h.interceptor.handle(&request)), FetchDisposition::Passthrough);
        assert!(h.network.requests().is_empty());
    }
}
