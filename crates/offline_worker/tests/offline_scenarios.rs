use futures::executor::block_on;
use offline_host::{
    FetchError, MemoryHost, Method, OutgoingRequest, QueueEntryStatus, QueueStore, ResponseSnapshot,
    SubmissionPayload, TierStore,
};
use offline_worker::{
    DrainOutcome, FetchDisposition, OfflineWorker, WorkerConfig, WorkerError, WorkerLifecycle,
};
use serde_json::json;

const SCOPE: &str = "https://app.local/";
const UPLOAD: &str = "https://app.local/upload";

fn config(version: &str) -> WorkerConfig {
    WorkerConfig::from_toml_str(&format!(
        r#"
version = "{version}"
cache_prefix = "app"

[assets]
files = ["/", "/app.css"]
"#
    ))
    .expect("config")
}

fn serve_assets(host: &MemoryHost) {
    host.network.route_text("https://app.local/", "<html>shell</html>");
    host.network.route_text("https://app.local/app.css", "body{}");
}

fn activated(host: &MemoryHost, version: &str) -> OfflineWorker {
    let worker = OfflineWorker::new(config(version), SCOPE, host.services()).expect("worker");
    block_on(worker.install()).expect("install");
    block_on(worker.activate()).expect("activate");
    worker
}

fn upload(name: &str) -> OutgoingRequest {
    OutgoingRequest::submission(
        UPLOAD,
        SubmissionPayload::image(name, "image/jpeg", name.as_bytes().to_vec()),
    )
}

fn accept_upload(host: &MemoryHost) {
    host.network.script(
        Method::Post,
        UPLOAD,
        Ok(ResponseSnapshot::json(200, &json!({"result_url": "/results/a.jpg", "summary": "ok"}))
            .expect("json")),
    );
}

fn body(disposition: FetchDisposition) -> ResponseSnapshot {
    match disposition {
        FetchDisposition::Respond(response) => response,
        FetchDisposition::Passthrough => panic!("expected the worker to respond"),
    }
}

fn count(tags: &[&str], tag: &str) -> usize {
    tags.iter().filter(|t| **t == tag).count()
}

#[test]
fn installed_manifest_is_served_offline_without_network() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let worker = activated(&host, "1");

    host.network.set_online(false);
    host.network.clear_requests();

    let shell = body(block_on(worker.fetch(&OutgoingRequest::navigate(SCOPE))));
    assert_eq!(shell.status, 200);
    assert_eq!(shell.body_text(), "<html>shell</html>");
    let css = body(block_on(
        worker.fetch(&OutgoingRequest::get("https://app.local/app.css")),
    ));
    assert_eq!(css.body_text(), "body{}");
    assert!(host.network.requests().is_empty());
}

#[test]
fn offline_submission_is_queued_then_drained_on_online() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let worker = activated(&host, "1");

    host.network
        .script(Method::Post, UPLOAD, Err(FetchError::Unreachable("no route".to_string())));
    let queued = body(block_on(worker.fetch(&upload("capture.jpg"))));
    assert_eq!(queued.status, 503);
    assert_eq!(block_on(worker.queue().list()).expect("list").len(), 1);
    assert_eq!(count(&host.clients.delivered_tags(), "upload-offline"), 1);

    accept_upload(&host);
    let report = block_on(worker.online()).expect("drain").expect("report");
    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert!(block_on(worker.queue().list()).expect("list").is_empty());
    assert_eq!(count(&host.clients.delivered_tags(), "upload-success"), 1);
}

#[test]
fn drain_is_fifo_with_one_request_in_flight() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let worker = activated(&host, "1");

    host.network.set_online(false);
    for name in ["first.jpg", "second.jpg", "third.jpg"] {
        block_on(worker.fetch(&upload(name)));
        host.clock.advance(10);
    }
    host.network.set_online(true);
    host.network.clear_requests();
    for _ in 0..3 {
        accept_upload(&host);
    }

    let report = block_on(worker.sync("background-upload"))
        .expect("sync")
        .expect("report");
    assert_eq!(report.submitted, 3);
    let order = host
        .network
        .requests()
        .iter()
        .filter_map(|request| request.submission_payload().map(|p| p.filename.clone()))
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["first.jpg", "second.jpg", "third.jpg"]);
}

#[test]
fn failed_resubmission_leaves_rest_pending_in_order() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let worker = activated(&host, "1");

    host.network.set_online(false);
    block_on(worker.fetch(&upload("a.jpg")));
    block_on(worker.fetch(&upload("b.jpg")));
    host.network.set_online(true);

    accept_upload(&host);
    host.network
        .script(Method::Post, UPLOAD, Err(FetchError::Aborted("reset".to_string())));
    let report = block_on(worker.online()).expect("drain").expect("report");
    assert_eq!(report.outcome, DrainOutcome::Interrupted);
    assert_eq!(report.submitted, 1);

    let remaining = block_on(worker.queue().list()).expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payload.filename, "b.jpg");
    assert_eq!(remaining[0].status, QueueEntryStatus::Pending);
}

#[test]
fn application_error_is_returned_and_never_queued() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let worker = activated(&host, "1");
    host.network.route(
        Method::Post,
        UPLOAD,
        ResponseSnapshot::json(400, &json!({"error": "No image file provided"})).expect("json"),
    );

    let response = body(block_on(worker.fetch(&upload("empty.jpg"))));
    assert_eq!(response.status, 400);
    assert!(block_on(host.queue.list_entries()).expect("entries").is_empty());
    assert!(host.clients.delivered().is_empty());
}

#[test]
fn activation_deletes_previous_version_tiers() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    host.network.route_text("https://app.local/history", "[]");
    let v1 = activated(&host, "1");
    block_on(v1.fetch(&OutgoingRequest::get("https://app.local/history")));
    assert_eq!(host.tiers.entry_count("app-dynamic-v1"), Some(1));

    let v2 = activated(&host, "2");
    assert_eq!(v2.lifecycle(), WorkerLifecycle::Activated);
    let names = block_on(host.tiers.tier_names()).expect("names");
    assert_eq!(names, vec!["app-static-v2".to_string()]);
}

#[test]
fn failed_install_keeps_previous_version_serving() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let v1 = activated(&host, "1");

    host.network.script(
        Method::Get,
        "https://app.local/app.css",
        Ok(ResponseSnapshot::text(500, "boom")),
    );
    let v2 = OfflineWorker::new(config("2"), SCOPE, host.services()).expect("worker");
    assert!(matches!(block_on(v2.install()), Err(WorkerError::Install(_))));
    assert_eq!(v2.lifecycle(), WorkerLifecycle::Redundant);
    assert!(block_on(v2.activate()).is_err());

    let names = block_on(host.tiers.tier_names()).expect("names");
    assert_eq!(names, vec!["app-static-v1".to_string()]);

    host.network.set_online(false);
    let shell = body(block_on(v1.fetch(&OutgoingRequest::navigate(SCOPE))));
    assert_eq!(shell.body_text(), "<html>shell</html>");
}

#[test]
fn restarted_worker_serves_cache_and_drains_queue_without_reinstall() {
    let host = MemoryHost::at(1_000);
    serve_assets(&host);
    let first = activated(&host, "1");
    host.network.set_online(false);
    block_on(first.fetch(&upload("a.jpg")));
    drop(first);

    let restarted = OfflineWorker::new(config("1"), SCOPE, host.services()).expect("worker");
    host.network.clear_requests();
    let shell = body(block_on(restarted.fetch(&OutgoingRequest::navigate(SCOPE))));
    assert_eq!(shell.body_text(), "<html>shell</html>");
    let css = body(block_on(
        restarted.fetch(&OutgoingRequest::get("https://app.local/app.css")),
    ));
    assert_eq!(css.body_text(), "body{}");
    assert!(host.network.requests().is_empty());
    assert_eq!(restarted.lifecycle(), WorkerLifecycle::Activated);

    host.network.set_online(true);
    accept_upload(&host);
    let report = block_on(restarted.online()).expect("drain").expect("report");
    assert_eq!(report.submitted, 1);
    assert!(host.queue.is_empty());
    assert_eq!(count(&host.clients.delivered_tags(), "upload-success"), 1);
}
