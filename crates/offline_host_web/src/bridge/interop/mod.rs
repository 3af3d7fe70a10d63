//! Shared transport interop for browser bridge domains.
//!
//! Calls are routed to the wasm implementation (inline JS over the Cache API, IndexedDB,
//! `fetch`, and `Clients`) or to the native shim, behind one uniform API.

use offline_host::{
    ClientMessage, FetchError, Notification, OutgoingRequest, QueueEntry, ResponseSnapshot,
};

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

#[cfg(target_arch = "wasm32")]
pub use wasm::{build_response, describe_request, js_error_to_string, passthrough};

pub async fn tier_open(name: &str) -> Result<(), String> {
    imp::tier_open(name).await
}

pub async fn tier_match(name: &str, url: &str) -> Result<Option<ResponseSnapshot>, String> {
    imp::tier_match(name, url).await
}

pub async fn tier_put(name: &str, url: &str, response: &ResponseSnapshot) -> Result<(), String> {
    imp::tier_put(name, url, response).await
}

pub async fn tier_delete(name: &str) -> Result<bool, String> {
    imp::tier_delete(name).await
}

pub async fn tier_names() -> Result<Vec<String>, String> {
    imp::tier_names().await
}

pub async fn queue_load(id: &str) -> Result<Option<QueueEntry>, String> {
    imp::queue_load(id).await
}

pub async fn queue_save(entry: &QueueEntry) -> Result<(), String> {
    imp::queue_save(entry).await
}

pub async fn queue_delete(id: &str) -> Result<(), String> {
    imp::queue_delete(id).await
}

pub async fn queue_list() -> Result<Vec<QueueEntry>, String> {
    imp::queue_list().await
}

pub async fn network_fetch(request: &OutgoingRequest) -> Result<ResponseSnapshot, FetchError> {
    imp::network_fetch(request).await
}

pub async fn clients_broadcast(message: &ClientMessage) -> Result<usize, String> {
    imp::clients_broadcast(message).await
}

pub async fn show_notification(notification: &Notification) -> Result<(), String> {
    imp::show_notification(notification).await
}

pub async fn open_window(url: &str) -> Result<(), String> {
    imp::open_window(url).await
}
