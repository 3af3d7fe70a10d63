//! `wasm_bindgen` surface driven by the service-worker bootstrap script.
//!
//! The script forwards each global event to one method here and awaits the returned promise
//! inside `event.waitUntil` / `event.respondWith`.

use std::rc::Rc;

use js_sys::Promise;
use log::LevelFilter;
use offline_host::{PageMessage, SUBMISSION_FIELD_NAME};
use offline_worker::{FetchDisposition, OfflineWorker, WorkerError};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::boot::{start_worker, DrainSummary};
use crate::bridge::{build_response, describe_request, js_error_to_string, passthrough};
use crate::logging::init_logging;

fn worker_error(err: WorkerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
/// One worker version bound to the service-worker global scope.
pub struct ServiceWorkerHost {
    worker: Rc<OfflineWorker>,
}

#[wasm_bindgen]
impl ServiceWorkerHost {
    /// Starts a worker for `scope`, using `config_toml` or the embedded configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(scope: &str, config_toml: Option<String>) -> Result<ServiceWorkerHost, JsValue> {
        init_logging(LevelFilter::Info);
        let worker = start_worker(scope, config_toml.as_deref()).map_err(worker_error)?;
        Ok(Self {
            worker: Rc::new(worker),
        })
    }

    /// Active cache version.
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> String {
        self.worker.config().version.clone()
    }

    /// Current lifecycle token.
    #[wasm_bindgen(getter)]
    pub fn lifecycle(&self) -> String {
        self.worker.lifecycle().as_str().to_string()
    }

    /// Whether the bootstrap should call `skipWaiting()`.
    #[wasm_bindgen(js_name = skipWaitingRequested)]
    pub fn skip_waiting_requested(&self) -> bool {
        self.worker.skip_waiting_requested()
    }

    /// Populates the static tier; resolves to the number of cached assets.
    pub fn install(&self) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let report = worker.install().await.map_err(worker_error)?;
            Ok(JsValue::from_f64(report.cached as f64))
        })
    }

    /// Deletes stale tiers; resolves to the deleted tier names.
    pub fn activate(&self) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let deleted = worker.activate().await.map_err(worker_error)?;
            to_js(&deleted)
        })
    }

    /// Resolves to the `Response` for `request`.
    #[wasm_bindgen(js_name = handleFetch)]
    pub fn handle_fetch(&self, request: JsValue) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let outgoing = describe_request(&request, SUBMISSION_FIELD_NAME)
                .await
                .map_err(|e| JsValue::from_str(&e))?;
            match worker.fetch(&outgoing).await {
                FetchDisposition::Respond(response) => {
                    build_response(&response).map_err(|e| JsValue::from_str(&e))
                }
                FetchDisposition::Passthrough => JsFuture::from(passthrough(&request))
                    .await
                    .map_err(|e| JsValue::from_str(&js_error_to_string(e))),
            }
        })
    }

    /// Handles a one-off `sync` event; resolves to a drain summary or `null`.
    pub fn sync(&self, tag: String) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let report = worker.sync(&tag).await.map_err(worker_error)?;
            to_js(&report.as_ref().map(DrainSummary::from))
        })
    }

    /// Handles a `periodicsync` event; resolves to a drain summary or `null`.
    #[wasm_bindgen(js_name = periodicSync)]
    pub fn periodic_sync(&self, tag: String) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let report = worker.periodic_sync(&tag).await.map_err(worker_error)?;
            to_js(&report.as_ref().map(DrainSummary::from))
        })
    }

    /// Handles the global `online` event.
    pub fn online(&self) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let report = worker.online().await.map_err(worker_error)?;
            to_js(&report.as_ref().map(DrainSummary::from))
        })
    }

    /// Handles a page message; resolves to the reply for the sender, or `null`.
    ///
    /// Unknown message shapes resolve to `null` without touching the worker.
    pub fn message(&self, data: JsValue) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let message: PageMessage = match serde_wasm_bindgen::from_value(data) {
                Ok(message) => message,
                Err(err) => {
                    log::debug!("ignoring page message: {err}");
                    return Ok(JsValue::NULL);
                }
            };
            let reply = worker.message(message).await.map_err(worker_error)?;
            to_js(&reply)
        })
    }

    /// Handles a push event carrying `data` text.
    pub fn push(&self, data: Option<String>) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let shown = worker.push(data.as_deref()).await;
            to_js(&shown)
        })
    }

    /// Handles a notification click; resolves to the opened URL.
    #[wasm_bindgen(js_name = notificationClick)]
    pub fn notification_click(&self) -> Promise {
        let worker = Rc::clone(&self.worker);
        future_to_promise(async move {
            let url = worker.notification_click().await;
            Ok(JsValue::from_str(url))
        })
    }
}
