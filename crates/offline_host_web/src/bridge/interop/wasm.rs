use super::*;
use js_sys::{Promise, Reflect, Uint8Array};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::bridge::wire::{ClientQuery, FetchFailure, RequestHead, ResponseHead};

#[wasm_bindgen(inline_js = r#"
const DB_NAME = 'offline_worker';
const DB_VERSION = 1;
const QUEUE_STORE = 'submission_queue';
const STORED_AT_HEADER = 'x-offline-stored-at';

function fail(message) {
  throw new Error(message);
}

function requestToPromise(req) {
  return new Promise((resolve, reject) => {
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('IndexedDB request failed'));
  });
}

function txDone(tx) {
  return new Promise((resolve, reject) => {
    tx.oncomplete = () => resolve();
    tx.onabort = () => reject(tx.error || new Error('IndexedDB transaction aborted'));
    tx.onerror = () => reject(tx.error || new Error('IndexedDB transaction error'));
  });
}

async function openDb() {
  if (typeof indexedDB === 'undefined') {
    fail('IndexedDB is unavailable in this worker context');
  }
  return await new Promise((resolve, reject) => {
    const req = indexedDB.open(DB_NAME, DB_VERSION);
    req.onupgradeneeded = () => {
      const db = req.result;
      if (!db.objectStoreNames.contains(QUEUE_STORE)) {
        db.createObjectStore(QUEUE_STORE, { keyPath: 'id' });
      }
    };
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('Failed to open IndexedDB'));
  });
}

async function withQueue(mode, fn) {
  const db = await openDb();
  const tx = db.transaction(QUEUE_STORE, mode);
  const done = txDone(tx);
  const result = await fn(tx.objectStore(QUEUE_STORE));
  await done;
  db.close();
  return result;
}

function cacheStorage() {
  if (typeof caches === 'undefined') {
    fail('Cache API unavailable');
  }
  return caches;
}

function nullBodyStatus(status) {
  return status === 101 || status === 204 || status === 205 || status === 304;
}

async function describeResponse(res) {
  const headers = [];
  let storedAt = null;
  for (const [name, value] of res.headers) {
    if (name === STORED_AT_HEADER) {
      storedAt = Number(value);
    } else {
      headers.push([name, value]);
    }
  }
  return {
    head: {
      status: res.status,
      statusText: res.statusText,
      headers,
      storedAtUnixMs: Number.isFinite(storedAt) ? storedAt : null,
    },
    body: new Uint8Array(await res.arrayBuffer()),
  };
}

export async function jsTierOpen(name) {
  await cacheStorage().open(name);
  return null;
}

export async function jsTierMatch(name, url) {
  const storage = cacheStorage();
  if (!(await storage.has(name))) return null;
  const cache = await storage.open(name);
  const res = await cache.match(new Request(url, { method: 'GET' }));
  return res ? await describeResponse(res) : null;
}

export async function jsTierPut(name, url, head, body) {
  const cache = await cacheStorage().open(name);
  const headers = new Headers(head.headers);
  if (head.storedAtUnixMs != null) {
    headers.set(STORED_AT_HEADER, String(head.storedAtUnixMs));
  }
  const res = new Response(nullBodyStatus(head.status) ? null : body, {
    status: head.status,
    statusText: head.statusText,
    headers,
  });
  await cache.put(new Request(url, { method: 'GET' }), res);
  return null;
}

export async function jsTierDelete(name) {
  return await cacheStorage().delete(name);
}

export async function jsTierNames() {
  return await cacheStorage().keys();
}

export async function jsQueueLoad(id) {
  const row = await withQueue('readonly', (store) => requestToPromise(store.get(id)));
  return row ?? null;
}

export async function jsQueueSave(entry) {
  if (!entry || typeof entry !== 'object' || typeof entry.id !== 'string') {
    fail('Invalid queue entry');
  }
  await withQueue('readwrite', (store) => requestToPromise(store.put(entry)));
  return null;
}

export async function jsQueueDelete(id) {
  await withQueue('readwrite', (store) => requestToPromise(store.delete(id)));
  return null;
}

export async function jsQueueList() {
  const rows = await withQueue('readonly', (store) => requestToPromise(store.getAll()));
  return (rows || []).sort((a, b) => Number(a.sequence) - Number(b.sequence));
}

export async function jsNetworkFetch(head, body) {
  const headers = new Headers(head.headers);
  const init = { method: head.method, headers };
  if (head.submission) {
    const form = new FormData();
    const blob = new Blob([body], { type: head.submission.contentType });
    form.append(head.submission.fieldName, blob, head.submission.filename);
    headers.delete('content-type');
    headers.delete('content-length');
    init.body = form;
  } else if (body && head.method !== 'GET' && head.method !== 'HEAD') {
    init.body = body;
  }
  let res;
  try {
    res = await fetch(head.url, init);
  } catch (err) {
    const message = String((err && err.message) || err);
    if (err && err.name === 'AbortError') return { failure: { kind: 'aborted', message } };
    if (err instanceof TypeError) return { failure: { kind: 'unreachable', message } };
    return { failure: { kind: 'invalid', message } };
  }
  return await describeResponse(res);
}

export async function jsClientsBroadcast(message, query) {
  const pages = await self.clients.matchAll(query);
  for (const page of pages) {
    page.postMessage(message);
  }
  return pages.length;
}

export async function jsShowNotification(notification) {
  await self.registration.showNotification(notification.title, {
    body: notification.body,
    icon: notification.icon ?? undefined,
    badge: notification.badge ?? undefined,
    tag: notification.tag ?? undefined,
  });
  return null;
}

export async function jsOpenWindow(url) {
  if (typeof self.clients.openWindow !== 'function') {
    fail('clients.openWindow is unavailable');
  }
  await self.clients.openWindow(url);
  return null;
}

export async function jsDescribeRequest(request, submissionField) {
  const head = {
    method: request.method,
    url: request.url,
    mode: request.mode === 'navigate' ? 'navigate' : 'subresource',
    headers: [...request.headers],
    submission: null,
  };
  let body = null;
  const contentType = request.headers.get('content-type') || '';
  if (request.method === 'POST' && contentType.startsWith('multipart/form-data')) {
    const form = await request.clone().formData();
    const file = form.get(submissionField);
    if (file && typeof file === 'object' && typeof file.arrayBuffer === 'function') {
      head.submission = {
        fieldName: submissionField,
        filename: file.name || 'upload',
        contentType: file.type || 'application/octet-stream',
      };
      body = new Uint8Array(await file.arrayBuffer());
    }
  } else if (request.method !== 'GET' && request.method !== 'HEAD') {
    body = new Uint8Array(await request.clone().arrayBuffer());
  }
  return { head, body };
}

export function jsBuildResponse(head, body) {
  return new Response(nullBodyStatus(head.status) ? null : body, {
    status: head.status,
    statusText: head.statusText,
    headers: new Headers(head.headers),
  });
}

export function jsPassthrough(request) {
  return fetch(request);
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsTierOpen)]
    fn js_tier_open(name: &str) -> Promise;
    #[wasm_bindgen(js_name = jsTierMatch)]
    fn js_tier_match(name: &str, url: &str) -> Promise;
    #[wasm_bindgen(js_name = jsTierPut)]
    fn js_tier_put(name: &str, url: &str, head: JsValue, body: JsValue) -> Promise;
    #[wasm_bindgen(js_name = jsTierDelete)]
    fn js_tier_delete(name: &str) -> Promise;
    #[wasm_bindgen(js_name = jsTierNames)]
    fn js_tier_names() -> Promise;

    #[wasm_bindgen(js_name = jsQueueLoad)]
    fn js_queue_load(id: &str) -> Promise;
    #[wasm_bindgen(js_name = jsQueueSave)]
    fn js_queue_save(entry: JsValue) -> Promise;
    #[wasm_bindgen(js_name = jsQueueDelete)]
    fn js_queue_delete(id: &str) -> Promise;
    #[wasm_bindgen(js_name = jsQueueList)]
    fn js_queue_list() -> Promise;

    #[wasm_bindgen(js_name = jsNetworkFetch)]
    fn js_network_fetch(head: JsValue, body: JsValue) -> Promise;

    #[wasm_bindgen(js_name = jsClientsBroadcast)]
    fn js_clients_broadcast(message: JsValue, query: JsValue) -> Promise;
    #[wasm_bindgen(js_name = jsShowNotification)]
    fn js_show_notification(notification: JsValue) -> Promise;
    #[wasm_bindgen(js_name = jsOpenWindow)]
    fn js_open_window(url: &str) -> Promise;

    #[wasm_bindgen(js_name = jsDescribeRequest)]
    fn js_describe_request(request: &JsValue, submission_field: &str) -> Promise;
    #[wasm_bindgen(js_name = jsBuildResponse)]
    fn js_build_response(head: JsValue, body: JsValue) -> JsValue;
    #[wasm_bindgen(js_name = jsPassthrough)]
    fn js_passthrough(request: &JsValue) -> Promise;
}

async fn await_promise(promise: Promise) -> Result<JsValue, String> {
    JsFuture::from(promise).await.map_err(js_error_to_string)
}

pub fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = Reflect::get(&err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

async fn promise_to_json<T: DeserializeOwned>(promise: Promise) -> Result<T, String> {
    let value = await_promise(promise).await?;
    from_value(value).map_err(|e| e.to_string())
}

async fn promise_to_optional_json<T: DeserializeOwned>(
    promise: Promise,
) -> Result<Option<T>, String> {
    let value = await_promise(promise).await?;
    if value.is_null() || value.is_undefined() {
        Ok(None)
    } else {
        from_value(value).map(Some).map_err(|e| e.to_string())
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

fn bytes_to_js(bytes: &[u8]) -> JsValue {
    Uint8Array::from(bytes).into()
}

fn field(value: &JsValue, name: &str) -> Result<JsValue, String> {
    Reflect::get(value, &JsValue::from_str(name)).map_err(js_error_to_string)
}

fn optional_bytes(value: &JsValue) -> Option<Vec<u8>> {
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(Uint8Array::new(value).to_vec())
    }
}

fn read_response(value: &JsValue) -> Result<ResponseSnapshot, String> {
    let head: ResponseHead = from_value(field(value, "head")?).map_err(|e| e.to_string())?;
    let body = optional_bytes(&field(value, "body")?).unwrap_or_default();
    Ok(head.into_snapshot(body))
}

pub async fn tier_open(name: &str) -> Result<(), String> {
    let _ = await_promise(js_tier_open(name)).await?;
    Ok(())
}

pub async fn tier_match(name: &str, url: &str) -> Result<Option<ResponseSnapshot>, String> {
    let value = await_promise(js_tier_match(name, url)).await?;
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    read_response(&value).map(Some)
}

pub async fn tier_put(name: &str, url: &str, response: &ResponseSnapshot) -> Result<(), String> {
    let head = to_js(&ResponseHead::from_snapshot(response))?;
    let _ = await_promise(js_tier_put(name, url, head, bytes_to_js(&response.body))).await?;
    Ok(())
}

pub async fn tier_delete(name: &str) -> Result<bool, String> {
    let value = await_promise(js_tier_delete(name)).await?;
    Ok(value.as_bool().unwrap_or(false))
}

pub async fn tier_names() -> Result<Vec<String>, String> {
    promise_to_json(js_tier_names()).await
}

pub async fn queue_load(id: &str) -> Result<Option<QueueEntry>, String> {
    promise_to_optional_json(js_queue_load(id)).await
}

pub async fn queue_save(entry: &QueueEntry) -> Result<(), String> {
    let _ = await_promise(js_queue_save(to_js(entry)?)).await?;
    Ok(())
}

pub async fn queue_delete(id: &str) -> Result<(), String> {
    let _ = await_promise(js_queue_delete(id)).await?;
    Ok(())
}

pub async fn queue_list() -> Result<Vec<QueueEntry>, String> {
    promise_to_json(js_queue_list()).await
}

pub async fn network_fetch(request: &OutgoingRequest) -> Result<ResponseSnapshot, FetchError> {
    let (head, body) = RequestHead::from_request(request);
    let head = to_js(&head).map_err(FetchError::InvalidRequest)?;
    let body = body.as_deref().map_or(JsValue::NULL, bytes_to_js);
    let value = await_promise(js_network_fetch(head, body))
        .await
        .map_err(FetchError::Unreachable)?;
    let failure = field(&value, "failure").map_err(FetchError::InvalidRequest)?;
    if !failure.is_null() && !failure.is_undefined() {
        let failure: FetchFailure =
            from_value(failure).map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        return Err(failure.into());
    }
    read_response(&value).map_err(FetchError::InvalidRequest)
}

pub async fn clients_broadcast(message: &ClientMessage) -> Result<usize, String> {
    let query = to_js(&ClientQuery::CONTROLLED_WINDOWS)?;
    let value = await_promise(js_clients_broadcast(to_js(message)?, query)).await?;
    Ok(value.as_f64().map_or(0, |count| count as usize))
}

pub async fn show_notification(notification: &Notification) -> Result<(), String> {
    let _ = await_promise(js_show_notification(to_js(notification)?)).await?;
    Ok(())
}

pub async fn open_window(url: &str) -> Result<(), String> {
    let _ = await_promise(js_open_window(url)).await?;
    Ok(())
}

pub async fn describe_request(
    request: &JsValue,
    submission_field: &str,
) -> Result<OutgoingRequest, String> {
    let value = await_promise(js_describe_request(request, submission_field)).await?;
    let head: RequestHead = from_value(field(&value, "head")?).map_err(|e| e.to_string())?;
    let body = optional_bytes(&field(&value, "body")?);
    Ok(head.into_request(body))
}

pub fn build_response(response: &ResponseSnapshot) -> Result<JsValue, String> {
    let head = to_js(&ResponseHead::from_snapshot(response))?;
    Ok(js_build_response(head, bytes_to_js(&response.body)))
}

pub fn passthrough(request: &JsValue) -> Promise {
    js_passthrough(request)
}
