//! Service-worker capability bridge for the `offline_host_web` adapters.
//!
//! Organized by host domain (`cache`, `queue`, `network`, `clients`) over a shared
//! `interop` layer that holds the wasm/JS glue and the native shim.

mod cache;
mod clients;
mod interop;
mod network;
mod queue;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod wire;

pub(crate) use cache::{tier_delete, tier_match, tier_names, tier_open, tier_put};
pub(crate) use clients::{clients_broadcast, open_window, show_notification};
#[cfg(target_arch = "wasm32")]
pub(crate) use interop::{build_response, describe_request, js_error_to_string, passthrough};
pub(crate) use network::network_fetch;
pub(crate) use queue::{queue_delete, queue_list, queue_load, queue_save};
