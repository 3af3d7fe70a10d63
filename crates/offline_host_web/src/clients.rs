//! `Clients`-backed page channel.

use offline_host::{ClientChannel, ClientFuture, ClientMessage, Notification};

#[derive(Debug, Clone, Copy, Default)]
/// Page channel over `self.clients` and `self.registration`.
pub struct WebClientChannel;

impl ClientChannel for WebClientChannel {
    fn broadcast<'a>(
        &'a self,
        message: &'a ClientMessage,
    ) -> ClientFuture<'a, Result<usize, String>> {
        Box::pin(async move { crate::bridge::clients_broadcast(message).await })
    }

    fn show_notification<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> ClientFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::show_notification(notification).await })
    }

    fn open_window<'a>(&'a self, url: &'a str) -> ClientFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::open_window(url).await })
    }
}
