//! Fire-and-forget page notifications.

use std::rc::Rc;

use log::{debug, warn};
use offline_host::{ClientChannel, ClientMessage, ClientMessageKind, Clock};

/// Broadcasts timestamped [`ClientMessage`]s to controlled pages.
#[derive(Clone)]
pub struct ClientNotifier {
    channel: Rc<dyn ClientChannel>,
    clock: Rc<dyn Clock>,
}

impl ClientNotifier {
    /// Creates a notifier over `channel`.
    pub fn new(channel: Rc<dyn ClientChannel>, clock: Rc<dyn Clock>) -> Self {
        Self { channel, clock }
    }

    /// Builds a message stamped with the current time.
    pub fn message(&self, kind: ClientMessageKind) -> ClientMessage {
        ClientMessage::new(kind, self.clock.now_unix_ms())
    }

    /// Broadcasts `kind` and returns how many pages it reached.
    ///
    /// Channel failures are logged and reported as zero recipients; callers never depend on
    /// delivery.
    pub async fn notify(&self, kind: ClientMessageKind) -> usize {
        let message = self.message(kind);
        match self.channel.broadcast(&message).await {
            Ok(recipients) => {
                debug!("{} reached {recipients} page(s)", message.kind.tag());
                recipients
            }
            Err(err) => {
                warn!("{} broadcast failed: {err}", message.kind.tag());
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use offline_host::{ClientFuture, ManualClock, MemoryClientChannel, Notification};

    use super::*;

    struct BrokenChannel;

    impl ClientChannel for BrokenChannel {
        fn broadcast<'a>(
            &'a self,
            _message: &'a ClientMessage,
        ) -> ClientFuture<'a, Result<usize, String>> {
            Box::pin(async { Err("clients unavailable".to_string()) })
        }

        fn show_notification<'a>(
            &'a self,
            _notification: &'a Notification,
        ) -> ClientFuture<'a, Result<(), String>> {
            Box::pin(async { Ok(()) })
        }

        fn open_window<'a>(&'a self, _url: &'a str) -> ClientFuture<'a, Result<(), String>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn notify_stamps_messages_with_clock_time() {
        let channel = MemoryClientChannel::default();
        let notifier = ClientNotifier::new(Rc::new(channel.clone()), Rc::new(ManualClock::at(77)));
        assert_eq!(block_on(notifier.notify(ClientMessageKind::UploadOffline)), 1);
        let delivered = channel.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].timestamp, 77);
    }

    #[test]
    fn broadcast_failure_is_swallowed() {
        let notifier = ClientNotifier::new(Rc::new(BrokenChannel), Rc::new(ManualClock::at(1)));
        assert_eq!(block_on(notifier.notify(ClientMessageKind::SyncUploads)), 0);
    }
}
