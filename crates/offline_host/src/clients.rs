//! Page-client broadcast contracts and adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use crate::messages::{ClientMessage, Notification};

/// Object-safe boxed future used by [`ClientChannel`].
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host channel from the worker to the pages it controls.
///
/// Delivery is best-effort: no acknowledgment, no persistence, and a message sent while no page
/// is listening is lost.
pub trait ClientChannel {
    /// Posts `message` to every controlled page and resolves to the number of recipients.
    fn broadcast<'a>(&'a self, message: &'a ClientMessage) -> ClientFuture<'a, Result<usize, String>>;

    /// Displays a user-visible notification.
    fn show_notification<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> ClientFuture<'a, Result<(), String>>;

    /// Focuses or opens a page at `url`.
    fn open_window<'a>(&'a self, url: &'a str) -> ClientFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Channel with no pages attached; every broadcast reaches zero recipients.
pub struct NoopClientChannel;

impl ClientChannel for NoopClientChannel {
    fn broadcast<'a>(&'a self, _message: &'a ClientMessage) -> ClientFuture<'a, Result<usize, String>> {
        Box::pin(async { Ok(0) })
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

#[derive(Debug, Default)]
struct MemoryClientState {
    pages: usize,
    delivered: Vec<ClientMessage>,
    notifications: Vec<Notification>,
    opened: Vec<String>,
}

/// Recording channel used by tests.
///
/// Messages are recorded only while at least one page is attached, matching the lossy host
/// behavior.
#[derive(Debug, Clone)]
pub struct MemoryClientChannel {
    inner: Rc<RefCell<MemoryClientState>>,
}

impl Default for MemoryClientChannel {
    fn default() -> Self {
        Self::with_pages(1)
    }
}

impl MemoryClientChannel {
    /// Creates a channel with `pages` attached pages.
    pub fn with_pages(pages: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryClientState {
                pages,
                ..MemoryClientState::default()
            })),
        }
    }

    /// Changes how many pages are attached.
    pub fn set_pages(&self, pages: usize) {
        self.inner.borrow_mut().pages = pages;
    }

    /// Messages delivered so far, oldest first.
    pub fn delivered(&self) -> Vec<ClientMessage> {
        self.inner.borrow().delivered.clone()
    }

    /// Wire tags of delivered messages, oldest first.
    pub fn delivered_tags(&self) -> Vec<&'static str> {
        self.inner
            .borrow()
            .delivered
            .iter()
            .map(|message| message.kind.tag())
            .collect()
    }

    /// Notifications shown so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.borrow().notifications.clone()
    }

    /// URLs opened so far.
    pub fn opened_windows(&self) -> Vec<String> {
        self.inner.borrow().opened.clone()
    }
}

impl ClientChannel for MemoryClientChannel {
    fn broadcast<'a>(&'a self, message: &'a ClientMessage) -> ClientFuture<'a, Result<usize, String>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            if inner.pages > 0 {
                inner.delivered.push(message.clone());
            }
            Ok(inner.pages)
        })
    }

    fn show_notification<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> ClientFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .notifications
                .push(notification.clone());
            Ok(())
        })
    }

    fn open_window<'a>(&'a self, url: &'a str) -> ClientFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().opened.push(url.to_string());
            Ok(())
        })
    }
}
