use offline_host::{ClientMessage, Notification};

pub(crate) async fn clients_broadcast(message: &ClientMessage) -> Result<usize, String> {
    super::interop::clients_broadcast(message).await
}

pub(crate) async fn show_notification(notification: &Notification) -> Result<(), String> {
    super::interop::show_notification(notification).await
}

pub(crate) async fn open_window(url: &str) -> Result<(), String> {
    super::interop::open_window(url).await
}
