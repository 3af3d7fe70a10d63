use offline_host::QueueEntry;

pub(crate) async fn queue_load(id: &str) -> Result<Option<QueueEntry>, String> {
    super::interop::queue_load(id).await
}

pub(crate) async fn queue_save(entry: &QueueEntry) -> Result<(), String> {
    super::interop::queue_save(entry).await
}

pub(crate) async fn queue_delete(id: &str) -> Result<(), String> {
    super::interop::queue_delete(id).await
}

pub(crate) async fn queue_list() -> Result<Vec<QueueEntry>, String> {
    super::interop::queue_list().await
}
