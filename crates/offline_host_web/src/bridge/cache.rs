use offline_host::ResponseSnapshot;

pub(crate) async fn tier_open(name: &str) -> Result<(), String> {
    super::interop::tier_open(name).await
}

pub(crate) async fn tier_match(name: &str, url: &str) -> Result<Option<ResponseSnapshot>, String> {
    super::interop::tier_match(name, url).await
}

pub(crate) async fn tier_put(
    name: &str,
    url: &str,
    response: &ResponseSnapshot,
) -> Result<(), String> {
    super::interop::tier_put(name, url, response).await
}

pub(crate) async fn tier_delete(name: &str) -> Result<bool, String> {
    super::interop::tier_delete(name).await
}

pub(crate) async fn tier_names() -> Result<Vec<String>, String> {
    super::interop::tier_names().await
}
