use offline_host::{FetchError, OutgoingRequest, ResponseSnapshot};

pub(crate) async fn network_fetch(
    request: &OutgoingRequest,
) -> Result<ResponseSnapshot, FetchError> {
    super::interop::network_fetch(request).await
}
