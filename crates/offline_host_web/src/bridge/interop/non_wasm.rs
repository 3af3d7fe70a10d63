use super::*;

fn unsupported() -> String {
    "Service worker APIs are only available when compiled for wasm32".to_string()
}

pub async fn tier_open(_name: &str) -> Result<(), String> {
    Ok(())
}

pub async fn tier_match(_name: &str, _url: &str) -> Result<Option<ResponseSnapshot>, String> {
    Ok(None)
}

pub async fn tier_put(_name: &str, _url: &str, _response: &ResponseSnapshot) -> Result<(), String> {
    Ok(())
}

pub async fn tier_delete(_name: &str) -> Result<bool, String> {
    Ok(false)
}

pub async fn tier_names() -> Result<Vec<String>, String> {
    Ok(Vec::new())
}

pub async fn queue_load(_id: &str) -> Result<Option<QueueEntry>, String> {
    Ok(None)
}

pub async fn queue_save(_entry: &QueueEntry) -> Result<(), String> {
    Ok(())
}

pub async fn queue_delete(_id: &str) -> Result<(), String> {
    Ok(())
}

pub async fn queue_list() -> Result<Vec<QueueEntry>, String> {
    Ok(Vec::new())
}

pub async fn network_fetch(_request: &OutgoingRequest) -> Result<ResponseSnapshot, FetchError> {
    Err(FetchError::Unreachable(unsupported()))
}

pub async fn clients_broadcast(_message: &ClientMessage) -> Result<usize, String> {
    Ok(0)
}

pub async fn show_notification(_notification: &Notification) -> Result<(), String> {
    Err(unsupported())
}

pub async fn open_window(_url: &str) -> Result<(), String> {
    Err(unsupported())
}
