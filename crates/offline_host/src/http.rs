//! Request/response snapshot models shared by cache, queue, and network contracts.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::queue::SubmissionPayload;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// Any other method, upper-cased.
    Other(String),
}

impl Method {
    /// Parses a method token case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the canonical upper-case token.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Other(token) => token,
        }
    }
}

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Subresource, XHR or `fetch()` call.
    #[default]
    Subresource,
}

/// Body attached to an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Multipart image submission decoded into its form field.
    Submission(SubmissionPayload),
    /// Opaque request bytes.
    Bytes(Vec<u8>),
}

/// Outgoing request as seen by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: String,
    /// Navigation vs. subresource.
    pub mode: RequestMode,
    /// Request headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<RequestBody>,
}

impl OutgoingRequest {
    /// Builds a subresource `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            mode: RequestMode::Subresource,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Builds a navigation `GET` request.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Builds a `POST` carrying a decoded submission payload.
    pub fn submission(url: impl Into<String>, payload: SubmissionPayload) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            mode: RequestMode::Subresource,
            headers: Vec::new(),
            body: Some(RequestBody::Submission(payload)),
        }
    }

    /// Returns whether the page is navigating to this URL.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Parses the request URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not absolute or is malformed.
    pub fn parsed_url(&self) -> Result<Url, String> {
        Url::parse(&self.url).map_err(|e| format!("invalid request url `{}`: {e}", self.url))
    }

    /// Returns the submission payload when the body carries one.
    pub fn submission_payload(&self) -> Option<&SubmissionPayload> {
        match &self.body {
            Some(RequestBody::Submission(payload)) => Some(payload),
            _ => None,
        }
    }
}

/// Normalized cache identity for a `GET` request: absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    url: String,
}

impl CacheKey {
    /// Builds a key for a `GET` of `url`.
    ///
    /// # Errors
    ///
    /// Returns an error when `url` cannot be parsed as an absolute URL.
    pub fn get(url: &str) -> Result<Self, String> {
        let mut parsed = Url::parse(url).map_err(|e| format!("invalid cache url `{url}`: {e}"))?;
        parsed.set_fragment(None);
        Ok(Self {
            url: parsed.into(),
        })
    }

    /// Builds a key for an intercepted request; only `GET` requests are cacheable.
    ///
    /// # Errors
    ///
    /// Returns an error for non-`GET` methods or malformed URLs.
    pub fn for_request(request: &OutgoingRequest) -> Result<Self, String> {
        if request.method != Method::Get {
            return Err(format!(
                "{} {} is not cacheable",
                request.method.as_str(),
                request.url
            ));
        }
        Self::get(&request.url)
    }

    /// Normalized URL string.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Stored or received response: status, headers, and full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status: u16,
    /// HTTP status text.
    pub status_text: String,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Unix milliseconds at which the snapshot was written into a cache tier.
    pub stored_at_unix_ms: Option<u64>,
}

impl ResponseSnapshot {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: default_status_text(status).to_string(),
            headers: Vec::new(),
            body: body.into(),
            stored_at_unix_ms: None,
        }
    }

    /// Creates a `text/plain` response.
    pub fn text(status: u16, text: &str) -> Self {
        Self::new(status, text.as_bytes().to_vec())
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Creates an `application/json` response from a serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` cannot be serialized.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, String> {
        let body = serde_json::to_vec(value).map_err(|e| e.to_string())?;
        Ok(Self::new(status, body).with_header("content-type", "application/json"))
    }

    /// Appends a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Returns the copy stamped with a storage timestamp.
    pub fn stamped(mut self, stored_at_unix_ms: u64) -> Self {
        self.stored_at_unix_ms = Some(stored_at_unix_ms);
        self
    }

    /// Looks up the first header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns whether the status is in the `2xx` range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns whether this response may be written into a cache tier.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Decodes the body as UTF-8 text, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_slice(&self.body).map_err(|e| e.to_string())
    }
}

fn default_status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("Post"), Method::Post);
        assert_eq!(Method::parse("patch"), Method::Other("PATCH".to_string()));
        assert_eq!(Method::parse("patch").as_str(), "PATCH");
    }

    #[test]
    fn cache_key_drops_fragment_and_rejects_non_get() {
        let key = CacheKey::get("https://app.local/static/app.css#top").expect("key");
        assert_eq!(key.url(), "https://app.local/static/app.css");

        let post = OutgoingRequest::submission(
            "https://app.local/upload",
            SubmissionPayload::image("capture.jpg", "image/jpeg", vec![1]),
        );
        assert!(CacheKey::for_request(&post).is_err());
        assert!(CacheKey::get("/relative").is_err());
    }

    #[test]
    fn response_helpers_expose_headers_and_json() {
        let response = ResponseSnapshot::json(503, &json!({"offline": true})).expect("json");
        assert_eq!(response.status_text, "Service Unavailable");
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert!(!response.is_success());
        assert!(!response.is_cacheable());
        let value: serde_json::Value = response.json_body().expect("decode");
        assert_eq!(value, json!({"offline": true}));
    }

    #[test]
    fn only_plain_ok_is_cacheable() {
        assert!(ResponseSnapshot::new(200, Vec::new()).is_cacheable());
        assert!(!ResponseSnapshot::new(204, Vec::new()).is_cacheable());
        assert!(ResponseSnapshot::new(204, Vec::new()).is_success());
    }
}
