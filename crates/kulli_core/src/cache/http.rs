//! Request/response values exchanged between clients, worker and network.

use reqwest::Method;
use url::Url;

/// How the client issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Full-page navigation; eligible for the offline root document.
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// One intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
}

impl Request {
    pub fn new(method: Method, url: Url, mode: RequestMode) -> Self {
        Self { method, url, mode }
    }

    /// Parses `url` into a same-origin GET request.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::GET, Url::parse(url)?, RequestMode::SameOrigin))
    }

    /// Parses `url` into a navigation GET request.
    pub fn navigate(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::GET, Url::parse(url)?, RequestMode::Navigate))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Partition key: the absolute URL without fragment.
    pub fn cache_key(&self) -> String {
        cache_key_for(&self.url)
    }

    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

/// Normalizes a URL into the key used by cache partitions.
pub fn cache_key_for(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// A network or cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Placeholder for font requests that failed with nothing cached.
    pub fn offline_placeholder() -> Self {
        Self::new(408, Vec::<u8>::new()).with_status_text("Offline")
    }

    /// Synthetic answer when neither cache nor network can serve a request.
    pub fn service_unavailable() -> Self {
        Self::new(503, "Offline").with_status_text("Service Unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::{Request, RequestMode, Response};
    use reqwest::Method;

    #[test]
    fn cache_key_drops_fragment() {
        let request = Request::get("http://localhost:8080/index.html#top").unwrap();
        assert_eq!(request.cache_key(), "http://localhost:8080/index.html");
    }

    #[test]
    fn only_http_schemes_are_interceptable() {
        assert!(Request::get("https://fonts.gstatic.com/a.woff2")
            .unwrap()
            .is_http());
        assert!(!Request::get("chrome-extension://abc/script.js")
            .unwrap()
            .is_http());
    }

    #[test]
    fn builders_override_method_and_mode() {
        let request = Request::get("http://localhost/")
            .unwrap()
            .with_method(Method::POST)
            .with_mode(RequestMode::Cors);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.mode, RequestMode::Cors);
    }

    #[test]
    fn synthetic_responses_carry_offline_status() {
        assert_eq!(Response::offline_placeholder().status, 408);
        let unavailable = Response::service_unavailable();
        assert_eq!(unavailable.status, 503);
        assert_eq!(unavailable.body, b"Offline");
        assert!(!unavailable.is_ok());
    }
}
