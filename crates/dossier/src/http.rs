use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// HTTP verbs used against the GitHub REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Header list; lookups through [`header_get`] ignore case.
pub type HttpHeaders = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Fully resolved URL, query string included.
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossy.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("http transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: String, url: String },
}

impl HttpError {
    /// Connection failures and timeouts are worth another attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, HttpError::Connect(_) | HttpError::Timeout(_))
    }
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub mod reqwest_transport {
    use super::*;

    use std::time::Duration;

    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Production transport backed by reqwest. Redirects are followed.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()
                .map_err(|e| HttpError::Transport(e.to_string()))?;
            Ok(Self { client })
        }
    }

    fn classify(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::Connect(err.to_string())
        } else {
            HttpError::Transport(err.to_string())
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
                HttpMethod::Delete => reqwest::Method::DELETE,
            };

            let mut builder = self.client.request(method, &request.url);
            for (k, v) in &request.headers {
                builder = builder.header(k, v);
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }

            let resp = builder.send().await.map_err(classify)?;

            let status = resp.status().as_u16();
            let headers: HttpHeaders = resp
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect();
            let body = resp.bytes().await.map_err(classify)?.to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

// ---------- Test-only mock transport ----------

#[cfg(test)]
use std::collections::{HashMap, VecDeque};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// In-memory transport keyed by method and full URL.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockTransportInner {
    routes: HashMap<(HttpMethod, String), VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Vec<HttpRequest>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; repeated keys are served FIFO.
    pub fn push_response(&self, method: HttpMethod, url: impl Into<String>, response: HttpResponse) {
        self.push(method, url, Ok(response));
    }

    pub fn push_error(&self, method: HttpMethod, url: impl Into<String>, error: HttpError) {
        self.push(method, url, Err(error));
    }

    /// Queue a `GET` returning `status` with a JSON body.
    pub fn push_json(&self, url: impl Into<String>, status: u16, body: serde_json::Value) {
        self.push_response(
            HttpMethod::Get,
            url,
            HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.to_string().into_bytes(),
            },
        );
    }

    fn push(&self, method: HttpMethod, url: impl Into<String>, item: Result<HttpResponse, HttpError>) {
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner
            .routes
            .entry((method, url.into()))
            .or_default()
            .push_back(item);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        let inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner.requests.clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");

        let key = (request.method, request.url.clone());
        inner.requests.push(request);

        match inner.routes.get_mut(&key).and_then(|q| q.pop_front()) {
            Some(item) => item,
            None => Err(HttpError::NoMockResponse {
                method: key.0.as_str().to_string(),
                url: key.1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn header_get_ignores_case_and_prefers_first() {
        let headers: HttpHeaders = vec![
            ("X-RateLimit-Remaining".to_string(), "42".to_string()),
            ("x-ratelimit-remaining".to_string(), "7".to_string()),
        ];
        assert_eq!(header_get(&headers, "x-ratelimit-remaining"), Some("42"));
        assert_eq!(header_get(&headers, "X-RATELIMIT-REMAINING"), Some("42"));
        assert_eq!(header_get(&headers, "etag"), None);
    }

    #[test]
    fn response_status_helpers() {
        let mut resp = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(resp.is_success());
        assert!(!resp.is_server_error());

        resp.status = 503;
        assert!(!resp.is_success());
        assert!(resp.is_server_error());

        resp.status = 404;
        assert!(!resp.is_success());
        assert!(!resp.is_server_error());
    }

    #[test]
    fn response_json_and_text_decode_body() {
        let resp = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: br#"{"login":"octocat"}"#.to_vec(),
        };
        let value: serde_json::Value = resp.json().expect("valid json");
        assert_eq!(value["login"], "octocat");
        assert_eq!(resp.text(), r#"{"login":"octocat"}"#);
    }

    #[test]
    fn only_connect_and_timeout_errors_are_transient() {
        assert!(HttpError::Connect("refused".into()).is_transient());
        assert!(HttpError::Timeout("read".into()).is_transient());
        assert!(!HttpError::Transport("builder".into()).is_transient());
        assert!(
            !HttpError::NoMockResponse {
                method: "GET".into(),
                url: "x".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn request_builder_collects_headers() {
        let req = HttpRequest::new(HttpMethod::Get, "https://api.github.com/user")
            .with_header("Accept", "application/vnd.github.v3+json")
            .with_header("Authorization", "Bearer t");
        assert_eq!(req.header("authorization"), Some("Bearer t"));
        assert!(req.body.is_empty());
    }

    #[tokio::test]
    async fn mock_transport_serves_fifo_and_records_requests() {
        let transport = MockTransport::new();
        let url = "https://api.github.com/rate_limit";
        transport.push_json(url, 500, serde_json::json!({}));
        transport.push_json(url, 200, serde_json::json!({"ok": true}));

        let first = transport
            .send(HttpRequest::new(HttpMethod::Get, url))
            .await
            .expect("first");
        let second = transport
            .send(HttpRequest::new(HttpMethod::Get, url))
            .await
            .expect("second");
        assert_eq!(first.status, 500);
        assert_eq!(second.status, 200);
        assert_eq!(transport.request_count(), 2);

        let err = transport
            .send(HttpRequest::new(HttpMethod::Get, url))
            .await
            .expect_err("queue drained");
        assert!(matches!(err, HttpError::NoMockResponse { .. }));
    }

    #[tokio::test]
    async fn mock_transport_can_return_errors() {
        let transport = MockTransport::new();
        transport.push_error(
            HttpMethod::Get,
            "https://api.github.com/user",
            HttpError::Timeout("slow".into()),
        );
        let err = transport
            .send(HttpRequest::new(HttpMethod::Get, "https://api.github.com/user"))
            .await
            .expect_err("queued error");
        assert!(err.is_transient());
    }

    #[test]
    fn reqwest_transport_with_timeout_builds_client() {
        let transport = reqwest_transport::ReqwestTransport::with_timeout(Duration::from_millis(1));
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn reqwest_transport_reads_status_headers_and_body() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            stream
                .set_read_timeout(Some(Duration::from_secs(2)))
                .expect("set_read_timeout");

            let mut buf = Vec::new();
            let mut tmp = [0u8; 4096];
            loop {
                match stream.read(&mut tmp) {
                    Ok(0) => break,
                    Ok(n) => {
                        buf.extend_from_slice(&tmp[..n]);
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }

            let req_text = String::from_utf8_lossy(&buf).to_lowercase();
            assert!(req_text.starts_with("get /repos/o/r?page=2 "), "{req_text:?}");
            assert!(req_text.contains("accept: application/vnd.github.v3+json"));

            let body = b"[]";
            let response = format!(
                "HTTP/1.1 200 OK\r\nX-RateLimit-Remaining: 59\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write headers");
            stream.write_all(body).expect("write body");
            stream.flush().ok();
        });

        let transport = reqwest_transport::ReqwestTransport::new(reqwest::Client::new());
        let req = HttpRequest::new(HttpMethod::Get, format!("http://{addr}/repos/o/r?page=2"))
            .with_header("Accept", "application/vnd.github.v3+json");

        let resp = transport.send(req).await.expect("transport should succeed");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("x-ratelimit-remaining"), Some("59"));
        assert_eq!(resp.body, b"[]".to_vec());

        handle.join().expect("server thread");
    }

    #[tokio::test]
    async fn reqwest_transport_maps_refused_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let transport = reqwest_transport::ReqwestTransport::new(reqwest::Client::new());
        let err = transport
            .send(HttpRequest::new(HttpMethod::Get, format!("http://{addr}/")))
            .await
            .expect_err("nothing listening");
        assert!(err.is_transient(), "{err:?}");
    }
}
