// HTTP transport seam. The client core only talks to the `HttpClient`
// capability; `ReqwestClient` is the default implementation.

use std::{fmt, time::Duration};

use reqwest::Method;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Blocking HTTP capability used by [`crate::FindologicApi`].
///
/// Implementations must enforce `request.timeout` themselves and return a
/// `TransportError` when no response could be obtained. A zero timeout
/// means the request may wait indefinitely. Any HTTP status,
/// including 5xx, is a successful transport result.
pub trait HttpClient: Send + Sync + fmt::Debug {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client without a client-wide timeout; every request carries
    /// its own. Fails when the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn with_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }
}

impl HttpClient for ReqwestClient {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.inner.request(request.method.clone(), &request.url);
        if !request.timeout.is_zero() {
            builder = builder.timeout(request.timeout);
        }
        let response = builder.send().map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    // Serves one request with `200 alive` and returns the listener's address.
    fn serve_alive_once() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nalive")
                .unwrap();
        });
        format!("http://{addr}/alivetest.php")
    }

    #[test]
    fn test_get_request_shape() {
        let request = HttpRequest::get("https://example.com/a", Duration::from_secs(2));
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://example.com/a");
        assert_eq!(request.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_reqwest_client_reports_connection_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let client = ReqwestClient::new().unwrap();
        let request = HttpRequest::get("http://127.0.0.1:9/alivetest.php", Duration::from_secs(1));
        let err = client.request(&request).unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_reqwest_client_reads_status_and_body() {
        let client = ReqwestClient::new().unwrap();
        let request = HttpRequest::get(serve_alive_once(), Duration::from_secs(2));
        assert_eq!(client.request(&request), Ok(HttpResponse::new(200, "alive")));
    }

    #[test]
    fn test_zero_timeout_does_not_expire_immediately() {
        let client = ReqwestClient::new().unwrap();
        let request = HttpRequest::get(serve_alive_once(), Duration::ZERO);
        assert_eq!(client.request(&request), Ok(HttpResponse::new(200, "alive")));
    }
}
