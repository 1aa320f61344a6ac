//! HTTP requests and responses as plain data.
//!
//! # Design
//! `TransitClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network; a `Transport` sits between the two and
//! performs the I/O. Keeping both ends as plain owned data lets tests script
//! exact responses without a server.
//!
//! The API surface is read-only, so every request is a GET.

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// A response described as plain data.
///
/// Non-2xx responses are still `HttpResponse` values; interpreting the status
/// is the client's job, not the transport's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
