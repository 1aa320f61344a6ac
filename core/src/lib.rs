//! Client core for the transit dashboard API.
//!
//! # Overview
//! Fetches stops, routes, arrivals, alerts, and system status from a
//! read-only JSON API, and wraps those fetches in an observable
//! loading/data/error container that views render from.
//!
//! # Design
//! - `TransitClient` holds only `base_url` and a `Transport`. It builds a
//!   plain-data `HttpRequest`, lets the transport do the I/O, and parses the
//!   plain-data `HttpResponse`, so everything but the transport is pure.
//! - Retries live in the `Retrying` transport decorator, never in the client.
//! - `ApiData` runs a producer closure per consumer and discards results from
//!   superseded or torn-down fetches using a generation counter.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch_state;
pub mod http;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::{parse_response, TransitClient};
pub use config::ClientConfig;
pub use dashboard::{relative_age, sample_alerts, AlertCounts};
pub use error::{ApiError, ConfigError, TransportError};
pub use fetch_state::{ApiData, FetchState, DEFAULT_ERROR_MESSAGE};
pub use http::{HttpRequest, HttpResponse};
pub use retry::{RetryPolicy, Retrying};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Alert, AlertCategory, Arrival, Route, RouteMode, Severity, Stop, SystemStatus};
