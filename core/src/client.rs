//! HTTP client for the transit API.
//!
//! # Design
//! `TransitClient` holds a `base_url` and a `Transport` and carries no other
//! state between calls. Every operation is the same three steps: build a
//! plain-data `HttpRequest`, hand it to the transport, parse the
//! `HttpResponse`. Building and parsing are pure, so they are tested without a
//! network; only `Transport::execute` does I/O.
//!
//! The client performs exactly one round trip per call. It never caches,
//! deduplicates, or retries; wrap the transport in `Retrying` for that.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpRequest, HttpResponse};
use crate::retry::Retrying;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Alert, Arrival, Route, Stop, SystemStatus};

/// Client for the read-only transit endpoints.
#[derive(Debug, Clone)]
pub struct TransitClient<X = ReqwestTransport> {
    base_url: String,
    transport: X,
}

impl TransitClient<ReqwestTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(base_url, ReqwestTransport::new())
    }
}

impl TransitClient<Box<dyn Transport>> {
    /// Wire up the production transport stack described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let reqwest = match config.timeout {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::new(),
        };
        let transport: Box<dyn Transport> = match config.retry {
            Some(policy) => Box::new(Retrying::new(reqwest, policy)),
            None => Box::new(reqwest),
        };
        Ok(Self::with_transport(&config.base_url, transport))
    }
}

impl<X> TransitClient<X> {
    pub fn with_transport(base_url: &str, transport: X) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// Build the GET request for `path`. A missing leading `/` is added.
    pub fn build_request(&self, path: &str) -> HttpRequest {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        HttpRequest {
            url,
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

impl<X: Transport> TransitClient<X> {
    /// GET `base_url + path` and decode the JSON body as `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.build_request(path);
        debug!(url = %req.url, "fetching");

        let result = match self.transport.execute(req).await {
            Ok(response) => parse_response(response),
            Err(err) => Err(ApiError::from(err)),
        };
        if let Err(err) = &result {
            warn!(path, error = %err, "API request failed");
        }
        result
    }

    pub async fn list_stops(&self) -> Result<Vec<Stop>, ApiError> {
        self.fetch("/stops").await
    }

    pub async fn get_stop(&self, stop_id: &str) -> Result<Stop, ApiError> {
        self.fetch(&format!("/stops/{stop_id}")).await
    }

    pub async fn list_routes(&self) -> Result<Vec<Route>, ApiError> {
        self.fetch("/routes").await
    }

    pub async fn get_route(&self, route_id: &str) -> Result<Route, ApiError> {
        self.fetch(&format!("/routes/{route_id}")).await
    }

    /// Upcoming arrivals at one stop.
    pub async fn get_arrivals(&self, stop_id: &str) -> Result<Vec<Arrival>, ApiError> {
        self.fetch(&format!("/arrivals/{stop_id}")).await
    }

    /// Stops served by one route.
    pub async fn get_route_stops(&self, route_id: &str) -> Result<Vec<Stop>, ApiError> {
        self.fetch(&format!("/routes/{route_id}/stops")).await
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        self.fetch("/alerts").await
    }

    pub async fn get_system_status(&self) -> Result<SystemStatus, ApiError> {
        self.fetch("/status").await
    }
}

/// Map a non-2xx status to `ApiError::Http`, otherwise decode the body.
pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            body: response.body,
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::ScriptedTransport;
    use crate::types::RouteMode;

    fn client(transport: ScriptedTransport) -> TransitClient<ScriptedTransport> {
        TransitClient::with_transport("http://localhost:5000", transport)
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn build_request_joins_base_and_path() {
        let req = client(ScriptedTransport::new()).build_request("/stops");
        assert_eq!(req.url, "http://localhost:5000/stops");
        assert_eq!(
            req.headers,
            vec![("accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TransitClient::with_transport("http://localhost:5000/", ScriptedTransport::new());
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.build_request("/routes").url, "http://localhost:5000/routes");
    }

    #[test]
    fn missing_leading_slash_is_added() {
        let req = client(ScriptedTransport::new()).build_request("alerts");
        assert_eq!(req.url, "http://localhost:5000/alerts");
    }

    #[test]
    fn parse_success_decodes_body() {
        let stops: Vec<Stop> =
            parse_response(ok(r#"[{"id":"1","name":"Embarcadero","lat":37.79,"lng":-122.39}]"#))
                .unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].name, "Embarcadero");
    }

    #[test]
    fn parse_accepts_any_2xx() {
        let response = HttpResponse {
            status: 203,
            body: "[]".to_string(),
        };
        let stops: Vec<Stop> = parse_response(response).unwrap();
        assert!(stops.is_empty());
    }

    #[test]
    fn parse_non_success_keeps_status_and_raw_body() {
        let response = HttpResponse {
            status: 500,
            body: r#"{"error":"boom"}"#.to_string(),
        };
        let err = parse_response::<Vec<Alert>>(response).unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"error":"boom"}"#);
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn parse_bad_json_is_deserialization_error() {
        let err = parse_response::<Vec<Stop>>(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_wrong_shape_is_deserialization_error() {
        let err = parse_response::<Vec<Stop>>(ok(r#"{"stops":[]}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[tokio::test]
    async fn list_stops_hits_stops_path_once() {
        let client = client(
            ScriptedTransport::new()
                .respond(200, r#"[{"id":"1","name":"Embarcadero","lat":37.79,"lng":-122.39}]"#),
        );
        let stops = client.list_stops().await.unwrap();
        assert_eq!(stops[0].id, "1");

        let seen = client.transport().requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "http://localhost:5000/stops");
    }

    #[tokio::test]
    async fn resource_paths() {
        let client = client(
            ScriptedTransport::new()
                .respond(200, "[]")
                .respond(200, "[]")
                .respond(200, r#"{"id":"N","name":"N-Judah","type":"rail"}"#)
                .respond(200, r#"{"id":"12","name":"Powell","lat":37.78,"lng":-122.41}"#)
                .respond(200, r#"{"status":"ok"}"#),
        );
        client.get_arrivals("12").await.unwrap();
        client.get_route_stops("N").await.unwrap();
        let route = client.get_route("N").await.unwrap();
        assert_eq!(route.mode, RouteMode::Rail);
        client.get_stop("12").await.unwrap();
        let status = client.get_system_status().await.unwrap();
        assert_eq!(status["status"], "ok");

        let urls: Vec<String> = client
            .transport()
            .requests()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:5000/arrivals/12",
                "http://localhost:5000/routes/N/stops",
                "http://localhost:5000/routes/N",
                "http://localhost:5000/stops/12",
                "http://localhost:5000/status",
            ]
        );
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let client = client(
            ScriptedTransport::new()
                .fail("connection refused")
                .respond(200, "[]"),
        );
        let err = client.list_alerts().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref t) if t.is_connect()));
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn from_config_rejects_bad_base_url() {
        let config = ClientConfig::new("ftp://transit");
        assert!(matches!(
            TransitClient::from_config(&config),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
