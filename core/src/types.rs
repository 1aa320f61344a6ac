//! Domain records returned by the transit API.
//!
//! # Design
//! These types mirror the mock server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates. Records
//! are plain immutable values: nothing here validates that a route's stop
//! list refers to stops that exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical boarding location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Identifiers of the routes serving this stop, when the backend knows them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Bus,
    Rail,
    Ferry,
}

impl RouteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteMode::Bus => "bus",
            RouteMode::Rail => "rail",
            RouteMode::Ferry => "ferry",
        }
    }
}

/// A named line or service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mode: RouteMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<String>>,
}

/// A predicted vehicle arrival at a stop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arrival {
    pub id: String,
    pub route_id: String,
    pub route_name: String,
    pub destination: String,
    /// Passed through as the backend formats it, e.g. `"08:15:00"`.
    pub estimated_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Delay,
    Disruption,
    Info,
    Maintenance,
}

impl AlertCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertCategory::Delay => "delay",
            AlertCategory::Disruption => "disruption",
            AlertCategory::Info => "info",
            AlertCategory::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A service-status notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    /// Free-text route label such as `"All BART Lines"`, not a route id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The `/status` payload has no agreed schema yet, so it stays untyped.
pub type SystemStatus = serde_json::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_without_routes_deserializes() {
        let stop: Stop =
            serde_json::from_str(r#"{"id":"1","name":"Embarcadero","lat":37.79,"lng":-122.39}"#)
                .unwrap();
        assert_eq!(stop.name, "Embarcadero");
        assert!(stop.routes.is_none());
    }

    #[test]
    fn stop_omits_absent_routes_when_serialized() {
        let stop = Stop {
            id: "1".to_string(),
            name: "Embarcadero".to_string(),
            lat: 37.79,
            lng: -122.39,
            routes: None,
        };
        let json = serde_json::to_value(&stop).unwrap();
        assert!(json.get("routes").is_none());
    }

    #[test]
    fn route_mode_uses_type_key() {
        let route: Route =
            serde_json::from_str(r##"{"id":"N","name":"N-Judah","type":"rail","color":"#005B95"}"##)
                .unwrap();
        assert_eq!(route.mode, RouteMode::Rail);
        assert_eq!(route.color.as_deref(), Some("#005B95"));

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["type"], "rail");
        assert!(json.get("mode").is_none());
    }

    #[test]
    fn route_rejects_unknown_mode() {
        let result: Result<Route, _> =
            serde_json::from_str(r#"{"id":"X","name":"Cable","type":"gondola"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn alert_parses_timestamps_and_category() {
        let alert: Alert = serde_json::from_str(
            r#"{
                "id": "a1",
                "type": "maintenance",
                "title": "Track work",
                "description": "Bus substitution",
                "severity": "low",
                "created_at": "2024-05-01T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(alert.category, AlertCategory::Maintenance);
        assert_eq!(alert.severity, Severity::Low);
        assert_eq!(alert.created_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert!(alert.updated_at.is_none());
        assert!(alert.route.is_none());
    }

    #[test]
    fn labels_match_wire_names() {
        for mode in [RouteMode::Bus, RouteMode::Rail, RouteMode::Ferry] {
            assert_eq!(serde_json::to_value(mode).unwrap(), mode.as_str());
        }
        assert_eq!(
            serde_json::to_value(AlertCategory::Disruption).unwrap(),
            AlertCategory::Disruption.as_str()
        );
        assert_eq!(serde_json::to_value(Severity::High).unwrap(), Severity::High.as_str());
    }

    #[test]
    fn severity_orders_low_to_high() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }
}
