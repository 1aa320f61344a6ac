use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub use axum::http::StatusCode;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Arrival {
    pub id: String,
    pub stop_id: String,
    pub route_id: String,
    pub route_name: String,
    pub destination: String,
    pub estimated_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub severity: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Everything the server can answer with.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub arrivals: Vec<Arrival>,
    pub alerts: Vec<Alert>,
}

impl Dataset {
    /// A few Bay Area stops and lines, enough to exercise every endpoint.
    pub fn sample() -> Self {
        let stop = |id: &str, name: &str, lat: f64, lng: f64, routes: &[&str]| Stop {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lng,
            routes: Some(routes.iter().map(|r| r.to_string()).collect()),
        };
        let route = |id: &str, name: &str, kind: &str, color: &str, stops: &[&str]| Route {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            color: Some(color.to_string()),
            stops: Some(stops.iter().map(|s| s.to_string()).collect()),
        };
        let arrival = |id: &str, stop_id: &str, route: (&str, &str), destination: &str, time: &str| Arrival {
            id: id.to_string(),
            stop_id: stop_id.to_string(),
            route_id: route.0.to_string(),
            route_name: route.1.to_string(),
            destination: destination.to_string(),
            estimated_time: time.to_string(),
            delay_minutes: None,
            vehicle_id: None,
        };
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        Self {
            stops: vec![
                stop("1", "Embarcadero", 37.7929, -122.3971, &["BART-Y", "N"]),
                stop("2", "Montgomery St", 37.7894, -122.4013, &["BART-Y", "N"]),
                stop("3", "Powell St", 37.7844, -122.4079, &["BART-Y", "N"]),
                stop("4", "Ferry Building", 37.7955, -122.3937, &["SF-OAK"]),
            ],
            routes: vec![
                route("BART-Y", "Yellow Line", "rail", "#FFE800", &["1", "2", "3"]),
                route("N", "N-Judah", "rail", "#005B95", &["3", "2", "1"]),
                route("SF-OAK", "SF - Oakland Ferry", "ferry", "#00A3E0", &["4"]),
            ],
            arrivals: vec![
                arrival("a3", "1", ("N", "N-Judah"), "Ocean Beach", "08:21:00"),
                Arrival {
                    delay_minutes: Some(2),
                    vehicle_id: Some("BART-1204".to_string()),
                    ..arrival("a1", "1", ("BART-Y", "Yellow Line"), "Antioch", "08:05:00")
                },
                arrival("a2", "1", ("BART-Y", "Yellow Line"), "SFO", "08:12:00"),
                arrival("a4", "4", ("SF-OAK", "SF - Oakland Ferry"), "Oakland", "08:30:00"),
            ],
            alerts: vec![
                Alert {
                    id: "1".to_string(),
                    kind: "delay".to_string(),
                    title: "Yellow Line delays".to_string(),
                    description: "Trains running up to 10 minutes late.".to_string(),
                    route: Some("Yellow Line".to_string()),
                    severity: "medium".to_string(),
                    created_at: issued,
                    updated_at: Some(issued + Duration::minutes(15)),
                },
                Alert {
                    id: "2".to_string(),
                    kind: "maintenance".to_string(),
                    title: "Weekend Track Work - Muni Metro".to_string(),
                    description: "N-Judah bus substitution this weekend.".to_string(),
                    route: Some("Muni N-Judah".to_string()),
                    severity: "low".to_string(),
                    created_at: issued,
                    updated_at: None,
                },
            ],
        }
    }
}

/// Paths answered with a forced status instead of real data.
pub type Faults = Arc<RwLock<HashMap<String, StatusCode>>>;

#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub faults: Faults,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            faults: Faults::default(),
        }
    }
}

pub fn app() -> Router {
    app_with(AppState::new(Dataset::sample()))
}

pub fn app_with(state: AppState) -> Router {
    Router::new()
        .route("/stops", get(list_stops))
        .route("/stops/{id}", get(get_stop))
        .route("/routes", get(list_routes))
        .route("/routes/{id}", get(get_route))
        .route("/routes/{id}/stops", get(get_route_stops))
        .route("/arrivals/{stop_id}", get(get_arrivals))
        .route("/alerts", get(list_alerts))
        .route("/status", get(status))
        .layer(middleware::from_fn_with_state(state.faults.clone(), inject_faults))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::new(Dataset::sample())).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock transit API listening");
    }
    axum::serve(listener, app_with(state)).await
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn not_found(message: String) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

async fn inject_faults(State(faults): State<Faults>, req: Request, next: Next) -> Response {
    let forced = faults.read().await.get(req.uri().path()).copied();
    match forced {
        Some(status) => {
            debug!(path = %req.uri().path(), %status, "injecting fault");
            (status, Json(json!({ "error": "injected fault" }))).into_response()
        }
        None => next.run(req).await,
    }
}

async fn list_stops(State(state): State<AppState>) -> Json<Vec<Stop>> {
    Json(state.dataset.stops.clone())
}

async fn get_stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stop>, ApiError> {
    state
        .dataset
        .stops
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("Stop {id} not found")))
}

async fn list_routes(State(state): State<AppState>) -> Json<Vec<Route>> {
    Json(state.dataset.routes.clone())
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    state
        .dataset
        .routes
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("Route {id} not found")))
}

async fn get_route_stops(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Stop>>, ApiError> {
    let route = state
        .dataset
        .routes
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found(format!("Route {id} not found or has no trips.")))?;
    let served = route.stops.as_deref().unwrap_or_default();

    let mut stops: Vec<Stop> = state
        .dataset
        .stops
        .iter()
        .filter(|s| served.contains(&s.id))
        .cloned()
        .collect();
    stops.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(stops))
}

async fn get_arrivals(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<Vec<Arrival>>, ApiError> {
    let mut arrivals: Vec<Arrival> = state
        .dataset
        .arrivals
        .iter()
        .filter(|a| a.stop_id == stop_id)
        .cloned()
        .collect();
    if arrivals.is_empty() {
        return Err(not_found(format!("No arrivals found for stop {stop_id}")));
    }
    arrivals.sort_by(|a, b| a.estimated_time.cmp(&b.estimated_time));
    Ok(Json(arrivals))
}

async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.dataset.alerts.clone())
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "stops": state.dataset.stops.len(),
        "routes": state.dataset.routes.len(),
        "alerts": state.dataset.alerts.len(),
    }))
}
