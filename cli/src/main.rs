//! Command-line view of the transit API.
//!
//! Builds one `TransitClient` from the environment, runs the requested fetch
//! through an `ApiData` container the same way a dashboard view does, and
//! prints the settled result. Alerts fall back to the built-in sample alerts
//! when the feed is unavailable.

use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transit_core::{
    relative_age, sample_alerts, AlertCounts, ApiData, ApiError, ClientConfig, FetchState,
    TransitClient, Transport, DEFAULT_ERROR_MESSAGE,
};

type Client = TransitClient<Box<dyn Transport>>;

#[derive(Parser)]
#[command(name = "transit-cli")]
#[command(about = "Query the transit dashboard API", long_about = None)]
struct Cli {
    /// API origin, overriding TRANSIT_API_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all stops
    Stops,
    /// List all routes
    Routes,
    /// Upcoming arrivals at a stop
    Arrivals {
        #[arg(value_name = "STOP_ID")]
        stop_id: String,
    },
    /// Stops served by a route
    RouteStops {
        #[arg(value_name = "ROUTE_ID")]
        route_id: String,
    },
    /// Service alerts, with sample alerts as a fallback
    Alerts,
    /// Raw system status payload
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    info!(base_url = %config.base_url, retry = config.retry.is_some(), "client configured");
    let client = Arc::new(TransitClient::from_config(&config)?);

    match cli.command {
        Commands::Stops => {
            let stops = require(load(&client, (), |c, _| async move { c.list_stops().await }).await)?;
            for stop in stops {
                println!("{}\t{}\t{:.5},{:.5}", stop.id, stop.name, stop.lat, stop.lng);
            }
        }
        Commands::Routes => {
            let routes =
                require(load(&client, (), |c, _| async move { c.list_routes().await }).await)?;
            for route in routes {
                println!("{}\t{}\t{}", route.id, route.name, route.mode.as_str());
            }
        }
        Commands::Arrivals { stop_id } => {
            let arrivals = require(
                load(&client, stop_id, |c, stop_id: String| async move {
                    c.get_arrivals(&stop_id).await
                })
                .await,
            )?;
            for arrival in arrivals {
                let delay = match arrival.delay_minutes {
                    Some(minutes) if minutes > 0 => format!(" (+{minutes} min)"),
                    _ => String::new(),
                };
                println!(
                    "{}\t{}\t{}{delay}",
                    arrival.estimated_time, arrival.route_name, arrival.destination
                );
            }
        }
        Commands::RouteStops { route_id } => {
            let stops = require(
                load(&client, route_id, |c, route_id: String| async move {
                    c.get_route_stops(&route_id).await
                })
                .await,
            )?;
            for stop in stops {
                println!("{}\t{}", stop.id, stop.name);
            }
        }
        Commands::Alerts => {
            let state = load(&client, (), |c, _| async move { c.list_alerts().await }).await;
            let now = Utc::now();
            let fallback = sample_alerts(now);
            if let Some(error) = &state.error {
                warn!(%error, "alerts unavailable, showing sample alerts");
                eprintln!("alerts unavailable ({error}); showing sample alerts");
            }
            let alerts = state.data_or_fallback(&fallback).map(Vec::as_slice).unwrap_or_default();

            let counts = AlertCounts::from_alerts(alerts);
            println!(
                "{} alerts: {} high, {} medium, {} low",
                counts.total, counts.high, counts.medium, counts.low
            );
            for alert in alerts {
                let route = alert.route.as_deref().unwrap_or("system-wide");
                println!(
                    "[{}] {}: {} ({route}, {})",
                    alert.severity.as_str(),
                    alert.category.as_str(),
                    alert.title,
                    relative_age(alert.created_at, now)
                );
            }
        }
        Commands::Status => {
            let status =
                require(load(&client, (), |c, _| async move { c.get_system_status().await }).await)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

/// Run one fetch through a fresh `ApiData` and wait for it to settle.
async fn load<T, D, F, Fut>(client: &Arc<Client>, deps: D, fetch: F) -> FetchState<T>
where
    T: Clone + Send + Sync + 'static,
    D: Clone + PartialEq + Send + 'static,
    F: Fn(Arc<Client>, D) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let client = Arc::clone(client);
    let data = ApiData::new(deps, move |deps| fetch(Arc::clone(&client), deps));
    data.settled().await
}

fn require<T>(state: FetchState<T>) -> Result<T> {
    match state.data {
        Some(data) => Ok(data),
        None => Err(anyhow!(state
            .error
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()))),
    }
}
