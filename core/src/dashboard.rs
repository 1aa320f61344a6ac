//! Small helpers shared by the dashboard views: demo alerts to show when the
//! alerts feed is unavailable, per-severity counts, and "N min ago" ages.

use chrono::{DateTime, Duration, Utc};

use crate::types::{Alert, AlertCategory, Severity};

/// Demo alerts displayed when `/alerts` fails. Ages are relative to `now`.
pub fn sample_alerts(now: DateTime<Utc>) -> Vec<Alert> {
    vec![
        Alert {
            id: "mock-1".to_string(),
            category: AlertCategory::Disruption,
            title: "BART System-Wide Delays".to_string(),
            description: "All BART lines experiencing 10-15 minute delays due to equipment \
                          malfunction at Montgomery Station. Crews are working to resolve the issue."
                .to_string(),
            route: Some("All BART Lines".to_string()),
            severity: Severity::High,
            created_at: now - Duration::minutes(23),
            updated_at: None,
        },
        Alert {
            id: "mock-2".to_string(),
            category: AlertCategory::Delay,
            title: "Caltrain Express Service Suspended".to_string(),
            description: "Express service between San Francisco and San Jose suspended until \
                          further notice. Local service operating with minor delays."
                .to_string(),
            route: Some("Caltrain Express".to_string()),
            severity: Severity::Medium,
            created_at: now - Duration::minutes(60),
            updated_at: None,
        },
        Alert {
            id: "mock-3".to_string(),
            category: AlertCategory::Maintenance,
            title: "Weekend Track Work - Muni Metro".to_string(),
            description: "N-Judah line will operate on bus substitution this weekend between \
                          Ocean Beach and Embarcadero stations."
                .to_string(),
            route: Some("Muni N-Judah".to_string()),
            severity: Severity::Low,
            created_at: now - Duration::hours(3),
            updated_at: None,
        },
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCounts {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl AlertCounts {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut counts, alert| {
            counts.total += 1;
            match alert.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
            counts
        })
    }
}

/// Coarse age of `then` as seen at `now`. Timestamps in the future read as
/// `"0 min ago"`.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes} min ago")
    } else if minutes < 1440 {
        format!("{} hours ago", minutes / 60)
    } else {
        format!("{} days ago", minutes / 1440)
    }
}
