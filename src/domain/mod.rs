/// Domain models for the fleet feed
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lower bound (inclusive) of the operational / green tier
pub const OPERATIONAL_THRESHOLD: f64 = 75.0;
/// Lower bound (inclusive) of the degraded / amber tier
pub const DEGRADED_THRESHOLD: f64 = 50.0;
/// Lower bound (inclusive) of the at-risk / orange tier
pub const AT_RISK_THRESHOLD: f64 = 30.0;

/// Severity rank shared by status labels and health colors, 0 = best
fn severity_rank(health: f64) -> u8 {
    if health >= OPERATIONAL_THRESHOLD {
        0
    } else if health >= DEGRADED_THRESHOLD {
        1
    } else if health >= AT_RISK_THRESHOLD {
        2
    } else {
        3
    }
}

/// Categorical satellite status derived from health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SatelliteStatus {
    Operational,
    Degraded,
    AtRisk,
    Critical,
}

impl SatelliteStatus {
    pub fn from_health(health: f64) -> Self {
        match severity_rank(health) {
            0 => SatelliteStatus::Operational,
            1 => SatelliteStatus::Degraded,
            2 => SatelliteStatus::AtRisk,
            _ => SatelliteStatus::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SatelliteStatus::Operational => "operational",
            SatelliteStatus::Degraded => "degraded",
            SatelliteStatus::AtRisk => "at-risk",
            SatelliteStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for SatelliteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity color for a health-like value.
///
/// Uses the same cut-offs as [`SatelliteStatus::from_health`], so a color
/// and a status label derived from the same value always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Green,
    Amber,
    Orange,
    Red,
}

impl HealthTier {
    pub fn from_health(health: f64) -> Self {
        match severity_rank(health) {
            0 => HealthTier::Green,
            1 => HealthTier::Amber,
            2 => HealthTier::Orange,
            _ => HealthTier::Red,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            HealthTier::Green => "#16a34a",
            HealthTier::Amber => "#f59e0b",
            HealthTier::Orange => "#f97316",
            HealthTier::Red => "#ef4444",
        }
    }
}

/// Score of a named subsystem (power supply, thermal control, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemScore {
    pub name: String,
    pub score: f64,
}

impl SubsystemScore {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// One tracked spacecraft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Satellite {
    pub id: String,
    pub name: String,
    pub health: f64,
    pub status: SatelliteStatus,
    pub last_update: DateTime<Utc>,
    pub temperature: f64,
    pub power: f64,
    pub data_transmission: f64,
    pub systems: Vec<SubsystemScore>,
}

/// One historical sample: a time label plus a health value per satellite name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: String,
    #[serde(flatten)]
    pub series: BTreeMap<String, f64>,
}

impl TrendPoint {
    pub fn new<'a, I>(timestamp: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        Self {
            timestamp: timestamp.into(),
            series: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.series.get(name).copied()
    }
}

/// Direction label attached to a dashboard metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Fleet-wide aggregate recomputed on every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetric {
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub trend: Trend,
}

impl DashboardMetric {
    pub fn new(label: &str, value: f64, unit: impl Into<String>, trend: Trend) -> Self {
        Self {
            label: label.to_string(),
            value,
            unit: unit.into(),
            trend,
        }
    }
}

/// Per-satellite gauge shown next to the health donut
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub name: &'static str,
    pub value: f64,
    pub color: &'static str,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
