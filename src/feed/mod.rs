/// Simulated telemetry feed: owns fleet state and drives it forward tick by tick
use crate::domain::{
    DashboardMetric, Gauge, HealthTier, Satellite, SatelliteStatus, SubsystemScore, Trend,
    TrendPoint,
};
use crate::errors::FeedError;
use crate::repo::{SnapshotRepo, StreamKind, Subscription};
use crate::sources::{Clock, Perturbation};
use crate::utils::{clamp_percent, comfort_score, mean, trend_label};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Satellites above this data rate count as an active signal
pub const ACTIVE_SIGNAL_THRESHOLD: f64 = 50.0;

const TEMPERATURE_GAUGE_COLOR: &str = "#60a5fa";

/// Tunables for a feed instance
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Append a trend point every N ticks; 0 keeps the trend buffer as seeded
    pub trend_sample_every: u64,
    /// Upper bound on retained trend points
    pub trend_capacity: usize,
    /// Snapshots retained per stream for replay
    pub snapshot_history: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            trend_sample_every: 0,
            trend_capacity: 24,
            snapshot_history: 16,
        }
    }
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub satellites_seq: u64,
    pub metrics_seq: u64,
    pub trend_seq: Option<u64>,
}

struct FleetState {
    satellites: IndexMap<String, Satellite>,
    trend: VecDeque<TrendPoint>,
    perturbation: Box<dyn Perturbation>,
    ticks: u64,
}

pub struct TelemetryFeed {
    settings: FeedSettings,
    clock: Arc<dyn Clock>,
    state: Mutex<FleetState>,
    satellites: SnapshotRepo<Vec<Satellite>>,
    metrics: SnapshotRepo<Vec<DashboardMetric>>,
    trend: SnapshotRepo<Vec<TrendPoint>>,
}

impl TelemetryFeed {
    /// Build a feed over the given fleet and publish the initial snapshots
    pub fn new(
        fleet: Vec<Satellite>,
        trend: Vec<TrendPoint>,
        settings: FeedSettings,
        perturbation: Box<dyn Perturbation>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FeedError> {
        if fleet.is_empty() {
            return Err(FeedError::EmptyFleet);
        }

        let mut satellites: IndexMap<String, Satellite> = IndexMap::with_capacity(fleet.len());
        for mut sat in fleet {
            if satellites.contains_key(&sat.id) {
                return Err(FeedError::DuplicateSatellite(sat.id));
            }
            // trend series are keyed by name
            if satellites.values().any(|other| other.name == sat.name) {
                return Err(FeedError::DuplicateName(sat.name));
            }
            sat.health = clamp_percent(sat.health);
            sat.status = SatelliteStatus::from_health(sat.health);
            satellites.insert(sat.id.clone(), sat);
        }

        let mut trend: VecDeque<TrendPoint> = trend.into();
        let capacity = settings.trend_capacity.max(1);
        while trend.len() > capacity {
            trend.pop_front();
        }

        let now = clock.now();
        let snapshot: Vec<Satellite> = satellites.values().cloned().collect();
        let metrics = compute_metrics(&snapshot);
        let history = settings.snapshot_history;

        info!(satellites = snapshot.len(), trend_points = trend.len(), "telemetry feed initialized");

        Ok(Self {
            satellites: SnapshotRepo::new(StreamKind::Satellites, snapshot, now, history),
            metrics: SnapshotRepo::new(StreamKind::Metrics, metrics, now, history),
            trend: SnapshotRepo::new(
                StreamKind::Trend,
                trend.iter().cloned().collect(),
                now,
                history,
            ),
            state: Mutex::new(FleetState {
                satellites,
                trend,
                perturbation,
                ticks: 0,
            }),
            settings,
            clock,
        })
    }

    /// Build a feed over the built-in four satellite fleet
    pub fn seeded(
        settings: FeedSettings,
        perturbation: Box<dyn Perturbation>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FeedError> {
        let now = clock.now();
        Self::new(seed_fleet(now), seed_trend(), settings, perturbation, clock)
    }

    /// Advance every satellite by one random-walk step and publish the results.
    ///
    /// Ticks never interleave: the fleet lock is held from the first mutation
    /// until the last subscriber has been handed its snapshot.
    pub fn tick(&self) -> TickReport {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.ticks += 1;
        let tick = state.ticks;

        let FleetState {
            satellites,
            perturbation,
            ..
        } = &mut *state;
        for sat in satellites.values_mut() {
            let delta = perturbation.delta(sat);
            let previous = sat.status;
            sat.health = clamp_percent(sat.health + delta);
            sat.status = SatelliteStatus::from_health(sat.health);
            sat.last_update = now;

            if sat.status != previous {
                if sat.status == SatelliteStatus::Critical {
                    warn!(satellite = %sat.name, health = sat.health, "satellite entered critical state");
                } else {
                    info!(satellite = %sat.name, from = %previous, to = %sat.status, "satellite status changed");
                }
            }
        }

        let snapshot: Vec<Satellite> = state.satellites.values().cloned().collect();
        let metrics = compute_metrics(&snapshot);
        if let Some(fleet_health) = metrics.first() {
            debug!(
                tick,
                fleet_health = fleet_health.value,
                satellite_subscribers = self.satellites.subscriber_count(),
                metric_subscribers = self.metrics.subscriber_count(),
                "telemetry tick"
            );
        }

        let trend_seq = if self.should_sample(tick) {
            let point = TrendPoint::new(
                trend_label(now),
                snapshot.iter().map(|s| (s.name.as_str(), s.health)),
            );
            state.trend.push_back(point);
            while state.trend.len() > self.settings.trend_capacity.max(1) {
                state.trend.pop_front();
            }
            Some(state.trend.iter().cloned().collect())
        } else {
            None
        };

        let satellites_seq = self.satellites.publish(snapshot, now);
        let metrics_seq = self.metrics.publish(metrics, now);
        let trend_seq = trend_seq.map(|points| self.trend.publish(points, now));

        TickReport {
            tick,
            satellites_seq,
            metrics_seq,
            trend_seq,
        }
    }

    fn should_sample(&self, tick: u64) -> bool {
        let every = self.settings.trend_sample_every;
        every > 0 && tick % every == 0
    }

    /// Number of ticks applied so far
    pub fn ticks(&self) -> u64 {
        self.state.lock().ticks
    }

    pub fn satellites(&self) -> Arc<Vec<Satellite>> {
        self.satellites.latest().data
    }

    #[cfg(test)]
    pub fn metrics(&self) -> Arc<Vec<DashboardMetric>> {
        self.metrics.latest().data
    }

    #[cfg(test)]
    pub fn trend(&self) -> Arc<Vec<TrendPoint>> {
        self.trend.latest().data
    }

    /// Look a satellite up in the latest published snapshot
    pub fn satellite(&self, id: &str) -> Option<Satellite> {
        self.satellites().iter().find(|s| s.id == id).cloned()
    }

    pub fn satellite_stream(&self) -> &SnapshotRepo<Vec<Satellite>> {
        &self.satellites
    }

    pub fn metric_stream(&self) -> &SnapshotRepo<Vec<DashboardMetric>> {
        &self.metrics
    }

    pub fn trend_stream(&self) -> &SnapshotRepo<Vec<TrendPoint>> {
        &self.trend
    }

    pub fn subscribe_satellites(&self) -> Subscription<Vec<Satellite>> {
        self.satellites.subscribe()
    }

    pub fn subscribe_metrics(&self) -> Subscription<Vec<DashboardMetric>> {
        self.metrics.subscribe()
    }

    pub fn subscribe_trend(&self) -> Subscription<Vec<TrendPoint>> {
        self.trend.subscribe()
    }
}

/// Fleet aggregates, recomputed from scratch for every snapshot
pub fn compute_metrics(satellites: &[Satellite]) -> Vec<DashboardMetric> {
    let total = satellites.len();
    let fleet_health = mean(satellites.iter().map(|s| s.health)).unwrap_or(0.0);
    let avg_power = mean(satellites.iter().map(|s| s.power)).unwrap_or(0.0);
    let operational = satellites
        .iter()
        .filter(|s| s.status == SatelliteStatus::Operational)
        .count();
    let active = satellites
        .iter()
        .filter(|s| s.data_transmission > ACTIVE_SIGNAL_THRESHOLD)
        .count();

    vec![
        DashboardMetric::new("Fleet Health", fleet_health.round(), "%", Trend::Stable),
        DashboardMetric::new(
            "Operational",
            operational as f64,
            format!("of {}", total),
            Trend::Up,
        ),
        DashboardMetric::new("Active Signals", active as f64, "satellites", Trend::Stable),
        DashboardMetric::new("Avg Power Usage", avg_power.round(), "%", Trend::Down),
    ]
}

/// Power, temperature comfort and data rate gauges for one satellite
pub fn gauges(satellite: &Satellite) -> Vec<Gauge> {
    vec![
        Gauge {
            name: "Power",
            value: satellite.power,
            color: HealthTier::from_health(satellite.power).hex(),
        },
        Gauge {
            name: "Temperature",
            value: comfort_score(satellite.temperature),
            color: TEMPERATURE_GAUGE_COLOR,
        },
        Gauge {
            name: "Data TX",
            value: satellite.data_transmission,
            color: HealthTier::from_health(satellite.data_transmission).hex(),
        },
    ]
}

fn seed_satellite(
    id: &str,
    name: &str,
    health: f64,
    last_update: DateTime<Utc>,
    (temperature, power, data_transmission): (f64, f64, f64),
    systems: [f64; 4],
) -> Satellite {
    let names = ["Power Supply", "Thermal Control", "Communication", "Propulsion"];
    Satellite {
        id: id.to_string(),
        name: name.to_string(),
        health,
        status: SatelliteStatus::from_health(health),
        last_update,
        temperature,
        power,
        data_transmission,
        systems: names
            .iter()
            .zip(systems)
            .map(|(name, score)| SubsystemScore::new(*name, score))
            .collect(),
    }
}

/// The four tracked CubeSats as they stand at process start
pub fn seed_fleet(now: DateTime<Utc>) -> Vec<Satellite> {
    vec![
        seed_satellite(
            "sat-001",
            "TSURU",
            85.0,
            now - Duration::minutes(5),
            (28.0, 92.0, 87.0),
            [95.0, 82.0, 88.0, 79.0],
        ),
        seed_satellite(
            "sat-002",
            "UGUISU",
            90.0,
            now - Duration::minutes(3),
            (25.0, 96.0, 93.0),
            [98.0, 89.0, 91.0, 85.0],
        ),
        seed_satellite(
            "sat-003",
            "NEPALISAT",
            70.0,
            now - Duration::minutes(8),
            (32.0, 72.0, 65.0),
            [68.0, 70.0, 72.0, 60.0],
        ),
        seed_satellite(
            "sat-004",
            "RAAVANA",
            60.0,
            now - Duration::minutes(12),
            (38.0, 55.0, 48.0),
            [50.0, 62.0, 55.0, 45.0],
        ),
    ]
}

/// Hourly health history preceding process start
pub fn seed_trend() -> Vec<TrendPoint> {
    let rows = [
        ("12:00 PM", [87.0, 92.0, 72.0, 65.0]),
        ("1:00 PM", [86.0, 91.0, 71.0, 62.0]),
        ("2:00 PM", [85.0, 90.0, 70.0, 60.0]),
        ("3:00 PM", [84.0, 89.0, 69.0, 58.0]),
    ];
    let names = ["TSURU", "UGUISU", "NEPALISAT", "RAAVANA"];
    rows.iter()
        .map(|(label, values)| TrendPoint::new(*label, names.iter().copied().zip(*values)))
        .collect()
}
