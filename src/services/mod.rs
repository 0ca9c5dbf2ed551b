/// Feed lifecycle and query layer
use crate::domain::{DashboardMetric, Gauge, Satellite, TrendPoint};
use crate::feed::{gauges, TelemetryFeed};
use crate::repo::{Snapshot, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

struct Ticker {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns a feed and the background task that ticks it
pub struct FeedService {
    feed: Arc<TelemetryFeed>,
    ticker: Mutex<Option<Ticker>>,
}

impl FeedService {
    pub fn new(feed: TelemetryFeed) -> Self {
        Self {
            feed: Arc::new(feed),
            ticker: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn feed(&self) -> &Arc<TelemetryFeed> {
        &self.feed
    }

    /// Start ticking every `period`; the first tick fires one period from now.
    /// Returns false if the ticker was already running.
    pub fn start(&self, period: Duration) -> bool {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            return false;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let feed = Arc::clone(&self.feed);
        let task = tokio::spawn(async move {
            info!("Starting telemetry feed task (interval: {:?})", period);
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        feed.tick();
                    }
                }
            }
            info!(ticks = feed.ticks(), "Telemetry feed task stopped");
        });

        *ticker = Some(Ticker { shutdown, task });
        true
    }

    /// Stop the ticker and wait for it to finish. Returns false if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(ticker) = self.ticker.lock().take() else {
            return false;
        };
        let _ = ticker.shutdown.send(true);
        if let Err(e) = ticker.task.await {
            warn!("Telemetry feed task ended abnormally: {:?}", e);
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.ticker.lock().is_some()
    }

    pub fn satellites(&self) -> Snapshot<Vec<Satellite>> {
        self.feed.satellite_stream().latest()
    }

    pub fn satellite_history(&self, limit: usize) -> Vec<Snapshot<Vec<Satellite>>> {
        let history = self.feed.satellite_stream().history();
        let skip = history.len().saturating_sub(limit);
        history.into_iter().skip(skip).collect()
    }

    pub fn metrics(&self) -> Snapshot<Vec<DashboardMetric>> {
        self.feed.metric_stream().latest()
    }

    pub fn trend(&self) -> Snapshot<Vec<TrendPoint>> {
        self.feed.trend_stream().latest()
    }

    pub fn satellite(&self, id: &str) -> Option<Satellite> {
        self.feed.satellite(id)
    }

    pub fn gauges(&self, id: &str) -> Option<Vec<Gauge>> {
        self.feed.satellite(id).map(|sat| gauges(&sat))
    }

    pub fn subscribe_satellites(&self) -> Subscription<Vec<Satellite>> {
        self.feed.subscribe_satellites()
    }

    pub fn subscribe_metrics(&self) -> Subscription<Vec<DashboardMetric>> {
        self.feed.subscribe_metrics()
    }

    pub fn subscribe_trend(&self) -> Subscription<Vec<TrendPoint>> {
        self.feed.subscribe_trend()
    }
}
