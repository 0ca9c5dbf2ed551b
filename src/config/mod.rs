/// Application configuration module
use crate::feed::FeedSettings;
use crate::sources::MAX_PERTURBATION_SPAN;
use anyhow::bail;
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub feed: FeedConfig,
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub tick_seconds: u64,
    pub perturbation_span: f64,
    pub seed: Option<u64>,
    pub trend_sample_every: u64,
    pub trend_capacity: usize,
    pub snapshot_history: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 10,
            perturbation_span: 4.0,
            seed: None,
            trend_sample_every: 0,
            trend_capacity: 24,
            snapshot_history: 16,
        }
    }
}

impl FeedConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }

    pub fn settings(&self) -> FeedSettings {
        FeedSettings {
            trend_sample_every: self.trend_sample_every,
            trend_capacity: self.trend_capacity,
            snapshot_history: self.snapshot_history,
        }
    }

    /// Reject values that parse but cannot drive a feed
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick_seconds == 0 {
            bail!("TICK_EVERY_SECONDS must be greater than zero");
        }
        if !(0.0..=MAX_PERTURBATION_SPAN).contains(&self.perturbation_span) {
            bail!(
                "PERTURBATION_SPAN must be within [0, {}], got {}",
                MAX_PERTURBATION_SPAN,
                self.perturbation_span
            );
        }
        if self.trend_capacity < 4 {
            bail!("TREND_CAPACITY must hold at least the 4 seeded trend points");
        }
        if self.snapshot_history == 0 {
            bail!("SNAPSHOT_HISTORY must be greater than zero");
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            tick_seconds: env_u64("TICK_EVERY_SECONDS", defaults.tick_seconds),
            perturbation_span: env_f64("PERTURBATION_SPAN", defaults.perturbation_span),
            seed: env_opt_u64("FEED_SEED"),
            trend_sample_every: env_u64("TREND_SAMPLE_EVERY_TICKS", defaults.trend_sample_every),
            trend_capacity: env_u64("TREND_CAPACITY", defaults.trend_capacity as u64) as usize,
            snapshot_history: env_u64("SNAPSHOT_HISTORY", defaults.snapshot_history as u64)
                as usize,
        };
        feed.validate()?;

        Ok(Self { bind_addr, feed })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt_u64(key).unwrap_or(default)
}

fn env_opt_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_period(), Duration::from_secs(10));
        assert_eq!(config.settings().trend_sample_every, 0);
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = FeedConfig {
            tick_seconds: 0,
            ..FeedConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_span_rejected() {
        let config = FeedConfig {
            perturbation_span: -4.0,
            ..FeedConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_span_rejected() {
        for span in [f64::MAX, f64::INFINITY, f64::NAN, 100.5] {
            let config = FeedConfig {
                perturbation_span: span,
                ..FeedConfig::default()
            };
            assert!(config.validate().is_err(), "span {} accepted", span);
        }
        let widest = FeedConfig {
            perturbation_span: MAX_PERTURBATION_SPAN,
            ..FeedConfig::default()
        };
        assert!(widest.validate().is_ok());
    }

    #[test]
    fn test_small_trend_capacity_rejected() {
        let config = FeedConfig {
            trend_capacity: 3,
            ..FeedConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_u64_parses_and_falls_back() {
        env::set_var("FLEET_TEST_U64_OK", " 42 ");
        env::set_var("FLEET_TEST_U64_BAD", "forty-two");
        assert_eq!(env_u64("FLEET_TEST_U64_OK", 7), 42);
        assert_eq!(env_u64("FLEET_TEST_U64_BAD", 7), 7);
        assert_eq!(env_u64("FLEET_TEST_U64_MISSING", 7), 7);
    }

    #[test]
    fn test_env_f64_parses() {
        env::set_var("FLEET_TEST_F64", "2.5");
        assert_eq!(env_f64("FLEET_TEST_F64", 4.0), 2.5);
        assert_eq!(env_f64("FLEET_TEST_F64_MISSING", 4.0), 4.0);
    }
}
