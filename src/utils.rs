/// Utility functions
use chrono::{DateTime, Utc};

/// Nominal operating temperature used by the comfort score
pub const NOMINAL_TEMPERATURE_C: f64 = 25.0;

/// Clamp a value into the percentage domain [0, 100]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Arithmetic mean, or None for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Score how close a temperature is to nominal: 100 at 25°C, minus 2 per degree off
pub fn comfort_score(temperature: f64) -> f64 {
    clamp_percent(100.0 - (temperature - NOMINAL_TEMPERATURE_C).abs() * 2.0)
}

/// Wall-clock label used for trend points, e.g. "3:00 PM"
pub fn trend_label(at: DateTime<Utc>) -> String {
    at.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clamp_percent_in_range() {
        assert_eq!(clamp_percent(42.5), 42.5);
    }

    #[test]
    fn test_clamp_percent_bounds() {
        assert_eq!(clamp_percent(105.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(Vec::new()), None);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(vec![80.0, 60.0]), Some(70.0));
    }

    #[test]
    fn test_comfort_score_nominal() {
        assert_eq!(comfort_score(25.0), 100.0);
    }

    #[test]
    fn test_comfort_score_off_nominal() {
        assert_eq!(comfort_score(38.0), 74.0);
        assert_eq!(comfort_score(12.0), 74.0);
        assert_eq!(comfort_score(200.0), 0.0);
    }

    #[test]
    fn test_trend_label_afternoon() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        assert_eq!(trend_label(at), "3:00 PM");
    }

    #[test]
    fn test_trend_label_noon() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 5, 0).unwrap();
        assert_eq!(trend_label(at), "12:05 PM");
    }
}
