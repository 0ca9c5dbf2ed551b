/// HTTP request handlers
use crate::domain::{DashboardMetric, Health, Satellite, TrendPoint};
use crate::errors::{ApiError, ApiResult};
use crate::repo::{Snapshot, Subscription};
use crate::services::FeedService;
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

const DEFAULT_HISTORY_LIMIT: usize = 8;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub feed_service: Arc<FeedService>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Latest satellite snapshot
pub async fn get_satellites(
    State(state): State<AppState>,
) -> Json<SuccessResponse<Snapshot<Vec<Satellite>>>> {
    Json(SuccessResponse::new(state.feed_service.satellites()))
}

/// Recent satellite snapshots, oldest first
pub async fn get_satellite_history(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let limit = match params.get("limit") {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ApiError::InvalidInput(format!(
                    "limit must be a positive integer, got '{}'",
                    raw
                )))
            }
        },
        None => DEFAULT_HISTORY_LIMIT,
    };

    let snapshots = state.feed_service.satellite_history(limit);
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "snapshots": snapshots
        })
    ))))
}

/// One satellite from the latest snapshot
pub async fn get_satellite(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let satellite = state
        .feed_service
        .satellite(&id)
        .ok_or_else(|| ApiError::NotFound(format!("satellite {}", id)))?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "satellite": satellite
        })
    ))))
}

/// Power, temperature and data rate gauges for one satellite
pub async fn get_satellite_gauges(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let gauges = state
        .feed_service
        .gauges(&id)
        .ok_or_else(|| ApiError::NotFound(format!("satellite {}", id)))?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "id": id,
            "gauges": gauges
        })
    ))))
}

/// Latest fleet metrics
pub async fn get_metrics(
    State(state): State<AppState>,
) -> Json<SuccessResponse<Snapshot<Vec<DashboardMetric>>>> {
    Json(SuccessResponse::new(state.feed_service.metrics()))
}

/// Latest trend buffer
pub async fn get_trend(
    State(state): State<AppState>,
) -> Json<SuccessResponse<Snapshot<Vec<TrendPoint>>>> {
    Json(SuccessResponse::new(state.feed_service.trend()))
}

/// Satellite snapshots as server-sent events
pub async fn stream_satellites(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    sse(state.feed_service.subscribe_satellites())
}

/// Metric snapshots as server-sent events
pub async fn stream_metrics(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    sse(state.feed_service.subscribe_metrics())
}

/// Trend snapshots as server-sent events
pub async fn stream_trend(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    sse(state.feed_service.subscribe_trend())
}

fn sse<T>(subscription: Subscription<T>) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
    T: Serialize + Send + Sync + 'static,
{
    let kind = subscription.kind();
    debug!(stream = %kind, subscriber = subscription.id(), "Event stream attached");
    let events = subscription.into_stream().map(move |snapshot| {
        Event::default()
            .event(kind.as_str())
            .id(snapshot.seq.to_string())
            .json_data(&snapshot)
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedSettings, TelemetryFeed};
    use crate::sources::testing::ScriptedPerturbation;
    use crate::sources::SystemClock;
    use axum::response::IntoResponse;

    fn state() -> AppState {
        let feed = TelemetryFeed::seeded(
            FeedSettings::default(),
            Box::new(ScriptedPerturbation::constant(0.5)),
            Arc::new(SystemClock),
        )
        .unwrap();
        AppState {
            feed_service: Arc::new(FeedService::new(feed)),
        }
    }

    /// Read body frames until one complete event is buffered, returning its fields
    async fn next_event<S>(body: &mut S, buffer: &mut String) -> HashMap<String, String>
    where
        S: Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
    {
        loop {
            if let Some(end) = buffer.find("\n\n") {
                let raw: String = buffer.drain(..end + 2).collect();
                return raw
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .map(|(field, value)| (field.to_string(), value.trim_start().to_string()))
                    .collect();
            }
            let chunk = body.next().await.unwrap().unwrap();
            buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    #[tokio::test]
    async fn test_stream_replays_latest_then_follows_ticks() {
        let state = state();
        let response = stream_satellites(State(state.clone())).await.into_response();
        let mut body = Box::pin(response.into_body().into_data_stream());
        let mut buffer = String::new();

        let first = next_event(&mut body, &mut buffer).await;
        assert_eq!(first["event"], "satellites");
        assert_eq!(first["id"], "0");
        let data: Value = serde_json::from_str(&first["data"]).unwrap();
        assert_eq!(data["seq"], 0);
        assert_eq!(data["data"][0]["health"], 85.0);

        state.feed_service.feed().tick();

        let second = next_event(&mut body, &mut buffer).await;
        assert_eq!(second["event"], "satellites");
        assert_eq!(second["id"], "1");
        let data: Value = serde_json::from_str(&second["data"]).unwrap();
        assert_eq!(data["seq"], 1);
        assert_eq!(data["data"][0]["health"], 85.5);
    }

    #[tokio::test]
    async fn test_metric_stream_is_tagged_with_its_kind() {
        let state = state();
        let response = stream_metrics(State(state)).await.into_response();
        let mut body = Box::pin(response.into_body().into_data_stream());
        let mut buffer = String::new();

        let first = next_event(&mut body, &mut buffer).await;
        assert_eq!(first["event"], "metrics");
        assert_eq!(first["id"], "0");
    }

    #[tokio::test]
    async fn test_get_satellite_found() {
        let Json(body) = get_satellite(Path("sat-002".to_string()), State(state()))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["satellite"]["name"], "UGUISU");
        assert_eq!(body["satellite"]["status"], "operational");
        assert_eq!(body["satellite"]["dataTransmission"], 93.0);
    }

    #[tokio::test]
    async fn test_get_satellite_not_found() {
        let err = get_satellite(Path("sat-999".to_string()), State(state()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_gauges() {
        let Json(body) = get_satellite_gauges(Path("sat-004".to_string()), State(state()))
            .await
            .unwrap();
        assert_eq!(body["gauges"][1]["name"], "Temperature");
        assert_eq!(body["gauges"][1]["value"], 74.0);
    }

    #[tokio::test]
    async fn test_get_satellites_reflects_ticks() {
        let state = state();
        state.feed_service.feed().tick();
        let Json(body) = get_satellites(State(state)).await;
        assert!(body.ok);
        assert_eq!(body.data.seq, 1);
        assert_eq!(body.data.data[0].health, 85.5);
    }

    #[tokio::test]
    async fn test_get_metrics_shape() {
        let Json(body) = get_metrics(State(state())).await;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["seq"], 0);
        assert_eq!(json["data"][0]["label"], "Fleet Health");
        assert_eq!(json["data"][0]["trend"], "stable");
    }

    #[tokio::test]
    async fn test_history_rejects_bad_limit() {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), "0".to_string());
        let err = get_satellite_history(Query(params), State(state()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_history_default_limit() {
        let state = state();
        for _ in 0..10 {
            state.feed_service.feed().tick();
        }
        let Json(body) = get_satellite_history(Query(HashMap::new()), State(state))
            .await
            .unwrap();
        let snapshots = body["snapshots"].as_array().unwrap();
        assert_eq!(snapshots.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(snapshots.last().unwrap()["seq"], 10);
    }

    #[tokio::test]
    async fn test_trend_is_seeded() {
        let Json(body) = get_trend(State(state())).await;
        assert_eq!(body.data.data.len(), 4);
        assert_eq!(body.data.data[0].timestamp, "12:00 PM");
    }
}
