use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{AppState, device_state, health, list_devices, test_connection};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/devices", get(list_devices))
        .route("/devices/{name}/state", get(device_state))
        .route("/test-connection", post(test_connection))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::{MetricKey, Unit};
    use crate::collector::{MeasuredValue, Measurement, Snapshot, SnapshotBuilder};
    use crate::config::settings::ConnectionSettings;
    use crate::coordinator::{Coordinator, PollSource};
    use crate::error::Failure;
    use crate::executor::BlockingExecutor;
    use crate::handlers::DeviceHandle;
    use crate::projection::entities;

    struct Fixed;

    #[async_trait]
    impl PollSource for Fixed {
        async fn poll(&self) -> Result<Snapshot, Failure> {
            let mut builder = SnapshotBuilder::new();
            builder.insert(Measurement {
                key: MetricKey::BatteryCapacity,
                value: MeasuredValue::Number(87.0),
                unit: Unit::Percent,
            });
            Ok(builder.build())
        }
    }

    async fn app() -> Router {
        let coordinator = Coordinator::new("server-room", Fixed, Duration::from_secs(60)).unwrap();
        coordinator.refresh().await;
        let devices = BTreeMap::from([(
            "server-room".to_string(),
            DeviceHandle {
                coordinator,
                entities: entities(&[MetricKey::BatteryCapacity]),
            },
        )]);
        create_router(AppState {
            devices: Arc::new(devices),
            executor: BlockingExecutor::new(1),
            connection: ConnectionSettings::default(),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_counts_devices() {
        let response = app()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["devices"], 1);
        assert_eq!(json["healthy"], 1);
    }

    #[tokio::test]
    async fn device_state_and_listing() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(Request::get("/devices/server-room/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["entities"][0]["value"]["value"], 87.0);

        let response = app
            .oneshot(Request::get("/devices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json[0]["name"], "server-room");
        assert_eq!(json[0]["poll_interval_secs"], 60);
    }

    #[tokio::test]
    async fn unknown_device_is_404() {
        let response = app()
            .await
            .oneshot(Request::get("/devices/rack-z/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_profile_is_400() {
        let body = serde_json::json!({
            "name": "new-ups",
            "host": "10.0.0.9",
            "version": "v3",
            "username": "admin",
            "privacy_protocol": "AES",
            "privacy_password": "privpass123",
        });
        let response = app()
            .await
            .oneshot(
                Request::post("/test-connection")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_config");
    }
}
