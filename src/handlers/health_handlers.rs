//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that opens (or reuses) the store handle

use crate::services::image_service::ImageService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Always 200 OK. Never touches the store.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Connects through the gateway (the first call here may be what opens the
/// pool) and runs `SELECT 1`. 200 when that works, 503 otherwise.
pub async fn readyz(State(service): State<ImageService>) -> impl IntoResponse {
    let check = match service.gateway.connect().await {
        Ok(handle) => match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&handle.pool)
            .await
        {
            Ok(1) => CheckStatus {
                ok: true,
                error: None,
            },
            Ok(v) => CheckStatus {
                ok: false,
                error: Some(format!("unexpected result: {}", v)),
            },
            Err(e) => CheckStatus {
                ok: false,
                error: Some(format!("error: {}", e)),
            },
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("connect failed: {}", e)),
        },
    };

    let status = if check.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if check.ok { "ok".into() } else { "error".into() },
        database: check,
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    database: CheckStatus,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
