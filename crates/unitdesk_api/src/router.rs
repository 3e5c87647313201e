//! axum hosting for `UnitsApi`.
//!
//! # Invariants
//! - Unknown paths answer 404 and known paths with an unsupported method
//!   answer 405, both with no body.
//! - A body that is not JSON is a 400 `{ "error": ... }` like any other
//!   malformed payload.

use crate::paths::{BASE, UNITS, UNIT_ITEM};
use crate::response::{ApiResponse, StatusCode};
use crate::units::{ListQuery, UnitsApi};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use unitdesk_core::UnitRepository;

type SharedApi<R> = Arc<UnitsApi<R>>;

/// Builds `/api/units` and `/api/units/:id` over `api`.
pub fn router<R>(api: SharedApi<R>) -> Router
where
    R: UnitRepository + Send + Sync + 'static,
{
    let units = Router::new()
        .route(UNITS, get(list_units::<R>).post(create_unit::<R>))
        .route(UNIT_ITEM, get(get_unit::<R>).put(update_unit::<R>));

    Router::new()
        .nest(BASE, units)
        .layer(middleware::from_fn(log_request))
        .with_state(api)
}

/// Serves `router(api)` on `listener` until the process stops.
pub async fn serve<R>(listener: TcpListener, api: SharedApi<R>) -> std::io::Result<()>
where
    R: UnitRepository + Send + Sync + 'static,
{
    info!(
        "event=api_serve module=api status=start addr={}",
        listener.local_addr()?
    );
    axum::serve(listener, router(api)).await
}

async fn list_units<R>(
    State(api): State<SharedApi<R>>,
    Query(query): Query<ListQuery>,
) -> ApiResponse
where
    R: UnitRepository + Send + Sync + 'static,
{
    api.list(&query)
}

async fn get_unit<R>(State(api): State<SharedApi<R>>, Path(id): Path<String>) -> ApiResponse
where
    R: UnitRepository + Send + Sync + 'static,
{
    api.get_one(&id)
}

async fn create_unit<R>(
    State(api): State<SharedApi<R>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResponse
where
    R: UnitRepository + Send + Sync + 'static,
{
    match payload {
        Ok(Json(body)) => api.create(&body),
        Err(rejection) => ApiResponse::error(StatusCode::BAD_REQUEST, rejection.body_text()),
    }
}

async fn update_unit<R>(
    State(api): State<SharedApi<R>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResponse
where
    R: UnitRepository + Send + Sync + 'static,
{
    match payload {
        Ok(Json(body)) => api.update(&id, &body),
        Err(rejection) => ApiResponse::error(StatusCode::BAD_REQUEST, rejection.body_text()),
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    info!(
        "event=api_request module=api status={} method={method} path={path} http_status={} duration_ms={}",
        if status.is_success() { "ok" } else { "error" },
        status.as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
