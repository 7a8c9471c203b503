//! HTTP front end.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /` | a showcase image (`image/png` or `image/gif`), `X-Cache: HIT \| MISS \| PASS` |
//! | `GET /healthz` | `200 ok` |
//!
//! Rendering is CPU-bound, so each request runs the pipeline on tokio's
//! blocking pool. Errors are logged in full and answered with a `500` carrying
//! only the generic [`public_message`](crate::pipeline::ShowcaseError::public_message).

use crate::pipeline::{Served, Showcase};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Message for failures that never reached the pipeline (e.g. a panicked task).
const INTERNAL_ERROR: &str = "Failed to process image.";

pub fn router(showcase: Arc<Showcase>) -> Router {
    Router::new()
        .route("/", get(showcase_image))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(showcase)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(showcase: Arc<Showcase>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "showcase listening");
    axum::serve(listener, router(showcase)).await
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn showcase_image(State(showcase): State<Arc<Showcase>>) -> Response {
    match tokio::task::spawn_blocking(move || showcase.serve()).await {
        Ok(Ok(served)) => image_response(served),
        Ok(Err(e)) => {
            error!(error = %e, "showcase request failed");
            error_response(e.public_message())
        }
        Err(e) => {
            error!(error = %e, "showcase task did not complete");
            error_response(INTERNAL_ERROR)
        }
    }
}

fn image_response(served: Served) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(served.content_type),
    );
    // Every request may pick a different image
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        "x-cache",
        HeaderValue::from_static(served.origin.cache_header()),
    );
    (StatusCode::OK, headers, served.body).into_response()
}

fn error_response(message: &'static str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        message,
    )
        .into_response()
}
