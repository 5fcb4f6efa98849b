use std::net::SocketAddr;

use axum::{extract::State, http::StatusCode, routing::{delete, get}, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;
use crate::{assessments, auth, plans, storage};

pub fn build_app(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(auth::router())
        .merge(assessments::router())
        .merge(plans::plans_routes())
        .route("/health", get(|| async { "ok" }));

    if state.config.enable_dev_routes {
        warn!("dev routes enabled");
        api = api.route("/dev/data", delete(clear_data));
    }

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

async fn clear_data(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    storage::clear_all_data(state.storage.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
