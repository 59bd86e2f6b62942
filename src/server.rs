use std::{any::Any, net::SocketAddr, time::Duration};

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower::{
    ServiceBuilder,
    timeout::{TimeoutLayer, error::Elapsed},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info, info_span, warn};

use crate::{
    config::Config,
    handlers::{annotations, health, images, users},
    models::Status,
    state::AppState,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// All API routes under `/v1`, without middleware.
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/images", get(images::list_images).post(images::create_image))
        .route(
            "/images/{id}",
            get(images::get_image)
                .put(images::update_image)
                .delete(images::delete_image),
        )
        .route(
            "/annotations",
            get(annotations::list_annotations).post(annotations::create_annotation),
        )
        .route(
            "/annotations/{id}",
            get(annotations::get_annotation)
                .put(annotations::update_annotation)
                .delete(annotations::delete_annotation),
        );

    Router::new().nest("/v1", v1).with_state(state)
}

/// Wrap a router in the standard middleware stack. Outermost first:
/// request id, tracing, request id echo, panic recovery, timeout, CORS.
/// A request exceeding `request_timeout` gets a JSON 408.
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    router
        .layer(cors_layer)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        warn!("Request timed out");
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "response": Status::error("Request timed out") })),
        )
            .into_response();
    }

    error!(error = %err, "Unhandled middleware error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "response": Status::error("Internal server error") })),
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "response": Status::error("Internal server error") })),
    )
        .into_response()
}

/// Bind the listener and serve until the process is killed.
pub async fn run(config: &Config, state: AppState) -> anyhow::Result<()> {
    let app = with_middleware(router(state), config.request_timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
