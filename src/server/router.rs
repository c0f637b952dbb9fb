use crate::db::{Db, TableSpec, tables};
use crate::server::db_target::{X_DB_TARGET, requested_target, scope_db_target};
use crate::server::routes::{entity, health};
use crate::service::EntityService;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode, Version, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use base64::Engine as _;
use rand::RngCore;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Db,
}

impl AppState {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn entities(&self, spec: &'static TableSpec) -> EntityService {
        EntityService::new(&self.db, spec)
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn access_log(req: Request, next: Next) -> Response {
    // Capture request metadata before moving `req` into the handler stack.
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();
    let db_target =
        requested_target(req.headers(), uri.query()).map_or("-", |kind| kind.as_str());

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let start = Instant::now();
    let mut resp = next.run(req).await;

    // Always reflect `x-request-id` for easier correlation, even if the client didn't send one.
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {:<6} | {} | {}ms",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            db_target,
            path,
            latency_ms
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {:<6} | {} | {}ms",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            db_target,
            path,
            latency_ms
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {:<6} | {} | {}ms",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            db_target,
            path,
            latency_ms
        );
    }

    resp
}

/// Browser callers may send credentials and the backend override header from any origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, X_DB_TARGET])
        .allow_credentials(true)
}

pub fn worldforge_router(state: AppState) -> Router {
    let mut api = Router::new().route("/health", get(health::health));
    for spec in tables::ALL {
        api = api.merge(entity::router(spec));
    }

    api.fallback(not_found_handler)
        .with_state(state)
        // Innermost: every handler and the fallback run inside the request's db scope.
        .layer(middleware::from_fn(scope_db_target))
        .layer(cors_layer())
        .layer(middleware::from_fn(access_log))
}
