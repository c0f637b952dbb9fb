use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};

use tracing::debug;

use crate::db::{BackendKind, run_with_mode};

/// Per-request backend override header.
pub const X_DB_TARGET: HeaderName = HeaderName::from_static("x-db-target");

/// Query parameter consulted only when [`X_DB_TARGET`] is absent.
pub const DB_QUERY_PARAM: &str = "db";

/// Backend a request asks for.
///
/// A present header decides alone, even when its value is not understood. Only `local` and
/// `remote` are recognized; anything else means no override.
pub fn requested_target(headers: &HeaderMap, query: Option<&str>) -> Option<BackendKind> {
    match headers.get(&X_DB_TARGET) {
        Some(value) => value.to_str().ok().and_then(parse_target),
        None => query
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(name, _)| name == DB_QUERY_PARAM)
                    .map(|(_, value)| value.into_owned())
            })
            .and_then(|value| parse_target(&value)),
    }
}

fn parse_target(raw: &str) -> Option<BackendKind> {
    match raw.parse() {
        Ok(kind) => Some(kind),
        Err(error) => {
            debug!(%error, "db target ignored");
            None
        }
    }
}

/// Runs the rest of the request inside an operation context carrying the requested backend.
pub async fn scope_db_target(req: Request, next: Next) -> Response {
    let target = requested_target(req.headers(), req.uri().query());
    run_with_mode(target, next.run(req)).await
}
