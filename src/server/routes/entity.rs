use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::get,
};
use serde_json::Value;
use worldforge_schema::{Entity, ListPage, ListQuery, ResponseEnvelope};

use crate::db::TableSpec;
use crate::error::WorldforgeError;
use crate::server::router::AppState;

type Reply<T> = Result<Json<ResponseEnvelope<T>>, WorldforgeError>;
type AppStateArg = State<AppState>;
type KeyArg = Path<String>;
type BodyArg = Result<Json<Value>, JsonRejection>;
type QueryArg = Result<Query<ListQuery>, QueryRejection>;

/// `GET|POST {path}` and `GET|PATCH|DELETE {path}/{key}` for one entity table.
pub fn router(spec: &'static TableSpec) -> Router<AppState> {
    Router::new()
        .route(
            spec.path,
            get(move |state: AppStateArg, query: QueryArg| list(state, spec, query))
                .post(move |state: AppStateArg, body: BodyArg| create(state, spec, body)),
        )
        .route(
            &format!("{}/{{key}}", spec.path),
            get(move |state: AppStateArg, key: KeyArg| show(state, spec, key))
                .patch(move |state: AppStateArg, key: KeyArg, body: BodyArg| {
                    update(state, spec, key, body)
                })
                .delete(move |state: AppStateArg, key: KeyArg| remove(state, spec, key)),
        )
}

fn parse_key(spec: &TableSpec, raw: &str) -> Result<i64, WorldforgeError> {
    raw.parse().map_err(|_| {
        WorldforgeError::BadRequest(format!("`{}` must be an integer, got `{raw}`", spec.key_field))
    })
}

fn body_or_bad_request(payload: BodyArg) -> Result<Value, WorldforgeError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| WorldforgeError::BadRequest(rejection.body_text()))
}

async fn list(
    State(state): State<AppState>,
    spec: &'static TableSpec,
    query: QueryArg,
) -> Reply<ListPage<Entity>> {
    let Query(query) =
        query.map_err(|rejection| WorldforgeError::BadRequest(rejection.body_text()))?;
    Ok(Json(state.entities(spec).list(query).await?))
}

async fn show(
    State(state): State<AppState>,
    spec: &'static TableSpec,
    Path(key): Path<String>,
) -> Reply<Option<Entity>> {
    let key = parse_key(spec, &key)?;
    Ok(Json(state.entities(spec).get(key).await?))
}

async fn create(
    State(state): State<AppState>,
    spec: &'static TableSpec,
    payload: BodyArg,
) -> Reply<Option<Entity>> {
    let body = body_or_bad_request(payload)?;
    Ok(Json(state.entities(spec).create(&body).await?))
}

async fn update(
    State(state): State<AppState>,
    spec: &'static TableSpec,
    Path(key): Path<String>,
    payload: BodyArg,
) -> Reply<Option<Entity>> {
    let key = parse_key(spec, &key)?;
    let body = body_or_bad_request(payload)?;
    Ok(Json(state.entities(spec).update(key, &body).await?))
}

async fn remove(
    State(state): State<AppState>,
    spec: &'static TableSpec,
    Path(key): Path<String>,
) -> Reply<Option<Value>> {
    let key = parse_key(spec, &key)?;
    Ok(Json(state.entities(spec).delete(key).await?))
}
