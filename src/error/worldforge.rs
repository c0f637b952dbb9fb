use axum::{Json, response::IntoResponse};
use thiserror::Error as ThisError;
use worldforge_schema::{ResponseCode, ResponseEnvelope, SchemaError};

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("`{setting}` must be set to use the {backend} database")]
    MissingSetting {
        setting: &'static str,
        backend: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unknown db target `{0}` (expected `local` or `remote`)")]
pub struct UnknownBackendKind(pub String);

#[derive(Debug, ThisError)]
pub enum WorldforgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Failed to decode {entity} row: {source}")]
    RowDecode {
        entity: &'static str,
        #[source]
        source: SchemaError,
    },

    #[error("Unsupported column type {type_name} for column `{column}`")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl WorldforgeError {
    /// Envelope `code` this error is reported under.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            WorldforgeError::Config(_) => ResponseCode::ConfigurationError,
            WorldforgeError::BadRequest(_) => ResponseCode::BadRequest,
            WorldforgeError::Schema(_) | WorldforgeError::JsonError(_) => {
                ResponseCode::ValidationError
            }
            WorldforgeError::DatabaseError(
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_),
            ) => ResponseCode::ServiceUnavailable,
            WorldforgeError::RowDecode { .. }
            | WorldforgeError::UnsupportedColumnType { .. }
            | WorldforgeError::DatabaseError(_)
            | WorldforgeError::MigrationError(_)
            | WorldforgeError::IoError(_)
            | WorldforgeError::ReqwestError(_)
            | WorldforgeError::UnexpectedError(_) => ResponseCode::InternalServerError,
        }
    }
}

/// Transport never fails at the HTTP level: every error becomes a 200 envelope with
/// `error: true` and a readable message.
impl IntoResponse for WorldforgeError {
    fn into_response(self) -> axum::response::Response {
        let code = self.response_code();
        if code == ResponseCode::InternalServerError {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, code = ?code, "request failed");
        }
        let body: ResponseEnvelope<Option<()>> = ResponseEnvelope::failure(code, self.to_string());
        Json(body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn missing_setting_becomes_configuration_envelope() {
        let err = WorldforgeError::from(ConfigError::MissingSetting {
            setting: "db.remote.connection_url",
            backend: "remote",
        });
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            body,
            json!({
                "data": null,
                "error": true,
                "code": "CONFIGURATION_ERROR",
                "message": "`db.remote.connection_url` must be set to use the remote database",
            })
        );
    }

    #[test]
    fn schema_errors_map_to_validation_code() {
        let err = WorldforgeError::from(SchemaError::NotAnObject("array"));
        assert_eq!(err.response_code(), ResponseCode::ValidationError);

        let decode = WorldforgeError::RowDecode {
            entity: "project",
            source: SchemaError::NotAnObject("array"),
        };
        assert_eq!(decode.response_code(), ResponseCode::InternalServerError);
    }
}
