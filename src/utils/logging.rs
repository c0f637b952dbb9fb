use serde::Serialize;

/// Logs `value` as pretty JSON at DEBUG. Serialization is skipped when DEBUG is disabled.
pub(crate) fn debug_json<T: Serialize>(context: &str, value: &T) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    match serde_json::to_string_pretty(value) {
        Ok(json) => tracing::debug!(context, "{json}"),
        Err(error) => tracing::debug!(context, %error, "payload is not serializable"),
    }
}
