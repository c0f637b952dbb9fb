use serde_json::Value;
use tracing::debug;
use url::Url;
use worldforge_schema::{SchemaDescriptor, SchemaError};

use crate::db::tables;

/// Re-validates response envelopes against the schema registered for their route.
///
/// Normalization is fail-open: a response that is not an envelope, has no data, targets an
/// unregistered route, or fails validation is returned untouched.
#[derive(Debug, Clone)]
pub struct ResponseEnvelopeNormalizer {
    routes: Vec<(&'static str, &'static SchemaDescriptor)>,
}

impl Default for ResponseEnvelopeNormalizer {
    fn default() -> Self {
        Self::new(tables::ALL.iter().map(|spec| (spec.path, spec.schema)))
    }
}

impl ResponseEnvelopeNormalizer {
    pub fn new(routes: impl IntoIterator<Item = (&'static str, &'static SchemaDescriptor)>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    /// Schema for `url`, matched on its path: equal to a prefix or below it (`prefix/...`).
    /// Absolute URLs and relative paths are both accepted; query and fragment are ignored.
    pub fn schema_for(&self, url: &str) -> Option<&'static SchemaDescriptor> {
        let parsed = Url::parse(url).ok();
        let path = match &parsed {
            Some(parsed) => parsed.path(),
            None => url.split(['?', '#']).next().unwrap_or_default(),
        };
        self.routes
            .iter()
            .find(|(prefix, _)| {
                path == *prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|(_, schema)| *schema)
    }

    pub fn normalize(&self, url: &str, body: Value) -> Value {
        let Some(schema) = self.schema_for(url) else {
            return body;
        };
        match try_normalize(&body, schema) {
            Ok(Some(normalized)) => normalized,
            Ok(None) => body,
            Err(error) => {
                debug!(url, entity = schema.entity, %error, "response left unnormalized");
                body
            }
        }
    }
}

/// Normalized copy of an envelope's `data`, or `None` when there is nothing to normalize.
///
/// `data.list` (when an array) is validated item by item; any other object `data` is
/// validated as a single entity.
pub fn try_normalize(
    body: &Value,
    schema: &SchemaDescriptor,
) -> Result<Option<Value>, SchemaError> {
    let Value::Object(envelope) = body else {
        return Ok(None);
    };
    if !envelope.contains_key("code") {
        return Ok(None);
    }
    let Some(Value::Object(data)) = envelope.get("data") else {
        return Ok(None);
    };

    let normalized = match data.get("list") {
        Some(Value::Array(items)) => {
            let list = items
                .iter()
                .map(|item| schema.validate(item).map(|entity| entity.into_value()))
                .collect::<Result<Vec<_>, _>>()?;
            let mut page = data.clone();
            page.insert("list".to_string(), Value::Array(list));
            Value::Object(page)
        }
        _ => schema.validate_object(data)?.into_value(),
    };

    let mut out = envelope.clone();
    out.insert("data".to_string(), normalized);
    Ok(Some(Value::Object(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use worldforge_schema::entities::{CHARACTER, PROJECT};

    #[test]
    fn routes_match_on_path_segments() {
        let normalizer = ResponseEnvelopeNormalizer::default();
        let entity = |url| normalizer.schema_for(url).map(|s| s.entity);

        assert_eq!(entity("/projects"), Some("project"));
        assert_eq!(entity("/projects/12?db=remote"), Some("project"));
        assert_eq!(entity("http://127.0.0.1:3001/characters/3"), Some("character"));
        assert_eq!(entity("/projectsX"), None);
        assert_eq!(entity("/health"), None);
    }

    #[test]
    fn single_entity_is_validated_and_completed() {
        let body = json!({ "code": "OK", "error": false, "message": "", "data": { "prjNo": 1, "stray": true } });
        let out = try_normalize(&body, &PROJECT).expect("valid").expect("normalized");

        assert_eq!(out["data"]["prjNo"], json!(1));
        assert_eq!(out["data"]["prjNm"], Value::Null);
        assert!(out["data"].get("stray").is_none());
        assert_eq!(out["code"], json!("OK"));
    }

    #[test]
    fn list_items_are_validated_and_paging_kept() {
        let body = json!({
            "code": "OK",
            "data": { "list": [{ "charNo": 1 }, { "charNo": 2 }], "totalCnt": 2, "page": 1 }
        });
        let out = try_normalize(&body, &CHARACTER).expect("valid").expect("normalized");

        assert_eq!(out["data"]["totalCnt"], json!(2));
        let list = out["data"]["list"].as_array().expect("list");
        assert_eq!(list.len(), 2);
        assert_eq!(list[1]["charNo"], json!(2));
        assert_eq!(list[1]["charNm"], Value::Null);
    }

    #[test]
    fn non_envelopes_and_empty_data_are_untouched() {
        for body in [
            json!({ "prjNo": 1 }),
            json!({ "code": "OK", "data": null }),
            json!({ "code": "OK" }),
            json!([1, 2, 3]),
        ] {
            assert_eq!(try_normalize(&body, &PROJECT), Ok(None), "{body}");
        }
    }

    #[test]
    fn validation_failure_returns_original_body() {
        let normalizer = ResponseEnvelopeNormalizer::default();
        let body = json!({ "code": "OK", "data": { "prjNo": "not a number" } });
        assert_eq!(normalizer.normalize("/projects/1", body.clone()), body);

        let unknown = json!({ "code": "OK", "data": { "anything": 1 } });
        assert_eq!(normalizer.normalize("/unknown", unknown.clone()), unknown);
    }
}
