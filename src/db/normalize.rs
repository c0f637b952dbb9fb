use serde_json::Map;
use worldforge_schema::{Entity, FieldRole, SchemaDescriptor};

use super::backend::BackendKind;
use super::connection::RawRow;
use crate::error::WorldforgeError;

/// Turns raw rows into schema-conformant entities.
///
/// Every declared field is looked up under its canonical name first and its column name
/// second, so a row carrying both keeps the canonical value. Owner fields are removed for
/// the embedded backend, which has no owner concept. Keys the schema does not declare are
/// dropped by validation.
#[derive(Debug, Clone, Copy)]
pub struct RowNormalizer {
    schema: &'static SchemaDescriptor,
    kind: BackendKind,
}

impl RowNormalizer {
    pub fn new(schema: &'static SchemaDescriptor, kind: BackendKind) -> Self {
        Self { schema, kind }
    }

    pub fn normalize(&self, row: &RawRow) -> Result<Entity, WorldforgeError> {
        let mut canonical = Map::new();
        for f in self.schema.fields() {
            if self.kind == BackendKind::Embedded && f.role == FieldRole::Owner {
                continue;
            }
            if let Some(value) = row.get(f.name).or_else(|| row.get(f.column)) {
                canonical.insert(f.name.to_string(), value.clone());
            }
        }

        self.schema
            .validate_object(&canonical)
            .map_err(|source| WorldforgeError::RowDecode {
                entity: self.schema.entity,
                source,
            })
    }

    pub fn normalize_all(&self, rows: &[RawRow]) -> Result<Vec<Entity>, WorldforgeError> {
        rows.iter().map(|row| self.normalize(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use worldforge_schema::entities::{CHARACTER, PROJECT};

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn column_names_become_canonical_and_missing_fields_are_null() {
        let entity = RowNormalizer::new(&PROJECT, BackendKind::Embedded)
            .normalize(&row(json!({ "prj_no": 1, "prj_nm": "X" })))
            .expect("normalize");

        assert_eq!(entity.get_i64("prjNo"), Some(1));
        assert_eq!(entity.get_str("prjNm"), Some("X"));
        assert_eq!(entity.get("prjDesc"), Some(&Value::Null));
        assert!(entity.get("prj_no").is_none());
    }

    #[test]
    fn canonical_key_wins_over_column_key() {
        let entity = RowNormalizer::new(&PROJECT, BackendKind::Networked)
            .normalize(&row(json!({ "prj_nm": "from column", "prjNm": "canonical" })))
            .expect("normalize");
        assert_eq!(entity.get_str("prjNm"), Some("canonical"));
    }

    #[test]
    fn owner_field_is_stripped_for_embedded_only() {
        let raw = row(json!({ "prj_no": 2, "user_no": 42 }));

        let local = RowNormalizer::new(&PROJECT, BackendKind::Embedded)
            .normalize(&raw)
            .expect("local");
        assert_eq!(local.get("userNo"), Some(&Value::Null));

        let remote = RowNormalizer::new(&PROJECT, BackendKind::Networked)
            .normalize(&raw)
            .expect("remote");
        assert_eq!(remote.get_i64("userNo"), Some(42));
    }

    #[test]
    fn mistyped_value_is_a_decode_error() {
        let err = RowNormalizer::new(&CHARACTER, BackendKind::Embedded)
            .normalize(&row(json!({ "char_no": "abc" })))
            .expect_err("string key must fail");
        assert!(matches!(
            err,
            WorldforgeError::RowDecode {
                entity: "character",
                ..
            }
        ));
    }

    #[test]
    fn undeclared_columns_are_dropped() {
        let entity = RowNormalizer::new(&PROJECT, BackendKind::Embedded)
            .normalize(&row(json!({ "prj_no": 3, "legacy_col": "x" })))
            .expect("normalize");
        assert!(entity.get("legacy_col").is_none());
        assert!(entity.get("legacyCol").is_none());
        assert_eq!(entity.len(), PROJECT.len());
    }
}
