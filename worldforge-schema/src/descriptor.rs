use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error as ThisError;

use crate::common::COMMON_FIELDS;

/// Wire format for every date/time field: `yyyy-MM-ddThh:mm:ss.sssZ`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Text,
    /// `"Y"` or `"N"`.
    YesNo,
    /// Text in [`DATETIME_FORMAT`].
    DateTime,
    IntegerList,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Text => "string",
            FieldType::YesNo => "'Y' | 'N'",
            FieldType::DateTime => "datetime (yyyy-MM-ddThh:mm:ss.sssZ)",
            FieldType::IntegerList => "integer[]",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Integer => value.as_i64().is_some(),
            FieldType::Text => value.is_string(),
            FieldType::YesNo => matches!(value.as_str(), Some("Y" | "N")),
            FieldType::DateTime => value.as_str().is_some_and(is_wire_datetime),
            FieldType::IntegerList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| item.as_i64().is_some())),
        }
    }
}

fn is_wire_datetime(s: &str) -> bool {
    s.len() == 24 && NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).is_ok()
}

/// How a field relates to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Auto-assigned primary key.
    Key,
    /// Plain column, writable through create/update.
    Column,
    /// Owner reference that exists only in the multi-tenant (networked) deployment.
    Owner,
    /// Column maintained by the data layer (audit stamps, deletion flag).
    Managed,
    /// Present on the entity but not stored in any table.
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Text(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Null => Value::Null,
            FieldDefault::Text(s) => Value::from(s),
        }
    }
}

/// One declared field: canonical (camelCase) name plus the snake_case column it is stored in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub column: &'static str,
    pub ty: FieldType,
    pub role: FieldRole,
    pub nullable: bool,
    pub default: FieldDefault,
}

/// Nullable plain column defaulting to null.
pub const fn field(name: &'static str, column: &'static str, ty: FieldType) -> FieldDescriptor {
    FieldDescriptor {
        name,
        column,
        ty,
        role: FieldRole::Column,
        nullable: true,
        default: FieldDefault::Null,
    }
}

impl FieldDescriptor {
    pub const fn key(self) -> Self {
        Self {
            role: FieldRole::Key,
            ..self
        }
    }

    pub const fn owner(self) -> Self {
        Self {
            role: FieldRole::Owner,
            ..self
        }
    }

    pub const fn managed(self) -> Self {
        Self {
            role: FieldRole::Managed,
            ..self
        }
    }

    pub const fn virtual_only(self) -> Self {
        Self {
            role: FieldRole::Virtual,
            ..self
        }
    }

    pub const fn required(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    pub const fn with_default(self, default: FieldDefault) -> Self {
        Self { default, ..self }
    }

    pub fn is_stored(&self) -> bool {
        !matches!(self.role, FieldRole::Virtual)
    }

    fn check(&self, value: Option<&Value>) -> Result<Value, SchemaError> {
        match value {
            None | Some(Value::Null) => {
                let default = self.default.to_value();
                if default.is_null() && !self.nullable {
                    return Err(SchemaError::MissingRequired { field: self.name });
                }
                Ok(default)
            }
            Some(v) if self.ty.accepts(v) => Ok(v.clone()),
            Some(v) => Err(SchemaError::TypeMismatch {
                field: self.name,
                expected: self.ty.as_str(),
                found: json_kind(v),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SchemaError {
    #[error("field `{field}` expected {expected}, found {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field `{field}` is required")]
    MissingRequired { field: &'static str },

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declarative per-entity field list. Declared once as a `static`, shared read-only.
#[derive(Debug)]
pub struct SchemaDescriptor {
    pub entity: &'static str,
    own: &'static [FieldDescriptor],
    shared: &'static [FieldDescriptor],
}

impl SchemaDescriptor {
    /// Entity fields followed by the common audit fields.
    pub const fn new(entity: &'static str, own: &'static [FieldDescriptor]) -> Self {
        Self {
            entity,
            own,
            shared: COMMON_FIELDS,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> + use<> {
        self.own.iter().chain(self.shared.iter())
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields().find(|f| f.name == name)
    }

    pub fn key(&self) -> Option<&'static FieldDescriptor> {
        self.fields().find(|f| f.role == FieldRole::Key)
    }

    pub fn len(&self) -> usize {
        self.own.len() + self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validates a JSON value and fills every absent field with its default.
    pub fn validate(&self, value: &Value) -> Result<Entity, SchemaError> {
        match value {
            Value::Object(obj) => self.validate_object(obj),
            other => Err(SchemaError::NotAnObject(json_kind(other))),
        }
    }

    /// Keys not declared in the schema are dropped.
    pub fn validate_object(&self, obj: &Map<String, Value>) -> Result<Entity, SchemaError> {
        let mut fields = Map::new();
        for f in self.fields() {
            fields.insert(f.name.to_string(), f.check(obj.get(f.name))?);
        }
        Ok(Entity { fields })
    }

    /// Type-checks only the declared fields that carry a non-null value; nothing is defaulted.
    pub fn validate_partial(&self, value: &Value) -> Result<Map<String, Value>, SchemaError> {
        let Value::Object(obj) = value else {
            return Err(SchemaError::NotAnObject(json_kind(value)));
        };
        let mut out = Map::new();
        for f in self.fields() {
            match obj.get(f.name) {
                None | Some(Value::Null) => {}
                Some(v) => {
                    out.insert(f.name.to_string(), f.check(Some(v))?);
                }
            }
        }
        Ok(out)
    }

    /// Every field set to its default.
    pub fn empty(&self) -> Entity {
        let fields = self
            .fields()
            .map(|f| (f.name.to_string(), f.default.to_value()))
            .collect();
        Entity { fields }
    }
}

/// A schema-conformant record: every declared field is present, absent values are null/default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: Map<String, Value>,
}

impl Entity {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}
