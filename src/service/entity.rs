use serde_json::{Map, Value};
use tracing::info;
use worldforge_schema::{Entity, ListPage, ListQuery, ResponseCode, ResponseEnvelope};

use crate::db::{Db, Mapper, TableSpec};
use crate::error::WorldforgeError;

/// Envelope-producing operations over one entity table.
///
/// Validation failures on input come back as `Err` and are rendered by
/// [`WorldforgeError`]'s response conversion. Missing rows are a normal outcome and come back
/// as an `Ok` envelope with the entity's not-found code.
#[derive(Debug, Clone)]
pub struct EntityService {
    mapper: Mapper,
}

impl EntityService {
    pub fn new(db: &Db, spec: &'static TableSpec) -> Self {
        Self {
            mapper: db.mapper(spec),
        }
    }

    fn spec(&self) -> &'static TableSpec {
        self.mapper.spec()
    }

    fn not_found<T>(&self, key: i64) -> ResponseEnvelope<Option<T>> {
        let spec = self.spec();
        ResponseEnvelope::failure(spec.not_found, format!("{} {key} not found.", spec.label))
    }

    /// `Some(message)` when the name field is present but blank, or (on create) absent.
    fn blank_name(&self, fields: &Map<String, Value>, required: bool) -> Option<String> {
        let name = self.spec().name_field;
        match fields.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => None,
            None | Some(Value::Null) if !required => None,
            _ => Some(format!("`{name}` is required and must not be blank")),
        }
    }

    pub async fn list(
        &self,
        query: ListQuery,
    ) -> Result<ResponseEnvelope<ListPage<Entity>>, WorldforgeError> {
        let (list, total) = self.mapper.select_list(&query).await?;
        Ok(ResponseEnvelope::ok(ListPage::new(
            list,
            total,
            query.page,
            query.page_size,
        )))
    }

    pub async fn get(&self, key: i64) -> Result<ResponseEnvelope<Option<Entity>>, WorldforgeError> {
        Ok(match self.mapper.select_by_key(key).await? {
            Some(entity) => ResponseEnvelope::ok(Some(entity)),
            None => self.not_found(key),
        })
    }

    pub async fn create(
        &self,
        body: &Value,
    ) -> Result<ResponseEnvelope<Option<Entity>>, WorldforgeError> {
        let entity = self.spec().schema.validate(body)?;
        if let Some(message) = self.blank_name(entity.as_map(), true) {
            return Ok(ResponseEnvelope::failure(ResponseCode::ValidationError, message));
        }

        let stored = self.mapper.insert(&entity).await?;
        info!(
            entity = self.spec().schema.entity,
            key = ?stored.get_i64(self.spec().key_field),
            "created"
        );
        Ok(ResponseEnvelope::created(Some(stored)))
    }

    pub async fn update(
        &self,
        key: i64,
        body: &Value,
    ) -> Result<ResponseEnvelope<Option<Entity>>, WorldforgeError> {
        let patch = self.spec().schema.validate_partial(body)?;
        if let Some(message) = self.blank_name(&patch, false) {
            return Ok(ResponseEnvelope::failure(ResponseCode::ValidationError, message));
        }

        Ok(match self.mapper.update(key, &patch).await? {
            Some(entity) => ResponseEnvelope::ok(Some(entity)),
            None => self.not_found(key),
        })
    }

    /// On success `data` echoes the deleted key under its canonical name.
    pub async fn delete(&self, key: i64) -> Result<ResponseEnvelope<Option<Value>>, WorldforgeError> {
        if !self.mapper.delete(key).await? {
            return Ok(self.not_found(key));
        }
        let mut data = Map::new();
        data.insert(self.spec().key_field.to_string(), Value::from(key));
        info!(entity = self.spec().schema.entity, key, "deleted");
        Ok(ResponseEnvelope::ok(Some(Value::Object(data))))
    }
}
