pub mod common;
pub mod descriptor;
pub mod entities;
pub mod envelope;

pub use descriptor::{
    DATETIME_FORMAT, Entity, FieldDefault, FieldDescriptor, FieldRole, FieldType,
    SchemaDescriptor, SchemaError, field,
};
pub use envelope::{ListPage, ListQuery, ResponseCode, ResponseEnvelope};
