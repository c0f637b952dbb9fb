//! Dual-backend data layer.
//!
//! Layout:
//! - `backend.rs`: the two backend kinds and their wire spelling
//! - `context.rs`: per-operation backend override (task-local)
//! - `resolver.rs`: explicit > context > configured default
//! - `manager.rs`: lazily provisioned, cached connection per backend
//! - `connection.rs`: engine-neutral handle, parameter binding and raw rows
//! - `normalize.rs`: raw rows to schema-conformant entities
//! - `mapper.rs` / `tables.rs`: per-entity CRUD over both engines

pub mod backend;
pub mod connection;
pub mod context;
pub mod manager;
pub mod mapper;
pub mod migrate;
pub mod normalize;
pub mod resolver;
pub mod tables;

mod layer;

pub use backend::BackendKind;
pub use connection::{ConnectionHandle, DbValue, RawRow};
pub use context::{OperationContext, current_mode, run_with_mode, spawn_in_context};
pub use layer::Db;
pub use manager::ConnectionManager;
pub use mapper::Mapper;
pub use normalize::RowNormalizer;
pub use resolver::ModeResolver;
pub use tables::TableSpec;
