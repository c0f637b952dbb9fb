pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod service;

mod utils;

pub use error::WorldforgeError;
pub use worldforge_schema as schema;
