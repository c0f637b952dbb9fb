mod worldforge;

pub use worldforge::{ConfigError, UnknownBackendKind, WorldforgeError};
