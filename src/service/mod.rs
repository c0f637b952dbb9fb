pub mod entity;
pub mod health;

pub use entity::EntityService;
pub use health::HealthStatus;
