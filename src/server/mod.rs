pub mod db_target;
pub mod router;
pub mod routes;

pub use router::{AppState, worldforge_router};
