//! Schema declarations for every entity served by the data layer.

mod ability;
mod character;
mod nation;
mod project;
mod traits;

pub use ability::ABILITY;
pub use character::CHARACTER;
pub use nation::NATION;
pub use project::PROJECT;
pub use traits::TRAIT;

use crate::descriptor::SchemaDescriptor;

pub static ALL: [&SchemaDescriptor; 5] = [&PROJECT, &TRAIT, &ABILITY, &CHARACTER, &NATION];
