//! CLI command implementations.

pub mod common;
pub mod inspect;
pub mod play;
pub mod presets;
pub mod validate;
