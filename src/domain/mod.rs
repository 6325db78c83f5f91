//! Domain layer
//!
//! Typed configuration, placeholder resolution and the ports external
//! collaborators implement. Nothing here touches files or the network.

pub mod errors;
pub mod models;
pub mod placeholder;
pub mod ports;

pub use errors::{CoreError, CoreResult};
pub use placeholder::{PlaceholderError, PlaceholderResolver};
