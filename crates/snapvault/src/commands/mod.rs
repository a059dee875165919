//! Command handlers for the snapvault CLI.
//!
//! Handlers take the resolved repository root and print their results.
//! Errors propagate to `main` as `anyhow::Error`.

pub mod alias;
pub mod branch;
pub mod logging;
pub mod repo;
pub mod snapshot;
pub mod sync;
pub mod trash;

pub use alias::*;
pub use branch::*;
pub use logging::*;
pub use repo::*;
pub use snapshot::*;
pub use sync::*;
pub use trash::*;
