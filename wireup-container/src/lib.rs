//! Core container implementation for Wireup DI.

pub mod cache;
pub mod constructor;
pub mod container;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod registry;
pub mod scope;

mod engine;
mod graph;

pub use container::prelude;
pub use error::{Result, WireupError};
pub use key::DependencyKey;
pub use lifetime::Lifetime;
pub use scope::Scope;
