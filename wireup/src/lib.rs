//! # Wireup — Dependency Injection Container for Rust
//!
//! An IoC container with constructor injection, named bindings, and
//! Transient / Scoped / Singleton lifetimes.
//!
//! # Quick start
//! ```
//! use wireup::prelude::*;
//! use std::sync::Arc;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Repo {
//!     config: Arc<Config>,
//! }
//!
//! let container = Container::builder()
//!     .singleton::<Config>(|t| {
//!         t.constructor(vec![], |_| {
//!             Ok(Config { url: "postgres://localhost".into() })
//!         });
//!     })
//!     .transient::<Repo>(|t| {
//!         t.constructor(vec![DependencyKey::of::<Config>()], |args| {
//!             Ok(Repo { config: args.take::<Config>()? })
//!         });
//!     })
//!     .build()?;
//!
//! let repo = container.resolve::<Repo>()?;
//! assert_eq!(repo.config.url, "postgres://localhost");
//! # Ok::<(), wireup::WireupError>(())
//! ```

pub use wireup_container::*;
pub use wireup_support::*;
