//! View Builder Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared identity types and logging setup used across the view builder workspace.
//!
//! - **Types**: entity identifiers and the typology tag every view row carries
//! - **Logging**: `tracing` subscriber configuration for binaries and tests
//!
//! # Example
//!
//! ```
//! use view_common::{EntityId, Typology};
//!
//! let id: EntityId = "4210000".parse().unwrap();
//! assert_eq!(id.get(), 4_210_000);
//! assert_eq!(Typology::Geography.as_str(), "geography");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{EntityId, Typology};
