//! # U-Rack Core
//!
//! Core abstractions for the U-Rack rack tier optimization engine.
//!
//! This crate is domain-free: it provides the generational genetic algorithm
//! that drives tier packing, together with the shared error types.
//!
//! ## Core Components
//!
//! - **GA framework**: [`GaRunner`], [`GaProblem`], [`Individual`] - elitism,
//!   immigrant injection, mixed random/tournament selection and
//!   stagnation-adaptive mutation
//! - **Errors**: [`Error`], [`Result`] - fail-fast configuration errors
//!
//! ## Configuration
//!
//! ```rust
//! use u_rack_core::GaConfig;
//!
//! let config = GaConfig::new()
//!     .with_population_size(200)
//!     .with_max_generations(300)
//!     .with_mutation_rate(0.4)
//!     .with_seed(42);
//!
//! assert_eq!(config.elite_count(), 20);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod ga;

// Re-exports
pub use error::{Error, Result};
pub use ga::{GaConfig, GaProblem, GaProgress, GaResult, GaRunner, Individual};
