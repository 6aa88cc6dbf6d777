//! # U-Rack Tiers
//!
//! Stacked rack tier optimization with top/bottom mounting.
//!
//! Rectangles (cross-sections of ducts, pipes, trays) are mounted on the
//! lower or upper edge of horizontal tiers of a fixed width. The optimizer
//! searches over tier count, tier height hints and placement order to
//! minimize stack height and tier count while placing every rectangle
//! without a bottom/top clash.
//!
//! ## Components
//!
//! - [`Rectangle`], [`Container`]: placement items and tiers
//! - [`TierPacker`]: deterministic placement and minimum-height derivation
//! - [`evaluate_layout`]: weighted multi-objective fitness
//! - [`TierChromosome`]: encoding with crossover and six mutation kinds
//! - [`StackOptimizer`]: runs the genetic algorithm and builds a [`StackResult`]
//!
//! ## Quick Start
//!
//! ```rust
//! use u_rack_tiers::{StackConfig, StackOptimizer};
//!
//! let config = StackConfig::new(7.0, 20.0)
//!     .with_max_containers(5)
//!     .with_population_size(30)
//!     .with_generations(20)
//!     .with_seed(1);
//!
//! let rects = [(4.0, 3.0), (3.0, 2.0), (2.0, 5.0), (3.0, 3.0)];
//! let optimizer = StackOptimizer::new(&rects, config).unwrap();
//! let result = optimizer.run();
//!
//! for report in result.reports() {
//!     assert!(!report.has_clash);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod chromosome;
pub mod config;
pub mod container;
pub mod fitness;
pub mod optimizer;
pub mod packer;
pub mod rectangle;
pub mod result;

// Re-exports
pub use chromosome::{order_crossover, EncodingLimits, MutationKind, TierChromosome};
pub use config::{StackConfig, DEFAULT_HEIGHT_JITTER, MAX_HEIGHT_JITTER};
pub use container::{Container, Mount, MountedItem, HEIGHT_EPSILON};
pub use fitness::{evaluate_layout, FitnessBreakdown, FitnessWeights};
pub use optimizer::{StackOptimizer, StackProblem};
pub use packer::{PackOutcome, TierPacker};
pub use rectangle::{rectangles_from_dims, Rectangle};
pub use result::{ContainerReport, PlacedItem, StackProgress, StackResult};

pub use u_rack_core::{Error, Result};
