//! Optimizer configuration.

use crate::fitness::FitnessWeights;
use u_rack_core::{Error, GaConfig, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default relative height jitter added above each tier's minimum height.
pub const DEFAULT_HEIGHT_JITTER: f64 = 0.02;

/// Largest accepted height jitter.
pub const MAX_HEIGHT_JITTER: f64 = 0.5;

/// Configuration for stacked tier optimization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StackConfig {
    /// Width shared by every tier.
    pub container_width: f64,
    /// Height budget of the whole stack. Only scales the height penalty;
    /// it is not enforced as a hard limit.
    pub max_total_height: f64,
    /// Maximum number of tiers.
    pub max_containers: usize,
    /// Population size.
    pub population_size: usize,
    /// Number of generations to run.
    pub generations: u32,
    /// Base mutation rate (0.0 - 1.0).
    pub mutation_rate: f64,
    /// Crossover rate (0.0 - 1.0).
    pub crossover_rate: f64,
    /// Fraction of the population kept as elites (0.0 - 1.0).
    pub elitism_rate: f64,
    /// Relative random jitter added to derived tier heights (0 = exact minimum).
    pub height_jitter: f64,
    /// Random seed for reproducibility (None = random).
    pub seed: Option<u64>,
    /// Fitness weights.
    pub weights: FitnessWeights,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            container_width: 1.0,
            max_total_height: 1.0,
            max_containers: 10,
            population_size: 100,
            generations: 500,
            mutation_rate: 0.2,
            crossover_rate: 0.8,
            elitism_rate: 0.1,
            height_jitter: DEFAULT_HEIGHT_JITTER,
            seed: None,
            weights: FitnessWeights::default(),
        }
    }
}

impl StackConfig {
    /// Creates a configuration for the given tier width and height budget.
    pub fn new(container_width: f64, max_total_height: f64) -> Self {
        Self {
            container_width,
            max_total_height,
            ..Self::default()
        }
    }

    /// Sets the maximum number of tiers.
    pub fn with_max_containers(mut self, max: usize) -> Self {
        self.max_containers = max;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the number of generations.
    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the base mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    /// Sets the relative height jitter.
    pub fn with_height_jitter(mut self, jitter: f64) -> Self {
        self.height_jitter = jitter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Checks every value, failing on the first unusable one.
    pub fn validate(&self) -> Result<()> {
        if !self.container_width.is_finite() || self.container_width <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "container_width must be positive, got {}",
                self.container_width
            )));
        }
        if !self.max_total_height.is_finite() || self.max_total_height <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_total_height must be positive, got {}",
                self.max_total_height
            )));
        }
        if self.max_containers < 1 {
            return Err(Error::InvalidConfig(
                "max_containers must be at least 1".into(),
            ));
        }
        if self.population_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("elitism_rate", self.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if !(0.0..=MAX_HEIGHT_JITTER).contains(&self.height_jitter) {
            return Err(Error::InvalidConfig(format!(
                "height_jitter must be within [0, {}], got {}",
                MAX_HEIGHT_JITTER, self.height_jitter
            )));
        }
        Ok(())
    }

    /// Builds the GA configuration for this problem.
    pub fn to_ga_config(&self) -> GaConfig {
        let mut ga = GaConfig::new()
            .with_population_size(self.population_size)
            .with_max_generations(self.generations)
            .with_mutation_rate(self.mutation_rate)
            .with_crossover_rate(self.crossover_rate)
            .with_elitism_rate(self.elitism_rate);
        ga.seed = self.seed;
        ga
    }
}
