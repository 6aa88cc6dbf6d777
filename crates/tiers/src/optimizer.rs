//! Stacked tier optimization driven by the core genetic algorithm.

use crate::chromosome::{EncodingLimits, MutationKind, TierChromosome};
use crate::config::StackConfig;
use crate::fitness::{evaluate_layout, FitnessBreakdown, FitnessWeights};
use crate::packer::{PackOutcome, TierPacker};
use crate::rectangle::{rectangles_from_dims, Rectangle};
use crate::result::{StackProgress, StackResult};
use rand::prelude::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use u_rack_core::{Error, GaProblem, GaProgress, GaRunner, Individual, Result};

/// Stacked tier packing as a GA problem.
#[derive(Debug, Clone)]
pub struct StackProblem {
    packer: TierPacker,
    limits: EncodingLimits,
    weights: FitnessWeights,
}

impl StackProblem {
    /// Creates a problem over an already validated rectangle set.
    pub fn new(rects: Vec<Rectangle>, config: &StackConfig) -> Self {
        let limits = EncodingLimits {
            rect_count: rects.len(),
            max_containers: config.max_containers,
            max_total_height: config.max_total_height,
        };
        let packer = TierPacker::new(
            rects,
            config.container_width,
            config.max_total_height,
            config.height_jitter,
        );

        Self {
            packer,
            limits,
            weights: config.weights,
        }
    }

    /// Returns the packer.
    pub fn packer(&self) -> &TierPacker {
        &self.packer
    }

    /// Returns the encoding bounds.
    pub fn limits(&self) -> &EncodingLimits {
        &self.limits
    }

    /// Returns the rectangle set.
    pub fn rectangles(&self) -> &[Rectangle] {
        self.packer.rectangles()
    }

    /// Scores a packed layout.
    pub fn score(&self, outcome: &PackOutcome, num_containers: usize) -> FitnessBreakdown {
        evaluate_layout(
            &outcome.containers,
            outcome.placed,
            num_containers,
            self.limits.max_containers,
            self.limits.max_total_height,
            self.packer.rectangles(),
            &self.weights,
        )
    }

    /// Fitness terms of an evaluated chromosome's cached layout.
    pub fn breakdown(&self, chromosome: &TierChromosome) -> FitnessBreakdown {
        evaluate_layout(
            chromosome.containers(),
            chromosome.rectangles_placed(),
            chromosome.num_containers,
            self.limits.max_containers,
            self.limits.max_total_height,
            self.packer.rectangles(),
            &self.weights,
        )
    }
}

impl GaProblem for StackProblem {
    type Individual = TierChromosome;

    fn random_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual {
        TierChromosome::random(&self.limits, rng)
    }

    fn evaluate(&self, individual: &mut Self::Individual) {
        let outcome = self.packer.pack(individual);
        let fitness = self.score(&outcome, individual.num_containers).fitness;
        individual.set_evaluation(outcome, fitness);
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        rng: &mut R,
    ) -> (Self::Individual, Self::Individual) {
        parent1.crossover(parent2, &self.limits, rng)
    }

    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R) {
        let kind = MutationKind::random(rng);
        individual.mutate(kind, &self.limits, rng);
    }

    fn on_generation(
        &self,
        generation: u32,
        best: &Self::Individual,
        _population: &[Self::Individual],
    ) {
        log::debug!(
            "Tier GA generation {}: fitness={:.4}, placed={}/{}, tiers={}, height={:.3}",
            generation,
            best.fitness(),
            best.rectangles_placed(),
            self.limits.rect_count,
            best.num_containers,
            best.total_height_used()
        );
    }
}

/// Optimizer for stacked rack tiers.
///
/// # Example
///
/// ```rust
/// use u_rack_tiers::{StackConfig, StackOptimizer};
///
/// let config = StackConfig::new(5.0, 10.0)
///     .with_max_containers(2)
///     .with_population_size(20)
///     .with_generations(10)
///     .with_seed(7);
/// let optimizer = StackOptimizer::new(&[(2.0, 2.0), (3.0, 1.0)], config).unwrap();
///
/// let result = optimizer.run();
/// assert_eq!(result.fitness_history.len(), 10);
/// ```
pub struct StackOptimizer {
    config: StackConfig,
    runner: GaRunner<StackProblem>,
}

impl StackOptimizer {
    /// Creates an optimizer from `(width, height)` pairs; ids are list indices.
    pub fn new(dims: &[(f64, f64)], config: StackConfig) -> Result<Self> {
        let rects = rectangles_from_dims(dims)?;
        Self::from_rectangles(rects, config)
    }

    /// Creates an optimizer from prepared rectangles.
    ///
    /// Every rectangle's id must equal its position in `rects`.
    pub fn from_rectangles(rects: Vec<Rectangle>, config: StackConfig) -> Result<Self> {
        config.validate()?;
        if rects.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one rectangle is required".into(),
            ));
        }
        for (index, rect) in rects.iter().enumerate() {
            if rect.id != index {
                return Err(Error::InvalidRectangle {
                    id: rect.id,
                    reason: format!("id must match its position {}", index),
                });
            }
            rect.validate()?;
        }

        let problem = StackProblem::new(rects, &config);
        let runner = GaRunner::new(config.to_ga_config(), problem);
        Ok(Self { config, runner })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Returns the rectangle set.
    pub fn rectangles(&self) -> &[Rectangle] {
        self.runner.problem().rectangles()
    }

    /// Returns the GA problem.
    pub fn problem(&self) -> &StackProblem {
        self.runner.problem()
    }

    /// Returns a handle that stops the run between generations when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.runner.cancel_handle()
    }

    /// Runs the optimization, seeding the RNG from the configuration.
    pub fn run(&self) -> StackResult {
        let mut rng = self.runner.config().make_rng();
        self.execute::<_, fn(&StackProgress)>(&mut rng, None)
    }

    /// Runs the optimization, reporting progress after each generation.
    pub fn run_with_progress<F>(&self, callback: F) -> StackResult
    where
        F: FnMut(&StackProgress),
    {
        let mut rng = self.runner.config().make_rng();
        self.execute(&mut rng, Some(callback))
    }

    /// Runs the optimization with a specific RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> StackResult {
        self.execute::<R, fn(&StackProgress)>(rng, None)
    }

    fn execute<R, F>(&self, rng: &mut R, mut callback: Option<F>) -> StackResult
    where
        R: Rng,
        F: FnMut(&StackProgress),
    {
        let total = self.rectangles().len();
        log::info!(
            "Starting tier optimization: {} rectangles, width {}, up to {} tiers, population {}, {} generations",
            total,
            self.config.container_width,
            self.config.max_containers,
            self.config.population_size,
            self.config.generations
        );

        let forward = callback.as_mut().map(|cb| {
            move |progress: &GaProgress, best: &TierChromosome| {
                if progress.running {
                    cb(&StackProgress::from_ga(progress, best, total));
                }
            }
        });
        let ga_result = self.runner.run_with_rng_and_progress(rng, forward);

        if ga_result.cancelled {
            log::warn!(
                "Tier optimization cancelled after {} of {} generations",
                ga_result.generations,
                self.config.generations
            );
        }

        let best = ga_result.best;
        let breakdown = self.problem().breakdown(&best);
        log::info!(
            "Tier optimization finished: fitness={:.4}, placed={}/{}, tiers={}, height={:.3}, {} ms",
            best.fitness(),
            best.rectangles_placed(),
            total,
            best.num_containers,
            best.total_height_used(),
            ga_result.elapsed.as_millis()
        );

        StackResult {
            best,
            rectangles: self.rectangles().to_vec(),
            breakdown,
            fitness_history: ga_result.history,
            generations: ga_result.generations,
            computation_time_ms: ga_result.elapsed.as_millis() as u64,
            cancelled: ga_result.cancelled,
        }
    }
}
