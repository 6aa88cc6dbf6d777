//! Genetic Algorithm framework for optimization.
//!
//! This module provides the generational GA used by u-rack. Domain crates
//! implement [`Individual`] for their chromosome and [`GaProblem`] for the
//! problem-side operators (random creation, evaluation, crossover,
//! mutation); [`GaRunner`] owns the evolutionary loop.
//!
//! # Generation cycle
//!
//! 1. Evaluate every unevaluated individual (in parallel via rayon).
//! 2. Rank the population by descending fitness and update elite memory.
//! 3. Build the next population from elites, fresh immigrants and
//!    offspring produced by selection, crossover and adaptive mutation.
//! 4. Replace the population and report progress.
//!
//! The loop always runs the full generation budget. Stagnation raises the
//! mutation rate instead of stopping the run; only cancellation ends it
//! early, and cancellation is only observed between generations.

use rand::prelude::*;
use rayon::prelude::*;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the genetic algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Number of generations to run.
    pub max_generations: u32,
    /// Crossover rate (0.0 - 1.0).
    pub crossover_rate: f64,
    /// Base mutation rate (0.0 - 1.0).
    pub mutation_rate: f64,
    /// Fraction of the ranked population copied unchanged (0.0 - 1.0).
    pub elitism_rate: f64,
    /// Fraction of each generation replaced by fresh random individuals.
    pub immigrant_rate: f64,
    /// Probability of picking both parents uniformly instead of by tournament.
    pub random_selection_rate: f64,
    /// Smallest tournament size.
    pub tournament_min: usize,
    /// Largest tournament size.
    pub tournament_max: usize,
    /// Stagnant generations after which the mutation rate starts to grow.
    pub stagnation_threshold: u32,
    /// Upper bound of the adaptive mutation rate.
    pub max_mutation_rate: f64,
    /// Stagnant generations after which extra mutation passes may run.
    pub heavy_stagnation_threshold: u32,
    /// Probability of the extra mutation passes under heavy stagnation.
    pub extra_mutation_probability: f64,
    /// Random seed for reproducibility (None = random).
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            elitism_rate: 0.1,
            immigrant_rate: 0.1,
            random_selection_rate: 0.25,
            tournament_min: 2,
            tournament_max: 5,
            stagnation_threshold: 15,
            max_mutation_rate: 0.8,
            heavy_stagnation_threshold: 25,
            extra_mutation_probability: 0.3,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the number of generations.
    pub fn with_max_generations(mut self, gen: u32) -> Self {
        self.max_generations = gen;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the base mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the immigrant rate.
    pub fn with_immigrant_rate(mut self, rate: f64) -> Self {
        self.immigrant_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size range (inclusive).
    pub fn with_tournament_range(mut self, min: usize, max: usize) -> Self {
        let min = min.max(1);
        self.tournament_min = min;
        self.tournament_max = max.max(min);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of individuals copied unchanged into the next generation.
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64 * self.elitism_rate) as usize).min(self.population_size)
    }

    /// Number of fresh random individuals injected every generation.
    pub fn immigrant_count(&self) -> usize {
        ((self.population_size as f64 * self.immigrant_rate) as usize).max(1)
    }

    /// Creates the run RNG: seeded if `seed` is set, from entropy otherwise.
    pub fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Mutation rate after adapting to `stagnation` generations without improvement.
    pub fn effective_mutation_rate(&self, stagnation: u32) -> f64 {
        if stagnation > self.stagnation_threshold {
            let scaled = self.mutation_rate * (1.0 + stagnation as f64 / 20.0);
            scaled.min(self.max_mutation_rate)
        } else {
            self.mutation_rate
        }
    }
}

/// A candidate solution carrying its cached fitness.
pub trait Individual: Clone + Send + Sync {
    /// Returns the fitness of this individual (higher is better).
    fn fitness(&self) -> f64;

    /// Returns true if the cached fitness is current.
    fn is_evaluated(&self) -> bool;
}

/// Problem-specific GA operations.
///
/// Crossover and mutation live on the problem rather than the individual
/// because they need problem bounds (container limits, height budgets).
pub trait GaProblem: Send + Sync {
    /// The individual type for this problem.
    type Individual: Individual;

    /// Creates a fresh random individual.
    fn random_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Evaluates the fitness of an individual, caching derived results on it.
    fn evaluate(&self, individual: &mut Self::Individual);

    /// Evaluates every unevaluated individual in parallel.
    fn evaluate_parallel(&self, individuals: &mut [Self::Individual]) {
        individuals
            .par_iter_mut()
            .filter(|ind| !ind.is_evaluated())
            .for_each(|ind| self.evaluate(ind));
    }

    /// Creates an initial population.
    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual> {
        (0..size).map(|_| self.random_individual(rng)).collect()
    }

    /// Recombines two parents into two children.
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        rng: &mut R,
    ) -> (Self::Individual, Self::Individual);

    /// Applies one mutation to an individual, invalidating its fitness.
    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R);

    /// Called after each generation's replacement step.
    fn on_generation(
        &self,
        _generation: u32,
        _best: &Self::Individual,
        _population: &[Self::Individual],
    ) {
    }
}

/// Progress information during GA execution.
#[derive(Debug, Clone)]
pub struct GaProgress {
    /// Generation that just completed.
    pub generation: u32,
    /// Generations configured.
    pub max_generations: u32,
    /// Fitness of the elite memory.
    pub best_fitness: f64,
    /// Average fitness of the ranked population of this generation.
    pub avg_fitness: f64,
    /// Generations since the last elite improvement.
    pub stagnation: u32,
    /// Mutation rate used to breed this generation's offspring.
    pub mutation_rate: f64,
    /// Elapsed time since start.
    pub elapsed: Duration,
    /// Whether the algorithm is still running.
    pub running: bool,
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual ever observed.
    pub best: I,
    /// Generations completed.
    pub generations: u32,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Whether the run was cancelled before the generation budget was spent.
    pub cancelled: bool,
    /// Best fitness per completed generation.
    pub history: Vec<f64>,
}

/// Genetic algorithm runner.
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
    cancelled: Arc<AtomicBool>,
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a new GA runner.
    pub fn new(config: GaConfig, problem: P) -> Self {
        Self {
            config,
            problem,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle to cancel the algorithm.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Returns the problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the genetic algorithm, seeding the RNG from the configuration.
    pub fn run(&self) -> GaResult<P::Individual> {
        let mut rng = self.config.make_rng();
        self.run_with_rng(&mut rng)
    }

    /// Runs the genetic algorithm with a progress callback.
    pub fn run_with_progress<F>(&self, progress_callback: F) -> GaResult<P::Individual>
    where
        F: FnMut(&GaProgress, &P::Individual),
    {
        let mut rng = self.config.make_rng();
        self.run_with_rng_and_progress(&mut rng, Some(progress_callback))
    }

    /// Runs the genetic algorithm with a specific RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> GaResult<P::Individual> {
        self.run_with_rng_and_progress::<R, fn(&GaProgress, &P::Individual)>(rng, None)
    }

    /// Runs the genetic algorithm with a specific RNG and optional progress callback.
    ///
    /// The callback for generation `N` fires only after generation `N`'s
    /// offspring have replaced the population.
    pub fn run_with_rng_and_progress<R: Rng, F>(
        &self,
        rng: &mut R,
        mut progress_callback: Option<F>,
    ) -> GaResult<P::Individual>
    where
        F: FnMut(&GaProgress, &P::Individual),
    {
        let start = Instant::now();
        let size = self.config.population_size.max(1);
        let elite_count = self.config.elite_count().min(size);
        let immigrant_count = self.config.immigrant_count();
        let mut history = Vec::with_capacity(self.config.max_generations as usize);

        let mut population = self.problem.initialize_population(size, rng);
        let mut best = population[0].clone();
        let mut best_fitness = f64::NEG_INFINITY;
        let mut stagnation = 0u32;
        let mut generation = 0u32;
        let mut cancelled = false;

        while generation < self.config.max_generations {
            if self.cancelled.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            self.problem.evaluate_parallel(&mut population);
            sort_by_fitness(&mut population);

            // Elite memory and stagnation have a single writer.
            if population[0].fitness() > best_fitness {
                best = population[0].clone();
                best_fitness = best.fitness();
                stagnation = 0;
            } else {
                stagnation += 1;
            }
            history.push(best_fitness);

            let avg_fitness = average_fitness(&population);
            let mutation_rate = self.config.effective_mutation_rate(stagnation);

            let mut next = Vec::with_capacity(size);
            next.extend(population.iter().take(elite_count).cloned());

            for _ in 0..immigrant_count {
                if next.len() >= size {
                    break;
                }
                next.push(self.problem.random_individual(rng));
            }

            while next.len() < size {
                let (parent1, parent2) = self.select_parents(&population, rng);

                let (mut child1, mut child2) = if rng.gen::<f64>() < self.config.crossover_rate {
                    self.problem.crossover(parent1, parent2, rng)
                } else {
                    (parent1.clone(), parent2.clone())
                };

                if rng.gen::<f64>() < mutation_rate {
                    self.problem.mutate(&mut child1, rng);
                }
                if rng.gen::<f64>() < mutation_rate {
                    self.problem.mutate(&mut child2, rng);
                }

                if stagnation > self.config.heavy_stagnation_threshold
                    && rng.gen::<f64>() < self.config.extra_mutation_probability
                {
                    for _ in 0..rng.gen_range(1..=2) {
                        self.problem.mutate(&mut child1, rng);
                        self.problem.mutate(&mut child2, rng);
                    }
                }

                next.push(child1);
                if next.len() < size {
                    next.push(child2);
                }
            }

            population = next;
            self.problem.on_generation(generation, &best, &population);

            if let Some(ref mut callback) = progress_callback {
                callback(
                    &GaProgress {
                        generation,
                        max_generations: self.config.max_generations,
                        best_fitness,
                        avg_fitness,
                        stagnation,
                        mutation_rate,
                        elapsed: start.elapsed(),
                        running: true,
                    },
                    &best,
                );
            }

            generation += 1;
        }

        // Fold the last offspring into elite memory.
        if !cancelled || !best.is_evaluated() {
            self.problem.evaluate_parallel(&mut population);
            sort_by_fitness(&mut population);
            if population[0].fitness() > best_fitness {
                best = population[0].clone();
                best_fitness = best.fitness();
            }
        }

        if let Some(ref mut callback) = progress_callback {
            callback(
                &GaProgress {
                    generation,
                    max_generations: self.config.max_generations,
                    best_fitness,
                    avg_fitness: average_fitness(&population),
                    stagnation,
                    mutation_rate: self.config.effective_mutation_rate(stagnation),
                    elapsed: start.elapsed(),
                    running: false,
                },
                &best,
            );
        }

        // A cancel request applies to this run only.
        self.cancelled.store(false, Ordering::Relaxed);

        GaResult {
            best,
            generations: generation,
            elapsed: start.elapsed(),
            cancelled,
            history,
        }
    }

    /// Picks two parents: uniformly at random, or by two tournaments of a shared random size.
    fn select_parents<'a, R: Rng>(
        &self,
        population: &'a [P::Individual],
        rng: &mut R,
    ) -> (&'a P::Individual, &'a P::Individual) {
        if rng.gen::<f64>() < self.config.random_selection_rate {
            let a = rng.gen_range(0..population.len());
            let b = rng.gen_range(0..population.len());
            return (&population[a], &population[b]);
        }

        let min = self.config.tournament_min.max(1);
        let max = self.config.tournament_max.max(min);
        let size = rng.gen_range(min..=max);
        (
            tournament_select(population, size, rng),
            tournament_select(population, size, rng),
        )
    }
}

/// Tournament selection: the fittest of `size` uniformly drawn individuals.
fn tournament_select<'a, I: Individual, R: Rng>(
    population: &'a [I],
    size: usize,
    rng: &mut R,
) -> &'a I {
    let mut best_idx = rng.gen_range(0..population.len());

    for _ in 1..size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].fitness() > population[best_idx].fitness() {
            best_idx = idx;
        }
    }

    &population[best_idx]
}

/// Sorts descending by fitness; unevaluated individuals sink to the end.
fn sort_by_fitness<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or(CmpOrdering::Equal)
    });
}

fn average_fitness<I: Individual>(population: &[I]) -> f64 {
    let evaluated: Vec<f64> = population
        .iter()
        .filter(|ind| ind.is_evaluated())
        .map(|ind| ind.fitness())
        .collect();
    if evaluated.is_empty() {
        return f64::NEG_INFINITY;
    }
    evaluated.iter().sum::<f64>() / evaluated.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone)]
    struct Scalar {
        value: f64,
        fitness: Option<f64>,
    }

    impl Individual for Scalar {
        fn fitness(&self) -> f64 {
            self.fitness.unwrap_or(f64::NEG_INFINITY)
        }

        fn is_evaluated(&self) -> bool {
            self.fitness.is_some()
        }
    }

    #[derive(Default)]
    struct Parabola {
        evaluations: AtomicUsize,
    }

    impl GaProblem for Parabola {
        type Individual = Scalar;

        fn random_individual<R: Rng>(&self, rng: &mut R) -> Scalar {
            Scalar {
                value: rng.gen_range(-100.0..100.0),
                fitness: None,
            }
        }

        fn evaluate(&self, individual: &mut Scalar) {
            self.evaluations.fetch_add(1, Ordering::Relaxed);
            // Maximize -(x^2), optimal at x = 0
            individual.fitness = Some(-individual.value * individual.value);
        }

        fn crossover<R: Rng>(&self, a: &Scalar, b: &Scalar, rng: &mut R) -> (Scalar, Scalar) {
            let t: f64 = rng.gen();
            let mix = |x: f64, y: f64| Scalar {
                value: x * t + y * (1.0 - t),
                fitness: None,
            };
            (mix(a.value, b.value), mix(b.value, a.value))
        }

        fn mutate<R: Rng>(&self, individual: &mut Scalar, rng: &mut R) {
            individual.value += rng.gen_range(-10.0..10.0);
            individual.fitness = None;
        }
    }

    #[test]
    fn test_ga_basic() {
        let config = GaConfig::default()
            .with_population_size(50)
            .with_max_generations(100)
            .with_seed(7);

        let runner = GaRunner::new(config, Parabola::default());
        let result = runner.run();

        assert!(result.best.value.abs() < 5.0);
        assert_eq!(result.generations, 100);
        assert_eq!(result.history.len(), 100);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_history_is_monotonic() {
        let config = GaConfig::default()
            .with_population_size(30)
            .with_max_generations(60)
            .with_mutation_rate(0.5)
            .with_seed(11);

        let result = GaRunner::new(config, Parabola::default()).run();

        for pair in result.history.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(result.best.fitness() >= *result.history.last().unwrap());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = GaConfig::default()
            .with_population_size(20)
            .with_max_generations(30)
            .with_seed(42);

        let a = GaRunner::new(config.clone(), Parabola::default()).run();
        let b = GaRunner::new(config, Parabola::default()).run();

        assert_eq!(a.history, b.history);
        assert_eq!(a.best.value, b.best.value);
    }

    #[test]
    fn test_cancel_before_start() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(50);
        let runner = GaRunner::new(config, Parabola::default());
        runner.cancel_handle().store(true, Ordering::Relaxed);

        let result = runner.run();

        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert!(result.history.is_empty());
        assert!(result.best.is_evaluated());
    }

    #[test]
    fn test_progress_reported_after_each_generation() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(5)
            .with_seed(3);
        let runner = GaRunner::new(config, Parabola::default());

        let mut seen = Vec::new();
        runner.run_with_progress(|progress, best| {
            assert!(best.is_evaluated());
            seen.push((progress.generation, progress.running));
        });

        assert_eq!(
            seen,
            vec![
                (0, true),
                (1, true),
                (2, true),
                (3, true),
                (4, true),
                (5, false)
            ]
        );
    }

    #[test]
    fn test_carried_over_individuals_are_not_reevaluated() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(1)
            .with_crossover_rate(0.0)
            .with_mutation_rate(0.0)
            .with_seed(5);
        let runner = GaRunner::new(config, Parabola::default());
        runner.run();

        // 10 initial evaluations plus only the single immigrant afterwards.
        assert_eq!(runner.problem().evaluations.load(Ordering::Relaxed), 11);
    }

    #[test]
    fn test_effective_mutation_rate() {
        let config = GaConfig::default().with_mutation_rate(0.2);

        assert_eq!(config.effective_mutation_rate(0), 0.2);
        assert_eq!(config.effective_mutation_rate(15), 0.2);
        assert!((config.effective_mutation_rate(20) - 0.4).abs() < 1e-12);
        assert_eq!(config.effective_mutation_rate(1000), 0.8);

        let high = GaConfig::default().with_mutation_rate(0.9);
        assert_eq!(high.effective_mutation_rate(15), 0.9);
        assert_eq!(high.effective_mutation_rate(16), 0.8);
        assert_eq!(high.effective_mutation_rate(500), 0.8);
    }

    #[test]
    fn test_builders_clamp() {
        let config = GaConfig::default()
            .with_immigrant_rate(1.5)
            .with_tournament_range(0, 0);
        assert_eq!(config.immigrant_rate, 1.0);
        assert_eq!(config.tournament_min, 1);
        assert_eq!(config.tournament_max, 1);

        let config = GaConfig::default()
            .with_population_size(40)
            .with_immigrant_rate(0.25)
            .with_tournament_range(4, 3);
        assert_eq!(config.immigrant_count(), 10);
        assert_eq!(config.tournament_min, 4);
        assert_eq!(config.tournament_max, 4);
    }

    #[test]
    fn test_seeded_make_rng_repeats() {
        let config = GaConfig::default().with_seed(17);
        let a: u64 = config.make_rng().gen();
        let b: u64 = config.make_rng().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_after_cancel_starts_fresh() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(20)
            .with_seed(8);
        let runner = GaRunner::new(config, Parabola::default());
        let handle = runner.cancel_handle();

        let first = runner.run_with_progress(|progress, _| {
            if progress.generation == 1 {
                handle.store(true, Ordering::Relaxed);
            }
        });
        assert!(first.cancelled);
        assert_eq!(first.generations, 2);

        let second = runner.run();
        assert!(!second.cancelled);
        assert_eq!(second.generations, 20);
        assert_eq!(second.history.len(), 20);
    }

    #[test]
    fn test_population_shares() {
        let config = GaConfig::default()
            .with_population_size(55)
            .with_elitism_rate(0.1);
        assert_eq!(config.elite_count(), 5);
        assert_eq!(config.immigrant_count(), 5);

        let tiny = GaConfig::default().with_population_size(4);
        assert_eq!(tiny.elite_count(), 0);
        assert_eq!(tiny.immigrant_count(), 1);
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let population: Vec<Scalar> = (0..10)
            .map(|i| Scalar {
                value: i as f64,
                fitness: Some(i as f64),
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(1);

        let total: f64 = (0..200)
            .map(|_| tournament_select(&population, 5, &mut rng).fitness())
            .sum();
        // Uniform sampling would average 4.5.
        assert!(total / 200.0 > 6.0);
    }
}
