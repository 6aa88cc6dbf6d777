//! Problem files and run reports.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use u_rack_tiers::{
    ContainerReport, FitnessBreakdown, FitnessWeights, PlacedItem, StackConfig, StackResult,
};

fn default_max_containers() -> usize {
    10
}

/// A problem definition read from JSON.
///
/// ```json
/// {
///   "container_width": 7.0,
///   "max_total_height": 20.0,
///   "max_containers": 5,
///   "rectangles": [[4, 3], [3, 2], [2, 5]],
///   "generations": 300
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemFile {
    pub container_width: f64,
    pub max_total_height: f64,
    #[serde(default = "default_max_containers")]
    pub max_containers: usize,
    pub rectangles: Vec<(f64, f64)>,
    #[serde(default)]
    pub population_size: Option<usize>,
    #[serde(default)]
    pub generations: Option<u32>,
    #[serde(default)]
    pub mutation_rate: Option<f64>,
    #[serde(default)]
    pub crossover_rate: Option<f64>,
    #[serde(default)]
    pub elitism_rate: Option<f64>,
    #[serde(default)]
    pub height_jitter: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub weights: Option<FitnessWeights>,
}

impl ProblemFile {
    /// Ten mixed cross-sections on a 7-wide rack of height 20.
    pub fn demo() -> Self {
        Self {
            container_width: 7.0,
            max_total_height: 20.0,
            max_containers: 5,
            rectangles: vec![
                (4.0, 3.0),
                (3.0, 2.0),
                (2.0, 5.0),
                (3.0, 3.0),
                (4.0, 2.0),
                (2.0, 2.0),
                (3.0, 4.0),
                (5.0, 1.0),
                (2.0, 1.0),
                (2.0, 3.0),
            ],
            population_size: Some(200),
            generations: Some(500),
            mutation_rate: Some(0.4),
            crossover_rate: Some(0.75),
            elitism_rate: Some(0.05),
            height_jitter: None,
            seed: None,
            weights: None,
        }
    }

    /// Reads a problem from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Builds the optimizer configuration; unset values keep their defaults.
    pub fn to_config(&self) -> StackConfig {
        let mut config = StackConfig::new(self.container_width, self.max_total_height)
            .with_max_containers(self.max_containers);

        if let Some(size) = self.population_size {
            config = config.with_population_size(size);
        }
        if let Some(generations) = self.generations {
            config = config.with_generations(generations);
        }
        if let Some(rate) = self.mutation_rate {
            config = config.with_mutation_rate(rate);
        }
        if let Some(rate) = self.crossover_rate {
            config = config.with_crossover_rate(rate);
        }
        if let Some(rate) = self.elitism_rate {
            config = config.with_elitism_rate(rate);
        }
        if let Some(jitter) = self.height_jitter {
            config = config.with_height_jitter(jitter);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(weights) = self.weights {
            config = config.with_weights(weights);
        }
        config
    }
}

/// Flattened result written with `--output`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub fitness: f64,
    pub num_containers: usize,
    pub container_heights: Vec<f64>,
    pub total_height_used: f64,
    pub rectangles_placed: usize,
    pub total_rectangles: usize,
    pub unplaced: Vec<usize>,
    pub generations: u32,
    pub computation_time_ms: u64,
    pub cancelled: bool,
    pub breakdown: FitnessBreakdown,
    pub tiers: Vec<ContainerReport>,
    pub placements: Vec<PlacedItem>,
    pub fitness_history: Vec<f64>,
}

impl From<&StackResult> for RunReport {
    fn from(result: &StackResult) -> Self {
        Self {
            fitness: result.fitness(),
            num_containers: result.num_containers(),
            container_heights: result.container_heights(),
            total_height_used: result.total_height_used(),
            rectangles_placed: result.rectangles_placed(),
            total_rectangles: result.rectangles.len(),
            unplaced: result.unplaced(),
            generations: result.generations,
            computation_time_ms: result.computation_time_ms,
            cancelled: result.cancelled,
            breakdown: result.breakdown,
            tiers: result.reports(),
            placements: result.placed_items(),
            fitness_history: result.fitness_history.clone(),
        }
    }
}

impl RunReport {
    /// Writes the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
