//! U-Rack tier optimization CLI

mod problem;

use clap::{Args, Parser, Subcommand};
use problem::{ProblemFile, RunReport};
use std::path::PathBuf;
use u_rack_tiers::{StackOptimizer, StackResult};

#[derive(Parser)]
#[command(name = "rack-runner")]
#[command(about = "Stacked rack tier optimizer for U-Rack")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in ten-rectangle demo
    Demo {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Run a problem from a JSON file
    Run {
        /// Path to the JSON problem file
        file: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of generations
    #[arg(short, long)]
    generations: Option<u32>,

    /// Population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Maximum number of tiers
    #[arg(short, long)]
    max_containers: Option<usize>,

    /// Print progress every N generations (0 = off)
    #[arg(long, default_value = "50")]
    progress_every: u32,

    /// Output file for the result (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, problem: &mut ProblemFile) {
        if let Some(seed) = self.seed {
            problem.seed = Some(seed);
        }
        if let Some(generations) = self.generations {
            problem.generations = Some(generations);
        }
        if let Some(size) = self.population {
            problem.population_size = Some(size);
        }
        if let Some(max) = self.max_containers {
            problem.max_containers = max;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut problem, args) = match cli.command {
        Commands::Demo { run } => (ProblemFile::demo(), run),
        Commands::Run { file, run } => (ProblemFile::load(&file)?, run),
    };
    args.apply(&mut problem);

    let config = problem.to_config();
    let optimizer = StackOptimizer::new(&problem.rectangles, config)?;
    let config = optimizer.config();

    println!("Running stacked tier optimization...");
    println!("Container width: {} (fixed)", config.container_width);
    println!("Max total height: {}", config.max_total_height);
    println!("Max containers: {}", config.max_containers);
    println!("Rectangles to pack: {}", problem.rectangles.len());
    println!("{:-<50}", "");

    let every = args.progress_every;
    let result = optimizer.run_with_progress(|p| {
        if every > 0 && p.generation % every == 0 {
            println!(
                "Generation {:>4}/{}: fitness={:.2}, placed={}/{}, tiers={}, height={:.2}, stagnation={}",
                p.generation,
                p.max_generations,
                p.best_fitness,
                p.rectangles_placed,
                p.total_rectangles,
                p.num_containers,
                p.total_height_used,
                p.stagnation
            );
        }
    });

    println!("{:-<50}", "");
    print_summary(&result);
    if let Err(e) = result.verify() {
        eprintln!("WARNING: {}", e);
    }

    if let Some(path) = args.output {
        RunReport::from(&result).save_json(&path)?;
        println!("\nResults saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(result: &StackResult) {
    let heights: Vec<String> = result
        .container_heights()
        .iter()
        .map(|h| format!("{:.2}", h))
        .collect();

    println!("\nBest solution found:");
    println!("Number of containers: {}", result.num_containers());
    println!("Container heights: [{}]", heights.join(", "));
    println!("Total height used: {:.2}", result.total_height_used());
    println!(
        "Rectangles placed: {}/{}",
        result.rectangles_placed(),
        result.rectangles.len()
    );
    println!("Fitness: {:.2}", result.fitness());
    println!(
        "Generations: {} ({} ms){}",
        result.generations,
        result.computation_time_ms,
        if result.cancelled { ", cancelled" } else { "" }
    );

    let unplaced = result.unplaced();
    if !unplaced.is_empty() {
        println!("Unplaced rectangles: {:?}", unplaced);
    }

    println!("\nContainer Analysis:");
    for report in result.reports() {
        println!(
            "  Container {}: {:.1}% utilization ({} items: {}B, {}T)",
            report.index + 1,
            report.utilization * 100.0,
            report.bottom_count + report.top_count,
            report.bottom_count,
            report.top_count
        );
        println!(
            "    Height: {:.2} (min: {:.2}, overhead: {:.1}%, alignment: {:.2})",
            report.height, report.minimum_height, report.jitter_overhead_pct, report.alignment_score
        );
        if report.has_clash {
            println!("      WARNING: Rectangle clashes detected!");
        }
    }
}
