//! Coverplace CLI.
//!
//! Optimize table placements for a rectangular room and export the results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cp_engine::{read_config, write_coordinates, write_json, HeatmapDocument};
use cp_optimizer::{InitialLayout, PlacementOptimizer, PlacementSweep, SolverOptions, SweepConfig};
use cp_types::{PlacementConfig, RoomDimensions};

const DEFAULT_TABLES: usize = 5;

#[derive(Parser)]
#[command(name = "coverplace")]
#[command(about = "Coverage-maximizing table placement for rectangular rooms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct RoomArgs {
    /// JSON placement config; replaces the room, radius, scale and corner flags.
    /// Solver flags still apply, and an explicit table count overrides the file's.
    #[arg(long, env = "COVERPLACE_CONFIG")]
    config: Option<PathBuf>,

    /// Room width (feet)
    #[arg(long, default_value = "20")]
    width: f64,

    /// Room height (feet)
    #[arg(long, default_value = "25")]
    height: f64,

    /// Table radius (feet)
    #[arg(long, short, default_value = "2")]
    radius: f64,

    /// Coverage spread relative to the table radius
    #[arg(long, short, default_value = "2")]
    scale: f64,

    /// Disable the fixed presentation table at the room origin
    #[arg(long)]
    no_presentation_corner: bool,

    /// Iteration budget for the search
    #[arg(long, default_value = "100")]
    max_iterations: usize,

    /// Relative improvement below which the search stops
    #[arg(long, default_value = "1e-6")]
    ftol: f64,

    /// Jitter the starting layout with this seed instead of using the plain grid
    #[arg(long)]
    seed: Option<u64>,
}

impl RoomArgs {
    fn placement_config(&self, emitters: Option<usize>) -> Result<PlacementConfig> {
        let config = match &self.config {
            Some(path) => read_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => {
                let room = RoomDimensions::new(self.width, self.height);
                PlacementConfig::new(room, DEFAULT_TABLES)
                    .with_radius(self.radius)
                    .with_scale(self.scale)
                    .with_presentation_corner(!self.no_presentation_corner)
            }
        };
        Ok(match emitters {
            Some(n) => config.with_emitters(n),
            None => config,
        })
    }

    fn solver_options(&self) -> SolverOptions {
        SolverOptions::default()
            .with_max_iterations(self.max_iterations)
            .with_ftol(self.ftol)
    }

    fn layout(&self) -> InitialLayout {
        self.seed
            .map(|seed| InitialLayout::Jittered { seed })
            .unwrap_or_default()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize one room and write the table coordinates.
    Optimize {
        #[command(flatten)]
        room: RoomArgs,
        /// Number of tables [default: 5, or the config file's count]
        #[arg(short, long)]
        tables: Option<usize>,
        /// Output file for table coordinates (JSON)
        #[arg(long, default_value = "output/table_coords.json")]
        coords: PathBuf,
        /// Output file for the heat-map document (JSON)
        #[arg(long)]
        heatmap: Option<PathBuf>,
    },

    /// Optimize a range of table counts in parallel.
    Sweep {
        #[command(flatten)]
        room: RoomArgs,
        /// Smallest table count
        #[arg(long, default_value = "1")]
        min_tables: usize,
        /// Largest table count
        #[arg(long, default_value = "8")]
        max_tables: usize,
        /// Output file for the sweep summary (JSON)
        #[arg(short, long, default_value = "output/sweep.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Optimize {
            room,
            tables,
            coords,
            heatmap,
        } => {
            let config = room.placement_config(tables)?;
            let optimizer = PlacementOptimizer::new(config.clone())?
                .with_options(room.solver_options())
                .with_layout(room.layout());
            let result = optimizer.run()?;

            if !result.status.is_feasible() {
                warn!("Tables overlap; try fewer tables or a smaller radius");
            }
            for (i, p) in result.placements.points().iter().enumerate() {
                info!("table {i}: {p}");
            }
            info!("coverage: {:.4}", result.coverage);

            write_coordinates(&coords, &result)?;
            if let Some(path) = heatmap {
                let integration = optimizer.coverage_grid(&result.placements)?;
                let doc = HeatmapDocument::new(&config, &result.placements, &integration);
                write_json(&path, &doc)?;
                info!("Wrote heat map to {}", path.display());
            }
        }

        Commands::Sweep {
            room,
            min_tables,
            max_tables,
            output,
        } => {
            anyhow::ensure!(
                min_tables <= max_tables,
                "min-tables ({min_tables}) exceeds max-tables ({max_tables})"
            );
            let base = room.placement_config(Some(min_tables))?;
            let sweep = SweepConfig::new("table-count", base)
                .with_emitter_range(min_tables..=max_tables)
                .with_options(room.solver_options())
                .with_layout(room.layout());
            let status = PlacementSweep::new(sweep).run();

            if let Some(best) = status.best_entry() {
                info!("Best coverage per table with {} tables", best.emitters);
            } else {
                warn!("No table count produced a non-overlapping layout");
            }
            write_json(&output, &status)?;
            info!("Wrote sweep summary to {}", output.display());
        }
    }

    Ok(())
}
