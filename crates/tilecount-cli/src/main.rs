use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tilecount_core::{
    Estimator, FloorConfig, PatternLayout, Summary, SurfaceConfig, SurfaceOutcome,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilecount")]
#[command(about = "Tile estimator - Calculate how many tiles to buy, reusing offcuts", long_about = None)]
struct Cli {
    /// Log estimator decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a single surface
    Estimate {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate every surface of a floor, optionally sharing offcuts
    Floor {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Estimate { input, output } => {
            estimate_command(input, output)?;
        }
        Commands::Floor { input, output } => {
            floor_command(input, output)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads a YAML or JSON input, picked by file extension.
fn load_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    debug!(path = %path.display(), yaml = is_yaml, "parsing input");
    let parsed = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(parsed)
}

fn estimate_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔍 Loading input...".bright_blue());

    let config: SurfaceConfig = load_input(&input)?;
    if let Some(surface) = &config.surface {
        println!(
            "  Surface {} with {} vertices, {} exclusions",
            surface.id.bright_white().bold(),
            surface.boundary.len(),
            surface.exclusions.len()
        );
    }
    println!(
        "  Tile {} x {} ({:?}, {:?} pattern)",
        config.tile.width, config.tile.height, config.tile.shape, config.pattern.kind
    );
    println!();

    println!("{}", "🚀 Running estimate...".bright_blue());

    let mut estimator = Estimator::new(PatternLayout::new());
    let result = estimator.compute_for_surface(&config)?;

    println!();
    println!("{}", "✅ Estimate complete!".bright_green().bold());
    println!();

    println!("{}", "📊 Results:".bright_yellow().bold());
    print_summary(&result.summary, "  ");

    if !result.remaining_offcuts.is_empty() {
        println!();
        println!("  Leftover offcuts:");
        for offcut in &result.remaining_offcuts {
            println!(
                "    • #{}: {:.1} x {:.1}",
                offcut.id, offcut.width, offcut.height
            );
        }
    }

    println!();
    write_output(&result, output)
}

fn floor_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔍 Loading floor...".bright_blue());

    let floor: FloorConfig = load_input(&input)?;
    println!(
        "  {} surfaces, offcut sharing {}",
        floor.surfaces.len().to_string().bright_white().bold(),
        if floor.share_offcuts { "on" } else { "off" }
    );
    println!();

    println!("{}", "🚀 Running estimate...".bright_blue());

    let mut estimator = Estimator::new(PatternLayout::new());
    let result = estimator.compute_for_floor(&floor)?;

    println!();
    println!("{}", "✅ Estimate complete!".bright_green().bold());
    println!();

    println!("{}", "📊 Results:".bright_yellow().bold());
    for outcome in &result.surfaces {
        match outcome {
            SurfaceOutcome::Computed(surface) => {
                println!("  {}:", surface.surface_id.bright_white().bold());
                print_summary(&surface.summary, "    ");
            }
            SurfaceOutcome::Failed { surface_id, error } => {
                println!(
                    "  {}: {}",
                    surface_id.as_deref().unwrap_or("<no surface>").bright_white(),
                    error.bright_red()
                );
            }
        }
    }

    let totals = &result.totals;
    println!();
    println!(
        "  Total tiles to buy: {}",
        totals
            .purchased_with_reserve
            .to_string()
            .bright_white()
            .bold()
    );
    println!("  Total waste: {:.1}%", totals.waste_percentage);
    if totals.surfaces_failed > 0 {
        println!(
            "  {}",
            format!("{} surfaces failed", totals.surfaces_failed).bright_red()
        );
    }

    println!();
    write_output(&result, output)
}

fn print_summary(summary: &Summary, indent: &str) {
    println!(
        "{indent}Tiles to buy: {}",
        summary
            .purchased_with_reserve
            .to_string()
            .bright_white()
            .bold()
    );
    println!(
        "{indent}Full: {}, cut: {}, cut from offcuts: {}",
        summary.full_tiles,
        summary.cut_tiles,
        summary.reused_cuts.to_string().bright_green()
    );
    if summary.reserve_tiles > 0 {
        println!("{indent}Reserve: {}", summary.reserve_tiles);
    }
    println!("{indent}Waste: {:.1}%", summary.waste_percentage);
    if let Some(packs) = summary.packs {
        println!("{indent}Packs: {}", packs);
    }
    if summary.purchase_cost > 0.0 {
        println!("{indent}Cost: {:.2}", summary.purchase_cost);
    }
}

fn write_output<T: Serialize>(result: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;

    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "💾 Saved result to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_surface() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "surface:
  id: bath
  boundary: [[0, 0], [60, 0], [60, 40], [0, 40]]
tile:
  width: 20
  height: 20
pricing:
  reserve_tiles: 2
"
        )
        .unwrap();

        let config: SurfaceConfig = load_input(file.path()).unwrap();
        assert_eq!(config.surface.as_ref().unwrap().id, "bath");
        assert!(config.cutting.allow_rotate);

        let mut estimator = Estimator::new(PatternLayout::new());
        let result = estimator.compute_for_surface(&config).unwrap();
        assert_eq!(result.summary.full_tiles, 6);
        assert_eq!(result.summary.purchased_with_reserve, 8);
    }

    #[test]
    fn test_load_json_floor() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
  "share_offcuts": true,
  "surfaces": [
    {{"surface": {{"id": "a", "boundary": [[0, 0], [50, 0], [50, 20], [0, 20]]}},
     "tile": {{"width": 20, "height": 20}}}},
    {{"tile": {{"width": 20, "height": 20}}}}
  ]
}}"#
        )
        .unwrap();

        let floor: FloorConfig = load_input(file.path()).unwrap();
        let mut estimator = Estimator::new(PatternLayout::new());
        let result = estimator.compute_for_floor(&floor).unwrap();
        assert_eq!(result.totals.surfaces_computed, 1);
        assert_eq!(result.totals.surfaces_failed, 1);
    }

    #[test]
    fn test_load_rejects_malformed_input() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"tile\": 3}}").unwrap();
        assert!(load_input::<SurfaceConfig>(file.path()).is_err());
    }
}
