//! Travesia CLI - least-cost corridors and paths over terrain

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::Point;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use travesia_algorithms::corridor::{corridor_network, CorridorLeg, RefinementSchedule, RoundConfig, Tolerance};
use travesia_algorithms::cost::{
    build_cost, cumulative_cost, directional_cost_surfaces, rasterize_points, water_mask,
    CostSurfaceParams, CumulativeCostParams, WaterMaskSource,
};
use travesia_algorithms::filter::low_gradient_mask;
use travesia_algorithms::path::{trace, trace_coarse, Compass, StepModel};
use travesia_algorithms::terrain::{slope, SlopeParams, SlopeUnits};
use travesia_core::io::{read_geotiff, write_geotiff};
use travesia_core::vector::{Feature, FeatureCollection};
use travesia_core::{Mask, Raster};

use config::{AnalysisConfig, CostKind};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "travesia")]
#[command(author, version, about = "Least-cost corridors and paths over terrain", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON analysis configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Calculate slope from DEM
    Slope {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Output units: degrees, percent, radians
        #[arg(short, long, default_value = "degrees")]
        units: String,
        /// Z-factor for unit conversion
        #[arg(short, long)]
        z_factor: Option<f64>,
    },
    /// Derive a water mask (1 = water)
    Water {
        /// Water-occurrence (0-100) or elevation raster
        input: PathBuf,
        /// Output mask file
        output: PathBuf,
        /// Occurrence percentage at or above which a cell is water
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Treat the input as elevation: water at or below this level
        #[arg(long)]
        sea_level: Option<f64>,
    },
    /// Build a friction surface from a DEM
    CostSurface {
        /// Input DEM file
        dem: PathBuf,
        /// Output cost file (forward direction for anisotropic costs)
        output: PathBuf,
        /// Water-occurrence raster on the DEM grid
        #[arg(short, long)]
        water: Option<PathBuf>,
        /// Occurrence percentage at or above which a --water cell is water
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Mark DEM cells at or below this elevation as water
        #[arg(long)]
        sea_level: Option<f64>,
        /// Cost function: tobler, quadratic, anisotropic
        #[arg(short, long)]
        function: Option<String>,
        /// Travel origin 'x,y' (anisotropic only)
        #[arg(long)]
        from: Option<String>,
        /// Travel destination 'x,y' (anisotropic only)
        #[arg(long)]
        to: Option<String>,
        /// Output file for the return-direction cost (anisotropic only)
        #[arg(long)]
        backward: Option<PathBuf>,
    },
    /// Accumulated least cost from one or more sources
    CumulativeCost {
        /// Input cost file
        cost: PathBuf,
        /// Output file
        output: PathBuf,
        /// Source points as 'x,y;x,y;...'
        #[arg(short, long)]
        points: String,
        /// Ground distance beyond which cells stay absent
        #[arg(short, long)]
        max_distance: Option<f64>,
    },
    /// Least-cost corridor through a set of waypoints
    Corridor {
        /// Input cost file
        cost: PathBuf,
        /// Output corridor mask file (start-end corridor)
        output: PathBuf,
        /// Waypoints as 'x,y;x,y;...' (at least two)
        #[arg(short, long)]
        points: String,
        /// Write corridor polygons as JSON
        #[arg(long)]
        polygons: Option<PathBuf>,
        /// Write the flat cells of the cost surface inside the corridor
        #[arg(long)]
        low_gradient: Option<PathBuf>,
        /// Also compute corridors between consecutive waypoints
        #[arg(long)]
        segments: bool,
        /// Number of refinement rounds; extra rounds repeat the last step
        #[arg(short, long)]
        rounds: Option<usize>,
        /// Block size of the first round in cells; later rounds keep their ratio
        #[arg(long)]
        initial_scale: Option<f64>,
        /// First-round tolerance as a fraction of the minimum cost
        #[arg(short, long)]
        tolerance: Option<f64>,
        /// Region half side as a multiple of the start-end distance
        #[arg(long)]
        cushion: Option<f64>,
    },
    /// Flat cells (small 8-neighbour Laplacian) inside a region
    LowGradient {
        /// Input raster
        input: PathBuf,
        /// Output mask file
        output: PathBuf,
        /// Region mask; the whole grid when omitted
        #[arg(short, long)]
        region: Option<PathBuf>,
        /// Laplacian magnitude below which a cell is flat
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Trace a path downhill on a cumulative cost field
    Path {
        /// Cumulative cost field
        field: PathBuf,
        /// Output path as JSON
        output: PathBuf,
        /// Starting position 'x,y'
        #[arg(short, long)]
        dest: String,
        /// Move along compass bearings by this ground distance instead of grid steps
        #[arg(long)]
        step_length: Option<f64>,
        /// Use 4 bearings instead of 8 with --step-length
        #[arg(long)]
        four: bool,
        /// Trace on the field coarsened by this block factor
        #[arg(long)]
        coarse: Option<usize>,
        #[arg(long)]
        max_steps: Option<usize>,
        /// Cost below which the source counts as reached
        #[arg(long)]
        source_threshold: Option<f64>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster: {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_mask(path: &Path) -> Result<Mask> {
    Ok(read_raster(path)?.select(|v| v >= 0.5))
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_mask(mask: &Mask, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(mask, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).context("Failed to write JSON")
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_units(s: &str) -> Result<SlopeUnits> {
    match s.to_lowercase().as_str() {
        "degrees" | "deg" => Ok(SlopeUnits::Degrees),
        "percent" | "pct" => Ok(SlopeUnits::Percent),
        "radians" | "rad" => Ok(SlopeUnits::Radians),
        _ => anyhow::bail!("Unknown units: {}. Use degrees, percent, or radians.", s),
    }
}

fn parse_point(s: &str) -> Result<Point<f64>> {
    let parts: Vec<&str> = s.trim().split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("Point must be 'x,y', got: {}", s);
    }
    let x: f64 = parts[0].trim().parse().context("Invalid x")?;
    let y: f64 = parts[1].trim().parse().context("Invalid y")?;
    Ok(Point::new(x, y))
}

fn parse_points(s: &str) -> Result<Vec<Point<f64>>> {
    s.split(';')
        .filter(|pair| !pair.trim().is_empty())
        .map(parse_point)
        .collect()
}

/// Occurrence threshold for a `--water` raster.
///
/// An elevation-heuristic config has no occurrence threshold, so the default
/// one is used with a warning.
fn occurrence_threshold(flag: Option<f64>, configured: WaterMaskSource) -> f64 {
    match (flag, configured) {
        (Some(t), _) => t,
        (None, WaterMaskSource::Occurrence { threshold }) => threshold,
        (None, WaterMaskSource::ElevationHeuristic { .. }) => {
            let fallback = match WaterMaskSource::default() {
                WaterMaskSource::Occurrence { threshold } => threshold,
                WaterMaskSource::ElevationHeuristic { .. } => 90.0,
            };
            warn!(
                threshold = fallback,
                "config water source is elevation based; --water raster uses the default occurrence threshold (set --threshold to change it)"
            );
            fallback
        }
    }
}

/// Applies the corridor flags to the configured schedule, changing only
/// what was given.
///
/// `rounds` truncates the schedule or extends it by repeating its last step.
/// `initial_scale` rescales every round so later rounds keep their ratio to
/// the first. `tolerance` replaces the first round's tolerance with a
/// fraction of the minimum cost.
fn override_schedule(
    schedule: &mut RefinementSchedule,
    rounds: Option<usize>,
    initial_scale: Option<f64>,
    tolerance: Option<f64>,
) -> Result<()> {
    if rounds.is_none() && initial_scale.is_none() && tolerance.is_none() {
        return Ok(());
    }
    let defaults = RefinementSchedule::default();
    if schedule.is_empty() {
        warn!("Configured schedule is empty; starting from the default first round");
        schedule.rounds.extend(defaults.rounds.first().copied());
    }

    if let Some(n) = rounds {
        if n == 0 {
            anyhow::bail!("--rounds must be at least 1");
        }
        schedule.rounds.truncate(n);
        if schedule.len() < n {
            info!(from = schedule.len(), to = n, "Extending schedule by repeating its last step");
        }
        while schedule.len() < n {
            let k = schedule.len();
            let last = schedule.rounds[k - 1];
            let ratio = match k {
                1 => None,
                _ => {
                    let prev = schedule.rounds[k - 2].scale;
                    (prev > 0.0 && last.scale > 0.0).then(|| last.scale / prev)
                }
            };
            let default_step = defaults.rounds.get(1).copied();
            let ratio = ratio
                .or_else(|| default_step.map(|d| d.scale / defaults.rounds[0].scale))
                .unwrap_or(0.5);
            let tolerance = match last.tolerance {
                t @ Tolerance::ScalePrevious(_) if k > 1 => t,
                _ => default_step.map_or(last.tolerance, |d| d.tolerance),
            };
            schedule.rounds.push(RoundConfig {
                scale: last.scale * ratio,
                tolerance,
            });
        }
    }

    if let Some(scale) = initial_scale {
        if !(scale.is_finite() && scale > 0.0) {
            anyhow::bail!("--initial-scale must be positive, got {}", scale);
        }
        let first = schedule.rounds[0].scale;
        if first.is_finite() && first > 0.0 {
            let factor = scale / first;
            for round in &mut schedule.rounds {
                round.scale *= factor;
            }
        } else {
            schedule.rounds[0].scale = scale;
        }
    }

    if let Some(t) = tolerance {
        schedule.rounds[0].tolerance = Tolerance::FractionOfMin(t);
    }
    Ok(())
}

fn leg_feature(leg: &CorridorLeg) -> Feature {
    leg.corridor
        .to_feature()
        .with_property("label", leg.label.clone())
        .with_property("low_gradient_cells", leg.low_gradient.count_in())
}

fn print_rounds(leg: &CorridorLeg) {
    println!("Corridor {}:", leg.label);
    for r in &leg.corridor.rounds {
        println!(
            "  Round {}: scale {} (used {}{}), min cost {:.3}, tolerance {:.3}, {} cells",
            r.round,
            r.requested_scale,
            r.scale_used,
            if r.coarsened { ", coarsened" } else { "" },
            r.min_cost,
            r.tolerance,
            r.cells
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = AnalysisConfig::load(cli.config.as_deref())?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            println!("Geographic: {}", raster.is_geographic());
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        // ── Slope ────────────────────────────────────────────────────
        Commands::Slope {
            input,
            output,
            units,
            z_factor,
        } => {
            let dem = read_raster(&input)?;
            let params = SlopeParams {
                units: parse_units(&units)?,
                z_factor: z_factor.unwrap_or(config.z_factor),
                ..Default::default()
            };
            let start = Instant::now();
            let result = slope(&dem, params).context("Failed to calculate slope")?;
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            done("Slope", &output, elapsed);
        }

        // ── Water ────────────────────────────────────────────────────
        Commands::Water {
            input,
            output,
            threshold,
            sea_level,
        } => {
            let raster = read_raster(&input)?;
            let source = match (sea_level, threshold) {
                (Some(level), _) => WaterMaskSource::ElevationHeuristic { sea_level: level },
                (None, Some(t)) => WaterMaskSource::Occurrence { threshold: t },
                (None, None) => config.water,
            };
            let start = Instant::now();
            let mask = water_mask(&raster, source);
            let elapsed = start.elapsed();
            info!("Water cells: {}", mask.count_in());
            write_mask(&mask, &output)?;
            done("Water mask", &output, elapsed);
        }

        // ── Cost surface ─────────────────────────────────────────────
        Commands::CostSurface {
            dem,
            output,
            water,
            threshold,
            sea_level,
            function,
            from,
            to,
            backward,
        } => {
            let elevation = read_raster(&dem)?;
            let water = match (water, sea_level) {
                (Some(path), _) => {
                    let threshold = occurrence_threshold(threshold, config.water);
                    let occurrence = read_raster(&path)?;
                    water_mask(&occurrence, WaterMaskSource::Occurrence { threshold })
                }
                (None, Some(level)) => {
                    water_mask(&elevation, WaterMaskSource::ElevationHeuristic { sea_level: level })
                }
                (None, None) => match config.water {
                    source @ WaterMaskSource::ElevationHeuristic { .. } => water_mask(&elevation, source),
                    WaterMaskSource::Occurrence { .. } => {
                        warn!("No water raster given; every cell is treated as land");
                        elevation.with_same_meta::<u8>(elevation.rows(), elevation.cols())
                    }
                },
            };
            let kind = match function {
                Some(s) => s.parse::<CostKind>()?,
                None => config.cost_function,
            };
            let slope_params = SlopeParams {
                z_factor: config.z_factor,
                ..Default::default()
            };

            let start = Instant::now();
            if kind == CostKind::AnisotropicTobler {
                let (Some(from), Some(to)) = (from, to) else {
                    anyhow::bail!("The anisotropic cost function needs --from and --to");
                };
                let Some(backward) = backward else {
                    anyhow::bail!("The anisotropic cost function needs --backward");
                };
                let (from, to) = (parse_point(&from)?, parse_point(&to)?);
                let pb = spinner("Building directional cost surfaces...");
                let costs = directional_cost_surfaces(&elevation, &water, from, to, &slope_params)
                    .context("Failed to build cost surfaces")?;
                pb.finish_and_clear();
                let elapsed = start.elapsed();
                info!("Travel azimuth: {:.2}", costs.azimuth);
                write_result(&costs.forward, &output)?;
                write_result(&costs.backward, &backward)?;
                done("Forward cost", &output, elapsed);
                done("Backward cost", &backward, elapsed);
            } else {
                if from.is_some() || to.is_some() {
                    warn!("--from/--to only apply to the anisotropic cost function");
                }
                let params = CostSurfaceParams {
                    function: kind.with_azimuth(0.0),
                    slope: slope_params,
                };
                let pb = spinner("Building cost surface...");
                let cost = build_cost(&elevation, &water, &params).context("Failed to build cost surface")?;
                pb.finish_and_clear();
                let elapsed = start.elapsed();
                write_result(&cost, &output)?;
                done("Cost surface", &output, elapsed);
            }
        }

        // ── Cumulative cost ──────────────────────────────────────────
        Commands::CumulativeCost {
            cost,
            output,
            points,
            max_distance,
        } => {
            let cost = read_raster(&cost)?;
            let points = parse_points(&points)?;
            let sources = rasterize_points(&cost, &points);
            info!("Sources: {} cells", sources.count_in());

            let start = Instant::now();
            let pb = spinner("Accumulating cost...");
            let result = cumulative_cost(&cost, &sources, CumulativeCostParams { max_distance })
                .context("Failed to compute cumulative cost")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            done("Cumulative cost", &output, elapsed);
        }

        // ── Corridor ─────────────────────────────────────────────────
        Commands::Corridor {
            cost,
            output,
            points,
            polygons,
            low_gradient,
            segments,
            rounds,
            initial_scale,
            tolerance,
            cushion,
        } => {
            let cost = read_raster(&cost)?;
            let points = parse_points(&points)?;

            let mut params = config.network;
            params.segments |= segments;
            if let Some(c) = cushion {
                params.cushion = c;
            }
            override_schedule(&mut params.corridor.schedule, rounds, initial_scale, tolerance)?;
            debug!("Schedule: {:?}", params.corridor.schedule);

            let start = Instant::now();
            let pb = spinner("Extracting corridors...");
            let network = match corridor_network(&cost, &points, &params) {
                Ok(n) => n,
                Err(e) if e.is_recoverable() => {
                    pb.finish_and_clear();
                    anyhow::bail!("{}. Retry with a larger --tolerance or a smaller --initial-scale.", e);
                }
                Err(e) => return Err(e).context("Failed to extract corridor"),
            };
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            info!("Region radius: {:.3}", network.radius);
            for leg in network.segments.iter().chain(std::iter::once(&network.complete)) {
                print_rounds(leg);
            }

            write_mask(&network.complete.corridor.mask, &output)?;
            done("Corridor", &output, elapsed);
            if let Some(path) = low_gradient {
                write_mask(&network.complete.low_gradient, &path)?;
                done("Low-gradient cells", &path, elapsed);
            }
            if let Some(path) = polygons {
                let features: FeatureCollection = network
                    .segments
                    .iter()
                    .chain(std::iter::once(&network.complete))
                    .map(leg_feature)
                    .collect();
                write_json(&features, &path)?;
                done("Corridor polygons", &path, elapsed);
            }
        }

        // ── Low gradient ─────────────────────────────────────────────
        Commands::LowGradient {
            input,
            output,
            region,
            threshold,
        } => {
            let raster = read_raster(&input)?;
            let region = match region {
                Some(path) => read_mask(&path)?,
                None => Mask::full_like(&raster),
            };
            let threshold = threshold.unwrap_or(config.network.low_gradient_threshold);

            let start = Instant::now();
            let mask = low_gradient_mask(&raster, &region, threshold).context("Failed to filter")?;
            let elapsed = start.elapsed();
            info!("Low-gradient cells: {}", mask.count_in());
            write_mask(&mask, &output)?;
            done("Low-gradient mask", &output, elapsed);
        }

        // ── Path ─────────────────────────────────────────────────────
        Commands::Path {
            field,
            output,
            dest,
            step_length,
            four,
            coarse,
            max_steps,
            source_threshold,
        } => {
            let field = read_raster(&field)?;
            let dest = parse_point(&dest)?;

            let mut params = config.trace;
            if let Some(step_length) = step_length {
                let directions = if four { Compass::Four } else { Compass::Eight };
                params.step_model = StepModel::Bearing { directions, step_length };
            }
            if let Some(n) = max_steps {
                params.max_steps = n;
            }
            if let Some(t) = source_threshold {
                params.source_threshold = t;
            }

            let start = Instant::now();
            let path = match coarse {
                Some(factor) => trace_coarse(&field, dest, factor, &params),
                None => trace(&field, dest, &params),
            }
            .context("Failed to trace path")?;
            let elapsed = start.elapsed();

            println!("Status: {}", path.status);
            println!("Steps: {}", path.steps());
            if !path.status.reached_source() {
                warn!("Path did not reach the source: {}", path.status);
            }

            let feature = Feature::new(path.to_line_string())
                .with_property("status", path.status.to_string())
                .with_property("steps", path.steps())
                .with_property("reached_source", path.status.reached_source());
            let mut value = serde_json::to_value(&feature).context("Failed to encode path")?;
            value["costs"] = serde_json::to_value(&path.costs).context("Failed to encode path")?;
            write_json(&value, &output)?;
            done("Path", &output, elapsed);
        }
    }

    Ok(())
}
