//! GeoHaz CLI - geologic hazard derivative tools

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use geohaz_core::io::{read_geojson, read_geotiff};
use geohaz_core::{FeatureCollection, Raster};
use geohaz_hazard::tiling::{CountyFilter, TilingConfig, MILE};
use geohaz_hazard::tools::{self, ROCKFALL_THRESHOLD};
use geohaz_hazard::workspace::dataset_stem;
use geohaz_hazard::{
    classify_units, distinct_units, tile_quadrangles, FormationOutcome, HazardCategory, LandslideConfig, NativeEngine,
    OutputWorkspace, PipelineConfig, QuadOutcome, RuleCatalog, WorkspaceConfig, DEFAULT_UNIT_FIELD,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "geohaz")]
#[command(author, version, about = "Geologic hazard derivative tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory receiving outputs
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Directory receiving intermediate rasters and per-formation batches
    #[arg(long, global = true)]
    scratch: Option<PathBuf>,

    /// Replace existing outputs
    #[arg(long, global = true)]
    overwrite: bool,

    /// JSON rule catalog replacing the built-in unit rules
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster or vector file
    Info {
        /// Input GeoTIFF or GeoJSON file
        input: PathBuf,
    },
    /// Print the unit rule catalog as JSON
    Rules,
    /// List the hazard units of a geology map
    Classify {
        /// Geology GeoJSON file
        geology: PathBuf,
        /// Formation code attribute
        #[arg(short, long, default_value = DEFAULT_UNIT_FIELD)]
        field: String,
    },
    /// Rockfall hazard: slopes steeper than 30 degrees
    Rockfall {
        /// Input DEM file
        dem: PathBuf,
        /// Output base name (defaults to the DEM name)
        #[arg(short, long)]
        output: Option<String>,
        /// Minimum polygon area kept, in CRS units squared
        #[arg(long, default_value = "1000")]
        min_area: f64,
        /// Douglas-Peucker tolerance for polygon boundaries
        #[arg(long, default_value = "0")]
        simplify: f64,
    },
    /// Export problematic rock and soil units
    Soils {
        /// Geology GeoJSON file
        geology: PathBuf,
        /// Formation code attribute
        #[arg(short, long, default_value = DEFAULT_UNIT_FIELD)]
        field: String,
        /// Rock output name
        #[arg(long)]
        rock_output: Option<String>,
        /// Soil output name
        #[arg(long)]
        soil_output: Option<String>,
    },
    /// Export landslide deposit units
    LandslideUnits {
        /// Geology GeoJSON file
        geology: PathBuf,
        /// Formation code attribute
        #[arg(short, long, default_value = DEFAULT_UNIT_FIELD)]
        field: String,
        /// Output name
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Landslide slope hazard per formation
    Landslide {
        /// Input DEM file
        dem: PathBuf,
        /// Geology GeoJSON file
        geology: PathBuf,
        /// JSON formation profile (defaults to the Summit County profile)
        #[arg(short, long)]
        profile: Option<PathBuf>,
        /// Minimum polygon area kept, in CRS units squared
        #[arg(long, default_value = "1000")]
        min_area: f64,
        /// Write the per-formation report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Clip a LiDAR DEM by quadrangle and derive terrain products
    Tile {
        /// LiDAR DEM file
        lidar: PathBuf,
        /// Quadrangle index GeoJSON file
        quads: PathBuf,
        /// County boundary GeoJSON file
        county: PathBuf,
        /// County attribute used to select the county polygon
        #[arg(long, requires = "county_value")]
        county_field: Option<String>,
        /// Value of the county attribute to select
        #[arg(long, requires = "county_field")]
        county_value: Option<String>,
        /// Buffer around each quadrangle, in CRS units
        #[arg(short, long, default_value_t = MILE)]
        buffer: f64,
        /// Contour interval
        #[arg(short, long, default_value = "100")]
        interval: f64,
        /// Quadrangle name attribute
        #[arg(long, default_value = "quad_name")]
        name_field: String,
        /// Write the per-quadrangle report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_features(path: &Path) -> Result<FeatureCollection> {
    let pb = spinner("Reading features...");
    let features =
        read_geojson(path).with_context(|| format!("Failed to read features {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} features", features.len());
    Ok(features)
}

fn open_workspace(cli: &Cli) -> Result<OutputWorkspace> {
    let config = WorkspaceConfig {
        root: cli.workspace.clone(),
        scratch: cli.scratch.clone(),
        overwrite: cli.overwrite,
    };
    OutputWorkspace::open(config)
        .with_context(|| format!("Failed to open workspace {}", cli.workspace.display()))
}

fn load_catalog(path: Option<&Path>) -> Result<RuleCatalog> {
    match path {
        Some(path) => RuleCatalog::load(path)
            .with_context(|| format!("Failed to load rule catalog {}", path.display())),
        None => Ok(RuleCatalog::builtin()),
    }
}

fn write_report<T: serde::Serialize>(report: &T, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, text).with_context(|| format!("Failed to write report {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_units(category: HazardCategory, units: &[String]) {
    if units.is_empty() {
        println!("{:>10}: (none)", category);
    } else {
        println!("{:>10}: {}", category, units.join(", "));
    }
}

fn raster_info(input: &Path) -> Result<()> {
    let raster = read_dem(input)?;
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
    Ok(())
}

fn vector_info(input: &Path) -> Result<()> {
    let features = read_features(input)?;
    println!("File: {}", input.display());
    println!("Features: {}", features.len());
    if let Some(crs) = &features.crs {
        println!("CRS: {}", crs);
    }
    println!("Fields: {}", features.fields.join(", "));
    Ok(())
}

fn is_vector(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("geojson") || e.eq_ignore_ascii_case("json"))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let engine = NativeEngine::new();

    match &cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            if is_vector(input) {
                vector_info(input)?;
            } else {
                raster_info(input)?;
            }
        }

        Commands::Rules => {
            let catalog = load_catalog(cli.rules.as_deref())?;
            println!("{}", catalog.to_json_string().context("Failed to serialize catalog")?);
        }

        // ── Unit classification ──────────────────────────────────────
        Commands::Classify { geology, field } => {
            let catalog = load_catalog(cli.rules.as_deref())?;
            let features = read_features(geology)?;
            let codes = distinct_units(&features, field).context("Failed to read formation codes")?;
            let result = classify_units(&codes, &catalog);

            println!("{} distinct units in {}", codes.len(), geology.display());
            for category in HazardCategory::ALL {
                print_units(category, result.get(category));
            }
        }

        Commands::Soils {
            geology,
            field,
            rock_output,
            soil_output,
        } => {
            let catalog = load_catalog(cli.rules.as_deref())?;
            let workspace = open_workspace(&cli)?;
            let features = read_features(geology)?;
            let dataset = dataset_stem(geology);
            let rock_name = rock_output.clone().unwrap_or_else(|| format!("{dataset}_rock"));
            let soil_name = soil_output.clone().unwrap_or_else(|| format!("{dataset}_soil"));

            let start = Instant::now();
            let out = tools::problematic_soils(
                &features, &dataset, field, &catalog, &rock_name, &soil_name, &workspace,
            )
            .context("Failed to export problematic units")?;
            let elapsed = start.elapsed();

            print_units(HazardCategory::Rock, &out.rock.units);
            print_units(HazardCategory::Soil, &out.soil.units);
            done("Problematic rock", &out.rock.path, elapsed);
            done("Problematic soil", &out.soil.path, elapsed);
        }

        Commands::LandslideUnits {
            geology,
            field,
            output,
        } => {
            let catalog = load_catalog(cli.rules.as_deref())?;
            let workspace = open_workspace(&cli)?;
            let features = read_features(geology)?;
            let dataset = dataset_stem(geology);
            let out_name = output.clone().unwrap_or_else(|| format!("{dataset}_landslides"));

            let start = Instant::now();
            let out = tools::landslide_units(&features, &dataset, field, &catalog, &out_name, &workspace)
                .context("Failed to export landslide units")?;
            print_units(HazardCategory::Landslide, &out.units);
            done("Landslide units", &out.path, start.elapsed());
        }

        // ── Slope hazards ────────────────────────────────────────────
        Commands::Rockfall {
            dem,
            output,
            min_area,
            simplify,
        } => {
            let workspace = open_workspace(&cli)?;
            let raster = read_dem(dem)?;
            let dem_name = dataset_stem(dem);
            let out_name = output.clone().unwrap_or_else(|| dem_name.clone());
            let config = PipelineConfig {
                min_area: *min_area,
                simplify_tolerance: *simplify,
                ..Default::default()
            };

            let pb = spinner(&format!("Mapping slopes above {ROCKFALL_THRESHOLD} degrees..."));
            let start = Instant::now();
            let out = tools::rockfall(&engine, &raster, &dem_name, &out_name, &workspace, &config);
            pb.finish_and_clear();
            let out = out.context("Failed to compute rockfall hazard")?;

            println!("{} rockfall hazard polygons", out.hazard_count);
            done("Rockfall hazard", &out.hazards, start.elapsed());
        }

        Commands::Landslide {
            dem,
            geology,
            profile,
            min_area,
            report,
        } => {
            let catalog = load_catalog(cli.rules.as_deref())?;
            let config = match profile {
                Some(path) => LandslideConfig::load(path)
                    .with_context(|| format!("Failed to load formation profile {}", path.display()))?,
                None => LandslideConfig::summit_county(),
            };
            let workspace = open_workspace(&cli)?;
            let raster = read_dem(dem)?;
            let features = read_features(geology)?;
            let pipeline = PipelineConfig {
                min_area: *min_area,
                ..Default::default()
            };

            let pb = spinner("Mapping landslide hazard...");
            let start = Instant::now();
            let out = tools::landslide(
                &engine,
                &raster,
                &dataset_stem(dem),
                &features,
                &catalog,
                &config,
                &pipeline,
                &workspace,
            );
            pb.finish_and_clear();
            let out = out.context("Failed to compute landslide hazard")?;

            for formation in &out.report.formations {
                match &formation.outcome {
                    FormationOutcome::Mapped { polygons } => {
                        println!("  {} ({} deg): {} polygons", formation.code, formation.threshold, polygons)
                    }
                    FormationOutcome::NotPresent => println!("  {}: not present", formation.code),
                    FormationOutcome::Failed { error } => println!("  {}: FAILED ({})", formation.code, error),
                }
            }
            if let Some(path) = report {
                write_report(&out.report, path)?;
            }
            done("Landslide hazard", &out.path, start.elapsed());
        }

        // ── LiDAR tiling ─────────────────────────────────────────────
        Commands::Tile {
            lidar,
            quads,
            county,
            county_field,
            county_value,
            buffer,
            interval,
            name_field,
            report,
        } => {
            let workspace = open_workspace(&cli)?;
            let raster = read_dem(lidar)?;
            let quad_index = read_features(quads)?;
            let county_layer = read_features(county)?;
            let config = TilingConfig {
                buffer_distance: *buffer,
                contour_interval: *interval,
                name_field: name_field.clone(),
                county: county_field.clone().zip(county_value.clone()).map(|(field, value)| CountyFilter { field, value }),
            };

            let pb = spinner("Tiling quadrangles...");
            let start = Instant::now();
            let out = tile_quadrangles(&engine, &raster, &quad_index, &county_layer, &workspace, &config);
            pb.finish_and_clear();
            let out = out.context("Failed to tile LiDAR DEM")?;

            for quad in &out.quads {
                match &quad.outcome {
                    QuadOutcome::Tiled { artifacts } => println!("  {}: {} products", quad.name, artifacts.len()),
                    QuadOutcome::Failed { error } => {
                        warn!("{} was not tiled", quad.name);
                        println!("  {}: FAILED ({})", quad.name, error)
                    }
                }
            }
            if let Some(path) = report {
                write_report(&out, path)?;
            }
            println!("{} of {} quadrangles tiled", out.tiled(), out.quads.len());
            done("Tiles", workspace.root(), start.elapsed());
        }
    }

    Ok(())
}
