//! ladder - batch CAD to mesh import
//!
//! Subcommands:
//! - `import`: convert CAD files and write the resulting scene as OBJ
//! - `info`: print what the engine sees in one CAD file
//! - `status`: report whether gmsh is usable
//! - `install`: install gmsh through the configured installer

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ladder_common::config::TomlConfig;
use ladder_common::{MeshAlgorithm, MeshQuality, SourceUnit};
use ladder_import::models::{ImportOptions, OriginMode};
use ladder_import::pipeline::{drive, TICK_INTERVAL};
use ladder_import::{ImportPipeline, MemoryScene, MeshBackend};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ladder
#[derive(Parser, Debug)]
#[command(name = "ladder")]
#[command(about = "Convert CAD files (STEP, IGES, BREP) to meshes with gmsh")]
#[command(version)]
struct Cli {
    /// Configuration file (overrides LADDER_CONFIG and the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import CAD files and export the scene
    Import(ImportArgs),

    /// Show entity counts, bounds, estimated unit and part names as JSON
    Info {
        /// CAD file to inspect
        path: PathBuf,
    },

    /// Show gmsh availability and version
    Status,

    /// Install gmsh
    Install,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// CAD files or directories to import
    #[arg(required = true, value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Scene file to write (Wavefront OBJ)
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Mesh quality preset (very-coarse, coarse, normal, fine, very-fine, custom)
    #[arg(long)]
    quality: Option<MeshQuality>,

    /// Minimum element size for custom quality
    #[arg(long)]
    mesh_size_min: Option<f64>,

    /// Maximum element size for custom quality
    #[arg(long)]
    mesh_size_max: Option<f64>,

    /// Meshing algorithm (id or name)
    #[arg(long, default_value = "automatic")]
    algorithm: MeshAlgorithm,

    /// Run the mesh optimization passes
    #[arg(long)]
    optimize: bool,

    /// Repair small geometry defects before meshing
    #[arg(long)]
    heal: bool,

    /// Unit of the source file (auto, mm, cm, m, in, ft, um)
    #[arg(long)]
    source_unit: Option<SourceUnit>,

    /// Extra uniform scale
    #[arg(long)]
    scale: Option<f64>,

    /// Put imported objects in a collection, optionally named
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    collection: Option<Option<String>>,

    /// Name objects after the parts found in the file
    #[arg(long)]
    part_names: bool,

    /// Smooth shading
    #[arg(long)]
    smooth: bool,

    /// Make normals consistent and outward
    #[arg(long)]
    recalc_normals: bool,

    /// Merge vertices closer than this distance (0 disables)
    #[arg(long, default_value_t = 0.0)]
    merge_distance: f64,

    /// Bake rotation and scale into the mesh
    #[arg(long)]
    apply_transform: bool,

    /// Origin placement (none, geometry, bounds, cursor, world)
    #[arg(long, default_value = "none")]
    origin: OriginMode,
}

impl ImportArgs {
    /// Configured defaults overridden by explicit flags
    fn to_options(&self, config: &TomlConfig) -> ImportOptions {
        let mut options = ImportOptions::from_defaults(&config.defaults);
        if let Some(quality) = self.quality {
            options.mesh_quality = quality;
        }
        if let Some(min) = self.mesh_size_min {
            options.mesh_size_min = min;
        }
        if let Some(max) = self.mesh_size_max {
            options.mesh_size_max = max;
        }
        options.algorithm = self.algorithm;
        options.optimize_mesh = self.optimize;
        options.healing = self.heal;
        if let Some(unit) = self.source_unit {
            options.source_unit = unit;
        }
        if let Some(scale) = self.scale {
            options.global_scale = scale;
        }
        if let Some(name) = &self.collection {
            options.import_to_collection = true;
            options.collection_name = name.clone();
        }
        options.use_part_names = self.part_names;
        options.smooth_shading |= self.smooth;
        options.recalc_normals = self.recalc_normals;
        options.merge_distance = self.merge_distance;
        options.apply_transform = self.apply_transform;
        options.set_origin = self.origin;
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // The log level lives in the config, so a load failure is reported
    // once the subscriber is installed
    let (config, config_error) = match TomlConfig::try_load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (TomlConfig::default(), Some(e)),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(e) = config_error {
        warn!("Ignoring config file, using defaults: {}", e);
    }

    let mut backend = MeshBackend::from_config(&config.backend);

    match cli.command {
        Command::Import(args) => run_import(args, &config, backend).await,
        Command::Info { path } => {
            if !backend.is_available() {
                bail!("gmsh is not installed. Run `ladder install` first.");
            }
            let info = backend.get_model_info(&path);
            println!("{}", serde_json::to_string_pretty(&info)?);
            if !info.valid {
                bail!("Could not read {}", path.display());
            }
            Ok(())
        }
        Command::Status => {
            let available = backend.is_available();
            println!("gmsh: {}", backend.version());
            println!("binary: {}", backend.engine().binary());
            println!("available: {}", if available { "yes" } else { "no" });
            Ok(())
        }
        Command::Install => {
            let outcome = backend.install().await;
            println!("{}", outcome.message);
            if !outcome.success {
                bail!("Installation failed");
            }
            Ok(())
        }
    }
}

async fn run_import(
    args: ImportArgs,
    config: &TomlConfig,
    backend: MeshBackend<ladder_import::GmshCli>,
) -> Result<()> {
    let options = args.to_options(config);
    let mut pipeline = ImportPipeline::new(backend, MemoryScene::new());

    let total = pipeline.start(&args.paths, options)?;
    info!("Importing {} file(s)", total);

    let token = pipeline.cancel_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Cancelling after the current file...");
            token.cancel();
        }
    });

    let Some(report) = drive(&mut pipeline, TICK_INTERVAL).await else {
        bail!("No import was running");
    };

    for warning in &report.warnings {
        eprintln!("warning: {}", warning.message());
    }
    println!("{}", report.message);

    if report.is_cancelled() {
        bail!("Import cancelled");
    }

    pipeline
        .scene()
        .export_obj(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Scene written to {}", args.output.display());
    Ok(())
}
