//! WrapForge CLI - Bridge interface for the web service
//!
//! Commands: profiles, canonical, fingerprint, compare, enforce, remap,
//! preflight, image, prepare, geometry
//! Outputs JSON to stdout
//! Returns 2 when a placement is rejected, 1 on invalid input

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wrapforge_core::{
    are_placements_equal, canonical_serialize, enforce_policy, fingerprint,
    geometry::{circumference_mm, mm_to_degrees},
    EngineConfig, ImageInsertRequest, PlacementDocument, PlacementPipeline, PolicyMode,
    PrepareRequest, ProfileRegistry, Zone,
};

#[derive(Parser)]
#[command(name = "wrapforge-cli")]
#[command(about = "WrapForge CLI - Placement Validation Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an engine config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to product profiles directory
    #[arg(short, long, default_value = "profiles")]
    profiles_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List available product profiles
    Profiles,

    /// Print the canonical text of a document
    Canonical {
        /// JSON payload (any document)
        #[arg(short, long)]
        payload: String,
    },

    /// Print the SHA-256 fingerprint of a document
    Fingerprint {
        /// JSON payload (any document)
        #[arg(short, long)]
        payload: String,
    },

    /// Compare two placement documents ignoring key order
    Compare {
        #[arg(long)]
        left: String,
        #[arg(long)]
        right: String,
    },

    /// Enforce a placement policy against a zone
    Enforce {
        /// JSON payload (PlacementDocument)
        #[arg(short, long)]
        payload: String,

        /// JSON zone, e.g. {"widthMm":100,"heightMm":100}
        #[arg(short, long)]
        zone: String,

        /// STRICT, CLAMP or SCALE_TO_FIT
        #[arg(short, long)]
        mode: PolicyMode,
    },

    /// Remap a document from one product zone to another
    Remap {
        #[arg(short, long)]
        payload: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Run preflight checks
    Preflight {
        /// Product profile ID
        #[arg(short = 'P', long)]
        product: String,

        /// JSON payload (PlacementDocument)
        #[arg(short, long)]
        payload: String,
    },

    /// Build the default placement for a new image
    Image {
        /// JSON payload (ImageInsertRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Parse, enforce, preflight and fingerprint in one step
    Prepare {
        /// JSON payload (PrepareRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Wrap math for a cylinder diameter
    Geometry {
        #[arg(short, long)]
        diameter: f64,

        /// Optional x position to convert to degrees
        #[arg(short, long)]
        x: Option<f64>,
    },
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn fail(code: &str, message: impl std::fmt::Display) -> ExitCode {
    print_json(&json!({"ok": false, "code": code, "error": message.to_string()}));
    ExitCode::FAILURE
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, ExitCode> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| {
                fail("CONFIG_READ_FAILED", format!("Failed to read config {}: {}", path.display(), e))
            })?;
            EngineConfig::from_json_str(&content).map_err(|e| fail(e.code(), e))?
        }
        None => EngineConfig::default(),
    };
    config
        .with_env_overrides(|key| std::env::var(key).ok())
        .map_err(|e| fail(e.code(), e))
}

fn load_profiles(dir: &Path) -> Result<ProfileRegistry, std::io::Error> {
    let mut registry = ProfileRegistry::new();
    if dir.exists() {
        let mut contents = vec![];
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                contents.push(fs::read_to_string(&path)?);
            }
        }
        registry.register_json(contents.iter().map(String::as_str));
    }
    Ok(registry)
}

fn parse_document(payload: &str) -> Result<PlacementDocument, ExitCode> {
    let raw: Value = serde_json::from_str(payload)
        .map_err(|e| fail("INVALID_PAYLOAD", format!("Invalid payload: {}", e)))?;
    wrapforge_core::parse_placement_document(&raw).map_err(|e| fail(e.code(), e))
}

fn parse_json<T: serde::de::DeserializeOwned>(payload: &str) -> Result<T, ExitCode> {
    serde_json::from_str(payload).map_err(|e| fail("INVALID_PAYLOAD", format!("Invalid payload: {}", e)))
}

fn run(cli: Cli) -> Result<ExitCode, ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let registry = load_profiles(&cli.profiles_dir)
        .map_err(|e| fail("PROFILE_LOAD_FAILED", format!("Failed to load profiles: {}", e)))?;
    let precision = config.rounding_precision_mm;
    let pipeline = PlacementPipeline::new(config, registry);

    match cli.command {
        Commands::Profiles => {
            print_json(&pipeline.list_profiles());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Canonical { payload } => {
            let raw: Value = parse_json(&payload)?;
            let canonical = canonical_serialize(&raw, precision).map_err(|e| fail(e.code(), e))?;
            println!("{}", canonical);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Fingerprint { payload } => {
            let raw: Value = parse_json(&payload)?;
            let hash = fingerprint(&raw, precision).map_err(|e| fail(e.code(), e))?;
            print_json(&json!({"fingerprint": hash}));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Compare { left, right } => {
            let left: Value = parse_json(&left)?;
            let right: Value = parse_json(&right)?;
            let equal = are_placements_equal(&left, &right).map_err(|e| fail(e.code(), e))?;
            print_json(&json!({"equal": equal}));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Enforce { payload, zone, mode } => {
            let document = parse_document(&payload)?;
            let zone: Zone = parse_json(&zone)?;
            let result = enforce_policy(&document, &zone, mode);
            print_json(&result);
            Ok(if result.ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }

        Commands::Remap { payload, from, to } => {
            let document = parse_document(&payload)?;
            let result = pipeline.remap(&from, &to, &document).map_err(|e| fail(e.code(), e))?;
            print_json(&result);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Preflight { product, payload } => {
            let document = parse_document(&payload)?;
            let result = pipeline.preflight(&product, &document).map_err(|e| fail(e.code(), e))?;
            print_json(&result);
            Ok(if result.ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }

        Commands::Image { payload } => {
            let request: ImageInsertRequest = parse_json(&payload)?;
            let object = pipeline.insert_image(&request).map_err(|e| fail(e.code(), e))?;
            print_json(&object);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Prepare { payload } => {
            let request: PrepareRequest = parse_json(&payload)?;
            let prepared = pipeline.prepare(&request).map_err(|e| fail(e.code(), e))?;
            let ok = prepared.ok();
            print_json(&json!({"success": ok, "placement": prepared}));
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }

        Commands::Geometry { diameter, x } => {
            let wrap_width = circumference_mm(diameter);
            let mut output = json!({
                "diameterMm": diameter,
                "circumferenceMm": wrap_width,
                "wrapWidthMm": wrap_width,
            });
            if let Some(x) = x {
                output["degrees"] = json!(mm_to_degrees(x, wrap_width));
            }
            print_json(&output);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(code) | Err(code) => code,
    }
}
