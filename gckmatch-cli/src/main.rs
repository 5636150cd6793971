use clap::Parser;
use gckmatch::image::io::{load_gray_image, save_gray_image};
use gckmatch::{
    change_map, reconstruct, BuildConfig, ChangeStats, CoordinateMap, DescriptorSet,
    DescriptorSpec, GckConfig, KdTree, MatchConfig, Matcher, ReconstructMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "GckMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TransformConfigJson {
    kernel_size: usize,
    bases: usize,
}

impl Default for TransformConfigJson {
    fn default() -> Self {
        let cfg = GckConfig::default();
        Self {
            kernel_size: cfg.kernel_size,
            bases: cfg.bases,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BuildConfigJson {
    leaf_cap: usize,
    max_depth: usize,
}

impl Default for BuildConfigJson {
    fn default() -> Self {
        let cfg = BuildConfig::default();
        Self {
            leaf_cap: cfg.leaf_cap,
            max_depth: cfg.max_depth,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    coherence: bool,
    hops: bool,
    parallel: bool,
    /// Query grid spacing; `0` selects one query per kernel-sized block.
    stride: usize,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            coherence: cfg.coherence,
            hops: cfg.hops,
            parallel: cfg.parallel,
            stride: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReconstructModeConfig {
    Pixel,
    #[default]
    Block,
    Blend,
}

impl From<ReconstructModeConfig> for ReconstructMode {
    fn from(value: ReconstructModeConfig) -> Self {
        match value {
            ReconstructModeConfig::Pixel => ReconstructMode::Pixel,
            ReconstructModeConfig::Block => ReconstructMode::Block,
            ReconstructModeConfig::Blend => ReconstructMode::Blend,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReconstructConfigJson {
    mode: ReconstructModeConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    reference_path: String,
    query_path: String,
    output_path: Option<String>,
    reconstruction_path: Option<String>,
    diff_path: Option<String>,
    include_map: bool,
    transform: TransformConfigJson,
    build: BuildConfigJson,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
    reconstruct: ReconstructConfigJson,
}

#[derive(Debug, Serialize)]
struct ChangeRecord {
    sum: u64,
    mean: f64,
    max: u8,
}

impl From<ChangeStats> for ChangeRecord {
    fn from(value: ChangeStats) -> Self {
        Self {
            sum: value.sum,
            mean: value.mean,
            max: value.max,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    grid_width: usize,
    grid_height: usize,
    step: usize,
    mean_score: f64,
    improved: usize,
    change: ChangeRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    packed_map: Option<Vec<u32>>,
}

fn summarize(
    map: &CoordinateMap,
    stats: ChangeStats,
    include_map: bool,
) -> Result<Output, Box<dyn std::error::Error>> {
    Ok(Output {
        grid_width: map.width(),
        grid_height: map.height(),
        step: map.step(),
        mean_score: map.mean_score(),
        improved: map.improved_count(),
        change: stats.into(),
        packed_map: if include_map { Some(map.packed()?) } else { None },
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("gckmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.reference_path.is_empty() || config.query_path.is_empty() {
        return Err("reference_path and query_path must be set in the config".into());
    }

    let reference = load_gray_image(&config.reference_path)?;
    let query = load_gray_image(&config.query_path)?;
    tracing::info!(
        reference_width = reference.width(),
        reference_height = reference.height(),
        query_width = query.width(),
        query_height = query.height(),
        "images loaded"
    );

    let kernel = config.transform.kernel_size;
    let spec = DescriptorSpec::single(kernel, config.transform.bases);
    let ref_set = DescriptorSet::extract(&[reference.view()], &spec)?;
    let tree = KdTree::build(
        ref_set,
        BuildConfig {
            leaf_cap: config.build.leaf_cap,
            max_depth: config.build.max_depth,
        },
    )?;

    let matcher = Matcher::new(tree).with_config(MatchConfig {
        coherence: config.match_cfg.coherence,
        hops: config.match_cfg.hops,
        parallel: config.match_cfg.parallel,
    });
    let stride = match config.match_cfg.stride {
        0 => kernel,
        s => s,
    };
    let map = matcher.match_image(&[query.view()], &spec, stride)?;

    let recon = reconstruct(
        reference.view(),
        &map,
        kernel,
        config.reconstruct.mode.into(),
        query.width(),
        query.height(),
    )?;
    let diff = change_map(query.view(), recon.view())?;
    if let Some(path) = &config.reconstruction_path {
        save_gray_image(path, &recon)?;
    }
    if let Some(path) = &config.diff_path {
        save_gray_image(path, &diff)?;
    }

    let output = summarize(&map, ChangeStats::from_diff(&diff), config.include_map)?;
    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
