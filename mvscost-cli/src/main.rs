use clap::Parser;
use mvscost::io::load_image;
use mvscost::{
    compute_cost_map_par, resolve_load_type, CostStats, DescriptorDistance, Homography, Metric,
    MetricContext, MetricKind, Parameters,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-view stereo matching cost CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DistanceConfig {
    L1,
    L2,
}

impl From<DistanceConfig> for DescriptorDistance {
    fn from(value: DistanceConfig) -> Self {
        match value {
            DistanceConfig::L1 => DescriptorDistance::L1,
            DistanceConfig::L2 => DescriptorDistance::L2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ParamsJson {
    metric: String,
    half_window: usize,
    step: usize,
    sigma_color: f64,
    sigma_spatial: f64,
    min_variance: f64,
    alpha: f64,
    tau_intensity: f64,
    tau_gradient: f64,
    gamma: f64,
    descriptor_distance: DistanceConfig,
    normalize_census: bool,
}

impl Default for ParamsJson {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            metric: p.metric.name().to_string(),
            half_window: p.half_window,
            step: p.step,
            sigma_color: p.sigma_color,
            sigma_spatial: p.sigma_spatial,
            min_variance: p.min_variance,
            alpha: p.alpha,
            tau_intensity: p.tau_intensity,
            tau_gradient: p.tau_gradient,
            gamma: p.gamma,
            descriptor_distance: DistanceConfig::L2,
            normalize_census: p.normalize_census,
        }
    }
}

impl ParamsJson {
    fn into_parameters(self) -> Result<Parameters, mvscost::CostError> {
        let metric: MetricKind = self.metric.parse()?;
        Ok(Parameters {
            metric,
            half_window: self.half_window,
            step: self.step,
            sigma_color: self.sigma_color,
            sigma_spatial: self.sigma_spatial,
            min_variance: self.min_variance,
            alpha: self.alpha,
            tau_intensity: self.tau_intensity,
            tau_gradient: self.tau_gradient,
            gamma: self.gamma,
            descriptor_distance: self.descriptor_distance.into(),
            normalize_census: self.normalize_census,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    reference_path: String,
    target_path: String,
    output_path: Option<String>,
    /// Row-major reference-to-target homography applied to every pixel.
    homography: [[f64; 3]; 3],
    params: ParamsJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_path: String::new(),
            target_path: String::new(),
            output_path: None,
            homography: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            params: ParamsJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsRecord {
    valid: usize,
    min: f64,
    max: f64,
    mean: f64,
}

impl From<CostStats> for StatsRecord {
    fn from(value: CostStats) -> Self {
        Self {
            valid: value.valid,
            min: value.min,
            max: value.max,
            mean: value.mean,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    metric: &'static str,
    width: usize,
    height: usize,
    pixels: usize,
    stats: Option<StatsRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("mvscost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.reference_path.is_empty() || config.target_path.is_empty() {
        return Err("reference_path and target_path must be set in the config".into());
    }

    let params = config.params.into_parameters()?;
    let load = resolve_load_type(params.metric);
    let reference = load_image(&config.reference_path, load)?;
    let target = load_image(&config.target_path, load)?;

    let h = config.homography;
    let homography = Homography::new(
        h[0][0], h[0][1], h[0][2], h[1][0], h[1][1], h[1][2], h[2][0], h[2][1], h[2][2],
    );

    let ctx = MetricContext::new();
    let metric = Metric::new(&reference, &target, &params, &ctx)?;
    let map = compute_cost_map_par(&metric, reference.width(), reference.height(), |_, _| {
        homography
    });
    info!(
        metric = params.metric.name(),
        width = map.width(),
        height = map.height(),
        "cost map computed"
    );

    let output = Output {
        metric: params.metric.name(),
        width: map.width(),
        height: map.height(),
        pixels: map.as_slice().len(),
        stats: map.stats().map(StatsRecord::from),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
