use anyhow::Context;
use clap::{Parser, Subcommand};
use icroute_common::db::core::Layout;
use icroute_common::db::drc::{DrcRule, RuleTable};
use icroute_common::db::route::RouteResult;
use icroute_common::util::config::Config;
use icroute_common::util::generator::{self, GeneratorParams};
use icroute_common::util::{check, logger, visualization};
use icroute_router::Router;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one layout, or several in parallel.
    Route {
        /// Layout JSON files. Defaults to `input.layout` from the config.
        layouts: Vec<PathBuf>,
    },
    /// Write a random benchmark layout.
    Generate {
        #[arg(long, default_value_t = 40)]
        cells: usize,
        #[arg(long, default_value_t = 30)]
        nets: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long, default_value = "inputs/layout.json")]
        output: PathBuf,
    },
    /// Verify a routing result against its layout.
    Check { layout: PathBuf, result: PathBuf },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .with_context(|| format!("Failed to read config file {:?}", args.config))?;
        toml::from_str(&config_str).context("Failed to parse config TOML")?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Route {
        layouts: Vec::new(),
    });

    match command {
        Commands::Generate {
            cells,
            nets,
            seed,
            output,
        } => {
            let params = GeneratorParams {
                cells,
                nets,
                pitch: config.routing.grid_size,
                ..Default::default()
            };
            let layout = generator::generate_random_layout(&params, seed);
            prepare_output_dir(&output)?;
            write_json(&output, &layout)?;
            log::info!(
                "Generated {:?}: {} cells, {} nets",
                output,
                layout.cells.len(),
                layout.nets.len()
            );
        }
        Commands::Route { layouts } => {
            let layouts = if layouts.is_empty() {
                vec![PathBuf::from(&config.input.layout)]
            } else {
                layouts
            };
            if run_routing(&config, &layouts).is_err() {
                std::process::exit(1);
            }
        }
        Commands::Check { layout, result } => {
            let layout: Layout = read_json(&layout)?;
            let result: RouteResult = read_json(&result)?;
            if check::verify_routes(&layout, &result, &config.routing).is_err() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn run_routing(config: &Config, paths: &[PathBuf]) -> anyhow::Result<()> {
    let rules = load_rules(config)?;
    let layouts = paths
        .iter()
        .map(|p| read_json::<Layout>(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let results = if let [layout] = layouts.as_slice() {
        let router = Router::new(config.routing.clone())?.with_rules(rules);
        vec![router.route(layout)?]
    } else {
        icroute_router::route_many(&layouts, &config.routing, &rules)?
    };

    let mut failed = false;
    for ((path, layout), result) in paths.iter().zip(&layouts).zip(&results) {
        let output = result_path(config, path, paths.len());
        prepare_output_dir(&output)?;
        log::info!("Writing routes to {:?}", output);
        write_json(&output, result)?;

        if let Some(image) = &config.output.image {
            let image = image_path(image, path, paths.len());
            log::info!("Generating routed visualization {:?}...", image);
            prepare_output_dir(&image)?;
            visualization::draw_routed_layout(
                layout,
                result,
                &config.routing.layers,
                &image.to_string_lossy(),
                config.output.image_size,
                config.output.image_size,
            )
            .with_context(|| format!("Failed to write {:?}", image))?;
        }

        if let Err(e) = check::verify_routes(layout, result, &config.routing) {
            log::error!("Verification failed for {:?}: {}", path, e);
            failed = true;
        }
        if !result.is_complete() {
            log::warn!(
                "{:?}: {} of {} nets could not be routed",
                path,
                result.errors.len(),
                layout.nets.len()
            );
        }
    }

    if failed {
        return Err(anyhow::anyhow!("route verification failed"));
    }
    Ok(())
}

fn load_rules(config: &Config) -> anyhow::Result<Vec<DrcRule>> {
    let Some(file) = &config.input.rules else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read rule file '{}'", file))?;
    let table: RuleTable =
        toml::from_str(&text).with_context(|| format!("Invalid rule TOML in '{}'", file))?;
    log::info!("Loaded {} DRC rules from {}", table.rules.len(), file);
    Ok(table.rules)
}

/// With several layouts each result is named after its layout, beside the configured file.
fn result_path(config: &Config, layout: &Path, count: usize) -> PathBuf {
    let configured = PathBuf::from(&config.output.result);
    if count == 1 {
        return configured;
    }
    sibling_named_after(&configured, layout, "routes.json")
}

fn image_path(configured: &str, layout: &Path, count: usize) -> PathBuf {
    let configured = PathBuf::from(configured);
    if count == 1 {
        return configured;
    }
    sibling_named_after(&configured, layout, "png")
}

fn sibling_named_after(configured: &Path, layout: &Path, suffix: &str) -> PathBuf {
    let stem = layout
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layout".to_string());
    let parent = configured.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}.{}", stem, suffix))
}

fn prepare_output_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))
}
