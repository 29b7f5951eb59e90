use anyhow::{Context, Result, bail};
use clap::Parser;
use rca_agents::AgentRegistry;
use rca_api::MemoizedClient;
use rca_cache::{CacheStore, DiskCache, MemoryCache};
use rca_config::AppConfig;
use rca_core::Mode;
use rca_runner::{Recipe, RecipeContext, RecipeExecutor, RecipeRegistry, ResultsWriter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod logging;

use cli::{Cli, Commands, ConfigCommands};

struct RunOptions {
    recipe: String,
    mode: Mode,
    inputs: Vec<PathBuf>,
    args: Option<String>,
    concurrency: Option<usize>,
    keep_going: bool,
    output_file: Option<PathBuf>,
    json_out: Option<PathBuf>,
    no_cache: bool,
    verbose: bool,
    geolocation: Option<String>,
    ip: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (verbose, trace_dir) = match &cli.command {
        Commands::Run {
            verbose,
            mode,
            trace_dir,
            ..
        } => (*verbose || *mode == Mode::Human, trace_dir.clone()),
        _ => (false, None),
    };
    // Held until exit so the file writer flushes.
    let _log_guard = logging::init(verbose, trace_dir.as_deref())?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            recipe,
            mode,
            inputs,
            args,
            concurrency,
            keep_going,
            output_file,
            json_out,
            no_cache,
            trace_dir: _,
            verbose: _,
            geolocation,
            ip,
        } => {
            run_recipe(
                &config,
                RunOptions {
                    recipe,
                    mode,
                    inputs,
                    args,
                    concurrency,
                    keep_going,
                    output_file,
                    json_out,
                    no_cache,
                    verbose,
                    geolocation,
                    ip,
                },
            )
            .await
        }
        Commands::Recipes => {
            for entry in RecipeRegistry::builtin().entries() {
                println!("{:<20} {}", entry.name, entry.description);
            }
            Ok(())
        }
        Commands::Config { cmd } => handle_config(cmd, &config, cli.config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => AppConfig::load(),
    }
}

fn parse_args(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("--args must be valid JSON")?;
    if !value.is_object() {
        bail!("--args must be a JSON object, got: {raw}");
    }
    Ok(value)
}

fn open_cache(config: &AppConfig, no_cache: bool) -> Result<Arc<dyn CacheStore>> {
    if no_cache || !config.cache.enabled {
        tracing::debug!("response cache disabled; using in-memory store");
        return Ok(Arc::new(MemoryCache::new()));
    }
    Ok(Arc::new(DiskCache::open(config.cache.resolved_dir())?))
}

async fn run_recipe(config: &AppConfig, opts: RunOptions) -> Result<()> {
    let args = parse_args(opts.args.as_deref())?;
    let recipe: Arc<dyn Recipe> = Arc::from(RecipeRegistry::builtin().build(&opts.recipe, opts.mode)?);

    let cache = open_cache(config, opts.no_cache)?;
    let client = Arc::new(MemoizedClient::from_config(config, cache));
    let agents = AgentRegistry::new(client).with_location(opts.geolocation, opts.ip);
    let ctx = RecipeContext::new(agents).with_verbose(opts.verbose);

    tracing::info!(recipe = recipe.name(), mode = %opts.mode, "starting recipe");
    let results = RecipeExecutor::new(Arc::clone(&recipe), ctx)
        .with_inputs(opts.inputs)
        .with_machine_concurrency(opts.concurrency.unwrap_or(config.runner.machine_concurrency))
        .with_keep_going(opts.keep_going)
        .run(&args)
        .await?;

    let writer = ResultsWriter::new(recipe.as_ref(), &results);
    writer.print(opts.output_file.as_deref())?;
    if let Some(path) = &opts.json_out {
        writer.write_json(path)?;
    }

    if !results.failures().is_empty() {
        bail!(
            "{} of {} document(s) failed",
            results.failures().len(),
            results.failures().len() + results.len()
        );
    }
    Ok(())
}

fn handle_config(cmd: ConfigCommands, config: &AppConfig, explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(AppConfig::config_path)
        .context("Cannot determine config directory")?;
    match cmd {
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if shown.service.api_key.is_some() {
                shown.service.api_key = Some("<redacted>".to_string());
            }
            print!("{}", toml::to_string_pretty(&shown).context("Failed to render config")?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init => {
            if path.exists() {
                bail!("Config already exists: {}", path.display());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, AppConfig::default_template())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
    }
    Ok(())
}
