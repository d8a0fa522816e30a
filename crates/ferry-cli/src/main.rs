//! Ferry - share source items between projects
//!
//! Usage:
//!   ferry build                 # Write ferry-manifest.json for this registry
//!   ferry add utils/math ...    # Install items into this project

mod interactive;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ferry_core::build::ManifestBuilder;
use ferry_core::config::{CONFIG_FILE, FerryConfig, parse_ferry_toml};
use ferry_core::language::Languages;
use ferry_core::manifest::MANIFEST_FILE;
use ferry_core::provider::{Providers, default_client};
use ferry_core::registry::{EnvTokenStore, FileStateCache, MemoryStateCache, RegistryResolver, StateCache};
use ferry_core::resolve::{
    AbortHandle, DependencyResolver, ItemRequest, fetch_items, resolve_registries,
};
use ferry_core::rewrite::{InstallPaths, RewrittenFile, Rewriter};

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "Share source items between projects", long_about = None)]
struct Cli {
    /// Project directory
    #[arg(long, global = true, default_value = ".")]
    cwd: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the registry manifest from the `[build]` table of ferry.toml
    Build {
        /// Directory to write the manifest to (overrides build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Install items and their local dependencies
    Add {
        /// Items as `category/item` or `<registry>/<category>/<item>`;
        /// none installs every listed item
        items: Vec<String>,

        /// Registry to use instead of those in ferry.toml (repeatable)
        #[arg(long, short)]
        registry: Vec<String>,

        /// Replace existing files that differ
        #[arg(long)]
        overwrite: bool,

        /// Skip all confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build { output, format } => run_build(&cli.cwd, output, format),
        Commands::Add {
            items,
            registry,
            overwrite,
            yes,
        } => run_add(&cli.cwd, items, registry, overwrite, yes).await,
    }
}

fn load_config(cwd: &Path) -> Result<FerryConfig> {
    let path = cwd.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(FerryConfig::new());
    }
    parse_ferry_toml(&path).with_context(|| format!("Failed to load {}", path.display()))
}

fn run_build(cwd: &Path, output: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let config = load_config(cwd)?;
    let mut build = config
        .build
        .with_context(|| format!("No [build] table in {}", cwd.join(CONFIG_FILE).display()))?;
    if let Some(output) = output {
        build.output_dir = output;
    }

    let output_dir = cwd.join(&build.output_dir);
    let report = ManifestBuilder::new(cwd, build)
        .build()
        .context("Manifest build failed")?;

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let manifest_path = output_dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, report.manifest.to_json_pretty()?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    match format {
        OutputFormat::Table => {
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            if !report.pruned.is_empty() {
                let pruned: Vec<String> = report.pruned.iter().map(|i| i.to_string()).collect();
                eprintln!("pruned unused: {}", pruned.join(", "));
            }
            println!(
                "Built {} item(s) into {}",
                report.item_count(),
                manifest_path.display()
            );
        }
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "manifest": manifest_path,
                "items": report.item_count(),
                "warnings": report.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                "pruned": report.pruned,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

async fn run_add(
    cwd: &Path,
    items: Vec<String>,
    registries: Vec<String>,
    overwrite: bool,
    yes: bool,
) -> Result<()> {
    let config = load_config(cwd)?;
    let registries = if registries.is_empty() {
        config.registries.clone()
    } else {
        registries
    };

    let providers = Providers::default();
    let requests = items
        .iter()
        .map(|spec| ItemRequest::parse(spec, &providers))
        .collect::<ferry_core::Result<Vec<_>>>()?;
    if registries.is_empty() && requests.iter().all(|r| r.registry.is_none()) {
        bail!(
            "No registries configured. Add `registries = [...]` to {} or pass --registry",
            CONFIG_FILE
        );
    }

    let cache: Arc<dyn StateCache> = match FileStateCache::default_dir() {
        Ok(dir) => Arc::new(FileStateCache::new(dir)),
        Err(e) => {
            warn!("{}; state will not be cached", e);
            Arc::new(MemoryStateCache::new())
        }
    };
    let abort = AbortHandle::new();
    let resolver = RegistryResolver::new(providers, default_client()?)
        .with_tokens(Arc::new(EnvTokenStore))
        .with_cache(cache)
        .with_signal(abort.signal());

    // Ctrl-C cancels whatever network work is in flight from here on.
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });
    let result = install(cwd, &config, &resolver, &registries, requests, overwrite, yes).await;
    watcher.abort();
    result
}

async fn install(
    cwd: &Path,
    config: &FerryConfig,
    resolver: &RegistryResolver,
    registries: &[String],
    requests: Vec<ItemRequest>,
    overwrite: bool,
    yes: bool,
) -> Result<()> {
    let resolved = resolve_registries(resolver, registries, &requests)
        .await
        .map_err(interrupted)?;
    let graph = DependencyResolver::new(&resolved).with_soft_roles(config.soft_roles());
    let requests = if interactive::is_interactive(yes) {
        interactive::disambiguate(&graph, requests)?
    } else {
        requests
    };
    let items = graph.resolve(&requests)?;

    if items.is_empty() {
        println!("Nothing to install");
        return Ok(());
    }
    if !interactive::confirm_install(&items, yes)? {
        println!("Cancelled");
        return Ok(());
    }

    let fetched = fetch_items(resolver, items).await.map_err(interrupted)?;
    let paths = InstallPaths::new(cwd, config.paths.clone()).with_project_aliases()?;
    let languages = Languages::default();
    let rewriter = Rewriter::new(&paths, &languages).with_watermark(config.watermark);

    let mut files = Vec::new();
    for item in &fetched {
        files.extend(rewriter.rewrite(item)?);
    }
    let (written, conflicts) = write_files(&files, overwrite)?;

    let mut dependencies = BTreeSet::new();
    let mut dev_dependencies = BTreeSet::new();
    for item in &fetched {
        dependencies.extend(item.resolved.item.dependencies.iter().map(|d| d.to_string()));
        dev_dependencies.extend(item.resolved.item.dev_dependencies.iter().map(|d| d.to_string()));
    }

    info!("Installed {} item(s), wrote {} file(s)", fetched.len(), written);
    if !dependencies.is_empty() {
        println!("Dependencies: {}", dependencies.into_iter().collect::<Vec<_>>().join(" "));
    }
    if !dev_dependencies.is_empty() {
        println!(
            "Dev dependencies: {}",
            dev_dependencies.into_iter().collect::<Vec<_>>().join(" ")
        );
    }
    if !conflicts.is_empty() {
        for path in &conflicts {
            eprintln!("skipped (differs): {}", path.display());
        }
        bail!(
            "{} file(s) already exist with different content; rerun with --overwrite to replace them",
            conflicts.len()
        );
    }
    Ok(())
}

fn interrupted(err: ferry_core::Error) -> anyhow::Error {
    match err {
        ferry_core::Error::Cancelled => anyhow::anyhow!("Interrupted"),
        other => other.into(),
    }
}

/// Write rewritten files, leaving differing files alone unless `overwrite`.
fn write_files(files: &[RewrittenFile], overwrite: bool) -> Result<(usize, Vec<PathBuf>)> {
    let mut written = 0;
    let mut conflicts = Vec::new();
    for file in files {
        match std::fs::read_to_string(&file.path) {
            Ok(existing) if existing == file.content => continue,
            Ok(_) if !overwrite => {
                conflicts.push(file.path.clone());
                continue;
            }
            _ => {}
        }
        if let Some(parent) = file.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&file.path, &file.content)
            .with_context(|| format!("Failed to write {}", file.path.display()))?;
        println!("wrote {}", file.path.display());
        written += 1;
    }
    Ok((written, conflicts))
}
