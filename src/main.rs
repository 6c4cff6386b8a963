//! reportdeps CLI - inspect generation query dependencies

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use reportdeps::{
    get_and_validate_dependencies_with_limits, validate_and_coerce_inputs, CatalogIndex,
    CatalogLoader, DataSource, DependencyResolver, DependencySet, FixSuggestion, GenerationQuery,
    HandlerFns, InputValue, Lookup, ReportDepsError, ResolveLimits,
};

#[derive(Parser)]
#[command(name = "reportdeps")]
#[command(about = "Resolve and validate report generation query dependencies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by every subcommand
#[derive(clap::Args)]
struct Target {
    /// Catalog YAML file or directory
    catalog: PathBuf,

    /// Generation query name
    query: String,

    /// Namespace of the query (also the default for catalog entries)
    #[arg(short, long, default_value = reportdeps::catalog::DEFAULT_NAMESPACE)]
    namespace: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve all transitive dependencies of a query
    Deps {
        #[command(flatten)]
        target: Target,

        /// Depth at which resolution reports a cycle
        #[arg(long)]
        max_depth: Option<usize>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Resolve and check that every dependency is ready
    Check {
        #[command(flatten)]
        target: Target,

        /// Depth at which resolution reports a cycle
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Validate and coerce input values for a query
    Inputs {
        #[command(flatten)]
        target: Target,

        /// Input value as NAME=VALUE (VALUE parsed as a YAML scalar)
        #[arg(short, long = "input", value_name = "NAME=VALUE")]
        inputs: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Deps {
            target,
            max_depth,
            format,
        } => print_dependencies(&target, limits(max_depth), format),
        Commands::Check { target, max_depth } => check_dependencies(&target, limits(max_depth)),
        Commands::Inputs { target, inputs } => check_inputs(&target, &inputs),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .downcast_ref::<ReportDepsError>()
            .and_then(|e| e.fix_suggestion())
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn limits(max_depth: Option<usize>) -> ResolveLimits {
    let limits = ResolveLimits::from_env();
    match max_depth {
        Some(depth) => limits.with_max_depth(depth),
        None => limits,
    }
}

fn load(target: &Target) -> Result<(CatalogIndex, Arc<GenerationQuery>)> {
    let index = CatalogLoader::new()
        .with_default_namespace(&target.namespace)
        .load_path(&target.catalog)
        .with_context(|| format!("loading catalog {}", target.catalog.display()))?
        .finish();
    let root = index.query(&target.namespace, &target.query).map_err(ReportDepsError::from)?;
    Ok((index, root))
}

fn print_dependencies(target: &Target, limits: ResolveLimits, format: Format) -> Result<()> {
    let (index, root) = load(target)?;
    let deps = DependencyResolver::new(&index).with_limits(limits).resolve(&root)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&deps)?),
        Format::Text => print_set(&root, &deps),
    }
    Ok(())
}

fn check_dependencies(target: &Target, limits: ResolveLimits) -> Result<()> {
    let (index, root) = load(target)?;

    let mut pending_queries = Vec::new();
    let mut pending_sources = Vec::new();
    let mut handler = HandlerFns {
        on_query: |q: &Arc<GenerationQuery>| pending_queries.push(q.name.clone()),
        on_data_source: |ds: &Arc<DataSource>| pending_sources.push(ds.name.clone()),
    };
    let result = get_and_validate_dependencies_with_limits(&index, &root, Some(&mut handler), limits);
    drop(handler);

    match result {
        Ok(deps) => {
            println!(
                "{} Query '{}' is ready ({} dependencies)",
                "✓".green(),
                root.name,
                deps.len()
            );
            Ok(())
        }
        Err(e) => {
            if e.is_invalid_dependency() {
                println!("{} Query '{}' has invalid dependencies", "✗".red(), root.name);
            } else if e.is_uninitialized_dependency() {
                println!("{} Query '{}' is waiting on dependencies", "…".yellow(), root.name);
            }
            for name in &pending_queries {
                println!("  waiting on query {}", name.cyan());
            }
            for name in &pending_sources {
                println!("  waiting on data source {}", name.cyan());
            }
            Err(e.into())
        }
    }
}

fn check_inputs(target: &Target, raw_inputs: &[String]) -> Result<()> {
    let (_, root) = load(target)?;
    let supplied = raw_inputs
        .iter()
        .map(|raw| parse_input(raw))
        .collect::<Result<Vec<_>>>()?;

    let values = validate_and_coerce_inputs(&root, &supplied)?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

fn parse_input(raw: &str) -> Result<InputValue> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("input '{}' must be NAME=VALUE", raw))?;
    let value: serde_json::Value = if value.is_empty() {
        serde_json::Value::Null
    } else {
        serde_yaml::from_str(value).with_context(|| format!("parsing value of input '{}'", name))?
    };
    Ok(InputValue {
        name: name.to_string(),
        value: Some(value),
    })
}

fn print_set(root: &GenerationQuery, deps: &DependencySet) {
    println!("{} {}", "Dependencies of".cyan().bold(), root.name.bold());

    section("Static queries", deps.static_queries.iter().map(|q| {
        let state = if q.view_disabled() {
            "view disabled".red().to_string()
        } else {
            readiness(q.view_name())
        };
        (q.name.as_str(), state)
    }));
    section(
        "Dynamic queries",
        deps.dynamic_queries
            .iter()
            .map(|q| (q.name.as_str(), "not checked".dimmed().to_string())),
    );
    section(
        "Data sources",
        deps.data_sources
            .iter()
            .map(|ds| (ds.name.as_str(), readiness(ds.table_name()))),
    );
    section(
        "Reports",
        deps.reports
            .iter()
            .map(|r| (r.name.as_str(), readiness(r.table_name()))),
    );
}

fn readiness(backing: Option<&str>) -> String {
    match backing {
        Some(name) => name.green().to_string(),
        None => "uninitialized".yellow().to_string(),
    }
}

fn section<'a>(title: &str, rows: impl Iterator<Item = (&'a str, String)>) {
    let rows: Vec<_> = rows.collect();
    println!("  {} ({})", title, rows.len());
    for (name, state) in rows {
        println!("    {:<40} {}", name, state);
    }
}
