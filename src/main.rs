use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagewalker::config::{CliConfig, PaginatorConfig};
use pagewalker::{EntityCatalog, PaginationParams, Paginator, SelectQuery};

/// Pagewalker - ROW_NUMBER() pagination SQL for SQL Server-style dialects
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Paginator configuration file (YAML); PAGEWALKER_* env vars otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum identifier parameters bound into a two-phase row fetch
    #[arg(long, global = true)]
    max_identifier_parameters: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the paginated SQL for a query tree
    Rewrite {
        /// Query tree file (YAML or JSON)
        #[arg(long)]
        query: PathBuf,

        /// Entity catalog file (YAML or JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Rows to skip
        #[arg(long)]
        offset: Option<u64>,

        /// Page size
        #[arg(long)]
        limit: Option<u64>,

        /// Force two-phase output even without a collection join
        #[arg(long)]
        two_phase: bool,

        /// Also print the count query
        #[arg(long)]
        count: bool,
    },
}

fn load_query(path: &Path) -> anyhow::Result<SelectQuery> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading query file {}", path.display()))?;
    let query = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("parsing query file {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("parsing query file {}", path.display()))?,
    };
    Ok(query)
}

fn load_config(cli: &Cli) -> anyhow::Result<PaginatorConfig> {
    let config = match &cli.config {
        Some(path) => PaginatorConfig::from_yaml_file(path)?,
        None => PaginatorConfig::from_env()?,
    };
    let overrides = CliConfig {
        max_identifier_parameters: cli.max_identifier_parameters,
        query_timeout_ms: None,
    };
    Ok(config.with_overrides(overrides)?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Rewrite {
            query,
            catalog,
            offset,
            limit,
            two_phase,
            count,
        } => {
            let query = load_query(&query)?;
            let catalog = EntityCatalog::from_yaml_file(&catalog)?;
            let pagination = PaginationParams { offset, limit };

            let mut paginator = Paginator::new(&query, &catalog).with_config(config);
            if two_phase {
                paginator = paginator.with_fetch_join_collection(true);
            }

            if paginator.fetch_join_collection() {
                let identifier_sql = paginator.preflight(&pagination)?;
                println!("-- identifier query\n{};", identifier_sql);
                let row_fetch = pagewalker::rewrite(&query, &catalog, &PaginationParams::new())?;
                println!(
                    "\n-- row fetch (restricted to the collected identifiers at run time)\n{};",
                    row_fetch
                );
            } else {
                println!("{};", pagewalker::rewrite(&query, &catalog, &pagination)?);
            }

            if count {
                println!("\n-- count\n{};", paginator.count_sql()?);
            }
        }
    }
    Ok(())
}

fn main() {
    // Load .env before reading PAGEWALKER_* variables
    dotenvy::dotenv().ok();

    // Defaults to WARN so only SQL reaches stdout; override with RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
