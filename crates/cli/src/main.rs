use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use cli::{db, extract, output};
use safelist_core::config;
use safelist_core::config::AppConfig;
use safelist_core::persister;
use safelist_core::pipeline::Pipeline;
use safelist_core::source::JsonExport;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            source,
            post_types,
            include_templates,
            json,
        } => run_scan(cfg, &source, post_types, include_templates, json).await,
        Commands::UpdateItem { source, id, json } => run_update_item(cfg, &source, id, json).await,
        Commands::UpdateDb => run_update_db(cfg).await,
        Commands::Extract { file, raw } => run_extract(cfg, file.as_deref(), raw),
        Commands::Show { json } => run_show(cfg, json),
    }
}

#[derive(Parser)]
#[command(name = "safelist")]
#[command(about = "Scan CMS content for CSS classes and write a safelist", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all content and rebuild the safelist
    Scan {
        /// Content export (JSON)
        #[arg(short, long)]
        source: PathBuf,
        /// Only scan these post types (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        post_types: Vec<String>,
        /// Also scan template files
        #[arg(long, default_value_t = false)]
        include_templates: bool,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Rescan a single content item and merge it into the safelist
    UpdateItem {
        /// Content export (JSON)
        #[arg(short, long)]
        source: PathBuf,
        /// Content id of the saved item
        #[arg(long)]
        id: u64,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Create the class log table
    UpdateDb,
    /// Print classes found in a markup file (stdin when omitted)
    Extract {
        file: Option<PathBuf>,
        /// Print every raw token in document order, unfiltered
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Decode and print the current safelist
    Show {
        /// Output JSON array
        #[arg(long)]
        json: bool,
    },
}

async fn run_scan(
    cfg: AppConfig,
    source: &Path,
    post_types: Vec<String>,
    include_templates: bool,
    json: bool,
) -> Result<()> {
    let export = JsonExport::load(source)?;
    let mut pipeline = Pipeline::from_config(&cfg).await?;
    let options = pipeline.options_mut();
    if !post_types.is_empty() {
        options.post_types = post_types;
    }
    options.include_templates |= include_templates;

    let report = pipeline.run_scan(&export).await?;
    if json {
        let summary = output::scan_json(&report, &cfg.output.path);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", output::scan_text(&report, &cfg.output.path));
    }
    Ok(())
}

async fn run_update_item(cfg: AppConfig, source: &Path, id: u64, json: bool) -> Result<()> {
    let export = JsonExport::load(source)?;
    let pipeline = Pipeline::from_config(&cfg).await?;
    let outcome = pipeline.run_item_update(&export, id).await?;
    if json {
        let summary = output::item_json(id, &outcome);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", output::item_text(id, &outcome));
    }
    Ok(())
}

async fn run_update_db(cfg: AppConfig) -> Result<()> {
    let Some(database) = cfg.database else {
        bail!("no [database] section configured");
    };
    if db::update_db(&database.path).await? {
        println!("Database table created successfully.");
    } else {
        println!("Database is already up to date.");
    }
    Ok(())
}

fn run_extract(cfg: AppConfig, file: Option<&Path>, raw: bool) -> Result<()> {
    let rules = cfg.scan.exclude_rules()?;
    let classes = match file {
        Some(path) => extract::extract_from_reader(File::open(path)?, &rules, raw)?,
        None => extract::extract_from_reader(io::stdin().lock(), &rules, raw)?,
    };
    for class in classes {
        println!("{}", class);
    }
    Ok(())
}

fn run_show(cfg: AppConfig, json: bool) -> Result<()> {
    let classes = persister::read_safelist(Path::new(&cfg.output.path))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&classes)?);
    } else {
        for class in classes {
            println!("{}", class);
        }
    }
    Ok(())
}
