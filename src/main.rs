use anyhow::Result;
use clap::{Parser, ValueEnum};
use esg_supplier_finder::config::{self, AppConfig, ExtractorMode};
use esg_supplier_finder::models::QueryReport;
use esg_supplier_finder::orchestrator::{persist_report, Pipeline, QueryOptions};
use esg_supplier_finder::render::render_report_markdown;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

/// ESG Supplier Finder - rank raw-material suppliers by ESG risk found in search results
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Material to research (e.g. cobalt, lithium). Omit to be prompted interactively.
    material: Option<String>,

    /// Path to config file (overrides ESG_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Also write <dir>/<date>/<material>.report.{json,md}
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Report format printed to stdout
    #[arg(short, long, value_enum, default_value = "markdown")]
    format: OutputFormat,

    /// Include per-article details for each supplier
    #[arg(long)]
    details: bool,

    /// Score on title and snippet only; skip fetching article pages
    #[arg(long)]
    no_enrich: bool,

    /// Organization extractor (overrides extraction.mode in the config file)
    #[arg(long, value_enum)]
    extractor: Option<ExtractorMode>,
}

fn load_app_config(cli_path: Option<&str>) -> Result<AppConfig> {
    let (cfg_path, explicit) = config::resolve_config_path(cli_path);

    let mut cfg = if cfg_path.exists() {
        debug!("Using config file: {}", cfg_path.display());
        config::load_config(&cfg_path)?
    } else if explicit {
        // Friendlier error if missing
        return Err(anyhow::anyhow!(
            "config not found at {}\n\
             Use --config to specify a config file, or set {}.\n\
             Example config.yaml:\n\
             search:\n  cx: \"YOUR_ENGINE_ID\"\n  num_results: 5\n\
             (keep the API key in {})\n",
            cfg_path.display(),
            config::ENV_CONFIG,
            config::ENV_SEARCH_API_KEY
        ));
    } else {
        debug!("No config file at {}; using defaults", cfg_path.display());
        AppConfig::default()
    };

    cfg.apply_secret_overrides(|k| std::env::var(k).ok());
    Ok(cfg)
}

fn emit(report: &QueryReport, args: &Args) -> Result<()> {
    let markdown = render_report_markdown(report, args.details);
    match args.format {
        OutputFormat::Markdown => println!("{}", markdown),
        OutputFormat::Json => {
            if let Some(err) = &report.search_error {
                eprintln!("Search failed: {}", err);
            }
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = persist_report(std::path::Path::new(dir), report, &markdown) {
            warn!("Could not persist report - error={:#}", e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stderr, so stdout carries only the report)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting esg-supplier-finder");

    let args = Args::parse();

    let mut cfg = load_app_config(args.config.as_deref())?;
    if let Some(mode) = args.extractor {
        cfg.extraction.mode = mode;
    }
    cfg.validate()?;

    let opts = QueryOptions {
        enrich: !args.no_enrich,
        extractor: cfg.extraction.mode,
    };
    let pipeline = Pipeline::new(cfg)?;

    if let Some(material) = args.material.as_deref().filter(|m| !m.trim().is_empty()) {
        let report = pipeline.run_query(material, &opts).await;
        return emit(&report, &args);
    }

    // Interactive: one material per line until EOF or an empty line
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter a material (e.g., cobalt, lithium): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let material = line.trim();
        if material.is_empty() {
            break;
        }
        let report = pipeline.run_query(material, &opts).await;
        emit(&report, &args)?;
    }

    info!("Bye");
    Ok(())
}
