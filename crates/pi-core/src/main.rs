//! Price Intelligence Core - quote catalog and pricing engine
//!
//! The main entry point for pi-core, handling:
//! - Material views, best prices and confidence bands
//! - Anomaly passes over material and labor lines
//! - Savings summaries, labor rankings and category forecasts
//! - Quote ingestion and confidence recomputation

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pi_common::{format_error_human, Error, JobId, MaterialId, OutputFormat, StructuredError};
use pi_core::anomaly::Severity;
use pi_core::config::{load_config, ConfigError, LoadedConfig};
use pi_core::dataset::Dataset;
use pi_core::exit_codes::ExitCode;
use pi_core::ingest::parse_records;
use pi_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use pi_core::output;
use pi_core::savings::DateWindow;
use pi_core::{InMemoryStore, PriceIntel};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Price Intelligence Core - vendor quote analysis
#[derive(Parser)]
#[command(name = "pi-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Catalog dataset (JSON)
    #[arg(long, global = true, env = "PI_DATA")]
    data: Option<PathBuf>,

    /// Engine config file (overrides env and XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format on stderr (overrides PI_LOG_FORMAT)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Engine(EngineCommand),

    /// Validate configuration and dataset
    Check,

    /// Print the effective engine configuration
    Config,
}

/// Commands that run against a loaded dataset.
#[derive(Subcommand)]
enum EngineCommand {
    /// Show a material with all vendor quotes and the best price
    Material(MaterialArgs),

    /// List materials, optionally for one category
    List(ListArgs),

    /// Run an anomaly pass (exit 1 when anything is flagged)
    Anomalies(AnomaliesArgs),

    /// Savings summary for a job or date range
    Savings(SavingsArgs),

    /// Rank subcontractors for a trade by value score
    Rank(RankArgs),

    /// Project a category's price direction
    Forecast(ForecastArgs),

    /// Ingest extracted quote records
    Ingest(IngestArgs),

    /// Recompute confidence scores across the catalog
    Recompute(RecomputeArgs),
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct MaterialArgs {
    /// Material id
    id: String,

    /// Express prices in this unit
    #[arg(long)]
    unit: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only materials in this category
    #[arg(long)]
    category: Option<String>,
}

#[derive(Args, Debug)]
struct AnomaliesArgs {
    /// Minimum severity to report (info, warning, critical)
    #[arg(long)]
    severity: Option<Severity>,

    /// Date stamped on detected anomalies (default: today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SavingsGroup {
    Job,
    Category,
}

#[derive(Args, Debug)]
struct SavingsArgs {
    /// Summarize a single job
    #[arg(long, conflicts_with_all = ["from", "to", "by"])]
    job: Option<String>,

    /// First order date included (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last order date included (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Break the summary down by job or category
    #[arg(long, value_enum)]
    by: Option<SavingsGroup>,
}

#[derive(Args, Debug)]
struct RankArgs {
    /// Trade to rank (e.g. drywall)
    trade: String,
}

#[derive(Args, Debug)]
struct ForecastArgs {
    /// Spend category
    category: String,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Quote records: a JSON array or one JSON object per line
    file: PathBuf,

    /// Write the updated dataset here
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RecomputeArgs {
    /// Write the updated dataset here
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let run_id = generate_run_id();
    let _run = tracing::info_span!("pi_core", run_id = %run_id).entered();
    tracing::debug!(event = event_names::RUN_STARTED, "run started");

    let exit_code = match &cli.command {
        Commands::Config => run_config(&cli.global, &run_id),
        Commands::Check => run_check(&cli.global, &run_id),
        Commands::Engine(command) => run_engine_command(&cli.global, &run_id, command),
    };

    tracing::debug!(
        event = event_names::RUN_FINISHED,
        exit_code = exit_code.as_i32(),
        "run finished"
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared plumbing
// ============================================================================

/// Envelope wrapped around every JSON payload.
#[derive(Serialize)]
struct Response<'a, T: Serialize> {
    run_id: &'a str,
    generated_at: String,
    command: &'a str,
    config_hash: &'a str,
    result: T,
}

fn print_json<T: Serialize>(run_id: &str, command: &str, config: &LoadedConfig, result: T) -> ExitCode {
    let response = Response {
        run_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        command,
        config_hash: config.snapshot.short_id(),
        result,
    };
    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::Clean
        }
        Err(e) => output_error(&OutputFormat::Json, &Error::Json(e)),
    }
}

fn output_error(format: &OutputFormat, err: &Error) -> ExitCode {
    match format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
        OutputFormat::Summary if err.is_insufficient_data() => {
            println!("{} ({})", output::MISSING, err)
        }
        OutputFormat::Summary => eprintln!("error [{}]: {}", err.code(), err),
        OutputFormat::Md => eprintln!(
            "{}",
            format_error_human(err, std::io::stderr().is_terminal())
        ),
    }
    ExitCode::for_error(err)
}

fn args_error(global: &GlobalOpts, message: &str) -> ExitCode {
    if global.format.is_human() {
        eprintln!("error: {}", message);
    } else {
        eprintln!(
            "{}",
            serde_json::json!({
                "status": "error",
                "error": { "code": ExitCode::ArgsError.as_i32(), "message": message }
            })
        );
    }
    ExitCode::ArgsError
}

fn output_config_error(global: &GlobalOpts, error: &ConfigError) -> ExitCode {
    let (error_code, exit_code) = match error {
        ConfigError::NotFound { .. } => (10, ExitCode::ArgsError),
        ConfigError::ParseError { .. } => (11, ExitCode::ConfigError),
        ConfigError::Validation(e) => (e.code(), ExitCode::ConfigError),
        ConfigError::Io { .. } => (60, ExitCode::IoError),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "error": {
                    "code": error_code,
                    "message": error.to_string(),
                }
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => eprintln!("config error: {}", error),
        OutputFormat::Md => {
            eprintln!("# Configuration Error");
            eprintln!();
            eprintln!("Error: {}", error);
        }
    }
    exit_code
}

fn load_dataset(path: &Path) -> Result<InMemoryStore, Error> {
    let store = Dataset::from_file(path)?.into_store()?;
    tracing::info!(
        event = event_names::DATASET_LOADED,
        path = %path.display(),
        "dataset loaded"
    );
    Ok(store)
}

fn write_dataset(intel: &PriceIntel<InMemoryStore>, path: &Path) -> Result<(), Error> {
    let json = Dataset::snapshot(intel.store().as_ref()).to_json_pretty()?;
    std::fs::write(path, json)?;
    Ok(())
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_config(global: &GlobalOpts, run_id: &str) -> ExitCode {
    let loaded = match load_config(global.config.as_deref()) {
        Ok(l) => l,
        Err(e) => return output_config_error(global, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "snapshot": &loaded.snapshot,
                "values": &loaded.config,
            });
            print_json(run_id, "config", &loaded, result)
        }
        OutputFormat::Summary => {
            println!(
                "config: {} ({}) hash {}",
                loaded.snapshot.path.as_deref().unwrap_or("built-in defaults"),
                loaded.snapshot.source,
                loaded.snapshot.short_id()
            );
            ExitCode::Clean
        }
        OutputFormat::Md => {
            let s = &loaded.snapshot.summary;
            println!("# pi-core config");
            println!();
            match &loaded.snapshot.path {
                Some(path) => println!("Source: {} ({})", path, loaded.snapshot.source),
                None => println!("Source: **built-in defaults**"),
            }
            println!("Hash: {}", loaded.snapshot.hash);
            println!("Schema version: {}", loaded.snapshot.schema_version);
            println!();
            println!("| Setting | Value |");
            println!("|---|---:|");
            println!("| anomaly.warning_pct | {} |", s.warning_pct);
            println!("| anomaly.critical_pct | {} |", s.critical_pct);
            println!(
                "| confidence cut points | {} / {} / {} |",
                s.band_cut_points[0], s.band_cut_points[1], s.band_cut_points[2]
            );
            println!("| savings.materiality_threshold | {} |", s.materiality_threshold);
            println!("| baseline.window | {} |", s.baseline_window);
            ExitCode::Clean
        }
    }
}

fn run_check(global: &GlobalOpts, run_id: &str) -> ExitCode {
    let loaded = match load_config(global.config.as_deref()) {
        Ok(l) => l,
        Err(e) => return output_config_error(global, &e),
    };

    let stats = match global.data.as_deref() {
        Some(path) => match load_dataset(path) {
            Ok(store) => Some(PriceIntel::new(Arc::new(store), loaded.config.clone()).stats()),
            Err(e) => return output_error(&global.format, &e),
        },
        None => None,
    };

    match global.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "status": "ok",
                "config": {
                    "source": loaded.snapshot.source,
                    "hash": loaded.snapshot.hash,
                },
                "dataset": stats,
            });
            print_json(run_id, "check", &loaded, result)
        }
        OutputFormat::Summary => {
            match &stats {
                Some(s) => println!(
                    "ok: config {} valid; {} materials, {} quotes, {} vendors",
                    loaded.snapshot.short_id(),
                    s.materials,
                    s.quotes,
                    s.vendors
                ),
                None => println!("ok: config {} valid; no dataset", loaded.snapshot.short_id()),
            }
            ExitCode::Clean
        }
        OutputFormat::Md => {
            println!("# pi-core check");
            println!();
            println!("Config: ok ({})", loaded.snapshot.source);
            match &stats {
                Some(s) => {
                    println!("Dataset: ok");
                    println!();
                    println!("| Vendors | Materials | Quotes | Without quotes | Subcontractors | Savings records | Categories |");
                    println!("|---:|---:|---:|---:|---:|---:|---:|");
                    println!(
                        "| {} | {} | {} | {} | {} | {} | {} |",
                        s.vendors,
                        s.materials,
                        s.quotes,
                        s.materials_without_quotes,
                        s.subcontractors,
                        s.savings_records,
                        s.categories
                    );
                }
                None => println!("Dataset: {}", output::MISSING),
            }
            ExitCode::Clean
        }
    }
}

fn stage_of(command: &EngineCommand) -> Stage {
    match command {
        EngineCommand::Ingest(_) => Stage::Ingest,
        EngineCommand::Anomalies(_) | EngineCommand::Recompute(_) | EngineCommand::Forecast(_) => {
            Stage::Analyze
        }
        EngineCommand::Material(_)
        | EngineCommand::List(_)
        | EngineCommand::Savings(_)
        | EngineCommand::Rank(_) => Stage::Report,
    }
}

fn run_engine_command(global: &GlobalOpts, run_id: &str, command: &EngineCommand) -> ExitCode {
    let init = tracing::debug_span!("stage", stage = %Stage::Init).entered();
    let loaded = match load_config(global.config.as_deref()) {
        Ok(l) => l,
        Err(e) => return output_config_error(global, &e),
    };
    drop(init);

    let Some(data) = global.data.as_deref() else {
        return args_error(global, "no dataset given; pass --data or set PI_DATA");
    };
    let load = tracing::debug_span!("stage", stage = %Stage::Load).entered();
    let store = match load_dataset(data) {
        Ok(s) => s,
        Err(e) => return output_error(&global.format, &e),
    };
    drop(load);
    let intel = PriceIntel::new(Arc::new(store), loaded.config.clone());

    let _stage = tracing::debug_span!("stage", stage = %stage_of(command)).entered();

    let result = match command {
        EngineCommand::Material(args) => run_material(global, run_id, &loaded, &intel, args),
        EngineCommand::List(args) => run_list(global, run_id, &loaded, &intel, args),
        EngineCommand::Anomalies(args) => run_anomalies(global, run_id, &loaded, &intel, args),
        EngineCommand::Savings(args) => run_savings(global, run_id, &loaded, &intel, args),
        EngineCommand::Rank(args) => run_rank(global, run_id, &loaded, &intel, args),
        EngineCommand::Forecast(args) => run_forecast(global, run_id, &loaded, &intel, args),
        EngineCommand::Ingest(args) => run_ingest(global, run_id, &loaded, &intel, args),
        EngineCommand::Recompute(args) => run_recompute(global, run_id, &loaded, &intel, args),
    };
    result.unwrap_or_else(|e| output_error(&global.format, &e))
}

type Intel = PriceIntel<InMemoryStore>;

fn run_material(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &MaterialArgs,
) -> Result<ExitCode, Error> {
    let Some(id) = MaterialId::parse(&args.id) else {
        return Ok(args_error(global, &format!("invalid material id: {:?}", args.id)));
    };
    let view = intel.material_view(&id, args.unit.as_deref())?;
    Ok(match global.format {
        OutputFormat::Json => print_json(run_id, "material", loaded, &view),
        OutputFormat::Md => {
            print!("{}", output::material_md(&view));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!("{}", output::material_summary(&view));
            ExitCode::Clean
        }
    })
}

fn run_list(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &ListArgs,
) -> Result<ExitCode, Error> {
    let rows = intel.materials_by_category(args.category.as_deref());
    Ok(match global.format {
        OutputFormat::Json => print_json(run_id, "list", loaded, &rows),
        OutputFormat::Md => {
            print!("{}", output::listing_md(&rows));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!(
                "{} materials{}",
                rows.len(),
                args.category
                    .as_deref()
                    .map(|c| format!(" in {}", c))
                    .unwrap_or_default()
            );
            ExitCode::Clean
        }
    })
}

fn run_anomalies(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &AnomaliesArgs,
) -> Result<ExitCode, Error> {
    let pass = match args.as_of {
        Some(day) => intel.detect_anomalies(day, args.severity),
        None => intel.anomalies(args.severity),
    };
    let printed = match global.format {
        OutputFormat::Json => print_json(run_id, "anomalies", loaded, &pass),
        OutputFormat::Md => {
            print!("{}", output::anomalies_md(&pass));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!("{}", output::anomalies_summary(&pass));
            ExitCode::Clean
        }
    };
    if printed != ExitCode::Clean {
        return Ok(printed);
    }
    Ok(if pass.anomalies.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::AnomaliesFound
    })
}

fn run_savings(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &SavingsArgs,
) -> Result<ExitCode, Error> {
    if let Some(job) = &args.job {
        let Some(job) = JobId::parse(job) else {
            return Ok(args_error(global, &format!("invalid job id: {:?}", job)));
        };
        let summary = intel.savings_for_job(&job)?;
        let title = format!("job {}", job);
        return Ok(render_savings(global, run_id, loaded, &title, &summary));
    }

    let window = DateWindow {
        from: args.from,
        to: args.to,
    };
    if let (Some(from), Some(to)) = (window.from, window.to) {
        if from > to {
            return Ok(args_error(
                global,
                &format!("empty date range: {} is after {}", from, to),
            ));
        }
    }

    Ok(match args.by {
        None => {
            let summary = intel.savings_between(window);
            let title = match (window.from, window.to) {
                (None, None) => "all records".to_string(),
                (from, to) => format!(
                    "{} to {}",
                    from.map_or_else(|| output::MISSING.to_string(), |d| d.to_string()),
                    to.map_or_else(|| output::MISSING.to_string(), |d| d.to_string())
                ),
            };
            render_savings(global, run_id, loaded, &title, &summary)
        }
        Some(SavingsGroup::Job) => {
            let groups = intel.savings_by_job(window);
            render_grouped(global, run_id, loaded, "job", &groups)
        }
        Some(SavingsGroup::Category) => {
            let groups = intel.savings_by_category(window);
            render_grouped(global, run_id, loaded, "category", &groups)
        }
    })
}

fn render_savings(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    title: &str,
    summary: &pi_core::savings::SavingsSummary,
) -> ExitCode {
    match global.format {
        OutputFormat::Json => print_json(run_id, "savings", loaded, summary),
        OutputFormat::Md => {
            print!("{}", output::savings_md(title, summary));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!("{}", output::savings_summary(title, summary));
            ExitCode::Clean
        }
    }
}

fn render_grouped<K: Serialize + std::fmt::Display + Ord>(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    heading: &str,
    groups: &std::collections::BTreeMap<K, pi_core::savings::SavingsSummary>,
) -> ExitCode {
    match global.format {
        OutputFormat::Json => print_json(run_id, "savings", loaded, groups),
        OutputFormat::Md => {
            print!("{}", output::grouped_savings_md(heading, groups));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            for (key, s) in groups {
                println!("{}", output::savings_summary(&key.to_string(), s));
            }
            ExitCode::Clean
        }
    }
}

fn run_rank(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &RankArgs,
) -> Result<ExitCode, Error> {
    let ranked = intel.rank_trade(&args.trade)?;
    Ok(match global.format {
        OutputFormat::Json => print_json(run_id, "rank", loaded, &ranked),
        OutputFormat::Md => {
            print!("{}", output::ranking_md(&args.trade, &ranked));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!("{}", output::ranking_summary(&args.trade, &ranked));
            ExitCode::Clean
        }
    })
}

fn run_forecast(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &ForecastArgs,
) -> Result<ExitCode, Error> {
    let forecast = intel.forecast_category(&args.category)?;
    Ok(match global.format {
        OutputFormat::Json => print_json(run_id, "forecast", loaded, &forecast),
        OutputFormat::Md => {
            print!("{}", output::forecast_md(&forecast));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!("{}", output::forecast_summary(&forecast));
            ExitCode::Clean
        }
    })
}

fn run_ingest(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &IngestArgs,
) -> Result<ExitCode, Error> {
    let text = std::fs::read_to_string(&args.file)?;
    let records = parse_records(&text)?;
    let report = intel.ingest(&records);
    if let Some(path) = &args.output {
        write_dataset(intel, path)?;
    }
    let printed = match global.format {
        OutputFormat::Json => print_json(run_id, "ingest", loaded, &report),
        OutputFormat::Md => {
            print!("{}", output::ingest_md(&report));
            ExitCode::Clean
        }
        OutputFormat::Summary => {
            println!("{}", output::ingest_summary(&report));
            ExitCode::Clean
        }
    };
    // Rejections are reported in the payload; they do not fail the run.
    Ok(printed)
}

fn run_recompute(
    global: &GlobalOpts,
    run_id: &str,
    loaded: &LoadedConfig,
    intel: &Intel,
    args: &RecomputeArgs,
) -> Result<ExitCode, Error> {
    let report = intel.recompute_confidence()?;
    if let Some(path) = &args.output {
        write_dataset(intel, path)?;
    }
    Ok(match global.format {
        OutputFormat::Json => print_json(run_id, "recompute", loaded, &report),
        OutputFormat::Md | OutputFormat::Summary => {
            println!("{}", output::recompute_summary(&report));
            ExitCode::Clean
        }
    })
}
