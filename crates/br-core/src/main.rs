//! Burn Rate - consumption tracking for metered compute entities
//!
//! The main entry point for burnrate, handling:
//! - Per-entity and per-group rate queries
//! - Interval and hourly chart data
//! - Leaderboards, detail views, and stats
//! - Registry administration
//! - Balance collection cycles

use br_common::{parse_window, EntityId, Error, OutputFormat, Result, StructuredError};
use br_core::collect::{CollectionReport, Collector, FileBalanceSource};
use br_core::config::{load_config, ConfigError, ConfigOptions, ConfigSource, ResolvedConfig};
use br_core::exit_codes::ExitCode;
use br_core::logging::{
    emit, event_names, init_logging, Level, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use br_core::report::{render, Page, Render, Reports};
use br_core::store::{DataContext, Dataset, EntityImport, EntityUpdate, FileStore};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Burn Rate - track how fast metered entities consume their balance
#[derive(Parser)]
#[command(name = "burnrate")]
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
    /// Path to burnrate.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding snapshots.json and registry.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Evaluate windows as of this epoch-millisecond time instead of the
    /// newest snapshot (also stamps `collect`)
    #[arg(long, global = true)]
    now: Option<i64>,
}

impl GlobalOpts {
    fn log_level(&self) -> Option<LogLevel> {
        (self.verbose > 0 || self.quiet > 0)
            .then(|| LogLevel::from_verbosity(self.verbose, self.quiet))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Burn rate of one entity
    Rate(EntityWindowArgs),

    /// Classified burn and top-up intervals of one entity
    Intervals(EntityWindowArgs),

    /// Burn spread over epoch hours for charting
    Hourly(HourlyArgs),

    /// Summed burn rate of a group
    Group(GroupWindowArgs),

    /// Group intervals reconciled onto one timeline
    GroupIntervals(GroupWindowArgs),

    /// Ranked members of one group
    Members(GroupArgs),

    /// Valid entities ranked by 24h burn
    Leaderboard(LeaderboardArgs),

    /// Groups ranked by 24h burn
    Groups,

    /// Balance, rates over every window, and history of one entity
    Detail(EntityArgs),

    /// Dataset counts
    Stats,

    /// Entity registry administration
    Registry(RegistryArgs),

    /// Run one collection cycle, or keep collecting with --every
    Collect(CollectArgs),

    /// Configuration management
    Config(ConfigArgs),
}

// ============================================================================
// Command argument structs
// ============================================================================

fn window_arg(s: &str) -> std::result::Result<i64, String> {
    parse_window(s).map_err(|e| e.to_string())
}

#[derive(Args, Debug)]
struct EntityArgs {
    /// Entity id
    entity: String,
}

#[derive(Args, Debug)]
struct EntityWindowArgs {
    /// Entity id
    entity: String,

    /// Lookback window (30m, 1h, 24h, 7d, or milliseconds)
    #[arg(long, short = 'w', default_value = "24h", value_parser = window_arg)]
    window: i64,
}

#[derive(Args, Debug)]
struct HourlyArgs {
    /// Entity id
    entity: String,

    /// Lookback window; defaults to the configured chart window
    #[arg(long, short = 'w', value_parser = window_arg)]
    window: Option<i64>,
}

#[derive(Args, Debug)]
struct GroupArgs {
    /// Group name
    group: String,
}

#[derive(Args, Debug)]
struct GroupWindowArgs {
    /// Group name
    group: String,

    /// Lookback window (30m, 1h, 24h, 7d, or milliseconds)
    #[arg(long, short = 'w', default_value = "24h", value_parser = window_arg)]
    window: i64,
}

#[derive(Args, Debug)]
struct LeaderboardArgs {
    /// Entries to skip
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Entries to return (capped by report.max_page_size)
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct RegistryArgs {
    #[command(subcommand)]
    command: RegistryCommands,
}

#[derive(Subcommand, Debug)]
enum RegistryCommands {
    /// Insert or replace records from a JSON array file
    Import {
        /// Path to the records file
        file: PathBuf,
    },
    /// Print every record in import format
    Export,
    /// Mark an entity valid or invalid
    SetValid {
        entity: String,
        #[arg(action = clap::ArgAction::Set)]
        valid: bool,
    },
    /// Change an entity's group or website
    Update {
        entity: String,
        #[arg(long, conflicts_with = "clear_group")]
        group: Option<String>,
        #[arg(long)]
        clear_group: bool,
        #[arg(long, conflicts_with = "clear_website")]
        website: Option<String>,
        #[arg(long)]
        clear_website: bool,
    },
    /// Remove entities from the registry and every snapshot
    Remove {
        #[arg(required = true)]
        entities: Vec<String>,
    },
    /// Empty the registry and the snapshot log
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// JSON object of entity id to balance
    #[arg(long)]
    balances: PathBuf,

    /// Repeat the cycle at this interval (5m, 1h, ...) until interrupted
    #[arg(long, value_parser = window_arg)]
    every: Option<i64>,

    /// Stop after this many cycles
    #[arg(long, requires = "every")]
    cycles: Option<u64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate a configuration file
    Validate {
        /// Path to validate (defaults to the resolved file)
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Local payloads
// ============================================================================

#[derive(Debug, Serialize)]
struct RegistryChange {
    action: &'static str,
    affected: usize,
    total: usize,
}

impl Render for RegistryChange {
    fn markdown(&self) -> String {
        format!(
            "# Registry {}\n\n- Affected: {}\n- Registered entities: {}\n",
            self.action, self.affected, self.total
        )
    }

    fn summary(&self) -> String {
        format!("{}: {} affected, {} total", self.action, self.affected, self.total)
    }
}

#[derive(Debug, Serialize)]
struct RegistryExport {
    entities: Vec<EntityImport>,
}

impl Render for RegistryExport {
    fn markdown(&self) -> String {
        let mut out = String::from("# Registry\n\n| Entity | Group | Website | Proxy | Kind | Valid |\n|--------|-------|---------|-------|------|-------|\n");
        for e in &self.entities {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                e.entity_id,
                e.group.as_deref().unwrap_or("-"),
                e.website.as_deref().unwrap_or("-"),
                e.proxy_reference,
                e.proxy_kind,
                e.valid.unwrap_or(true),
            ));
        }
        out
    }

    fn summary(&self) -> String {
        format!("{} registered entities", self.entities.len())
    }
}

#[derive(Debug, Serialize)]
struct ConfigValidation {
    status: &'static str,
    source: String,
    config_path: Option<PathBuf>,
}

impl Render for ConfigValidation {
    fn markdown(&self) -> String {
        let path = self
            .config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string());
        format!("# Configuration Validation\n\nStatus: ✓ Valid\nFile: {}\n", path)
    }

    fn summary(&self) -> String {
        "config validate: OK".to_string()
    }
}

// ============================================================================
// Entry point
// ============================================================================

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level(), cli.global.log_format);
    init_logging(&log_config);

    let ctx = LogContext::fresh();
    let span = tracing::info_span!("run", run_id = %ctx.run_id);
    let _enter = span.enter();
    emit(&ctx.event(
        Level::Debug,
        event_names::RUN_STARTED,
        Stage::Init,
        "burnrate started",
    ));

    let exit_code = run(&cli, &ctx);

    emit(
        &ctx.event(
            Level::Debug,
            event_names::RUN_FINISHED,
            Stage::Report,
            "burnrate finished",
        )
        .with_field("exit_code", exit_code.as_i32()),
    );
    exit_code.into()
}

fn run(cli: &Cli, ctx: &LogContext) -> ExitCode {
    let global = &cli.global;
    let options = ConfigOptions {
        config_path: global.config.clone(),
        data_dir: global.data_dir.clone(),
    };

    if let Commands::Config(args) = &cli.command {
        return run_config(global, args, options, ctx);
    }

    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(e) => return output_config_error(global, &e, ctx),
    };
    log_config_source(&resolved, ctx);

    let data = Data::open(&resolved);
    match dispatch(global, &cli.command, &resolved, &data, ctx) {
        Ok(code) => code,
        Err(e) => output_error(global, &e, ctx),
    }
}

/// The data directory behind a lazily loaded context.
struct Data {
    ctx: DataContext,
    store: FileStore,
}

impl Data {
    fn open(resolved: &ResolvedConfig) -> Self {
        let store = FileStore::new(&resolved.data_dir);
        Data {
            ctx: DataContext::new(store.clone()),
            store,
        }
    }

    fn dataset(&self) -> Result<Arc<Dataset>> {
        Ok(self.ctx.dataset()?)
    }

    /// Drop the cached dataset so the next read sees the files again.
    fn refresh(&self) {
        self.ctx.invalidate();
    }

    /// Apply `f` to a private copy, persist it, then publish it.
    fn mutate<T>(&self, f: impl FnOnce(&mut Dataset) -> T) -> Result<T> {
        let mut dataset = (*self.dataset()?).clone();
        let out = f(&mut dataset);
        self.store.save(&dataset)?;
        self.ctx.replace(dataset);
        Ok(out)
    }
}

fn print<T: Render + ?Sized>(global: &GlobalOpts, payload: &T) -> Result<()> {
    println!("{}", render(payload, global.format)?);
    Ok(())
}

/// `NoData` when the query was answered without an estimate.
fn data_code(has_data: bool) -> ExitCode {
    if has_data {
        ExitCode::Clean
    } else {
        ExitCode::NoData
    }
}

fn dispatch(
    global: &GlobalOpts,
    command: &Commands,
    resolved: &ResolvedConfig,
    data: &Data,
    ctx: &LogContext,
) -> Result<ExitCode> {
    let config = &resolved.engine;

    match command {
        Commands::Registry(args) => return run_registry(global, &args.command, resolved, data, ctx),
        Commands::Collect(args) => return run_collect(global, args, resolved, data, ctx),
        _ => {}
    }

    let span = tracing::info_span!("query", stage = %Stage::Report);
    let _enter = span.enter();
    let dataset = data.dataset()?;
    let reports = Reports::new(&dataset, config).at(global.now);

    match command {
        Commands::Rate(args) => {
            let report = reports.rate(&args.entity, args.window)?;
            print(global, &report)?;
            Ok(data_code(report.estimate.is_some()))
        }
        Commands::Intervals(args) => {
            let report = reports.intervals(&args.entity, args.window)?;
            print(global, &report)?;
            Ok(data_code(!report.intervals.is_empty()))
        }
        Commands::Hourly(args) => {
            let report = reports.hourly(&args.entity, args.window)?;
            print(global, &report)?;
            Ok(data_code(!report.buckets.is_empty()))
        }
        Commands::Group(args) => {
            let report = reports.group_rate(&args.group, args.window)?;
            print(global, &report)?;
            Ok(data_code(report.estimate.is_some()))
        }
        Commands::GroupIntervals(args) => {
            let report = reports.group_intervals(&args.group, args.window)?;
            print(global, &report)?;
            Ok(data_code(!report.slices.is_empty()))
        }
        Commands::Members(args) => {
            print(global, &reports.group_members(&args.group)?)?;
            Ok(ExitCode::Clean)
        }
        Commands::Leaderboard(args) => {
            let page = Page {
                offset: args.offset,
                limit: args.limit,
            };
            print(global, &reports.leaderboard(page))?;
            Ok(ExitCode::Clean)
        }
        Commands::Groups => {
            print(global, &reports.group_leaderboard())?;
            Ok(ExitCode::Clean)
        }
        Commands::Detail(args) => {
            print(global, &reports.entity_detail(&args.entity)?)?;
            Ok(ExitCode::Clean)
        }
        Commands::Stats => {
            print(global, &reports.stats())?;
            Ok(ExitCode::Clean)
        }
        Commands::Registry(_) | Commands::Collect(_) | Commands::Config(_) => {
            Ok(ExitCode::InternalError)
        }
    }
}

fn require_registered(data: &Data, entity: &str) -> Result<()> {
    if data.dataset()?.registry.get(entity).is_none() {
        return Err(Error::EntityNotFound {
            entity_id: entity.to_string(),
        });
    }
    Ok(())
}

fn run_registry(
    global: &GlobalOpts,
    command: &RegistryCommands,
    resolved: &ResolvedConfig,
    data: &Data,
    ctx: &LogContext,
) -> Result<ExitCode> {
    let limits = &resolved.engine.registry;

    let change = match command {
        RegistryCommands::Export => {
            let entities = data.dataset()?.registry.export();
            print(global, &RegistryExport { entities })?;
            return Ok(ExitCode::Clean);
        }
        RegistryCommands::Import { file } => {
            let content = std::fs::read_to_string(file)?;
            let rows: Vec<EntityImport> = serde_json::from_str(&content)
                .map_err(|e| Error::InvalidRecord(format!("{}: {}", file.display(), e)))?;
            let (affected, total) = data.mutate(|ds| {
                let n = ds.registry.import(rows, limits);
                (n, ds.registry.len())
            })?;
            emit(
                &ctx.info(event_names::REGISTRY_IMPORTED, Stage::Load, "registry records imported")
                    .with_field("count", affected)
                    .with_field("path", file.display().to_string()),
            );
            RegistryChange {
                action: "import",
                affected,
                total,
            }
        }
        RegistryCommands::SetValid { entity, valid } => {
            require_registered(data, entity)?;
            let total = data.mutate(|ds| {
                ds.registry.set_valid(entity, *valid);
                ds.registry.len()
            })?;
            RegistryChange {
                action: "set-valid",
                affected: 1,
                total,
            }
        }
        RegistryCommands::Update {
            entity,
            group,
            clear_group,
            website,
            clear_website,
        } => {
            let update = EntityUpdate {
                group: if *clear_group {
                    Some(None)
                } else {
                    group.clone().map(Some)
                },
                website: if *clear_website {
                    Some(None)
                } else {
                    website.clone().map(Some)
                },
            };
            require_registered(data, entity)?;
            let total = data.mutate(|ds| {
                ds.registry.update(entity, update, limits);
                ds.registry.len()
            })?;
            RegistryChange {
                action: "update",
                affected: 1,
                total,
            }
        }
        RegistryCommands::Remove { entities } => {
            let ids: Vec<EntityId> = entities.iter().map(|e| EntityId::from(e.as_str())).collect();
            let (removed, total) = data.mutate(|ds| {
                let removed = ds.remove_entities(&ids);
                (removed, ds.registry.len())
            })?;
            for entity in &removed {
                emit(
                    &ctx.info(event_names::REGISTRY_REMOVED, Stage::Load, "entity removed")
                        .with_entity(entity.as_str()),
                );
            }
            RegistryChange {
                action: "remove",
                affected: removed.len(),
                total,
            }
        }
        RegistryCommands::Clear { yes } => {
            if !yes {
                return Err(Error::InvalidRecord(
                    "refusing to clear without --yes".to_string(),
                ));
            }
            let affected = data.mutate(|ds| {
                let n = ds.registry.len();
                ds.clear();
                n
            })?;
            RegistryChange {
                action: "clear",
                affected,
                total: 0,
            }
        }
    };

    print(global, &change)?;
    Ok(ExitCode::Clean)
}

fn run_collect(
    global: &GlobalOpts,
    args: &CollectArgs,
    resolved: &ResolvedConfig,
    data: &Data,
    ctx: &LogContext,
) -> Result<ExitCode> {
    let span = tracing::info_span!("collect", stage = %Stage::Collect);
    let _enter = span.enter();

    let Some(every) = args.every else {
        let timestamp = global
            .now
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let report = collect_cycle(args, resolved, data, ctx, timestamp)?;
        print(global, &report)?;
        return Ok(ExitCode::Clean);
    };

    emit(
        &ctx.info(event_names::COLLECT_SCHEDULED, Stage::Collect, "periodic collection started")
            .with_field("every_ms", every)
            .with_field("cycles", args.cycles),
    );

    let mut cycle: u64 = 0;
    loop {
        // With --now the schedule is simulated from that instant.
        let timestamp = match global.now {
            Some(start) => start.saturating_add(every.saturating_mul(cycle as i64)),
            None => chrono::Utc::now().timestamp_millis(),
        };
        cycle += 1;

        data.refresh();
        match collect_cycle(args, resolved, data, ctx, timestamp) {
            Ok(report) => print(global, &report)?,
            // A broken setup fails fast; later failures wait for the next cycle.
            Err(e) if cycle == 1 => return Err(e),
            Err(e) => emit(
                &ctx.warn(event_names::COLLECT_CYCLE_FAILED, Stage::Collect, e.to_string())
                    .with_field("cycle", cycle),
            ),
        }

        if args.cycles.is_some_and(|limit| cycle >= limit) {
            break;
        }
        std::thread::sleep(Duration::from_millis(every as u64));
    }
    Ok(ExitCode::Clean)
}

/// Read the balances file once and append one snapshot.
fn collect_cycle(
    args: &CollectArgs,
    resolved: &ResolvedConfig,
    data: &Data,
    ctx: &LogContext,
    timestamp: i64,
) -> Result<CollectionReport> {
    let source = FileBalanceSource::open(&args.balances)?;
    let collector = Collector::new(
        Arc::new(source),
        resolved.engine.collector.clone(),
        resolved.engine.retention.clone(),
    );

    let report = data.mutate(|ds| collector.collect(ds, timestamp))?;
    if report.omitted() > 0 {
        emit(
            &ctx.warn(
                event_names::COLLECT_FINISHED,
                Stage::Collect,
                "some entities had no balance and no previous value",
            )
            .with_field("omitted", report.omitted()),
        );
    }
    Ok(report)
}

fn log_config_source(resolved: &ResolvedConfig, ctx: &LogContext) {
    emit(
        &ctx.event(
            Level::Debug,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "configuration loaded",
        )
        .with_field("source", resolved.source.to_string()),
    );
    if resolved.source == ConfigSource::BuiltinDefault {
        emit(
            &ctx.event(
                Level::Debug,
                event_names::CONFIG_DEFAULT_USED,
                Stage::Init,
                "no configuration file found, using built-in defaults",
            )
            .with_field("data_dir", resolved.data_dir.display().to_string()),
        );
    }
}

fn run_config(
    global: &GlobalOpts,
    args: &ConfigArgs,
    mut options: ConfigOptions,
    ctx: &LogContext,
) -> ExitCode {
    if let ConfigCommands::Validate { path: Some(path) } = &args.command {
        options.config_path = Some(path.clone());
    }

    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(e) => return output_config_error(global, &e, ctx),
    };
    log_config_source(&resolved, ctx);

    let printed = match &args.command {
        ConfigCommands::Show => print(global, &resolved.report()),
        ConfigCommands::Validate { .. } => print(
            global,
            &ConfigValidation {
                status: "valid",
                source: resolved.source.to_string(),
                config_path: resolved.config_path.clone(),
            },
        ),
    };
    match printed {
        Ok(()) => ExitCode::Clean,
        Err(e) => output_error(global, &e, ctx),
    }
}

// ============================================================================
// Error output
// ============================================================================

/// Output a config error in the appropriate format.
fn output_config_error(global: &GlobalOpts, error: &ConfigError, ctx: &LogContext) -> ExitCode {
    let exit_code = match error {
        ConfigError::IoError { .. } => ExitCode::IoError,
        _ => ExitCode::ConfigError,
    };
    emit(
        &ctx.event(Level::Error, event_names::CONFIG_ERROR, Stage::Init, error.to_string())
            .with_field("exit_code", exit_code.as_i32()),
    );

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "error": {
                    "code": exit_code.code_name(),
                    "message": error.to_string(),
                }
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_else(|_| error.to_string())
            );
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

/// Output a command error in the appropriate format.
fn output_error(global: &GlobalOpts, error: &Error, ctx: &LogContext) -> ExitCode {
    let exit_code = ExitCode::from(error);
    if exit_code.is_internal_error() {
        emit(
            &ctx.event(Level::Error, event_names::INTERNAL_ERROR, Stage::Report, error.to_string())
                .with_field("code", error.code()),
        );
    }

    match global.format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(error).to_json()),
        OutputFormat::Summary => eprintln!("error: {}", error),
        OutputFormat::Md => eprintln!("{}", error.to_human()),
    }
    exit_code
}
