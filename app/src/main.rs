use std::path::{Path, PathBuf};

use bandwidth::Bandwidth;
use cache_elements::CacheElements;
use cache_misses::{CacheMisses, QueryCacheMisses};
use clap::{Parser, Subcommand};
use common::{
    config::Settings,
    parse::{ReplySizes, read_reply_sizes},
    plot::{Plot, RunDir, pair_runs},
};
use eyre::{Context, ContextCompat, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const MODULES: &[&str] = &["common", "bandwidth", "cache_misses", "cache_elements"];

#[derive(Parser)]
#[command(about = "Bar charts from swiftlinks experiment logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// YAML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Directory charts are written to, overrides the settings file
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,
    /// Tracing directives, e.g. `common=debug`
    #[arg(short, long, global = true)]
    log: Vec<String>,
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch reply bandwidth during and after startup
    Bandwidth {
        /// Run directories, `-nonlazy` in the name marks non-lazy runs
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// Cache misses per cache size limit
    CacheMisses {
        /// `<name> <dir>` pairs, lazy and non-lazy runs alternating
        #[arg(required = true)]
        runs: Vec<String>,
    },
    /// Cache misses per query cache time
    QueryCacheMisses {
        /// `<name> <dir>` pairs
        #[arg(required = true)]
        runs: Vec<String>,
    },
    /// Peak cached elements per cache size limit
    CacheElements {
        /// `<name> <dir>` pairs, lazy and non-lazy runs alternating
        #[arg(required = true)]
        runs: Vec<String>,
    },
    /// Average and total fetch reply size of one client log
    CountSize { file: PathBuf },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let _guard = init_logging(&args)?;

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }

    if let Err(err) = run(args.command, &settings) {
        error!("{err:#}");
        return Err(err);
    }
    Ok(())
}

fn init_logging(args: &Cli) -> Result<Option<WorkerGuard>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let mut env_filter = EnvFilter::new(format!("swiftlinks_plots={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }
    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().context("Log file path has no file name")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (
                Some(layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .init();
    Ok(guard)
}

fn run(command: Commands, settings: &Settings) -> Result<()> {
    let (plot, runs): (Box<dyn Plot>, Vec<RunDir>) = match command {
        Commands::Bandwidth { dirs } => (
            Box::new(Bandwidth),
            dirs.into_iter().map(RunDir::unnamed).collect(),
        ),
        Commands::CacheMisses { runs } => (Box::new(CacheMisses), pair_runs(&runs)?),
        Commands::QueryCacheMisses { runs } => (Box::new(QueryCacheMisses), pair_runs(&runs)?),
        Commands::CacheElements { runs } => (Box::new(CacheElements), pair_runs(&runs)?),
        Commands::CountSize { file } => return count_size(&file),
    };

    for path in common::plot::plot(plot.as_ref(), &runs, settings)? {
        info!("{} -> {}", plot.name(), path.display());
    }
    Ok(())
}

fn count_size(file: &Path) -> Result<()> {
    let sizes = read_reply_sizes(file).with_context(|| format!("Reading {}", file.display()))?;
    println!("{}", size_report(&sizes)?);
    Ok(())
}

fn size_report(sizes: &ReplySizes) -> Result<String> {
    Ok(format!(
        "Avg size: {:?}\nTot size: {}",
        sizes.average()?,
        sizes.total
    ))
}
