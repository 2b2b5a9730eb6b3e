use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use txbench_backends::BackendRegistry;
use txbench_core::{
    Executor, ExecutorOptions, Properties, ReportFormat, Statistics, TransactionSettings, Workload,
};

#[derive(Parser, Debug)]
#[command(name = "txbench")]
#[command(about = "Transaction benchmarking harness", long_about = None)]
#[command(version)]
struct Cli {
    /// Workload definition (YAML)
    #[arg(short = 'w', long, env = "TXBENCH_WORKLOAD")]
    workload: PathBuf,

    /// Backend to run against (stdout, noop, sqlite, mysql, postgresql)
    #[arg(short = 'd', long = "database", visible_alias = "db", env = "TXBENCH_DATABASE")]
    database: String,

    /// Override the workload's worker count
    #[arg(long, env = "TXBENCH_THREADS")]
    threads: Option<usize>,

    /// Report destination (default: stdout)
    #[arg(short = 'r', long, env = "TXBENCH_RESULT")]
    result: Option<PathBuf>,

    /// Connection properties file (key=value lines)
    #[arg(short = 'p', long, env = "TXBENCH_PROPERTIES")]
    properties: Option<PathBuf>,

    /// Statement issued before every iteration
    #[arg(long, env = "TXBENCH_BEGIN", default_value = "BEGIN")]
    begin: String,

    /// Statement issued after every iteration
    #[arg(long, env = "TXBENCH_COMMIT", default_value = "COMMIT")]
    commit: String,

    /// Run the queries without begin/commit around them
    #[arg(long)]
    no_transaction: bool,

    /// Report format (text or json)
    #[arg(long, env = "TXBENCH_FORMAT", default_value = "text")]
    format: ReportFormat,

    /// Seconds to wait for every worker to connect; 0 waits forever
    #[arg(long, env = "TXBENCH_START_TIMEOUT_SECS", default_value = "60")]
    start_timeout_secs: u64,

    /// Log filter, e.g. `debug` or `txbench_core=trace` (default: RUST_LOG or info)
    #[arg(long, env = "TXBENCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, env = "TXBENCH_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    fn transaction_settings(&self) -> TransactionSettings {
        TransactionSettings {
            begin: self.begin.clone(),
            commit: self.commit.clone(),
            enabled: !self.no_transaction,
        }
    }

    fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            start_timeout: match self.start_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            ..ExecutorOptions::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors exit 1.
            let code = u8::from(e.use_stderr());
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.log_level.as_deref(), cli.log_format);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "benchmark failed");
            eprintln!("txbench: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let properties = match &cli.properties {
        Some(path) => Properties::from_file(path)
            .with_context(|| format!("failed to load properties from {}", path.display()))?,
        None => Properties::new(),
    };

    let mut workload = Workload::from_file(&cli.workload, cli.transaction_settings())
        .with_context(|| format!("failed to load workload from {}", cli.workload.display()))?;
    if let Some(threads) = cli.threads {
        workload.set_threads(threads);
    }

    let backend = BackendRegistry::with_defaults().get(&cli.database)?;
    info!(
        workload = %workload.name(),
        backend = %cli.database,
        threads = workload.threads(),
        count = workload.count(),
        "loaded configuration"
    );

    let statistics = Executor::with_options(backend, cli.executor_options())
        .execute(&workload, &properties)
        .context("benchmark run failed")?;

    write_report(&statistics, cli.format, cli.result.as_deref())
}

fn write_report(statistics: &Statistics, format: ReportFormat, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create report file {}", path.display()))?;
            statistics
                .write_report(&mut BufWriter::new(file), format)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => statistics
            .write_report(&mut io::stdout().lock(), format)
            .context("failed to write report to stdout")?,
    }
    Ok(())
}

/// Initialize logging on stderr so the report on stdout stays clean.
fn init_logging(level: Option<&str>, format: LogFormat) {
    let env_filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["txbench", "-w", "bench.yml", "--db", "noop"]).unwrap();
        assert_eq!(cli.workload, PathBuf::from("bench.yml"));
        assert_eq!(cli.database, "noop");
        assert_eq!(cli.format, ReportFormat::Text);
        assert_eq!(cli.transaction_settings(), TransactionSettings::default());
        assert_eq!(
            cli.executor_options().start_timeout,
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_parse_full() {
        let cli = Cli::try_parse_from([
            "txbench",
            "--workload",
            "bench.yml",
            "-d",
            "postgresql",
            "--threads",
            "16",
            "-r",
            "out.txt",
            "-p",
            "db.properties",
            "--begin",
            "START TRANSACTION",
            "--no-transaction",
            "--format",
            "json",
            "--start-timeout-secs",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.threads, Some(16));
        assert_eq!(cli.result, Some(PathBuf::from("out.txt")));
        assert_eq!(cli.format, ReportFormat::Json);
        let transaction = cli.transaction_settings();
        assert_eq!(transaction.begin, "START TRANSACTION");
        assert!(!transaction.enabled);
        assert_eq!(cli.executor_options().start_timeout, None);
    }

    #[test]
    fn test_missing_required_flag_is_usage_error() {
        let err = Cli::try_parse_from(["txbench", "-d", "noop"]).unwrap_err();
        assert!(err.use_stderr());

        let help = Cli::try_parse_from(["txbench", "--help"]).unwrap_err();
        assert!(!help.use_stderr());
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let workload = dir.path().join("bench.yml");
        std::fs::write(
            &workload,
            "name: smoke\ncount: 4\nthreads: 2\ntransaction:\n  queries:\n    - SELECT {{ random_number(1, 9) }}\n",
        )
        .unwrap();
        let result = dir.path().join("report.json");

        let cli = Cli::try_parse_from([
            "txbench",
            "-w",
            workload.to_str().unwrap(),
            "-d",
            "noop",
            "-r",
            result.to_str().unwrap(),
            "--format",
            "json",
        ])
        .unwrap();
        run(&cli).unwrap();

        let report = std::fs::read_to_string(&result).unwrap();
        assert!(report.contains("\"name\": \"smoke\""));
        assert!(report.contains("\"success\": 8"));
    }

    #[test]
    fn test_run_unknown_backend_fails() {
        let dir = tempfile::tempdir().unwrap();
        let workload = dir.path().join("bench.yml");
        std::fs::write(
            &workload,
            "name: smoke\ncount: 1\nthreads: 1\ntransaction:\n  queries: [\"SELECT 1\"]\n",
        )
        .unwrap();

        let cli =
            Cli::try_parse_from(["txbench", "-w", workload.to_str().unwrap(), "-d", "oracle"])
                .unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("unknown backend `oracle`"));
    }
}
