use clap::{Parser, ValueEnum};
use dashsync_core::storage::{DryRunSink, SnapshotSink, SnapshotWriter};
use dashsync_core::sync::{self, Metric, SyncContext};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod plan;

#[derive(Debug, Parser)]
#[command(name = "dashsync_worker", about = "Fetch market data and write dashboard snapshots")]
struct Args {
    /// Output directory for snapshot files. Overrides DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Sync only these metrics (repeatable). Defaults to all of them.
    #[arg(long, value_enum)]
    only: Vec<MetricArg>,

    /// Fetch and validate everything but write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Exit non-zero when any metric fell back to an error snapshot.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Prices,
    Funds,
    Sentiment,
    Rates,
    Breadth,
    Analysis,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Prices => Metric::Prices,
            MetricArg::Funds => Metric::Funds,
            MetricArg::Sentiment => Metric::Sentiment,
            MetricArg::Rates => Metric::Rates,
            MetricArg::Breadth => Metric::Breadth,
            MetricArg::Analysis => Metric::Analysis,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = match dashsync_core::config::Settings::from_env() {
        Ok(s) => s,
        Err(err) => {
            eprintln!("invalid configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    match run(args, settings).await {
        Ok(code) => code,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "sync run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, settings: dashsync_core::config::Settings) -> anyhow::Result<ExitCode> {
    let data_dir = args.data_dir.unwrap_or_else(|| settings.data_dir.clone());
    let only: Vec<Metric> = args.only.into_iter().map(Metric::from).collect();

    let sink: Box<dyn SnapshotSink> = if args.dry_run {
        Box::new(DryRunSink::new(&data_dir))
    } else {
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            anyhow::anyhow!("create data dir {} failed: {e}", data_dir.display())
        })?;
        Box::new(SnapshotWriter::new(&data_dir))
    };

    let now = chrono::Utc::now();
    let ctx = SyncContext::from_settings(&settings, now);
    let plan = plan::build_plan(&settings, now.date_naive());

    tracing::info!(
        data_dir = %data_dir.display(),
        dry_run = args.dry_run,
        only = ?only,
        %now,
        "sync run started"
    );

    let report = sync::run(&ctx, &plan, sink.as_ref(), &only).await;

    let written = report.outcomes.len() - report.write_failures();
    tracing::info!(
        artifacts = report.outcomes.len(),
        written,
        write_failures = report.write_failures(),
        error_snapshots = report.error_snapshots(),
        "sync run finished"
    );

    if report.write_failures() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    if args.strict && report.error_snapshots() > 0 {
        tracing::warn!(
            error_snapshots = report.error_snapshots(),
            "strict mode: error snapshots were written"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_sentry(settings: &dashsync_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
