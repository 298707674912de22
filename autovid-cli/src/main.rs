//! AutoVid CLI
//!
//! One-shot retrieval of a recorded still frame for a terminal transaction:
//! resolves the terminal to a site, drives the Video Investigator UI to the
//! matching camera and time window, exports a frame into the output
//! directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use autovid::{Outcome, Task};

#[derive(Parser)]
#[command(name = "autovid")]
#[command(about = "Pull a recorded still frame from the video review application")]
struct Cli {
    /// Terminal identifier to look up (e.g. CAM-14).
    terminal_id: String,

    /// Transaction timestamp, `YYYY-MM-DD HH:MM:SS` local time.
    #[arg(long)]
    time: String,

    /// Directory the exported image lands in; must already exist.
    #[arg(long, env = "AUTOVID_OUTDIR")]
    outdir: PathBuf,

    /// Seconds of footage on each side of the transaction time.
    #[arg(long, default_value_t = 5)]
    lookback_secs: i64,

    /// Share of the screen width the target app keeps, 50-80; the status
    /// overlay takes the rest.
    #[arg(long, default_value_t = 80)]
    width_percent: u8,

    /// File name for the exported image, without extension. Defaults to the
    /// name the save dialog generates.
    #[arg(long)]
    name: Option<String>,

    /// Fail instead of overwriting an existing image.
    #[arg(long)]
    no_overwrite: bool,

    /// Investigation reference carried through the logs.
    #[arg(long)]
    case_id: Option<String>,

    /// Run without the status overlay; progress goes to the log only.
    #[arg(long)]
    headless: bool,
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let time = chrono::NaiveDateTime::parse_from_str(&cli.time, "%Y-%m-%d %H:%M:%S")
        .context("transaction time must be `YYYY-MM-DD HH:MM:SS`")?;

    let mut task = Task::new(cli.terminal_id, time, cli.outdir, cli.width_percent)?
        .with_lookback(chrono::Duration::seconds(cli.lookback_secs))
        .with_overwrite(!cli.no_overwrite);
    if let Some(name) = cli.name {
        task = task.with_file_name(name);
    }
    if let Some(case_id) = cli.case_id {
        task = task.with_case_id(case_id);
    }

    run(task, cli.headless)
}

#[cfg(target_os = "windows")]
fn execute(task: &Task, sink: &dyn autovid::StatusSink) -> autovid::Outcome {
    use autovid::platforms::windows::WindowsApp;
    use autovid::{AppConfig, AppHandle, Navigator, Outcome, SiteResolver, WorkflowController};

    let resolver = match SiteResolver::from_env() {
        Ok(resolver) => resolver,
        Err(err) => return Outcome::Failed(err),
    };
    let mut app = WindowsApp::new(AppConfig::default());
    let navigator = match app.tree() {
        Ok(tree) => Navigator::new(tree),
        Err(err) => return Outcome::Failed(err),
    };
    WorkflowController::new(task, &resolver, &mut app, &navigator, sink).run()
}

#[cfg(target_os = "windows")]
fn run(task: Task, headless: bool) -> Result<()> {
    use std::sync::mpsc;
    use std::thread;

    use autovid::{AbortFlag, ChannelSink, LogSink};

    let abort = AbortFlag::new();
    let outcome = if headless {
        let sink = LogSink::new(abort);
        execute(&task, &sink)
    } else {
        // The worker drives the UI; this thread stays free to surface status
        // text (the graphical overlay attaches to the same channel/flag).
        let (tx, rx) = mpsc::channel();
        let worker_abort = abort.clone();
        let worker = thread::spawn(move || {
            let sink = ChannelSink::new(tx, worker_abort);
            execute(&task, &sink)
        });
        for message in rx {
            println!("[autovid] {message}");
        }
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))?
    };

    report(outcome)
}

#[cfg(not(target_os = "windows"))]
fn run(_task: Task, _headless: bool) -> Result<()> {
    report(Outcome::Failed(autovid::AutomationError::PlatformError(
        "the target application can only be automated on Windows".to_string(),
    )))
}

/// Terminal outcome of a run: the saved path goes to stdout for scripting,
/// everything else through the log.
fn report(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Done(path) => {
            info!(path = %path.display(), "image saved");
            println!("{}", path.display());
            Ok(())
        }
        Outcome::Failed(err) => {
            error!("workflow failed: {err}");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::report;
    use autovid::{AutomationError, Outcome};

    #[test]
    fn done_outcome_reports_success() {
        let path = std::path::PathBuf::from("frame_0001.jpg");
        assert!(report(Outcome::Done(path)).is_ok());
    }

    #[test]
    fn failed_outcome_propagates_the_error() {
        let err = report(Outcome::Failed(AutomationError::Aborted)).unwrap_err();
        assert!(err.to_string().contains("Aborted"));
    }
}
