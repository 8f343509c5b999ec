mod args;
mod error;
mod gui;
mod lesson;
mod progress;
mod spreadsheet;
mod tts;
mod utils;

use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Engines};
use crate::error::Severity;
use crate::progress::Progress;
use crate::tts::SynthesisOutcome;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engines = Engines::from_args(&args)?;
    if args.headless {
        run_headless(&args, &engines)
    } else {
        info!("Opening lesson builder window");
        gui::run(args, engines)
    }
}

fn run_headless(args: &Args, engines: &Engines) -> anyhow::Result<()> {
    let config = match args.run_config() {
        Ok(config) => config,
        Err(e) => anyhow::bail!("{}", e),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        let (tx, mut rx) = unbounded_channel();
        let logger = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Progress::Started { total } => info!("Synthesizing {} audio files", total),
                    Progress::Advanced { done, total } => {
                        info!("Progress {}/{} ({:.0}%)", done, total, event.percent())
                    }
                    Progress::Reset => {}
                }
            }
        });
        let result = lesson::build(&config, &engines.hosted, &engines.local, tx).await;
        let _ = logger.await;
        result
    });

    match result {
        Ok(report) => {
            for record in &report.attempts {
                match &record.outcome {
                    SynthesisOutcome::Written(path) => debug!("Wrote {}", path.display()),
                    SynthesisOutcome::Failed(reason) => warn!(
                        "No {:?} audio for row {} ({}): {}",
                        record.engine,
                        record.row,
                        record.kind.as_str(),
                        reason
                    ),
                    SynthesisOutcome::Skipped => {}
                }
            }
            info!(
                "Lesson created from {} rows after {}/{} synthesis attempts: {}, {}, {}/",
                report.rows,
                report.completed,
                report.total,
                report.layout.lesson_file.display(),
                report.layout.mapping_file.display(),
                report.layout.audio_dir_name()
            );
            Ok(())
        }
        Err(e) if e.severity() != Severity::Error => {
            info!("{}", e);
            Ok(())
        }
        Err(e) => {
            error!("{}", e.detail());
            Err(anyhow::anyhow!("lesson build failed: {}", e.detail()))
        }
    }
}
