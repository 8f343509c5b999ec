use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::progress::{Progress, ProgressTracker, count_tasks};
use crate::spreadsheet::{Row, read_rows};
use crate::tts::{Engine, SynthesisOutcome, Synthesizer, attempt};

pub const LANG: &str = "en";

/// Validated inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl RunConfig {
    pub fn new(input: &str, output: &str) -> Result<Self, BuildError> {
        let input = input.trim();
        let output = output.trim();
        if input.is_empty() {
            return Err(BuildError::MissingInput);
        }
        if output.is_empty() {
            return Err(BuildError::MissingOutput);
        }
        Ok(Self {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
        })
    }

    /// Input file name without its extension.
    pub fn lesson_name(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "lesson".to_string())
    }
}

/// Which English column a text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    #[serde(rename = "en")]
    Front,
    #[serde(rename = "ex_en")]
    Example,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Front => "en",
            FieldKind::Example => "ex_en",
        }
    }
}

/// Where a run writes its three artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub lesson_file: PathBuf,
    pub mapping_file: PathBuf,
    pub audio_dir: PathBuf,
    audio_dir_name: String,
}

impl OutputLayout {
    pub fn new(config: &RunConfig) -> Self {
        let name = config.lesson_name();
        let audio_dir_name = format!("audio_{}", name);
        Self {
            lesson_file: config.output.join(format!("{}.json", name)),
            mapping_file: config.output.join(format!("mapping_{}.json", name)),
            audio_dir: config.output.join(&audio_dir_name),
            audio_dir_name,
        }
    }

    pub fn audio_dir_name(&self) -> &str {
        &self.audio_dir_name
    }

    pub fn audio_file_name(engine: Engine, kind: FieldKind, row: usize) -> String {
        format!("{}_{}_{}.mp3", engine.prefix(), kind.as_str(), row)
    }

    pub fn audio_path(&self, file_name: &str) -> PathBuf {
        self.audio_dir.join(file_name)
    }

    /// Path as recorded in the mapping file, relative to the output folder.
    pub fn relative_audio(&self, file_name: &str) -> String {
        format!("{}/{}", self.audio_dir_name, file_name)
    }
}

/// Links one text to one synthesized audio file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingEntry {
    pub id: String,
    pub text: String,
    pub file: String,
    pub lang: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub engine: Engine,
    pub voice: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub row: usize,
    pub kind: FieldKind,
    pub engine: Engine,
    pub outcome: SynthesisOutcome,
}

#[derive(Debug, Default)]
pub struct Assembly {
    pub mapping: Vec<MappingEntry>,
    pub attempts: Vec<AttemptRecord>,
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub layout: OutputLayout,
    pub rows: usize,
    pub total: usize,
    /// Attempts that finished, successful or not.
    pub completed: usize,
    pub attempts: Vec<AttemptRecord>,
    pub mapping_entries: usize,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, SynthesisOutcome::Failed(_)))
    }

    /// Text of the success dialog.
    pub fn summary(&self) -> String {
        let mut msg = format!(
            "✔ Lesson created successfully!\n\n- {}\n- {}\n- {}/",
            self.layout.lesson_file.display(),
            self.layout.mapping_file.display(),
            self.layout.audio_dir_name(),
        );
        let failed = self.failures().count();
        if failed > 0 {
            msg.push_str(&format!("\n\n{} of {} audio files could not be generated.", failed, self.total));
        }
        msg
    }
}

/// Reads the spreadsheet, synthesizes every English text with both engines and
/// writes the lesson, mapping and audio folder. Always ends by sending
/// `Progress::Reset`.
pub async fn build<A, B>(
    config: &RunConfig,
    hosted: &A,
    local: &B,
    progress: UnboundedSender<Progress>,
) -> Result<RunReport, BuildError>
where
    A: Synthesizer,
    B: Synthesizer,
{
    info!(
        "Building lesson from {} into {}",
        config.input.display(),
        config.output.display()
    );
    let result = match read_rows(&config.input) {
        Ok(rows) => build_from_rows(config, rows, hosted, local, &progress).await,
        Err(e) => Err(e),
    };
    let _ = progress.send(Progress::Reset);
    result
}

pub(crate) async fn build_from_rows<A, B>(
    config: &RunConfig,
    rows: Vec<Row>,
    hosted: &A,
    local: &B,
    progress: &UnboundedSender<Progress>,
) -> Result<RunReport, BuildError>
where
    A: Synthesizer,
    B: Synthesizer,
{
    let total = count_tasks(&rows);
    if total == 0 {
        info!("No English text found; nothing to synthesize");
        return Err(BuildError::NothingToDo);
    }

    let layout = OutputLayout::new(config);
    fs::create_dir_all(&layout.audio_dir).map_err(|e| BuildError::io(&layout.audio_dir, e))?;
    info!("{} rows, {} synthesis tasks", rows.len(), total);

    let mut tracker = ProgressTracker::start(total, progress.clone());
    let assembly = assemble(&rows, &layout, hosted, local, &mut tracker).await;
    write_outputs(&layout, &rows, &assembly.mapping)?;

    let report = RunReport {
        rows: rows.len(),
        total,
        completed: tracker.done(),
        mapping_entries: assembly.mapping.len(),
        attempts: assembly.attempts,
        layout,
    };
    info!(
        "Lesson written: {} mapping entries, {} failed attempts",
        report.mapping_entries,
        report.failures().count()
    );
    Ok(report)
}

/// Synthesizes rows strictly in order: per row the front text then the
/// example, per text the hosted engine then the local one.
pub async fn assemble<A, B>(
    rows: &[Row],
    layout: &OutputLayout,
    hosted: &A,
    local: &B,
    tracker: &mut ProgressTracker,
) -> Assembly
where
    A: Synthesizer,
    B: Synthesizer,
{
    let mut assembly = Assembly::default();
    for (i, row) in rows.iter().enumerate() {
        for (text, kind) in [(row.front(), FieldKind::Front), (row.example(), FieldKind::Example)] {
            if text.trim().is_empty() {
                continue;
            }
            debug!(row = i, kind = kind.as_str(), "synthesizing {:?}", text);
            synthesize_field(hosted, layout, i, kind, text, tracker, &mut assembly).await;
            synthesize_field(local, layout, i, kind, text, tracker, &mut assembly).await;
        }
    }
    assembly
}

async fn synthesize_field<S: Synthesizer>(
    synth: &S,
    layout: &OutputLayout,
    row: usize,
    kind: FieldKind,
    text: &str,
    tracker: &mut ProgressTracker,
    assembly: &mut Assembly,
) {
    let engine = synth.engine();
    let file_name = OutputLayout::audio_file_name(engine, kind, row);
    let outcome = attempt(synth, text, &layout.audio_path(&file_name)).await;
    if let SynthesisOutcome::Written(_) = outcome {
        assembly.mapping.push(MappingEntry {
            id: format!("{}_{}", kind.as_str(), row),
            text: text.to_string(),
            file: layout.relative_audio(&file_name),
            lang: LANG.to_string(),
            kind,
            engine,
            voice: synth.voice().to_string(),
        });
    }
    assembly.attempts.push(AttemptRecord {
        row,
        kind,
        engine,
        outcome,
    });
    tracker.advance();
}

pub fn write_outputs(layout: &OutputLayout, rows: &[Row], mapping: &[MappingEntry]) -> Result<(), BuildError> {
    write_json(&layout.lesson_file, &rows)?;
    write_json(&layout.mapping_file, &mapping)?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), BuildError> {
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data).map_err(|e| {
        warn!("Failed to write {}: {}", path.display(), e);
        BuildError::io(path, e)
    })?;
    info!("Wrote {}", path.display());
    Ok(())
}
