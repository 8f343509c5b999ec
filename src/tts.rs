use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use reqwest::header::{REFERER, USER_AGENT};
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::utils::chunk_text;

pub const GTTS_VOICE: &str = "Female US (gTTS)";
pub const EDGE_VOICE: &str = "en-US-GuyNeural";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Engine {
    #[serde(rename = "gTTS")]
    Gtts,
    #[serde(rename = "Edge")]
    Edge,
}

impl Engine {
    /// File name prefix of this engine's audio files.
    pub fn prefix(self) -> &'static str {
        match self {
            Engine::Gtts => "gtts",
            Engine::Edge => "edge",
        }
    }
}

/// A text-to-speech backend that writes one MP3 file per call.
pub trait Synthesizer: Send + Sync {
    fn engine(&self) -> Engine;

    /// Voice label recorded in the mapping file.
    fn voice(&self) -> &str;

    fn synthesize(&self, text: &str, dest: &Path) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// Result of one best-effort synthesis attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Written(PathBuf),
    Skipped,
    Failed(String),
}

/// Runs one synthesis attempt and never fails: blank text is skipped and
/// errors are captured as `Failed`. A failed attempt leaves no file behind.
pub async fn attempt<S: Synthesizer>(synth: &S, text: &str, dest: &Path) -> SynthesisOutcome {
    if text.trim().is_empty() {
        return SynthesisOutcome::Skipped;
    }
    match synth.synthesize(text, dest).await {
        Ok(()) => {
            debug!(engine = ?synth.engine(), dest = %dest.display(), "synthesized");
            SynthesisOutcome::Written(dest.to_path_buf())
        }
        Err(e) => {
            warn!(engine = ?synth.engine(), dest = %dest.display(), "synthesis failed: {:#}", e);
            let _ = tokio::fs::remove_file(dest).await;
            SynthesisOutcome::Failed(format!("{:#}", e))
        }
    }
}

/// Engine A: Google Translate's hosted speech endpoint, the service behind gTTS.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    lang: String,
}

impl GoogleTts {
    /// Longest text the endpoint accepts per request.
    pub const MAX_CHARS: usize = 100;

    pub fn new(endpoint: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            lang: lang.into(),
        }
    }

    pub fn default_endpoint(tld: &str) -> String {
        format!("https://translate.google.{}/translate_tts", tld)
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> anyhow::Result<Vec<u8>> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        let query = [
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("tl", self.lang.as_str()),
            ("q", chunk),
            ("idx", idx.as_str()),
            ("total", total.as_str()),
            ("textlen", textlen.as_str()),
        ];
        let bytes = self
            .client
            .get(&self.endpoint)
            .header(USER_AGENT, "Mozilla/5.0 (excel-lesson)")
            .header(REFERER, "http://translate.google.com/")
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        if bytes.is_empty() {
            anyhow::bail!("empty audio response for chunk {}", idx);
        }
        Ok(bytes.to_vec())
    }
}

impl Synthesizer for GoogleTts {
    fn engine(&self) -> Engine {
        Engine::Gtts
    }

    fn voice(&self) -> &str {
        GTTS_VOICE
    }

    async fn synthesize(&self, text: &str, dest: &Path) -> anyhow::Result<()> {
        let chunks = chunk_text(text, Self::MAX_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("no speakable text");
        }
        // MP3 frames concatenate cleanly, so the chunks are written back to back.
        let mut audio = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let bytes = self
                .fetch_chunk(chunk, i, chunks.len())
                .await
                .with_context(|| format!("gTTS request {}/{} failed", i + 1, chunks.len()))?;
            audio.extend_from_slice(&bytes);
        }
        tokio::fs::write(dest, &audio)
            .await
            .with_context(|| format!("writing {}", dest.display()))?;
        Ok(())
    }
}

/// Engine B: the `edge-tts` command line tool, run once per text.
#[derive(Debug, Clone)]
pub struct EdgeTts {
    program: String,
    leading_args: Vec<String>,
    voice: String,
}

impl EdgeTts {
    /// `command` is the program followed by any fixed arguments, e.g.
    /// `["python3", "-m", "edge_tts"]`.
    pub fn new<I, S>(command: I, voice: impl Into<String>) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = command.into_iter().map(Into::into);
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .context("edge-tts command is empty")?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
            voice: voice.into(),
        })
    }
}

impl Synthesizer for EdgeTts {
    fn engine(&self) -> Engine {
        Engine::Edge
    }

    fn voice(&self) -> &str {
        &self.voice
    }

    async fn synthesize(&self, text: &str, dest: &Path) -> anyhow::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .args(["--voice", self.voice.as_str()])
            // One token, so text starting with '-' is not read as an option.
            .arg(format!("--text={}", text))
            .arg("--write-media")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .with_context(|| format!("failed to spawn {}", self.program))?;

        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}
