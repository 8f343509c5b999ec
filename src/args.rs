use clap::Parser;

use crate::error::BuildError;
use crate::lesson::RunConfig;
use crate::tts::{EDGE_VOICE, EdgeTts, GoogleTts};

/// Turn an Excel sheet into a lesson JSON plus gTTS and Edge TTS audio.
#[derive(Parser, Debug, Clone)]
#[command(name = "excel-lesson", version)]
pub struct Args {
    /// Spreadsheet to convert (prefills the form).
    #[clap(long)]
    pub input: Option<String>,

    /// Folder receiving the lesson files (prefills the form).
    #[clap(long)]
    pub output: Option<String>,

    /// Build straight away without opening a window.
    #[clap(long, requires_all = ["input", "output"])]
    pub headless: bool,

    #[clap(long, default_value = "en")]
    pub gtts_lang: String,

    #[clap(long, default_value = "com")]
    pub gtts_tld: String,

    /// Override the hosted speech endpoint.
    #[clap(long, env = "GTTS_ENDPOINT")]
    pub gtts_endpoint: Option<String>,

    /// edge-tts command, e.g. "edge-tts" or "python3 -m edge_tts".
    #[clap(long, env = "EDGE_TTS_BIN", default_value = "edge-tts")]
    pub edge_bin: String,

    #[clap(long, default_value = EDGE_VOICE)]
    pub edge_voice: String,

    #[clap(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn run_config(&self) -> Result<RunConfig, BuildError> {
        RunConfig::new(
            self.input.as_deref().unwrap_or_default(),
            self.output.as_deref().unwrap_or_default(),
        )
    }
}

/// The two synthesis backends used for every English text.
#[derive(Debug, Clone)]
pub struct Engines {
    pub hosted: GoogleTts,
    pub local: EdgeTts,
}

impl Engines {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let endpoint = args
            .gtts_endpoint
            .clone()
            .unwrap_or_else(|| GoogleTts::default_endpoint(&args.gtts_tld));
        Ok(Self {
            hosted: GoogleTts::new(endpoint, args.gtts_lang.clone()),
            local: EdgeTts::new(args.edge_bin.split_whitespace(), args.edge_voice.clone())?,
        })
    }
}
