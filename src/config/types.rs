use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    #[serde(default)]
    pub options: Options,
}

/// How requests travel to the analyzer process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pipelined where the platform supports non-blocking pipes,
    /// synchronous elsewhere.
    #[default]
    Auto,
    /// One long-lived process, one request per line.
    Pipelined,
    /// One process per request, output collected until exit.
    Synchronous,
}

impl Mode {
    /// Resolve `Auto` against the host platform.
    pub fn effective(self) -> Mode {
        match self {
            Mode::Auto if cfg!(unix) => Mode::Pipelined,
            Mode::Auto => Mode::Synchronous,
            other => other,
        }
    }
}

/// Where the analyzer lives and how the session drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Explicit path to the mystem binary.
    #[serde(default)]
    pub binary: Option<PathBuf>,
    /// Directory the binary is installed into when nothing else is found.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
    /// Download the binary on first use if it is missing (default: true).
    #[serde(default = "default_autoinstall")]
    pub autoinstall: bool,
    #[serde(default)]
    pub mode: Mode,
    /// How long to wait for more output once a response has started
    /// (default: 30).
    #[serde(default = "default_response_timeout")]
    pub response_timeout_seconds: u64,
}

/// Flags passed to the analyzer at startup.
///
/// Fixed for the lifetime of a session; changing them means building a new
/// [`Mystem`](crate::Mystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Print grammatical information (`-i`).
    #[serde(default = "default_true")]
    pub grammar_info: bool,
    /// Glue grammatical information for identical lemmas (`-g`).
    #[serde(default = "default_true")]
    pub glue_grammar_info: bool,
    /// Apply contextual disambiguation (`-d`).
    #[serde(default = "default_true")]
    pub disambiguation: bool,
    /// Copy the entire input to the output, whitespace included (`-c`).
    #[serde(default = "default_true")]
    pub entire_input: bool,
    /// Print context-independent lemma weight (`--weight`).
    #[serde(default)]
    pub weight: bool,
    /// Generate every hypothesis for non-dictionary words (`--generate-all`).
    #[serde(default)]
    pub generate_all: bool,
    /// Print dictionary words only (`-w`).
    #[serde(default)]
    pub no_bastards: bool,
    /// Mark sentence ends, needs `entire_input` (`-s`).
    #[serde(default)]
    pub end_of_sentence: bool,
    /// Supplementary dictionary (`--fixlist <path>`).
    #[serde(default)]
    pub fixlist: Option<PathBuf>,
    /// English grammeme names (`--eng-gr`).
    #[serde(default)]
    pub use_english_names: bool,
}

fn default_true() -> bool {
    true
}

fn default_autoinstall() -> bool {
    true
}

fn default_response_timeout() -> u64 {
    30
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            binary: None,
            install_dir: None,
            autoinstall: true,
            mode: Mode::Auto,
            response_timeout_seconds: 30,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            grammar_info: true,
            glue_grammar_info: true,
            disambiguation: true,
            entire_input: true,
            weight: false,
            generate_all: false,
            no_bastards: false,
            end_of_sentence: false,
            fixlist: None,
            use_english_names: false,
        }
    }
}
