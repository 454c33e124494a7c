use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rsmystem::{Config, Locator, Mode, Mystem};

#[derive(Debug, Parser)]
#[command(
    name = "rsmystem",
    version,
    about = "Run text through the Yandex Mystem morphological analyzer"
)]
struct Cli {
    /// Config file (default: ~/.config/rsmystem/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the mystem binary
    #[arg(long, global = true)]
    mystem_bin: Option<PathBuf>,

    /// Do not print grammatical information
    #[arg(long, global = true)]
    no_grammar_info: bool,

    /// Do not glue grammatical information for identical lemmas
    #[arg(long, global = true)]
    no_glue: bool,

    /// Do not apply contextual disambiguation
    #[arg(long, global = true)]
    no_disambiguation: bool,

    /// Drop whitespace and punctuation from the output
    #[arg(long, global = true)]
    no_entire_input: bool,

    /// Print context-independent lemma weight
    #[arg(long, global = true)]
    weight: bool,

    /// Generate all hypotheses for non-dictionary words
    #[arg(long, global = true)]
    generate_all: bool,

    /// Print dictionary words only
    #[arg(long, global = true)]
    dictionary_only: bool,

    /// Mark sentence ends
    #[arg(long, global = true)]
    end_of_sentence: bool,

    /// Supplementary dictionary file
    #[arg(long, global = true)]
    fixlist: Option<PathBuf>,

    /// English grammeme names
    #[arg(long, global = true)]
    english: bool,

    /// Start a new analyzer for every line
    #[arg(long, global = true)]
    sync: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download mystem, overwriting any installed copy
    Install {
        /// Target directory (default: $MYSTEM_DIR or ~/.local/bin)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the binary path that would be used
    Locate,
    /// Print the JSON analysis of each stdin line (default)
    Analyze,
    /// Print the lemmas of each stdin line
    Lemmatize,
}

impl Cli {
    /// Layer command-line flags over the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(bin) = &self.mystem_bin {
            config.analyzer.binary = Some(bin.clone());
        }
        if self.sync {
            config.analyzer.mode = Mode::Synchronous;
        }

        let options = &mut config.options;
        options.grammar_info &= !self.no_grammar_info;
        options.glue_grammar_info &= !self.no_glue;
        options.disambiguation &= !self.no_disambiguation;
        options.entire_input &= !self.no_entire_input;
        options.weight |= self.weight;
        options.generate_all |= self.generate_all;
        options.no_bastards |= self.dictionary_only;
        options.end_of_sentence |= self.end_of_sentence;
        options.use_english_names |= self.english;
        if let Some(fixlist) = &self.fixlist {
            options.fixlist = Some(fixlist.clone());
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply(&mut config);
    config.validate()?;

    match cli.command {
        Some(Command::Install { dir }) => install(&config, dir),
        Some(Command::Locate) => {
            let mystem = Mystem::from_config(&config)?;
            println!("{}", mystem.binary().display());
            Ok(())
        }
        Some(Command::Lemmatize) => run(&config, Output::Lemmas),
        Some(Command::Analyze) => run(&config, Output::Json),
        None => {
            if io::stdin().is_terminal() {
                let mystem = Mystem::from_config(&config)?;
                eprintln!("mystem is placed in {}", mystem.binary().display());
                return Ok(());
            }
            run(&config, Output::Json)
        }
    }
}

fn install(config: &Config, dir: Option<PathBuf>) -> Result<()> {
    let mut locator = Locator::from_env();
    if let Some(install_dir) = &config.analyzer.install_dir {
        locator = locator.with_install_dir(install_dir);
    }
    let destination = dir.unwrap_or_else(|| locator.install_dir().to_path_buf());
    let binary = locator
        .install(&destination)
        .with_context(|| format!("installing mystem into {}", destination.display()))?;
    eprintln!("mystem is placed in {}", binary.display());
    Ok(())
}

#[derive(Clone, Copy)]
enum Output {
    Json,
    Lemmas,
}

fn run(config: &Config, output: Output) -> Result<()> {
    let mut mystem = Mystem::from_config(config)?;
    tracing::info!(binary = %mystem.binary().display(), "Using mystem");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let text = line.trim();
        match output {
            Output::Json => {
                let records = mystem.analyze(text)?;
                serde_json::to_writer_pretty(&mut out, &records)?;
                writeln!(out)?;
            }
            Output::Lemmas => {
                let lemmas = mystem.lemmatize(text)?;
                if config.options.entire_input {
                    write!(out, "{}", lemmas.concat())?;
                } else {
                    writeln!(out, "{}", lemmas.join(" "))?;
                }
            }
        }
        out.flush()?;
    }
    mystem.close()?;
    Ok(())
}
