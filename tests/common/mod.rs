//! Shared test utilities: a scripted stand-in for the mystem binary.
//!
//! The fake replays output recorded from mystem 3.1 for a few fixed inputs
//! and has trigger lines for failure modes:
//!
//! - `SPLIT`: prints half a response, pauses, prints the rest
//! - `STALL`: prints half a response and hangs
//! - `EOF`: prints half a response and exits
//! - `NOISE`: prints something that is not JSON
//! - `BYE`: answers, then exits
//! - `ARGS`: answers with its own argument vector
//!
//! Given a trailing file argument it analyzes that file line by line,
//! one JSON fragment per line, and exits.

#![allow(dead_code, unused_imports)]

use std::path::{Path, PathBuf};

use rsmystem::{AnalyzerSettings, Mode, Mystem, Options};
use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
entire=0
last=""
argv="$*"
for arg in "$@"; do
  [ "$arg" = "-c" ] && entire=1
  last=$arg
done

respond() {
  case "$1" in
    "Мама мыла раму")
      if [ $entire = 1 ]; then
        printf '%s\n' '[{"analysis":[{"lex":"мама","gr":"S,жен,од=им,ед"}],"text":"Мама"},{"text":" "},{"analysis":[{"lex":"мыть","gr":"V,несов,пе=прош,ед,изъяв,жен"}],"text":"мыла"},{"text":" "},{"analysis":[{"lex":"рама","gr":"S,жен,неод=вин,ед"}],"text":"раму"},{"text":"\n"}]'
      else
        printf '%s\n' '[{"analysis":[{"lex":"мама","gr":"S,жен,од=им,ед"}],"text":"Мама"},{"analysis":[{"lex":"мыть","gr":"V,несов,пе=прош,ед,изъяв,жен"}],"text":"мыла"},{"analysis":[{"lex":"рама","gr":"S,жен,неод=вин,ед"}],"text":"раму"}]'
      fi ;;
    SPLIT)
      printf '%s' '[{"text":"SP"},'
      sleep 1
      printf '%s\n' '{"text":"LIT"}]' ;;
    STALL)
      printf '%s' '[{"text":"ST"},'
      exec sleep 30 ;;
    EOF)
      printf '%s' '[{"text":"E"},'
      exit 0 ;;
    NOISE)
      printf '%s\n' 'Segmentation fault' ;;
    BYE)
      printf '%s\n' '[{"text":"BYE"}]'
      exit 0 ;;
    ARGS)
      printf '[{"text":"%s"}]\n' "$argv" ;;
    *)
      if [ -n "$(printf '%s' "$1" | tr -d ' \t')" ]; then
        if [ $entire = 1 ]; then
          printf '[{"analysis":[],"text":"%s"},{"text":"\\n"}]\n' "$1"
        else
          printf '[{"analysis":[],"text":"%s"}]\n' "$1"
        fi
      elif [ $entire = 1 ]; then
        printf '[{"text":"%s\\n"}]\n' "$1"
      else
        printf '[]\n'
      fi ;;
  esac
}

if [ -n "$last" ] && [ -f "$last" ]; then
  while IFS= read -r line || [ -n "$line" ]; do
    respond "$line"
  done < "$last"
  exit 0
fi

while IFS= read -r line; do
  respond "$line"
done
"#;

/// A temp directory holding the fake analyzer.
pub struct FakeMystem {
    dir: TempDir,
    binary: PathBuf,
}

impl FakeMystem {
    pub fn install() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let binary = write_executable(dir.path(), "mystem", SCRIPT);
        Self { dir, binary }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Session in the given mode with a short response timeout.
    pub fn session(&self, options: Options, mode: Mode) -> Mystem {
        let settings = AnalyzerSettings {
            mode,
            response_timeout_seconds: 2,
            ..AnalyzerSettings::default()
        };
        Mystem::with_binary(&self.binary, &options, &settings)
    }

    pub fn pipelined(&self, options: Options) -> Mystem {
        self.session(options, Mode::Pipelined)
    }
}

pub fn without_entire_input() -> Options {
    Options {
        entire_input: false,
        ..Options::default()
    }
}

/// Write a script file and make it executable.
pub fn write_executable(dir: &Path, name: &str, content: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write fake mystem");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to make fake mystem executable");
    path
}
