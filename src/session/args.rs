use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Options;

/// Binary plus the argument vector the analyzer is started with.
///
/// Owns the session-lifetime constants; every process the session spawns
/// is launched from the same `Launch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    binary: PathBuf,
    args: Vec<OsString>,
}

impl Launch {
    pub fn new(binary: impl Into<PathBuf>, options: &Options) -> Self {
        Self {
            binary: binary.into(),
            args: build_args(options),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Full argument vector, binary first.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.binary.clone().into_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Command with piped stdin/stdout; `input` is appended as the final
    /// argument when the analyzer should read a file instead of stdin.
    pub(crate) fn command(&self, input: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(input) = input {
            cmd.arg(input);
        }
        cmd
    }
}

/// Map options onto mystem's command line.
///
/// The order is stable: `--format json`, then `-i -g -d -c -w -s --weight
/// --generate-all --fixlist <path> --eng-gr` for whichever are enabled.
pub fn build_args(options: &Options) -> Vec<OsString> {
    let mut args = vec![OsString::from("--format"), OsString::from("json")];

    let flags = [
        (options.grammar_info, "-i"),
        (options.glue_grammar_info, "-g"),
        (options.disambiguation, "-d"),
        (options.entire_input, "-c"),
        (options.no_bastards, "-w"),
        (options.end_of_sentence, "-s"),
        (options.weight, "--weight"),
        (options.generate_all, "--generate-all"),
    ];
    args.extend(
        flags
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| OsString::from(*flag)),
    );

    if let Some(fixlist) = &options.fixlist {
        args.push(OsString::from("--fixlist"));
        args.push(fixlist.clone().into_os_string());
    }
    if options.use_english_names {
        args.push(OsString::from("--eng-gr"));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        assert_eq!(
            build_args(&Options::default()),
            vec!["--format", "json", "-i", "-g", "-d", "-c"]
        );
    }

    #[test]
    fn everything_enabled_keeps_order() {
        let options = Options {
            weight: true,
            generate_all: true,
            no_bastards: true,
            end_of_sentence: true,
            fixlist: Some(PathBuf::from("/tmp/fix.txt")),
            use_english_names: true,
            ..Options::default()
        };
        assert_eq!(
            build_args(&options),
            vec![
                "--format",
                "json",
                "-i",
                "-g",
                "-d",
                "-c",
                "-w",
                "-s",
                "--weight",
                "--generate-all",
                "--fixlist",
                "/tmp/fix.txt",
                "--eng-gr",
            ]
        );
    }

    #[test]
    fn everything_disabled() {
        let options = Options {
            grammar_info: false,
            glue_grammar_info: false,
            disambiguation: false,
            entire_input: false,
            ..Options::default()
        };
        assert_eq!(build_args(&options), vec!["--format", "json"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_fixlist_is_passed_through() {
        use std::os::unix::ffi::OsStrExt;

        let raw = std::ffi::OsStr::from_bytes(b"/tmp/fix\xff.txt");
        let options = Options {
            fixlist: Some(PathBuf::from(raw)),
            ..Options::default()
        };
        let args = build_args(&options);
        let at = args.iter().position(|a| a == "--fixlist").unwrap();
        assert_eq!(args[at + 1].as_os_str(), raw);
    }

    #[test]
    fn argv_starts_with_binary() {
        let launch = Launch::new("/opt/mystem", &Options::default());
        let argv = launch.argv();
        assert_eq!(argv[0], OsString::from("/opt/mystem"));
        assert_eq!(argv.len(), 1 + launch.args().len());
    }
}
