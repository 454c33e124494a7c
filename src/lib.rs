//! Pipe-driven binding for the Yandex Mystem morphological analyzer.
//!
//! The analyzer runs as a child process. [`Mystem`] owns that process, feeds
//! it one line of text per request and parses the JSON it prints back into
//! [`Record`]s.
//!
//! ```no_run
//! use rsmystem::{Mystem, Options};
//!
//! # fn main() -> Result<(), rsmystem::MystemError> {
//! let mut mystem = Mystem::new(Options::default())?;
//! let lemmas = mystem.lemmatize("Мама мыла раму")?;
//! assert_eq!(lemmas, ["мама", " ", "мыть", " ", "рама", "\n"]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod locator;
pub mod record;
pub mod session;

pub use config::{AnalyzerSettings, Config, ConfigError, Mode, Options};
pub use error::{InstallError, MystemError};
pub use locator::{ArchiveTable, Locator};
pub use record::{Analysis, Record};
pub use session::Mystem;
