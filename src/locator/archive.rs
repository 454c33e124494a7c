//! Download table and archive extraction for the mystem distribution.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::EXE_NAME;
use crate::error::InstallError;

const CDN: &str = "http://download.cdn.yandex.net/mystem";

/// A published archive for one OS, optionally tied to a pointer width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Prefix of `std::env::consts::OS`.
    pub os: String,
    /// `None` when the archive runs on every pointer width.
    pub bits: Option<u32>,
    pub url: String,
}

impl ArchiveEntry {
    pub fn new(os: &str, bits: Option<u32>, url: impl Into<String>) -> Self {
        Self {
            os: os.to_string(),
            bits,
            url: url.into(),
        }
    }
}

/// OS / pointer-width to archive URL mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTable {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveTable {
    pub fn new(entries: Vec<ArchiveEntry>) -> Self {
        Self { entries }
    }

    /// URL of the archive for `os` at `bits` pointer width.
    pub fn lookup(&self, os: &str, bits: u32) -> Result<&str, InstallError> {
        self.entries
            .iter()
            .filter(|e| os.starts_with(e.os.as_str()))
            .find(|e| e.bits.is_none_or(|b| b == bits))
            .map(|e| e.url.as_str())
            .ok_or_else(|| InstallError::UnsupportedPlatform {
                os: os.to_string(),
                bits,
            })
    }

    /// URL of the archive for the running host.
    pub fn for_host(&self) -> Result<&str, InstallError> {
        self.lookup(std::env::consts::OS, usize::BITS)
    }
}

impl Default for ArchiveTable {
    fn default() -> Self {
        Self::new(vec![
            ArchiveEntry::new("linux", Some(32), format!("{CDN}/mystem-3.0-linux3.5-32bit.tar.gz")),
            ArchiveEntry::new("linux", Some(64), format!("{CDN}/mystem-3.1-linux-64bit.tar.gz")),
            ArchiveEntry::new("macos", None, format!("{CDN}/mystem-3.1-macosx.tar.gz")),
            ArchiveEntry::new("windows", Some(32), format!("{CDN}/mystem-3.0-win7-32bit.zip")),
            ArchiveEntry::new("windows", Some(64), format!("{CDN}/mystem-3.1-win-64bit.zip")),
            ArchiveEntry::new("freebsd", Some(64), format!("{CDN}/mystem-3.0-freebsd9.0-64bit.tar.gz")),
        ])
    }
}

/// Container format, picked from the URL suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn from_url(url: &str) -> Option<Self> {
        if url.ends_with(".tar.gz") || url.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if url.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// Extract only the analyzer executable from `archive` into `destination`.
///
/// Returns the path of the extracted binary.
pub fn extract_binary<R: Read + Seek>(
    kind: ArchiveKind,
    archive: R,
    destination: &Path,
) -> io::Result<PathBuf> {
    let target = destination.join(EXE_NAME);
    let found = match kind {
        ArchiveKind::TarGz => extract_from_tar(archive, &target)?,
        ArchiveKind::Zip => extract_from_zip(archive, &target)?,
    };
    if !found {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("archive does not contain {EXE_NAME}"),
        ));
    }
    Ok(target)
}

fn is_analyzer(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == EXE_NAME)
}

fn extract_from_tar<R: Read>(archive: R, target: &Path) -> io::Result<bool> {
    let mut tar = tar::Archive::new(GzDecoder::new(archive));
    for entry in tar.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_file() && is_analyzer(&entry.path()?) {
            entry.unpack(target)?;
            return Ok(true);
        }
    }
    Ok(false)
}

fn extract_from_zip<R: Read + Seek>(archive: R, target: &Path) -> io::Result<bool> {
    let mut zip = zip::ZipArchive::new(archive).map_err(io::Error::other)?;
    for index in 0..zip.len() {
        let mut file = zip.by_index(index).map_err(io::Error::other)?;
        let matches = file.is_file() && file.enclosed_name().is_some_and(|p| is_analyzer(&p));
        if matches {
            let mut out = File::create(target)?;
            io::copy(&mut file, &mut out)?;
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn lookup_matches_os_and_width() {
        let table = ArchiveTable::default();
        assert!(table.lookup("linux", 64).unwrap().ends_with("linux-64bit.tar.gz"));
        assert!(table.lookup("linux", 32).unwrap().ends_with("32bit.tar.gz"));
        assert!(table.lookup("windows", 64).unwrap().ends_with(".zip"));
    }

    #[test]
    fn lookup_ignores_width_for_macos() {
        let table = ArchiveTable::default();
        assert_eq!(table.lookup("macos", 64).unwrap(), table.lookup("macos", 32).unwrap());
    }

    #[test]
    fn lookup_rejects_unknown_platform() {
        let table = ArchiveTable::default();
        assert!(matches!(
            table.lookup("freebsd", 32),
            Err(InstallError::UnsupportedPlatform { bits: 32, .. })
        ));
        assert!(matches!(
            table.lookup("haiku", 64),
            Err(InstallError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn archive_kind_from_url() {
        assert_eq!(ArchiveKind::from_url("a/mystem.tar.gz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::from_url("a/mystem.zip"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_url("a/mystem.rar"), None);
    }

    fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_only_the_binary_from_tar() {
        let dir = tempfile::tempdir().unwrap();
        let archive = tar_gz(&[("README", b"docs"), (EXE_NAME, b"#!/bin/sh\n")]);

        let path = extract_binary(ArchiveKind::TarGz, Cursor::new(archive), dir.path()).unwrap();

        assert_eq!(path, dir.path().join(EXE_NAME));
        assert_eq!(std::fs::read(&path).unwrap(), b"#!/bin/sh\n");
        assert!(!dir.path().join("README").exists());
    }

    #[test]
    fn extracts_only_the_binary_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let name = format!("bin/{EXE_NAME}");
        let archive = zip(&[("LICENSE", b"text"), (name.as_str(), b"MZ")]);

        let path = extract_binary(ArchiveKind::Zip, Cursor::new(archive), dir.path()).unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"MZ");
        assert!(!dir.path().join("LICENSE").exists());
    }

    #[test]
    fn missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = tar_gz(&[("README", b"docs")]);
        let err = extract_binary(ArchiveKind::TarGz, Cursor::new(archive), dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
