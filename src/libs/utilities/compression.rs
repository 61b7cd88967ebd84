// Archive extraction for downloaded toolchains.
//
// The supported formats are the ones real toolchain distributions ship in:
// .zip (Maven, JDK builds), .tar.gz (Oracle JDK), .tar.xz (Node.js),
// .tar.bz2 and plain .tar (older mirrors), plus single-file .gz payloads.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use colored::Colorize;
use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;
use zip::ZipArchive;

use crate::errors::{BootstrapError, Result};
use crate::log_debug;

/// Determines the archive type from the file name. Compound extensions are
/// checked before their suffixes so `.tar.gz` never classifies as `.gz`.
pub fn detect_archive_type(path: &Path) -> &'static str {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return "unknown";
    };
    let name = name.to_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        "tar.gz"
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        "tar.xz"
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz") || name.ends_with(".tbz2") {
        "tar.bz2"
    } else if name.ends_with(".zip") {
        "zip"
    } else if name.ends_with(".tar") {
        "tar"
    } else if name.ends_with(".gz") {
        "gz"
    } else {
        "unknown"
    }
}

/// Extracts `src` into `dest` (created if necessary) and reports the
/// extraction root: when every entry sits under exactly one common top-level
/// directory, that directory is returned so callers can rename a versioned
/// root like `apache-maven-3.9.9` to a stable name; otherwise `dest` itself.
pub fn extract_archive(src: &Path, dest: &Path) -> Result<PathBuf> {
    log_debug!(
        "[Archive] Extracting {} into {}",
        src.display().to_string().blue(),
        dest.display().to_string().cyan()
    );
    fs::create_dir_all(dest)?;

    let archive_type = detect_archive_type(src);
    let result: io::Result<()> = match archive_type {
        "zip" => extract_zip(src, dest),
        "tar.gz" => unpack_tar(GzDecoder::new(File::open(src)?), dest),
        "tar.xz" => unpack_tar(XzDecoder::new(File::open(src)?), dest),
        "tar.bz2" => unpack_tar(BzDecoder::new(File::open(src)?), dest),
        "tar" => unpack_tar(File::open(src)?, dest),
        "gz" => decompress_single_gz(src, dest),
        other => {
            return Err(BootstrapError::Extraction {
                archive: src.to_path_buf(),
                reason: format!("unsupported archive type '{}'", other),
            });
        }
    };

    result.map_err(|err| BootstrapError::Extraction {
        archive: src.to_path_buf(),
        reason: err.to_string(),
    })?;

    log_debug!("[Archive] Extraction finished for {}", src.display());
    extraction_root(dest)
}

fn extract_zip(src: &Path, dest: &Path) -> io::Result<()> {
    let file = File::open(src)?;
    let mut archive = ZipArchive::new(file).map_err(io::Error::other)?;
    archive.extract(dest).map_err(io::Error::other)
}

fn unpack_tar<R: io::Read>(reader: R, dest: &Path) -> io::Result<()> {
    Archive::new(reader).unpack(dest)
}

/// A plain `.gz` holds a single compressed file, not a tar stream; the
/// payload lands in `dest` under the source name minus its extension.
fn decompress_single_gz(src: &Path, dest: &Path) -> io::Result<()> {
    let mut decoder = GzDecoder::new(File::open(src)?);
    let output_path = dest.join(src.file_stem().unwrap_or_default());
    let mut output = File::create(output_path)?;
    io::copy(&mut decoder, &mut output)?;
    Ok(())
}

/// The single common top-level directory of `dest`, when there is exactly
/// one; otherwise `dest` itself.
fn extraction_root(dest: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(dest)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect::<Vec<_>>();

    if entries.len() == 1 {
        let only = entries.remove(0);
        if only.is_dir() {
            return Ok(only);
        }
    }
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn build_source_tree(root: &Path, top_level: &str) -> PathBuf {
        let tree = root.join(top_level);
        fs::create_dir_all(tree.join("bin")).unwrap();
        fs::write(tree.join("bin/tool"), b"#!/bin/sh\n").unwrap();
        fs::write(tree.join("README"), b"hello\n").unwrap();
        tree
    }

    fn build_tar_gz(archive: &Path, source: &Path, top_level: &str) {
        let file = File::create(archive).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(top_level, source).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn detects_compound_extensions_before_simple_ones() {
        assert_eq!(detect_archive_type(Path::new("jdk.tar.gz")), "tar.gz");
        assert_eq!(detect_archive_type(Path::new("node.tar.xz")), "tar.xz");
        assert_eq!(detect_archive_type(Path::new("x.tar.bz2")), "tar.bz2");
        assert_eq!(detect_archive_type(Path::new("maven.zip")), "zip");
        assert_eq!(detect_archive_type(Path::new("data.tar")), "tar");
        assert_eq!(detect_archive_type(Path::new("single.gz")), "gz");
        assert_eq!(detect_archive_type(Path::new("setup.exe")), "unknown");
    }

    #[test]
    fn tar_gz_with_single_root_reports_that_root() {
        let workspace = tempfile::tempdir().unwrap();
        let source = build_source_tree(workspace.path(), "src-tree");
        let archive = workspace.path().join("apache-maven-3.9.9-bin.tar.gz");
        build_tar_gz(&archive, &source, "apache-maven-3.9.9");

        let dest = workspace.path().join("out");
        let root = extract_archive(&archive, &dest).unwrap();
        assert_eq!(root, dest.join("apache-maven-3.9.9"));
        assert!(root.join("bin/tool").exists());
    }

    #[test]
    fn zip_with_multiple_top_level_entries_reports_dest() {
        let workspace = tempfile::tempdir().unwrap();
        let archive = workspace.path().join("flat.zip");

        let file = File::create(&archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        zip.start_file("one.txt", options).unwrap();
        zip.write_all(b"one").unwrap();
        zip.start_file("two.txt", options).unwrap();
        zip.write_all(b"two").unwrap();
        zip.finish().unwrap();

        let dest = workspace.path().join("out");
        let root = extract_archive(&archive, &dest).unwrap();
        assert_eq!(root, dest);
        assert!(dest.join("one.txt").exists());
        assert!(dest.join("two.txt").exists());
    }

    #[test]
    fn zip_with_single_root_directory_reports_that_root() {
        let workspace = tempfile::tempdir().unwrap();
        let archive = workspace.path().join("tool.zip");

        let file = File::create(&archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        zip.add_directory("tool-1.0", options).unwrap();
        zip.start_file("tool-1.0/main.txt", options).unwrap();
        zip.write_all(b"payload").unwrap();
        zip.finish().unwrap();

        let dest = workspace.path().join("out");
        let root = extract_archive(&archive, &dest).unwrap();
        assert_eq!(root, dest.join("tool-1.0"));
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let workspace = tempfile::tempdir().unwrap();
        let archive = workspace.path().join("broken.tar.gz");
        fs::write(&archive, b"this is not gzip data").unwrap();

        let dest = workspace.path().join("out");
        let err = extract_archive(&archive, &dest).unwrap_err();
        assert!(matches!(err, BootstrapError::Extraction { .. }));
    }

    #[test]
    fn unsupported_type_is_an_extraction_error() {
        let workspace = tempfile::tempdir().unwrap();
        let archive = workspace.path().join("installer.dmg");
        fs::write(&archive, b"whatever").unwrap();

        let err = extract_archive(&archive, workspace.path()).unwrap_err();
        assert!(matches!(err, BootstrapError::Extraction { .. }));
    }
}
