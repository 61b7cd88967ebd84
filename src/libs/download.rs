// The download/verify/extract pipeline every toolchain installer rides on.
//
// Bytes are streamed to disk while a SHA-256 digest is computed on the fly;
// a pinned digest that does not match deletes the partial file before the
// error is returned, so a corrupt archive can never sit on disk looking like
// a finished download. Mirror lists are walked on download failures only:
// checksum and extraction failures are evidence about the artifact, not the
// network, and retrying them would just re-fetch the same bad bytes.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use sha2::{Digest, Sha256};

use crate::constants::DOWNLOAD_CHUNK_SIZE;
use crate::errors::{BootstrapError, Result};
use crate::schemas::download::DownloadSpec;
use crate::{log_debug, log_info, log_success, log_warn};

/// Fetches one spec: stream, digest, verify.
///
/// On success the file at `spec.destination` is complete and (when a checksum
/// was supplied) verified. On any failure the destination file is gone.
pub fn fetch(agent: &ureq::Agent, spec: &DownloadSpec) -> Result<()> {
    log_debug!("[Download] GET {}", spec.url.blue());

    // An artifact from an earlier interrupted run that still matches its
    // pinned digest does not need re-fetching.
    if spec.destination.exists() {
        if let (Some(expected), Ok(actual)) = (
            &spec.expected_checksum,
            sha256_of_file(&spec.destination),
        ) {
            if actual.eq_ignore_ascii_case(expected) {
                log_info!(
                    "Verified existing download {}, skipping fetch",
                    spec.destination.display()
                );
                return Ok(());
            }
        }
        let _ = fs::remove_file(&spec.destination);
    }

    if let Some(parent) = spec.destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let response = agent.get(&spec.url).call().map_err(|err| {
        BootstrapError::Download {
            url: spec.url.clone(),
            reason: err.to_string(),
        }
    })?;

    let digest = stream_to_file(response.into_reader(), &spec.destination).map_err(|err| {
        // A half-written file from a dropped connection is as dangerous as a
        // checksum mismatch; remove it before reporting.
        let _ = fs::remove_file(&spec.destination);
        BootstrapError::Download {
            url: spec.url.clone(),
            reason: err.to_string(),
        }
    })?;

    if let Some(expected) = &spec.expected_checksum {
        verify_checksum(&spec.destination, expected, &digest)?;
        log_success!("Checksum verified for {}", spec.destination.display());
    } else {
        log_debug!(
            "[Download] No pinned checksum for {}; accepting digest {}",
            spec.url,
            digest
        );
    }

    Ok(())
}

/// Streams the response body to `dest`, returning the hex SHA-256 of the
/// bytes written.
fn stream_to_file(mut reader: impl Read, dest: &Path) -> std::io::Result<String> {
    let mut file = File::create(dest)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; DOWNLOAD_CHUNK_SIZE];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        file.write_all(&buffer[..read])?;
    }
    file.flush()?;

    Ok(hex_encode(&hasher.finalize()))
}

/// Compares the computed digest against the pinned one, case-insensitively.
/// On mismatch the destination file is deleted before the error is returned.
fn verify_checksum(dest: &Path, expected: &str, actual: &str) -> Result<()> {
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    let _ = fs::remove_file(dest);
    Err(BootstrapError::ChecksumMismatch {
        path: dest.to_path_buf(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// Hex SHA-256 of an existing file. Used by tests and by callers that want to
/// re-verify an artifact that was already on disk.
pub fn sha256_of_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; DOWNLOAD_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Tries each mirror in order until one delivers a verified file.
///
/// Only download failures move on to the next mirror; a checksum or
/// extraction problem is terminal for the artifact no matter which mirror
/// served it.
pub fn fetch_with_mirrors(
    agent: &ureq::Agent,
    urls: &[&str],
    destination: &Path,
    expected_checksum: Option<&str>,
) -> Result<()> {
    let mut last_error: Option<BootstrapError> = None;

    for url in urls {
        let mut spec = DownloadSpec::new(*url, destination);
        if let Some(checksum) = expected_checksum {
            spec = spec.with_checksum(checksum);
        }

        match fetch(agent, &spec) {
            Ok(()) => {
                log_success!("Downloaded {}", url.green());
                return Ok(());
            }
            Err(err) if err.is_retryable_download() => {
                log_warn!("[Download] Mirror failed: {}", url.yellow());
                log_debug!("[Download] {}", err);
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_error.unwrap_or_else(|| BootstrapError::Download {
        url: "<no mirrors>".to_string(),
        reason: "empty mirror list".to_string(),
    }))
}

/// Full pipeline: download (with mirror fallback), verify, extract, and
/// remove the archive. Returns the extraction root (see
/// [`crate::libs::utilities::compression::extract_archive`]).
pub fn download_and_extract(
    agent: &ureq::Agent,
    urls: &[&str],
    archive_path: &Path,
    extract_dir: &Path,
    expected_checksum: Option<&str>,
) -> Result<PathBuf> {
    fetch_with_mirrors(agent, urls, archive_path, expected_checksum)?;

    log_info!("Extracting {}...", archive_path.display());
    let root = crate::libs::utilities::compression::extract_archive(archive_path, extract_dir)?;

    // The archive has served its purpose; only the extracted tree stays.
    if let Err(err) = fs::remove_file(archive_path) {
        log_warn!(
            "[Download] Could not remove archive {}: {}",
            archive_path.display(),
            err
        );
    }

    Ok(root)
}
