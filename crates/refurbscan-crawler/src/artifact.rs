//! Artifact persistence: lossless per-country merge and atomic writes.
//!
//! The artifact accumulates across runs. Merging a run's records into a
//! country replaces re-observed listings (preserving `first_seen_at`) and
//! leaves listings the run did not touch in place, so a shallow or partial
//! crawl never erases earlier observations. Other countries' slices are
//! never modified.

use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use refurbscan_core::{ArtifactFile, CountryArtifact, ListingRecord};

use crate::error::CrawlError;

/// Loads the artifact from `path`. A missing file is an empty artifact,
/// not an error; first runs start from nothing.
///
/// # Errors
///
/// [`CrawlError::Read`] on any other I/O failure, [`CrawlError::Parse`] when
/// the file exists but is not a valid artifact.
pub fn load_artifact(path: &Path) -> Result<ArtifactFile, CrawlError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ArtifactFile::default());
        }
        Err(source) => {
            return Err(CrawlError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };

    serde_json::from_str(&contents).map_err(|source| CrawlError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Merges one run's records into the country's slice of `file`.
///
/// Every merged record gets `last_seen_at = now`; records whose id already
/// exists additionally keep their original `first_seen_at`. Records the run
/// did not produce are carried over unchanged. Idempotent for a fixed `now`.
pub fn merge_country(
    file: &mut ArtifactFile,
    country_code: &str,
    records: Vec<ListingRecord>,
    now: DateTime<Utc>,
) {
    let country = file
        .countries
        .entry(country_code.to_string())
        .or_insert_with(|| CountryArtifact::empty(country_code, now));

    for mut record in records {
        record.last_seen_at = now;
        if let Some(prior) = country.listings.get(&record.id) {
            record.first_seen_at = prior.first_seen_at;
        }
        country.listings.insert(record.id.clone(), record);
    }

    country.generated_at = now;
    file.generated_at = Some(now);
}

/// Writes the artifact to `path` atomically: serialize to a temp file in the
/// same directory, then rename over the destination. A crash mid-write
/// leaves the previous artifact intact.
///
/// # Errors
///
/// [`CrawlError::Serialize`] or [`CrawlError::Write`].
pub fn write_artifact(path: &Path, file: &ArtifactFile) -> Result<(), CrawlError> {
    let json = serde_json::to_string_pretty(file).map_err(|source| CrawlError::Serialize {
        context: path.display().to_string(),
        source,
    })?;

    let staged = stage(path, &json)?;
    staged
        .persist(path)
        .map_err(|e| CrawlError::Write {
            path: path.display().to_string(),
            source: e.error,
        })?;
    Ok(())
}

/// Stages serialized contents in a temp file next to `path`. Split from the
/// rename so the commit step is a single syscall.
fn stage(path: &Path, contents: &str) -> Result<NamedTempFile, CrawlError> {
    use std::io::Write;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut staged = match dir {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(|source| CrawlError::Write {
        path: path.display().to_string(),
        source,
    })?;

    staged
        .write_all(contents.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|source| CrawlError::Write {
            path: path.display().to_string(),
            source,
        })?;
    Ok(staged)
}
