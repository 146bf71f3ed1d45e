//! On-disk snapshots of the fragment cache.
//!
//! A snapshot records the namespace it was rendered under and a SHA-256
//! checksum per fragment. Loading restores only entries whose checksum still
//! matches, and only when the namespace matches the running configuration;
//! anything else is treated as a miss and re-rendered on demand.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::fragment::Fragment;

use super::keys::{FINGERPRINT_VERSION, Fingerprint};
use super::service::FragmentCache;
use super::store::Generation;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to prepare snapshot directory: {0}")]
    Directory(io::Error),
    #[error("failed to write snapshot: {0}")]
    Write(io::Error),
    #[error("failed to read snapshot: {0}")]
    Read(io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub discarded: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    namespace: String,
    generation: Generation,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    fingerprint: String,
    fragment: Fragment,
    checksum: String,
}

fn checksum(fragment: &Fragment) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fragment.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

impl FragmentCache {
    /// Write every current-generation fragment to `path` atomically.
    pub fn save_snapshot(&self, path: &Path, namespace: &str) -> Result<usize, PersistError> {
        let started_at = Instant::now();
        let (generation, live) = self.store().current_entries();
        let snapshot = Snapshot {
            version: FINGERPRINT_VERSION,
            namespace: namespace.to_string(),
            generation,
            entries: live
                .into_iter()
                .map(|(fingerprint, fragment)| SnapshotEntry {
                    fingerprint: fingerprint.as_str().to_string(),
                    checksum: checksum(&fragment),
                    fragment,
                })
                .collect(),
        };
        let count = snapshot.entries.len();
        let bytes = serde_json::to_vec(&snapshot)?;

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(directory).map_err(PersistError::Directory)?;

        let mut staging = tempfile::Builder::new()
            .suffix(".json")
            .tempfile_in(directory)
            .map_err(PersistError::Write)?;
        staging.write_all(&bytes).map_err(PersistError::Write)?;
        staging.flush().map_err(PersistError::Write)?;
        staging
            .persist(path)
            .map_err(|err| PersistError::Write(err.error))?;

        info!(
            target = "cache::persist",
            op = "save_snapshot",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            path = %path.display(),
            entries = count,
            bytes = bytes.len(),
            "Fragment cache snapshot written"
        );
        Ok(count)
    }

    /// Restore fragments from `path`. A missing file restores nothing.
    ///
    /// `generation` is the cache generation observed before `namespace` was
    /// derived; if an invalidation has happened since, the snapshot may
    /// describe content that is already gone and nothing is restored.
    pub fn load_snapshot(
        &self,
        path: &Path,
        namespace: &str,
        generation: Generation,
    ) -> Result<RestoreReport, PersistError> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    target = "cache::persist",
                    op = "load_snapshot",
                    result = "absent",
                    path = %path.display(),
                    "No fragment cache snapshot found"
                );
                return Ok(RestoreReport::default());
            }
            Err(err) => return Err(PersistError::Read(err)),
        };
        let snapshot: Snapshot = serde_json::from_slice(&raw)?;

        if snapshot.version != FINGERPRINT_VERSION || snapshot.namespace != namespace {
            warn!(
                target = "cache::persist",
                op = "load_snapshot",
                result = "ignored",
                path = %path.display(),
                snapshot_version = snapshot.version,
                snapshot_namespace = %snapshot.namespace,
                namespace,
                "Fragment cache snapshot does not match configuration"
            );
            return Ok(RestoreReport {
                restored: 0,
                discarded: snapshot.entries.len(),
            });
        }

        let mut report = RestoreReport::default();
        let mut restored = Vec::with_capacity(snapshot.entries.len());
        for entry in snapshot.entries {
            let Some(fingerprint) = Fingerprint::parse(&entry.fingerprint) else {
                report.discarded += 1;
                continue;
            };
            if checksum(&entry.fragment) != entry.checksum {
                warn!(
                    target = "cache::persist",
                    op = "load_snapshot",
                    result = "checksum_mismatch",
                    fingerprint = %fingerprint,
                    "Discarding corrupted snapshot entry"
                );
                report.discarded += 1;
                continue;
            }
            restored.push((fingerprint, entry.fragment));
        }

        let candidates = restored.len();
        if !self.is_enabled() {
            report.discarded += candidates;
        } else {
            match self.store().restore(restored, generation) {
                Some(count) => report.restored = count,
                None => {
                    warn!(
                        target = "cache::persist",
                        op = "load_snapshot",
                        result = "superseded",
                        path = %path.display(),
                        generation,
                        current = self.generation(),
                        "Content changed while loading snapshot; discarding it"
                    );
                    report.discarded += candidates;
                }
            }
        }

        info!(
            target = "cache::persist",
            op = "load_snapshot",
            result = "ok",
            path = %path.display(),
            restored = report.restored,
            discarded = report.discarded,
            "Fragment cache snapshot restored"
        );
        Ok(report)
    }
}
