//! # Snapshot Store
//!
//! Persistence for the node is one JSON document: the whole [`Deployment`]
//! serialized after every successful mutation and reloaded at boot. The
//! accounting state is small (balances, a rate timeline, a ticket log), so
//! a full-document write is cheaper than it sounds and keeps recovery
//! trivial — a snapshot either parses or it doesn't.
//!
//! ## Atomicity
//!
//! Every save writes to a `.tmp` sibling first and renames it over the
//! target. Rename is atomic on POSIX filesystems, so a crash mid-save
//! leaves either the old snapshot or the new one, never a torn file.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use solera_vault::deployment::Deployment;

/// Reads and writes deployment snapshots at a fixed filesystem path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Where the snapshot document lives.
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store for the given snapshot path. Nothing is touched on
    /// disk until the first `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot document already exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads and parses the snapshot.
    pub fn load(&self) -> Result<Deployment> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read snapshot at {}", self.path.display()))?;
        let deployment: Deployment = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot at {}", self.path.display()))?;
        Ok(deployment)
    }

    /// Persists the deployment: write to a `.tmp` sibling, then rename
    /// over the snapshot path.
    pub fn save(&self, deployment: &Deployment) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create snapshot directory {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(deployment)
            .context("failed to serialize deployment snapshot")?;

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, json).with_context(|| {
            format!("failed to write snapshot scratch file {}", tmp_path.display())
        })?;
        std::fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to move snapshot into place at {}",
                self.path.display()
            )
        })?;
        Ok(())
    }

    /// The scratch path saves go through: the snapshot path with `.tmp`
    /// appended (not substituted, so `state.json` scratches to
    /// `state.json.tmp`).
    fn tmp_path(&self) -> PathBuf {
        let mut raw: OsString = self.path.clone().into_os_string();
        raw.push(".tmp");
        PathBuf::from(raw)
    }
}
