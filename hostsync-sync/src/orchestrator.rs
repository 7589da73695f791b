//! Pull and push reconciliation against the remote store.
//!
//! Phases run in a fixed order; inside a phase every path is an
//! independent task on the bounded worker pool. Remote failures are
//! retried by the [`Retrier`]; a local failure stops the phase.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use hostsync_core::{paths, Config, DiffSets, Manifest, RuntimeStatus};
use hostsync_store::{
    RemoteFiles, Retrier, RetryPolicy, SessionFactory, SessionPool, StoreError, UploadOutcome,
};

use crate::diff::{self, SyncDirection};
use crate::error::SyncError;
use crate::index::{self, PathFilter};
use crate::local;
use crate::parallel::try_for_each_bounded;

/// Counters from a completed push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub sets: DiffSets,
    /// Uploads skipped because the object was already present remotely.
    pub skipped: usize,
    /// Remote folders that had to be created.
    pub folders_created: usize,
}

pub struct Orchestrator<F: SessionFactory> {
    root: PathBuf,
    filter: PathFilter,
    concurrency: usize,
    remote: RemoteFiles<F>,
    retrier: Retrier,
}

impl<F: SessionFactory> Orchestrator<F> {
    pub fn new(
        root: PathBuf,
        filter: PathFilter,
        concurrency: usize,
        remote: RemoteFiles<F>,
        retrier: Retrier,
    ) -> Self {
        Self {
            root,
            filter,
            concurrency: concurrency.max(1),
            remote,
            retrier,
        }
    }

    /// Wire an orchestrator from the loaded config.
    pub fn from_config(config: &Config, factory: F) -> Self {
        let pool = SessionPool::new(factory, config.session_ttl());
        Self::new(
            config.root.clone(),
            PathFilter::new(&config.effective_filters()),
            config.concurrency(),
            RemoteFiles::new(pool),
            Retrier::new(RetryPolicy::from(&config.retry)),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote(&self) -> &RemoteFiles<F> {
        &self.remote
    }

    // -----------------------------------------------------------------------
    // Manifests
    // -----------------------------------------------------------------------

    /// Manifest of the local tree as it is now.
    pub fn local_manifest(&self) -> Result<Manifest, SyncError> {
        index::build(&self.root, &self.filter, self.concurrency)
    }

    /// Download the remote manifest into the local state directory and load
    /// it. A store without a manifest yields an empty one.
    ///
    /// Keys that would resolve outside the synced root are dropped.
    pub fn fetch_manifest(&self) -> Result<Manifest, SyncError> {
        let path = paths::local_manifest_path(&self.root);
        self.fetch_document(&paths::remote_manifest_key(), &path)?;
        let mut manifest = local::load_manifest(&path)?;
        manifest.retain(|key, _| {
            let safe = paths::is_safe_key(key);
            if !safe {
                tracing::warn!(target: "local", key = %key, "ignoring manifest entry outside the synced root");
            }
            safe
        });
        Ok(manifest)
    }

    /// Diff sets for `direction` without transferring anything.
    pub fn plan(&self, direction: SyncDirection) -> Result<DiffSets, SyncError> {
        let remote = self.fetch_manifest()?;
        let local = self.local_manifest()?;
        Ok(diff::plan(direction, &local, &remote))
    }

    // -----------------------------------------------------------------------
    // Pull
    // -----------------------------------------------------------------------

    /// Make the local tree match the remote manifest.
    pub fn pull(&self) -> Result<DiffSets, SyncError> {
        let remote = self.fetch_manifest()?;
        let local = self.local_manifest()?;
        let sets = diff::plan(SyncDirection::Pull, &local, &remote);

        log_status(RuntimeStatus::Updating);
        tracing::info!(
            target: "local",
            delete = sets.to_delete.len(),
            download = sets.to_upload.len() + sets.to_update.len(),
            "pulling"
        );

        let deletions: Vec<&String> = sets.to_delete.keys().collect();
        try_for_each_bounded(deletions, self.concurrency, |key| {
            let Some(path) = self.local_path(key) else {
                return Ok(());
            };
            match local::remove_if_exists(&path) {
                Ok(true) => tracing::info!(target: "local", key = %key, "deleted"),
                Ok(false) => {}
                Err(err) => tracing::warn!(target: "local", key = %key, error = %err, "delete failed"),
            }
            Ok::<(), SyncError>(())
        })?;

        let downloads: Vec<&String> = sets.to_upload.keys().chain(sets.to_update.keys()).collect();
        try_for_each_bounded(downloads, self.concurrency, |key| {
            let Some(dest) = self.local_path(key) else {
                return Ok(());
            };
            let found = self.retried("download", key, || self.remote.download(key, &dest))?;
            if found {
                tracing::info!(target: "transfer", key = %key, "downloaded");
            } else {
                tracing::warn!(target: "transfer", key = %key, "listed in manifest but not found remotely");
            }
            Ok::<(), SyncError>(())
        })?;

        tracing::info!(target: "transfer", "all files synchronized");
        log_status(RuntimeStatus::Synchronized);
        Ok(sets)
    }

    // -----------------------------------------------------------------------
    // Push
    // -----------------------------------------------------------------------

    /// Make the remote match the local tree.
    ///
    /// With `resume`, uploads first check whether the object already exists
    /// remotely and skip it if so; a previous push may have been cut off
    /// after some uploads completed.
    pub fn push(&self, resume: bool) -> Result<PushReport, SyncError> {
        let remote = self.fetch_manifest()?;
        let local = self.local_manifest()?;
        let manifest_path = paths::local_manifest_path(&self.root);
        local::save_manifest(&manifest_path, &local)?;

        let sets = diff::plan(SyncDirection::Push, &local, &remote);
        log_status(RuntimeStatus::Uploading);
        tracing::info!(
            target: "transfer",
            delete = sets.to_delete.len(),
            upload = sets.to_upload.len(),
            update = sets.to_update.len(),
            resume,
            "pushing"
        );

        // 1. Remote deletes.
        let deletions: Vec<&String> = sets.to_delete.keys().collect();
        try_for_each_bounded(deletions, self.concurrency, |key| {
            if self.retried("delete", key, || self.remote.delete(key))? {
                tracing::info!(target: "transfer", key = %key, "deleted");
            } else {
                tracing::warn!(target: "transfer", key = %key, "not found");
            }
            Ok::<(), SyncError>(())
        })?;

        // 2. Folder tree.
        let folders_created = self.mirror_folders()?;

        // 3. New files.
        let skipped = AtomicUsize::new(0);
        let uploads: Vec<&String> = sets.to_upload.keys().collect();
        try_for_each_bounded(uploads, self.concurrency, |key| {
            let Some(source) = self.local_path(key) else {
                return Ok(());
            };
            if resume {
                let outcome =
                    self.retried("upload", key, || self.remote.upload_if_absent(&source, key))?;
                if let UploadOutcome::AlreadyPresent(_) = outcome {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(target: "transfer", key = %key, "already present");
                    return Ok(());
                }
            } else {
                self.retried("upload", key, || self.remote.upload(&source, key))?;
            }
            tracing::info!(target: "transfer", key = %key, "uploaded");
            Ok::<(), SyncError>(())
        })?;

        // 4. Changed files.
        let updates: Vec<&String> = sets.to_update.keys().collect();
        try_for_each_bounded(updates, self.concurrency, |key| {
            let Some(source) = self.local_path(key) else {
                return Ok(());
            };
            self.retried("update", key, || self.remote.overwrite(&source, key))?;
            tracing::info!(target: "transfer", key = %key, "updated");
            Ok::<(), SyncError>(())
        })?;

        tracing::info!(target: "transfer", "all files synchronized");

        // 5. Manifest last, so a crash before this point leaves the old one.
        let manifest_key = paths::remote_manifest_key();
        self.retried("upload", &manifest_key, || {
            self.remote.overwrite(&manifest_path, &manifest_key)
        })?;
        log_status(RuntimeStatus::Synchronized);

        Ok(PushReport {
            sets,
            skipped: skipped.into_inner(),
            folders_created,
        })
    }

    /// Recreate the local folder tree remotely, one depth level at a time
    /// so siblings never race on a shared parent.
    fn mirror_folders(&self) -> Result<usize, SyncError> {
        let folders = index::list_folders(&self.root, &self.filter)?;
        let mut levels: Vec<Vec<String>> = Vec::new();
        for folder in folders {
            let depth = paths::segments(&folder).count();
            if depth == 0 {
                continue;
            }
            if levels.len() < depth {
                levels.resize_with(depth, Vec::new);
            }
            levels[depth - 1].push(folder);
        }

        let created = AtomicUsize::new(0);
        for level in levels {
            try_for_each_bounded(level, self.concurrency, |key| {
                if self.retried("create folder", &key, || self.remote.create_folder(&key))? {
                    created.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(target: "transfer", key = %key, "created");
                } else {
                    tracing::debug!(target: "transfer", key = %key, "already created");
                }
                Ok::<(), SyncError>(())
            })?;
        }
        Ok(created.into_inner())
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    /// Download `key` to `dest`; writes an empty document when the remote
    /// object does not exist yet.
    pub(crate) fn fetch_document(&self, key: &str, dest: &Path) -> Result<(), SyncError> {
        if !self.retried("download", key, || self.remote.download(key, dest))? {
            tracing::warn!(target: "transfer", key, "not found remotely");
            local::write_empty(dest)?;
        }
        Ok(())
    }

    /// Overwrite `key` with the local file `source`.
    pub(crate) fn publish_document(&self, source: &Path, key: &str) -> Result<(), SyncError> {
        self.retried("upload", key, || self.remote.overwrite(source, key))?;
        Ok(())
    }

    /// Local path of `key`, or `None` (logged) for a key that would leave
    /// the synced root.
    fn local_path(&self, key: &str) -> Option<PathBuf> {
        let path = paths::key_to_path(&self.root, key);
        if path.is_none() {
            tracing::warn!(target: "local", key, "skipping key outside the synced root");
        }
        path
    }

    /// Run a store operation under the retry policy. Remote failures are
    /// retried; a local I/O failure ends the phase as [`SyncError::Io`].
    pub(crate) fn retried<T>(
        &self,
        action: &str,
        key: &str,
        op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, SyncError> {
        let result = self.retrier.retry(op, |err, attempt| {
            tracing::warn!(target: "transfer", key, attempt, error = %err, "retrying {action}");
        });
        result.map_err(|err| match err {
            StoreError::Io { path, source } => {
                tracing::error!(target: "local", key, path = %path.display(), error = %source, "{action} failed");
                SyncError::Io { path, source }
            }
            other => SyncError::Store(other),
        })
    }
}

pub(crate) fn log_status(status: RuntimeStatus) {
    tracing::info!(target: "state", %status, "status");
}
