/*!
 * Completion Tracker
 * Binds convergence waits to virtual paths and local directories
 */

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use super::config::{FileCompletionConfig, FolderCompletionConfig};
use super::errors::{CompletionError, CompletionResult};
use super::file::wait_for_file;
use super::folder::{wait_for_folder, FolderOutcome};
use crate::core::clock::{Sleeper, ThreadSleeper};
use crate::vfs::local::tree_size;
use crate::vfs::resolver::Resolver;

/// Waits for copies onto drives and moves off them
#[derive(Clone)]
pub struct CompletionTracker {
    file: FileCompletionConfig,
    folder: FolderCompletionConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            file: FileCompletionConfig::default(),
            folder: FolderCompletionConfig::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_file_config(mut self, config: FileCompletionConfig) -> Self {
        self.file = config;
        self
    }

    pub fn with_folder_config(mut self, config: FolderCompletionConfig) -> Self {
        self.folder = config;
        self
    }

    pub fn with_sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn file_config(&self) -> &FileCompletionConfig {
        &self.file
    }

    pub fn folder_config(&self) -> &FolderCompletionConfig {
        &self.folder
    }

    /// Wait on an arbitrary size probe
    pub fn wait_for_file<P>(&self, label: &str, target: u64, probe: P) -> CompletionResult<u64>
    where
        P: FnMut() -> Option<u64>,
    {
        wait_for_file(label, target, probe, &self.file, self.sleeper.as_ref())
    }

    /// Wait on arbitrary size and existence probes
    pub fn wait_for_folder<M, E>(
        &self,
        label: &str,
        measure: M,
        source_exists: E,
    ) -> CompletionResult<FolderOutcome>
    where
        M: FnMut() -> u64,
        E: FnMut() -> bool,
    {
        wait_for_folder(label, measure, source_exists, &self.folder, self.sleeper.as_ref())
    }

    /// Wait until the file at virtual `path` reaches `expected_size` bytes
    ///
    /// The drive must resolve up front; a missing file is treated as not yet
    /// created.
    #[instrument(skip(self, resolver), level = "debug")]
    pub fn wait_for_copy(
        &self,
        resolver: &Resolver,
        path: &str,
        expected_size: u64,
    ) -> CompletionResult<u64> {
        resolver.resolve(path).map_err(|source| CompletionError::Probe {
            label: path.to_string(),
            source,
        })?;

        let size = self.wait_for_file(path, expected_size, || resolver.file_size(path).ok())?;
        info!(path, size, "Copy complete");
        Ok(size)
    }

    /// Wait until a folder moved from virtual `source_path` into `destination`
    /// has fully landed
    #[instrument(skip(self, resolver, destination), level = "debug")]
    pub fn wait_for_move(
        &self,
        resolver: &Resolver,
        source_path: &str,
        destination: &Path,
    ) -> CompletionResult<FolderOutcome> {
        let label = destination.display().to_string();
        let outcome = self.wait_for_folder(
            &label,
            || tree_size(destination).unwrap_or(0),
            || resolver.exists(source_path),
        )?;
        info!(source_path, size = outcome.size, "Move complete");
        Ok(outcome)
    }
}

impl std::fmt::Debug for CompletionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionTracker")
            .field("file", &self.file)
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}
