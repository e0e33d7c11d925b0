//! Configuration snapshot and explicit reconfiguration.

use crate::config::Config;
use crate::error::Result;
use crate::remote::RemoteClient;
use crate::storage::{StorageBackend, open_backend};
use crate::transfer::TransferTracker;
use std::sync::Arc;

use super::FieldMonitor;

impl FieldMonitor {
    /// Configuration snapshot in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Switch to a new configuration snapshot.
    ///
    /// The storage backend is rebuilt from the new snapshot, so switching
    /// between the sandboxed and the granted directory only happens here.
    /// Clones of this monitor taken earlier keep the previous snapshot.
    ///
    /// On error the monitor is left unchanged.
    pub fn reconfigure(&mut self, config: Config) -> Result<()> {
        let storage = open_backend(&config)?;
        self.reconfigure_with_storage(config, storage);
        Ok(())
    }

    /// Switch to a new configuration snapshot with an explicit backend
    pub fn reconfigure_with_storage(&mut self, config: Config, storage: Arc<dyn StorageBackend>) {
        let switched_kind = storage.directory().is_sandboxed() != self.storage.directory().is_sandboxed();
        tracing::info!(
            from = %self.storage.directory(),
            to = %storage.directory(),
            switched_kind,
            "reconfiguring field monitor"
        );

        if config.storage.scratch_dir != self.config.storage.scratch_dir
            || config.progress.sample_interval != self.config.progress.sample_interval
        {
            self.tracker = TransferTracker::new(
                config.storage.scratch_dir.clone(),
                config.progress.sample_interval,
            );
        }
        self.remote = RemoteClient::new(config.remote.clone());
        self.storage = storage;
        self.config = Arc::new(config);
    }
}
