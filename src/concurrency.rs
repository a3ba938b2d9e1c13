//! Concurrent access safety for component instances
//!
//! Instances are independent units of work and may run in parallel. Writes to
//! the same output path are serialized through a per-path lock, and a shared
//! shutdown flag stops new instances from being started.

use crate::error::ApiError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

/// Per-path lock manager for composite and fragment-tree writes
pub struct InstanceLockManager {
    locks: Arc<RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl InstanceLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get or create the lock guarding `path`
    pub fn get_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(path) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another thread may have inserted it between the two guards
        map.entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for InstanceLockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative shutdown signal checked before each instance starts.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Exit status used when a second interrupt arrives before the run finishes.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "Ctrl+C"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl+C")
}

/// Listen for Ctrl+C / SIGTERM on a background thread and raise `flag`.
///
/// The first signal lets running instances finish; a second one exits.
pub fn install_shutdown_handler(flag: ShutdownFlag) -> Result<(), ApiError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("shutdown-signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match shutdown_signal().await {
                    Ok(signal) => {
                        warn!(signal, "Shutdown requested, no new instances will start");
                        flag.request();
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to listen for shutdown signals");
                        return;
                    }
                }
                if shutdown_signal().await.is_ok() {
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            });
        })?;
    Ok(())
}
