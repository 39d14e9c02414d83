//! Network connectivity signal.
//!
//! Platform network detection lives outside this crate; callers feed the
//! current state into a `NetworkStatus` and components read it through the
//! `Connectivity` trait.

use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only view of whether the device currently has a network connection.
pub trait Connectivity: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Shared, settable connectivity flag.
#[derive(Debug)]
pub struct NetworkStatus {
    connected: AtomicBool,
}

impl NetworkStatus {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    /// Record a connectivity change reported by the platform.
    pub fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous != connected {
            if connected {
                tracing::info!("Network connection restored");
            } else {
                tracing::info!("No internet connection");
            }
        }
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for NetworkStatus {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
