//! Location snapshot boundary
//!
//! The coordinator never samples the sensor itself; it reads a snapshot from a
//! [`LocationSource`] once per dispatch. A missing fix is `NoLocationAvailable`
//! and a revoked sensor is `PermissionDenied` — both are surfaced, never fatal.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{LocationFix, Result, WatchtowerError};

/// Read side of the location sampler
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_fix(&self) -> Result<LocationFix>;
}

/// Last-known-fix cell shared between the sampler and the coordinator
///
/// Writers (the platform sampler, the monitor loop) push fixes in; readers get
/// the most recent one or `NoLocationAvailable` before the first fix arrives.
#[derive(Default)]
pub struct LastKnownLocation {
    fix: RwLock<Option<LocationFix>>,
}

impl LastKnownLocation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a fresh fix
    pub async fn update(&self, fix: LocationFix) {
        debug!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            "Location updated"
        );
        *self.fix.write().await = Some(fix);
    }

    /// Drop the cached fix (sensor lost or permission revoked)
    pub async fn clear(&self) {
        *self.fix.write().await = None;
    }
}

#[async_trait]
impl LocationSource for LastKnownLocation {
    async fn current_fix(&self) -> Result<LocationFix> {
        (*self.fix.read().await).ok_or(WatchtowerError::NoLocationAvailable)
    }
}
