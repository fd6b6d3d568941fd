//! Subscription usage gate.
//!
//! Read-mostly view of `{tier, remaining, can_generate}` consulted by the
//! generation flows. Until the authoritative value loads (or when the load
//! fails) the gate answers with the conservative free-tier default, so a
//! transient fetch failure can never let a user bypass a cap.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::Backend;
use crate::error::ApiResult;
use crate::types::SubscriptionStatus;

pub struct SubscriptionUsageGate {
    backend: Arc<dyn Backend>,
    status: Mutex<SubscriptionStatus>,
    authoritative: Mutex<bool>,
}

impl SubscriptionUsageGate {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        SubscriptionUsageGate {
            backend,
            status: Mutex::new(SubscriptionStatus::conservative_default()),
            authoritative: Mutex::new(false),
        }
    }

    /// Load the authoritative status. A failure keeps the conservative
    /// default in place and returns the error.
    pub async fn refresh(&self) -> ApiResult<SubscriptionStatus> {
        match self.backend.fetch_subscription_status().await {
            Ok(status) => {
                *self.status.lock() = status.clone();
                *self.authoritative.lock() = true;
                Ok(status)
            }
            Err(e) => {
                log::warn!("subscription: status load failed, keeping conservative default: {e}");
                Err(e)
            }
        }
    }

    pub fn current(&self) -> SubscriptionStatus {
        self.status.lock().clone()
    }

    /// Whether the authoritative value has loaded at least once.
    pub fn is_authoritative(&self) -> bool {
        *self.authoritative.lock()
    }

    /// Whether a generation action is permitted right now.
    pub fn can_generate(&self) -> bool {
        let status = self.status.lock();
        status.can_generate && status.remaining.map_or(true, |r| r > 0)
    }

    /// Optimistically consume one generation from the cached allotment, so
    /// repeated generations within a session respect the cap without a
    /// refetch. No-op for unlimited tiers.
    pub fn consume_local(&self) {
        let mut status = self.status.lock();
        if let Some(remaining) = status.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                status.can_generate = false;
            }
        }
    }
}
