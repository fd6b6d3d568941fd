//! Per-sign-in session context.
//!
//! One [`SessionContext`] owns the long-lived state machines for a signed-in
//! user. It is constructed fresh on sign-in and dropped on sign-out; nothing
//! here is global, so two sessions (tests, account switch) never share state.

use std::sync::Arc;

use crate::api::Backend;
use crate::prefs::PreferenceSyncEngine;
use crate::report::ReportWorkflowController;
use crate::role::{ProfileState, ProfileStore};
use crate::subscription::SubscriptionUsageGate;

pub struct SessionContext {
    backend: Arc<dyn Backend>,
    profile: ProfileStore,
    subscription: SubscriptionUsageGate,
    prefs: PreferenceSyncEngine,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        SessionContext {
            profile: ProfileStore::new(backend.clone()),
            subscription: SubscriptionUsageGate::new(backend.clone()),
            prefs: PreferenceSyncEngine::new(backend.clone()),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn subscription(&self) -> &SubscriptionUsageGate {
        &self.subscription
    }

    pub fn prefs(&self) -> &PreferenceSyncEngine {
        &self.prefs
    }

    /// Fresh workflow controller over this session's backend. Report state
    /// is view-scoped, not session-scoped, so each view owns its own.
    pub fn report_controller(&self) -> ReportWorkflowController {
        ReportWorkflowController::new(self.backend.clone())
    }

    /// Warm the session after sign-in: profile and subscription status load
    /// concurrently, and either may fail without blocking the other. The
    /// returned profile state is whatever is cached after the attempt.
    pub async fn initialize(&self) -> ProfileState {
        let (profile, _) = tokio::join!(self.profile.load(), self.subscription.refresh());
        if let Err(e) = profile {
            log::warn!("session: profile load failed during initialize: {e}");
        }
        self.profile.state()
    }
}
