//! In-memory [`Backend`] double for unit tests.
//!
//! Each endpoint is backed by a programmable slot; `fail_*` flags force the
//! uniform failure signal, and per-scope delays let tests exercise the
//! stale-response discard path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::{ApiError, ApiResult};
use crate::types::{
    ClassDashboard, ContactRow, Profile, ReportState, Role, SavePreferencesRequest, SendOutcome,
    SessionRecord, SubscriptionStatus, TopicSelection,
};

use super::Backend;

#[derive(Default)]
pub(crate) struct MockBackend {
    pub preferences: Mutex<HashMap<(String, String), Vec<TopicSelection>>>,
    /// Artificial latency per preference scope, for supersession tests.
    pub pref_delay: Mutex<HashMap<(String, String), Duration>>,
    pub fail_pref_load: AtomicBool,
    pub fail_pref_save: AtomicBool,
    pub saved_preferences: Mutex<Vec<SavePreferencesRequest>>,
    pub pref_load_calls: AtomicU32,

    pub profile: Mutex<Option<Profile>>,
    pub fail_profile_fetch: AtomicBool,
    pub fail_switch_role: AtomicBool,

    pub dashboard: Mutex<ClassDashboard>,
    pub fail_dashboard: AtomicBool,

    pub fail_generate: AtomicBool,
    pub generate_calls: AtomicU32,
    /// Override for generated-report lifetime; default is 7 days.
    pub report_ttl: Mutex<Option<chrono::Duration>>,

    pub contacts: Mutex<HashMap<String, Vec<ContactRow>>>,
    pub saved_contacts: Mutex<Vec<(String, Vec<ContactRow>)>>,
    pub fail_contacts_fetch: AtomicBool,
    pub fail_contacts_save: AtomicBool,

    pub send_outcome: Mutex<Option<SendOutcome>>,
    pub fail_send: AtomicBool,

    pub history: Mutex<Vec<SessionRecord>>,
    pub fail_history: AtomicBool,

    pub subscription: Mutex<Option<SubscriptionStatus>>,
    pub fail_subscription: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn failure() -> ApiError {
        ApiError::Status {
            status: 500,
            detail: "mock failure".to_string(),
        }
    }
}

/// A plausible saved profile for tests.
pub(crate) fn sample_profile(active_role: Role) -> Profile {
    Profile {
        user_id: "user-1".to_string(),
        role: Role::Teacher,
        active_role,
        subjects: vec!["math".to_string()],
        grades: vec!["4".to_string()],
        school_name: Some("Hillside Primary".to_string()),
        region: None,
        created_at: None,
        updated_at: None,
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn fetch_preferences(
        &self,
        child_id: &str,
        subject: &str,
    ) -> ApiResult<Option<Vec<TopicSelection>>> {
        let key = (child_id.to_string(), subject.to_string());
        self.pref_load_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.pref_delay.lock().get(&key).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if self.fail_pref_load.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.preferences.lock().get(&key).cloned())
    }

    async fn save_preferences(&self, req: &SavePreferencesRequest) -> ApiResult<()> {
        if self.fail_pref_save.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        self.saved_preferences.lock().push(req.clone());
        self.preferences.lock().insert(
            (req.child_id.clone(), req.subject.clone()),
            req.selected_topics.clone(),
        );
        Ok(())
    }

    async fn fetch_profile(&self) -> ApiResult<Option<Profile>> {
        if self.fail_profile_fetch.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.profile.lock().clone())
    }

    async fn update_profile(&self, profile: &Profile) -> ApiResult<Profile> {
        *self.profile.lock() = Some(profile.clone());
        Ok(profile.clone())
    }

    async fn switch_role(&self, active_role: Role) -> ApiResult<Profile> {
        if self.fail_switch_role.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let mut guard = self.profile.lock();
        let mut profile = guard.clone().ok_or_else(Self::failure)?;
        profile.active_role = active_role;
        *guard = Some(profile.clone());
        Ok(profile)
    }

    async fn fetch_class_dashboard(&self, _class_id: &str) -> ApiResult<ClassDashboard> {
        if self.fail_dashboard.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.dashboard.lock().clone())
    }

    async fn generate_report(&self, class_id: &str) -> ApiResult<ReportState> {
        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let n = self.generate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("tok-{class_id}-{n}");
        let ttl = self
            .report_ttl
            .lock()
            .unwrap_or_else(|| chrono::Duration::days(7));
        Ok(ReportState {
            share_url: format!("https://app.example.com/reports/{token}"),
            token,
            expires_at: Utc::now() + ttl,
        })
    }

    async fn fetch_contacts(&self, class_id: &str) -> ApiResult<Vec<ContactRow>> {
        if self.fail_contacts_fetch.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self
            .contacts
            .lock()
            .get(class_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_contacts(&self, class_id: &str, rows: &[ContactRow]) -> ApiResult<()> {
        if self.fail_contacts_save.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        self.saved_contacts
            .lock()
            .push((class_id.to_string(), rows.to_vec()));
        self.contacts
            .lock()
            .insert(class_id.to_string(), rows.to_vec());
        Ok(())
    }

    async fn send_report_email(
        &self,
        _class_id: &str,
        _report_token: &str,
    ) -> ApiResult<SendOutcome> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self
            .send_outcome
            .lock()
            .unwrap_or(SendOutcome { sent: 0, skipped: 0 }))
    }

    async fn fetch_session_history(
        &self,
        _child_id: &str,
        _limit: u32,
    ) -> ApiResult<Vec<SessionRecord>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.history.lock().clone())
    }

    async fn fetch_subscription_status(&self) -> ApiResult<SubscriptionStatus> {
        if self.fail_subscription.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        self.subscription.lock().clone().ok_or_else(Self::failure)
    }
}
