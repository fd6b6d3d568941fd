//! Backend service contract.
//!
//! One async method per remote endpoint, behind a dyn-compatible trait so
//! every engine in this crate can run against the real HTTP backend or an
//! in-memory test double. There is no cancellation token: callers discard
//! late results by generation check, which is sufficient because every
//! operation is an idempotent read or a last-write-wins write.

pub mod http;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{
    ClassDashboard, ContactRow, Profile, ReportState, Role, SavePreferencesRequest, SendOutcome,
    SessionRecord, SubscriptionStatus,
};

/// The remote worksheet-platform API.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/topic-preferences/{childId}/{subject}`.
    /// `Ok(None)` means no saved preference exists for this scope yet.
    async fn fetch_preferences(
        &self,
        child_id: &str,
        subject: &str,
    ) -> ApiResult<Option<Vec<crate::types::TopicSelection>>>;

    /// `POST /api/topic-preferences/`. Last write wins.
    async fn save_preferences(&self, req: &SavePreferencesRequest) -> ApiResult<()>;

    /// `GET /api/users/profile`. `Ok(None)` means the authenticated user has
    /// not selected a role yet.
    async fn fetch_profile(&self) -> ApiResult<Option<Profile>>;

    /// `PUT /api/users/profile` — full profile replace. Returns the server's
    /// authoritative copy.
    async fn update_profile(&self, profile: &Profile) -> ApiResult<Profile>;

    /// `POST /api/users/switch-role`. Returns the authoritative profile,
    /// which may normalize or reject part of the request.
    async fn switch_role(&self, active_role: Role) -> ApiResult<Profile>;

    /// `GET /api/classes/{classId}/dashboard` — heatmap plus summaries.
    async fn fetch_class_dashboard(&self, class_id: &str) -> ApiResult<ClassDashboard>;

    /// `POST /api/teacher/classes/{classId}/report`.
    async fn generate_report(&self, class_id: &str) -> ApiResult<ReportState>;

    /// `GET /api/teacher/classes/{classId}/contacts`.
    async fn fetch_contacts(&self, class_id: &str) -> ApiResult<Vec<ContactRow>>;

    /// `POST /api/teacher/classes/{classId}/contacts` — full non-blank set.
    async fn save_contacts(&self, class_id: &str, rows: &[ContactRow]) -> ApiResult<()>;

    /// `POST /api/teacher/classes/{classId}/report/send-email`.
    async fn send_report_email(
        &self,
        class_id: &str,
        report_token: &str,
    ) -> ApiResult<SendOutcome>;

    /// `GET /api/children/{childId}/graph/history?limit={limit}`.
    async fn fetch_session_history(
        &self,
        child_id: &str,
        limit: u32,
    ) -> ApiResult<Vec<SessionRecord>>;

    /// `GET /api/subscription/status`.
    async fn fetch_subscription_status(&self) -> ApiResult<SubscriptionStatus>;
}
