//! HTTP implementation of the [`Backend`] trait.
//!
//! Uses reqwest with Bearer token auth. The token itself comes from the
//! shell's auth layer; this crate only attaches it. Paths mirror the
//! platform API exactly.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::types::{
    ClassDashboard, ContactRow, Profile, ReportState, Role, SavePreferencesRequest, SendOutcome,
    SessionRecord, SubscriptionStatus, TopicSelection,
};

use super::Backend;

/// Optional `{detail}` body carried by error responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreferencesBody {
    #[serde(default)]
    selected_topics: Vec<TopicSelection>,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base: String,
    auth_token: String,
}

impl HttpBackend {
    /// `base` is the platform origin, e.g. `https://app.pupilpath.io`.
    /// `auth_token` is the caller-supplied bearer token.
    pub fn new(base: &str, auth_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            auth_token: auth_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.auth_token)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.auth_token)
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .bearer_auth(&self.auth_token)
    }

    /// Collapse any non-2xx response to a uniform failure, reading the
    /// optional `{detail}` body for the schema-not-provisioned distinction.
    async fn check(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        Err(ApiError::from_status(status, detail))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_preferences(
        &self,
        child_id: &str,
        subject: &str,
    ) -> ApiResult<Option<Vec<TopicSelection>>> {
        let resp = self
            .get(&format!("/api/topic-preferences/{child_id}/{subject}"))
            .send()
            .await?;
        // 404 means no saved preference for this scope yet.
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let body: PreferencesBody = Self::check(resp).await?.json().await?;
        if body.selected_topics.is_empty() {
            Ok(None)
        } else {
            Ok(Some(body.selected_topics))
        }
    }

    async fn save_preferences(&self, req: &SavePreferencesRequest) -> ApiResult<()> {
        let resp = self.post("/api/topic-preferences/").json(req).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn fetch_profile(&self) -> ApiResult<Option<Profile>> {
        let resp = self.get("/api/users/profile").send().await?;
        // No profile yet — the user still needs to pick a role.
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let profile: Profile = Self::check(resp).await?.json().await?;
        Ok(Some(profile))
    }

    async fn update_profile(&self, profile: &Profile) -> ApiResult<Profile> {
        let resp = self.put("/api/users/profile").json(profile).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn switch_role(&self, active_role: Role) -> ApiResult<Profile> {
        let resp = self
            .post("/api/users/switch-role")
            .json(&serde_json::json!({ "active_role": active_role }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn fetch_class_dashboard(&self, class_id: &str) -> ApiResult<ClassDashboard> {
        let resp = self
            .get(&format!("/api/classes/{class_id}/dashboard"))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn generate_report(&self, class_id: &str) -> ApiResult<ReportState> {
        let resp = self
            .post(&format!("/api/teacher/classes/{class_id}/report"))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn fetch_contacts(&self, class_id: &str) -> ApiResult<Vec<ContactRow>> {
        let resp = self
            .get(&format!("/api/teacher/classes/{class_id}/contacts"))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn save_contacts(&self, class_id: &str, rows: &[ContactRow]) -> ApiResult<()> {
        let resp = self
            .post(&format!("/api/teacher/classes/{class_id}/contacts"))
            .json(&rows)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn send_report_email(
        &self,
        class_id: &str,
        report_token: &str,
    ) -> ApiResult<SendOutcome> {
        let resp = self
            .post(&format!("/api/teacher/classes/{class_id}/report/send-email"))
            .json(&serde_json::json!({ "report_token": report_token }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn fetch_session_history(
        &self,
        child_id: &str,
        limit: u32,
    ) -> ApiResult<Vec<SessionRecord>> {
        let resp = self
            .get(&format!("/api/children/{child_id}/graph/history?limit={limit}"))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn fetch_subscription_status(&self) -> ApiResult<SubscriptionStatus> {
        let resp = self.get("/api/subscription/status").send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}
