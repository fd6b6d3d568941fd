//! Domain and wire types shared across the client core.
//!
//! Field names match the backend's JSON exactly (snake_case throughout),
//! so these types double as the wire format for every endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single practice-session record from the history endpoint.
///
/// Immutable once received; the timeline aggregator consumes these
/// read-only. `created_at` is kept as the backend's ISO-8601 string so
/// day bucketing truncates the *recorded* timestamp instead of
/// reinterpreting it across time zones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub topic_slug: String,
    pub subject: String,
    pub score_pct: Option<f64>,
    pub created_at: String,
}

/// One chapter's worth of selected topics in a user's preference set.
///
/// Chapters with no selected topics are filtered out before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSelection {
    pub chapter: String,
    pub topics: Vec<String>,
}

/// Payload for `POST /api/topic-preferences/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePreferencesRequest {
    pub child_id: String,
    pub subject: String,
    pub selected_topics: Vec<TopicSelection>,
}

/// The mode a profile operates as, independent of its stored role metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Teacher,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Parent => write!(f, "parent"),
            Role::Teacher => write!(f, "teacher"),
        }
    }
}

/// A user's profile. One per authenticated user; absence of a profile is
/// itself a meaningful state ("needs role selection"), not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub role: Role,
    /// Mutable independently of `role`'s subject/grade metadata.
    pub active_role: Role,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub grades: Vec<String>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A child in a class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
}

/// A parent-contact row for one student. At most one row per child per
/// class; a blank `parent_email` means "no contact on file".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    pub child_id: String,
    pub child_name: String,
    #[serde(default)]
    pub parent_email: String,
}

impl ContactRow {
    /// Whether this row has a usable saved email.
    pub fn has_email(&self) -> bool {
        !self.parent_email.trim().is_empty()
    }
}

/// A generated class report. Immutable once created; the token is
/// invalidated server-side after `expires_at` — the client only displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportState {
    pub token: String,
    pub share_url: String,
    pub expires_at: DateTime<Utc>,
}

impl ReportState {
    /// Whether the report link is past its server-side expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Server's per-recipient outcome for a report email send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub sent: u32,
    pub skipped: u32,
}

/// Subscription usage as reported by `/api/subscription/status`.
///
/// `remaining` is `None` for unlimited tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub tier: String,
    pub remaining: Option<u32>,
    pub can_generate: bool,
}

impl SubscriptionStatus {
    /// Client-side placeholder used until the authoritative value loads or
    /// when the load fails. Never more permissive than the true minimum
    /// free allotment, so a transient fetch failure cannot bypass a cap.
    pub fn conservative_default() -> Self {
        SubscriptionStatus {
            tier: "free".to_string(),
            remaining: Some(3),
            can_generate: true,
        }
    }
}

/// Class-level roll-up figures shown next to the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub avg_score: Option<f64>,
}

/// Raw payload of `GET /api/classes/{classId}/dashboard`.
///
/// `heatmap` maps topic → (child id → mastery level string). The map keeps
/// the server's key order (`serde_json` with `preserve_order`), which fixes
/// the heatmap's row order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassDashboard {
    #[serde(default)]
    pub students: Vec<Child>,
    #[serde(default)]
    pub heatmap: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub summary: Option<ClassSummary>,
}
