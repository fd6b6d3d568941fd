//! Concurrent view loaders.
//!
//! Each view fans out its independent fetches and assembles whatever
//! arrived: a failed branch degrades that one section of the view instead
//! of failing the whole load.

use tokio::join;

use crate::api::Backend;
use crate::heatmap::HeatmapGrid;
use crate::subscription::SubscriptionUsageGate;
use crate::timeline::{self, DayBucket, WindowSummary, DEFAULT_WINDOW_DAYS};
use crate::types::{Child, ClassSummary, ContactRow};

/// Default history fetch size for the child overview, enough to cover the
/// aggregation window with several sessions per day.
pub const DEFAULT_HISTORY_LIMIT: u32 = 200;

/// Assembled teacher class view. `dashboard_ok` / `contacts_ok` record, per
/// branch, whether the section holds live data or an empty fallback.
#[derive(Debug, Clone)]
pub struct ClassView {
    pub class_id: String,
    pub students: Vec<Child>,
    pub heatmap: HeatmapGrid,
    pub summary: Option<ClassSummary>,
    pub contacts: Vec<ContactRow>,
    pub dashboard_ok: bool,
    pub contacts_ok: bool,
}

/// Assembled parent child-overview: the bucketed session timeline plus its
/// rollup. Subscription status is refreshed alongside but lives in the gate.
#[derive(Debug, Clone)]
pub struct ChildOverview {
    pub child_id: String,
    pub buckets: Vec<DayBucket>,
    pub summary: WindowSummary,
    pub history_ok: bool,
}

/// Load the class dashboard and the parent-contact roster concurrently.
pub async fn load_class_view(backend: &dyn Backend, class_id: &str) -> ClassView {
    let (dashboard, contacts) = join!(
        backend.fetch_class_dashboard(class_id),
        backend.fetch_contacts(class_id),
    );

    let (students, heatmap, summary, dashboard_ok) = match dashboard {
        Ok(d) => {
            let grid = HeatmapGrid::build(&d.students, &d.heatmap);
            (d.students, grid, d.summary, true)
        }
        Err(e) => {
            log::warn!("dashboard: class {class_id} dashboard load failed: {e}");
            (Vec::new(), HeatmapGrid::empty(), None, false)
        }
    };

    let (contacts, contacts_ok) = match contacts {
        Ok(rows) => (rows, true),
        Err(e) => {
            log::warn!("dashboard: class {class_id} contacts load failed: {e}");
            (Vec::new(), false)
        }
    };

    ClassView {
        class_id: class_id.to_string(),
        students,
        heatmap,
        summary,
        contacts,
        dashboard_ok,
        contacts_ok,
    }
}

/// Load a child's session history and refresh subscription status
/// concurrently. The gate handles its own failure (conservative default);
/// a history failure yields an empty timeline.
pub async fn load_child_overview(
    backend: &dyn Backend,
    gate: &SubscriptionUsageGate,
    child_id: &str,
) -> ChildOverview {
    let (history, _) = join!(
        backend.fetch_session_history(child_id, DEFAULT_HISTORY_LIMIT),
        gate.refresh(),
    );

    let (sessions, history_ok) = match history {
        Ok(sessions) => (sessions, true),
        Err(e) => {
            log::warn!("dashboard: child {child_id} history load failed: {e}");
            (Vec::new(), false)
        }
    };

    let buckets = timeline::day_buckets(&sessions, DEFAULT_WINDOW_DAYS);
    let summary = timeline::window_summary(&buckets);
    ChildOverview {
        child_id: child_id.to_string(),
        buckets,
        summary,
        history_ok,
    }
}
