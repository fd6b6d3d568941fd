//! Debounced preference synchronization.
//!
//! Reconciles a locally edited topic selection with the remote store while
//! keeping write traffic low: edits apply in memory immediately, a deferred
//! write is scheduled per edit, and any further edit (or scope change)
//! within the deferral window supersedes the pending write. Generation
//! counters stand in for cancellation — a timer or load continuation whose
//! generation no longer matches simply drops its result.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::api::Backend;
use crate::types::{SavePreferencesRequest, TopicSelection};

/// Default deferral window between the last edit and the persistence call.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// The (child, subject) key under which a selection is cached and synced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefScope {
    pub child_id: String,
    pub subject: String,
}

impl PrefScope {
    pub fn new(child_id: &str, subject: &str) -> Self {
        PrefScope {
            child_id: child_id.to_string(),
            subject: subject.to_string(),
        }
    }
}

#[derive(Default)]
struct EngineState {
    scope: Option<PrefScope>,
    /// Full chapter/topic catalog for the scope; defines "all selected".
    catalog: Vec<TopicSelection>,
    selection: Vec<TopicSelection>,
    /// Whether the load phase has completed for the current scope. Persists
    /// are suppressed until then so a transient default can never overwrite
    /// real server state.
    loaded: bool,
    /// Bumped on every `set_scope`; a load continuation applies its result
    /// only if its generation is still current.
    load_gen: u64,
    /// Bumped on every edit and every scope change; a debounce timer fires
    /// its write only if its generation is still current.
    save_gen: u64,
}

pub struct PreferenceSyncEngine {
    backend: Arc<dyn Backend>,
    debounce: Duration,
    state: Arc<Mutex<EngineState>>,
}

impl PreferenceSyncEngine {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_debounce(backend, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(backend: Arc<dyn Backend>, debounce: Duration) -> Self {
        PreferenceSyncEngine {
            backend,
            debounce,
            state: Arc::new(Mutex::new(EngineState::default())),
        }
    }

    /// Switch to a new scope and issue exactly one load for it.
    ///
    /// The previous scope's pending debounce timer is invalidated
    /// unconditionally, even if unfired. The previous selection is kept
    /// until the load resolves (no flicker). A saved server selection
    /// replaces the local one; no saved selection, or a load failure,
    /// falls open to the full catalog so generation is never silently
    /// blocked by an empty selection.
    ///
    /// Returns the load task handle; callers may ignore it.
    pub fn set_scope(&self, scope: PrefScope, catalog: Vec<TopicSelection>) -> JoinHandle<()> {
        let gen = {
            let mut st = self.state.lock();
            st.scope = Some(scope.clone());
            st.catalog = catalog;
            st.loaded = false;
            st.load_gen += 1;
            st.save_gen += 1;
            st.load_gen
        };

        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let result = backend
                .fetch_preferences(&scope.child_id, &scope.subject)
                .await;

            let mut st = state.lock();
            if st.load_gen != gen {
                // A newer scope superseded this load while it was in flight.
                log::debug!(
                    "prefs: discarding stale load for {}/{}",
                    scope.child_id,
                    scope.subject
                );
                return;
            }
            match result {
                Ok(Some(selection)) => st.selection = selection,
                Ok(None) => st.selection = st.catalog.clone(),
                Err(e) => {
                    log::warn!(
                        "prefs: load failed for {}/{}, defaulting to all topics selected: {e}",
                        scope.child_id,
                        scope.subject
                    );
                    st.selection = st.catalog.clone();
                }
            }
            st.loaded = true;
        })
    }

    /// Toggle one topic within a chapter. Applies in memory immediately and
    /// schedules a deferred persist.
    pub fn toggle_topic(&self, chapter: &str, topic: &str) {
        {
            let mut st = self.state.lock();
            if st.scope.is_none() {
                log::warn!("prefs: toggle with no active scope ignored");
                return;
            }
            match st.selection.iter_mut().find(|c| c.chapter == chapter) {
                Some(entry) => {
                    if let Some(pos) = entry.topics.iter().position(|t| t == topic) {
                        entry.topics.remove(pos);
                    } else {
                        entry.topics.push(topic.to_string());
                    }
                }
                None => st.selection.push(TopicSelection {
                    chapter: chapter.to_string(),
                    topics: vec![topic.to_string()],
                }),
            }
        }
        self.schedule_save();
    }

    /// Replace a whole chapter's selected topics (select-all / clear-all).
    pub fn set_chapter(&self, chapter: &str, topics: Vec<String>) {
        {
            let mut st = self.state.lock();
            if st.scope.is_none() {
                log::warn!("prefs: edit with no active scope ignored");
                return;
            }
            match st.selection.iter_mut().find(|c| c.chapter == chapter) {
                Some(entry) => entry.topics = topics,
                None => st.selection.push(TopicSelection {
                    chapter: chapter.to_string(),
                    topics,
                }),
            }
        }
        self.schedule_save();
    }

    /// Current working selection (the user's source of truth regardless of
    /// remote outcome).
    pub fn selection(&self) -> Vec<TopicSelection> {
        self.state.lock().selection.clone()
    }

    pub fn is_selected(&self, chapter: &str, topic: &str) -> bool {
        self.state
            .lock()
            .selection
            .iter()
            .any(|c| c.chapter == chapter && c.topics.iter().any(|t| t == topic))
    }

    /// Whether the load phase has completed for the current scope.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    pub fn scope(&self) -> Option<PrefScope> {
        self.state.lock().scope.clone()
    }

    /// Arm (or re-arm) the debounce timer. The write payload is recomputed
    /// from the selection at fire time, not captured here.
    fn schedule_save(&self) {
        let gen = {
            let mut st = self.state.lock();
            st.save_gen += 1;
            st.save_gen
        };

        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let payload = {
                let st = state.lock();
                if st.save_gen != gen {
                    // Superseded by a later edit or a scope change.
                    return;
                }
                if !st.loaded {
                    log::debug!("prefs: persist suppressed until first load completes");
                    return;
                }
                let scope = match st.scope.clone() {
                    Some(s) => s,
                    None => return,
                };
                SavePreferencesRequest {
                    child_id: scope.child_id,
                    subject: scope.subject,
                    // Chapters with nothing selected are dropped before persistence.
                    selected_topics: st
                        .selection
                        .iter()
                        .filter(|c| !c.topics.is_empty())
                        .cloned()
                        .collect(),
                }
            };

            if let Err(e) = backend.save_preferences(&payload).await {
                // Not retried; the already-applied local selection stands.
                log::warn!(
                    "prefs: save failed for {}/{} (keeping local selection): {e}",
                    payload.child_id,
                    payload.subject
                );
            }
        });
    }
}
