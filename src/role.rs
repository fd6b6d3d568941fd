//! Profile cache and optimistic role switching.
//!
//! The switch is apply-then-confirm: the target role lands in local state
//! immediately, the server confirms (or not), and on failure the cache is
//! replaced with a freshly fetched authoritative profile rather than a
//! hand-rolled undo. The UI never observes an intermediate role.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::Backend;
use crate::error::{ApiError, ApiResult};
use crate::types::{Profile, Role};

/// What the profile cache currently knows.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    /// Not fetched yet (or the last fetch failed with nothing cached).
    Unknown,
    /// The server has no profile for this user — role selection needed.
    NeedsRoleSelection,
    Loaded(Profile),
}

/// Resolution of a switch request.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleSwitchOutcome {
    /// Server confirmed; carries the authoritative active role (the server
    /// may normalize the request).
    Confirmed(Role),
    /// Server rejected or the call failed; local state shows this role
    /// again. The caller decides whether to inform the user.
    RolledBack(Role),
}

/// Per-user profile cache, initialized on sign-in.
pub struct ProfileStore {
    backend: Arc<dyn Backend>,
    state: Mutex<ProfileState>,
}

impl ProfileStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        ProfileStore {
            backend,
            state: Mutex::new(ProfileState::Unknown),
        }
    }

    pub fn state(&self) -> ProfileState {
        self.state.lock().clone()
    }

    /// The role the UI should render right now, if a profile is loaded.
    pub fn active_role(&self) -> Option<Role> {
        match &*self.state.lock() {
            ProfileState::Loaded(p) => Some(p.active_role),
            _ => None,
        }
    }

    /// Fetch the authoritative profile. On failure the previous cached
    /// state is kept and the error is returned.
    pub async fn load(&self) -> ApiResult<ProfileState> {
        match self.backend.fetch_profile().await {
            Ok(Some(profile)) => {
                let state = ProfileState::Loaded(profile);
                *self.state.lock() = state.clone();
                Ok(state)
            }
            Ok(None) => {
                *self.state.lock() = ProfileState::NeedsRoleSelection;
                Ok(ProfileState::NeedsRoleSelection)
            }
            Err(e) => {
                log::warn!("profile: load failed, keeping cached state: {e}");
                Err(e)
            }
        }
    }

    /// Full profile replace (first role selection or profile edit). The
    /// server's returned copy becomes the cached profile.
    pub async fn save_profile(&self, profile: &Profile) -> ApiResult<Profile> {
        let saved = self.backend.update_profile(profile).await?;
        *self.state.lock() = ProfileState::Loaded(saved.clone());
        Ok(saved)
    }

    /// Optimistically switch the active role, then confirm remotely.
    ///
    /// On confirmation the cache takes the server's authoritative response.
    /// On failure the optimistic value is discarded and the profile is
    /// re-fetched from scratch; if even that fails, the remembered
    /// pre-switch profile is restored. Either way the active role resolves
    /// to a defined value — the original or the target, never in between.
    pub async fn switch_role(&self, target: Role) -> ApiResult<RoleSwitchOutcome> {
        let original = {
            let mut guard = self.state.lock();
            let profile = match &mut *guard {
                ProfileState::Loaded(p) => p,
                _ => {
                    return Err(ApiError::Status {
                        status: 409,
                        detail: "no profile loaded".to_string(),
                    })
                }
            };
            let original = profile.clone();
            profile.active_role = target;
            original
        };

        match self.backend.switch_role(target).await {
            Ok(authoritative) => {
                let confirmed = authoritative.active_role;
                *self.state.lock() = ProfileState::Loaded(authoritative);
                Ok(RoleSwitchOutcome::Confirmed(confirmed))
            }
            Err(e) => {
                log::warn!("profile: switch to {target} failed, reverting: {e}");
                match self.backend.fetch_profile().await {
                    Ok(Some(profile)) => {
                        let role = profile.active_role;
                        *self.state.lock() = ProfileState::Loaded(profile);
                        Ok(RoleSwitchOutcome::RolledBack(role))
                    }
                    Ok(None) => {
                        *self.state.lock() = ProfileState::NeedsRoleSelection;
                        Ok(RoleSwitchOutcome::RolledBack(original.active_role))
                    }
                    Err(refetch_err) => {
                        // Authoritative copy unreachable — fall back to the
                        // remembered pre-switch profile.
                        log::warn!("profile: revert fetch failed, restoring cached copy: {refetch_err}");
                        let role = original.active_role;
                        *self.state.lock() = ProfileState::Loaded(original);
                        Ok(RoleSwitchOutcome::RolledBack(role))
                    }
                }
            }
        }
    }
}
