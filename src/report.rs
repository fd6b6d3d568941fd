//! Report generation and distribution workflow.
//!
//! One controller per class scope, tracking the distinct phases of the
//! share flow: generate a time-limited report link, optionally collect
//! recipient contacts, confirm, send. Each step fails independently —
//! a failed generate returns to `NoReport`, a failed send returns to
//! `Ready` with the token still valid.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api::Backend;
use crate::error::ApiError;
use crate::subscription::SubscriptionUsageGate;
use crate::types::{Child, ContactRow, ReportState, SendOutcome};

/// Failure of a workflow step.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No class selected")]
    NoClass,

    #[error("Action not available in the current phase")]
    WrongPhase,

    #[error("Report generation limit reached")]
    QuotaExhausted,

    /// The held report link is past its server-side expiry — a distinct,
    /// user-readable terminal state, not a generic failure.
    #[error("Report link has expired")]
    ReportExpired,

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::Api(e) if e.is_retryable())
    }
}

/// Clipboard access is supplied by the shell; writing can fail (platform
/// permission, headless context) and both outcomes are user-visible.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Pre-formatted compose text for the share-via-link action. Opening the
/// external compose target is the shell's job; no network call, no state
/// change here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMessage {
    pub subject: String,
    pub body: String,
}

/// Where the workflow currently is for the active class scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPhase {
    NoReport,
    Generating,
    Ready,
    EditingContacts,
    ConfirmingSend {
        /// Contacts with a saved email at the moment confirmation was shown.
        recipient_count: usize,
    },
    Sending,
    Sent(SendOutcome),
}

/// How a send-confirmation request resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEntry {
    Confirm { recipient_count: usize },
    /// No contact has a saved email yet; the flow moved to contact editing.
    RedirectedToContacts,
}

pub struct ReportWorkflowController {
    backend: Arc<dyn Backend>,
    class_id: Option<String>,
    phase: ReportPhase,
    report: Option<ReportState>,
    /// Last-known saved contact rows for the current class.
    contacts: Vec<ContactRow>,
    /// Modal-scoped edit buffer, meaningful only in `EditingContacts`.
    edit_buffer: Vec<ContactRow>,
}

impl ReportWorkflowController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        ReportWorkflowController {
            backend,
            class_id: None,
            phase: ReportPhase::NoReport,
            report: None,
            contacts: Vec::new(),
            edit_buffer: Vec::new(),
        }
    }

    pub fn phase(&self) -> &ReportPhase {
        &self.phase
    }

    pub fn class_id(&self) -> Option<&str> {
        self.class_id.as_deref()
    }

    pub fn report(&self) -> Option<&ReportState> {
        self.report.as_ref()
    }

    pub fn contacts(&self) -> &[ContactRow] {
        &self.contacts
    }

    pub fn edit_buffer(&self) -> &[ContactRow] {
        &self.edit_buffer
    }

    /// Switch the class scope. A report generated for a different class
    /// never carries over: everything resets to `NoReport`.
    pub fn set_class(&mut self, class_id: &str) {
        if self.class_id.as_deref() == Some(class_id) {
            return;
        }
        self.class_id = Some(class_id.to_string());
        self.phase = ReportPhase::NoReport;
        self.report = None;
        self.contacts.clear();
        self.edit_buffer.clear();
    }

    /// Refresh the contact cache for the current class.
    pub async fn load_contacts(&mut self) -> Result<&[ContactRow], WorkflowError> {
        let class_id = self.class_id.clone().ok_or(WorkflowError::NoClass)?;
        self.contacts = self.backend.fetch_contacts(&class_id).await?;
        Ok(&self.contacts)
    }

    /// Generate (or regenerate) the shareable report. Failure returns to
    /// `NoReport` with a retryable error; no partial report is ever held.
    pub async fn generate(
        &mut self,
        gate: &SubscriptionUsageGate,
    ) -> Result<ReportState, WorkflowError> {
        let class_id = self.class_id.clone().ok_or(WorkflowError::NoClass)?;
        match self.phase {
            ReportPhase::NoReport | ReportPhase::Ready | ReportPhase::Sent(_) => {}
            _ => return Err(WorkflowError::WrongPhase),
        }
        if !gate.can_generate() {
            return Err(WorkflowError::QuotaExhausted);
        }

        self.phase = ReportPhase::Generating;
        self.report = None;

        match self.backend.generate_report(&class_id).await {
            Ok(report) => {
                self.report = Some(report.clone());
                self.phase = ReportPhase::Ready;
                gate.consume_local();
                Ok(report)
            }
            Err(e) => {
                self.phase = ReportPhase::NoReport;
                Err(e.into())
            }
        }
    }

    /// Copy the share link. Available from `Ready` (and later phases that
    /// still hold the report) without leaving the current phase.
    pub fn copy_link(&self, clipboard: &dyn Clipboard) -> Result<(), WorkflowError> {
        let report = self.report.as_ref().ok_or(WorkflowError::WrongPhase)?;
        clipboard
            .write_text(&report.share_url)
            .map_err(WorkflowError::Clipboard)
    }

    /// Pre-formatted compose text for sharing the link externally.
    pub fn share_message(&self) -> Option<ShareMessage> {
        let report = self.report.as_ref()?;
        Some(ShareMessage {
            subject: "Class progress report".to_string(),
            body: format!(
                "Here is the latest class progress report:\n\n{}\n\nThe link is valid until {}.",
                report.share_url,
                report.expires_at.format("%Y-%m-%d"),
            ),
        })
    }

    /// Open the contact-editing buffer: last-known rows plus a blank row
    /// for every roster student without one.
    pub fn begin_contact_edit(&mut self, roster: &[Child]) -> Result<&[ContactRow], WorkflowError> {
        if self.phase != ReportPhase::Ready {
            return Err(WorkflowError::WrongPhase);
        }
        self.seed_edit_buffer(roster);
        self.phase = ReportPhase::EditingContacts;
        Ok(&self.edit_buffer)
    }

    fn seed_edit_buffer(&mut self, roster: &[Child]) {
        self.edit_buffer = self.contacts.clone();
        for child in roster {
            if !self.edit_buffer.iter().any(|r| r.child_id == child.id) {
                self.edit_buffer.push(ContactRow {
                    child_id: child.id.clone(),
                    child_name: child.name.clone(),
                    parent_email: String::new(),
                });
            }
        }
    }

    /// Edit one row of the buffer. Rows are fixed by the roster; an unknown
    /// child id is ignored.
    pub fn update_contact(&mut self, child_id: &str, email: &str) -> Result<(), WorkflowError> {
        if self.phase != ReportPhase::EditingContacts {
            return Err(WorkflowError::WrongPhase);
        }
        match self.edit_buffer.iter_mut().find(|r| r.child_id == child_id) {
            Some(row) => row.parent_email = email.to_string(),
            None => log::warn!("report: contact edit for unknown child {child_id} ignored"),
        }
        Ok(())
    }

    pub fn cancel_contact_edit(&mut self) {
        if self.phase == ReportPhase::EditingContacts {
            self.edit_buffer.clear();
            self.phase = ReportPhase::Ready;
        }
    }

    /// Post the non-blank subset, then re-fetch — the server, not the local
    /// buffer, is the source of truth after a save. A failed save keeps the
    /// buffer and phase so the user can retry or cancel.
    pub async fn save_contacts(&mut self) -> Result<(), WorkflowError> {
        if self.phase != ReportPhase::EditingContacts {
            return Err(WorkflowError::WrongPhase);
        }
        let class_id = self.class_id.clone().ok_or(WorkflowError::NoClass)?;

        let non_blank: Vec<ContactRow> = self
            .edit_buffer
            .iter()
            .filter(|r| r.has_email())
            .cloned()
            .collect();
        self.backend.save_contacts(&class_id, &non_blank).await?;

        match self.backend.fetch_contacts(&class_id).await {
            Ok(rows) => self.contacts = rows,
            Err(e) => {
                log::warn!("report: contact refetch after save failed, using posted rows: {e}");
                self.contacts = non_blank;
            }
        }
        self.edit_buffer.clear();
        self.phase = ReportPhase::Ready;
        Ok(())
    }

    /// Move toward sending. If no contact has a saved email yet, the flow
    /// redirects to contact editing instead. The recipient count is
    /// computed from the contacts as they are *now*, not cached from any
    /// earlier step.
    pub fn begin_send_confirmation(
        &mut self,
        roster: &[Child],
    ) -> Result<ConfirmEntry, WorkflowError> {
        if self.phase != ReportPhase::Ready {
            return Err(WorkflowError::WrongPhase);
        }
        if self.report.is_none() {
            return Err(WorkflowError::WrongPhase);
        }

        let recipient_count = self.contacts.iter().filter(|r| r.has_email()).count();
        if recipient_count == 0 {
            self.seed_edit_buffer(roster);
            self.phase = ReportPhase::EditingContacts;
            return Ok(ConfirmEntry::RedirectedToContacts);
        }
        self.phase = ReportPhase::ConfirmingSend { recipient_count };
        Ok(ConfirmEntry::Confirm { recipient_count })
    }

    pub fn cancel_send_confirmation(&mut self) {
        if matches!(self.phase, ReportPhase::ConfirmingSend { .. }) {
            self.phase = ReportPhase::Ready;
        }
    }

    /// Send the report email. Failure reverts to `Ready` — the token stays
    /// valid and reusable — rather than discarding the report.
    pub async fn confirm_send(&mut self) -> Result<SendOutcome, WorkflowError> {
        if !matches!(self.phase, ReportPhase::ConfirmingSend { .. }) {
            return Err(WorkflowError::WrongPhase);
        }
        let class_id = self.class_id.clone().ok_or(WorkflowError::NoClass)?;
        let token = match &self.report {
            Some(r) => r.token.clone(),
            None => return Err(WorkflowError::WrongPhase),
        };

        self.phase = ReportPhase::Sending;
        match self.backend.send_report_email(&class_id, &token).await {
            Ok(outcome) => {
                self.phase = ReportPhase::Sent(outcome);
                Ok(outcome)
            }
            Err(e) => {
                self.phase = ReportPhase::Ready;
                Err(e.into())
            }
        }
    }

    /// Check the held report against its expiry. Expiry is enforced
    /// server-side; this only surfaces the distinct display state.
    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        match &self.report {
            Some(report) if report.is_expired(now) => Err(WorkflowError::ReportExpired),
            _ => Ok(()),
        }
    }
}
