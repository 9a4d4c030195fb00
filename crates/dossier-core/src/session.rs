//! One report open for editing.
//!
//! An [`EditSession`] keeps the last report state the server sent, turns user
//! edits into remote commands and hands those to a [`Dispatcher`]. Edits are
//! never awaited: every `change_*`/`submit_*` call returns as soon as its
//! commands are queued, and the snapshot catches up on the next [`sync`].
//!
//! [`sync`]: EditSession::sync

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::dispatch::{Command, DispatchError, DispatchStats, Dispatcher};
use crate::error::ErrorCode;
use crate::gateway::{EditInput, GatewayError, RelationAddInput, ReportGateway};
use crate::model::{
    Association, InitialValues, ReportSnapshot, SelectOption, SingularAssociation, union_options,
};
use crate::presence::{EditUser, editors_of};
use crate::reconcile::{
    EdgeStep, ManyDiff, MarkingBatch, ReconcileError, SingularAction, plan_many, plan_singular,
    reconcile_many, reconcile_singular,
};
use crate::validate::{Field, ValidationError, validate_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSettings {
    pub marking_batch: MarkingBatch,
    pub identities_page_size: u32,
    pub markings_page_size: u32,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for EditSettings {
    fn from(cfg: &ProjectConfig) -> Self {
        Self {
            marking_batch: cfg.edit.marking_batch,
            identities_page_size: cfg.search.identities_page_size,
            markings_page_size: cfg.search.markings_page_size,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("failed to start dispatcher: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SessionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Reconcile(e) => e.code(),
            Self::Dispatch(e) => e.code(),
            Self::Gateway(e) => e.code(),
            Self::Spawn(_) => ErrorCode::InternalUnexpected,
        }
    }
}

/// What happened to a field submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Dispatched,
    /// The value failed validation; nothing was sent.
    Skipped(ValidationError),
}

/// The outcome of a marking change: the full diff, and the steps actually
/// queued under the batch policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkingChange {
    pub diff: ManyDiff,
    pub steps: Vec<EdgeStep>,
}

pub struct EditSession {
    gateway: Arc<dyn ReportGateway>,
    dispatcher: Dispatcher,
    report: ReportSnapshot,
    settings: EditSettings,
    me: Option<String>,
    identity_options: Vec<SelectOption>,
    marking_options: Vec<SelectOption>,
}

impl EditSession {
    /// Start a session over an already known snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the dispatch worker cannot be started.
    pub fn new(
        gateway: Arc<dyn ReportGateway>,
        report: ReportSnapshot,
        settings: EditSettings,
    ) -> Result<Self, SessionError> {
        let dispatcher = Dispatcher::spawn(Arc::clone(&gateway))?;
        Ok(Self {
            gateway,
            dispatcher,
            report,
            settings,
            me: None,
            identity_options: Vec::new(),
            marking_options: Vec::new(),
        })
    }

    /// Fetch `report_id` and start a session over it.
    ///
    /// # Errors
    ///
    /// Fails if the report cannot be fetched or the worker cannot start.
    pub fn open(
        gateway: Arc<dyn ReportGateway>,
        report_id: &str,
        settings: EditSettings,
    ) -> Result<Self, SessionError> {
        let report = gateway.fetch_report(report_id)?;
        info!(report_id, "report opened for edition");
        Self::new(gateway, report, settings)
    }

    #[must_use]
    pub fn with_me(mut self, me: Option<String>) -> Self {
        self.me = me;
        self
    }

    pub const fn report(&self) -> &ReportSnapshot {
        &self.report
    }

    pub const fn settings(&self) -> &EditSettings {
        &self.settings
    }

    #[must_use]
    pub fn initial_values(&self) -> InitialValues {
        self.report.initial_values()
    }

    // -----------------------------------------------------------------------
    // Field edits
    // -----------------------------------------------------------------------

    /// Tell collaborators which field this user is on.
    ///
    /// # Errors
    ///
    /// Fails only if the dispatcher is closed.
    pub fn change_focus(&self, field: Field) -> Result<(), SessionError> {
        self.dispatcher.submit(Command::Focus {
            report_id: self.report.id.clone(),
            focus_on: field.as_str().to_string(),
        })?;
        Ok(())
    }

    /// Validate one field and autosave it if valid.
    ///
    /// # Errors
    ///
    /// Fails only if the dispatcher is closed. Invalid values are reported as
    /// [`SubmitOutcome::Skipped`], not as errors.
    pub fn submit_field(&self, field: Field, value: &str) -> Result<SubmitOutcome, SessionError> {
        if let Err(err) = validate_at(field, value) {
            debug!(field = field.as_str(), reason = %err.reason, "save skipped");
            return Ok(SubmitOutcome::Skipped(err));
        }
        self.dispatcher.submit(Command::PatchField {
            report_id: self.report.id.clone(),
            input: EditInput {
                key: field.as_str().to_string(),
                value: value.to_string(),
            },
        })?;
        Ok(SubmitOutcome::Dispatched)
    }

    /// Point the created-by edge at `choice`.
    ///
    /// # Errors
    ///
    /// Fails if a replace is needed but the current edge has no relation id,
    /// or if the dispatcher is closed.
    pub fn change_created_by(&self, choice: SelectOption) -> Result<SingularAction, SessionError> {
        let current = self.report.created_by();
        let desired = SingularAssociation::from(choice);
        let action = reconcile_singular(&current, &desired);
        let steps = plan_singular(&action)?;
        debug!(?action, steps = steps.len(), "created-by change planned");
        self.dispatch_steps(steps)?;
        Ok(action)
    }

    /// Replace the marking set with `desired`.
    ///
    /// # Errors
    ///
    /// Fails if a removal has no relation id, or if the dispatcher is closed.
    pub fn change_markings(&self, desired: &[Association]) -> Result<MarkingChange, SessionError> {
        let current = self.report.marking_associations();
        let diff = reconcile_many(&current, desired);
        let steps = plan_many(&diff, self.settings.marking_batch)?;
        if steps.len() < diff.to_add.len() + diff.to_remove.len() {
            debug!(
                added = diff.to_add.len(),
                removed = diff.to_remove.len(),
                planned = steps.len(),
                "marking change truncated by batch policy"
            );
        }
        self.dispatch_steps(steps.clone())?;
        Ok(MarkingChange { diff, steps })
    }

    /// Build a desired marking set from target ids.
    ///
    /// Ids already linked keep their existing edge; others become fresh picks,
    /// labelled from the marking options when known.
    #[must_use]
    pub fn select_markings(&self, ids: &[String]) -> Vec<Association> {
        let current = self.report.marking_associations();
        let mut out: Vec<Association> = Vec::new();
        for id in ids {
            if out.iter().any(|a| &a.value == id) {
                continue;
            }
            let assoc = current
                .iter()
                .find(|a| &a.value == id)
                .cloned()
                .unwrap_or_else(|| {
                    let label = self
                        .marking_options
                        .iter()
                        .find(|o| &o.value == id)
                        .map_or_else(|| id.clone(), |o| o.label.clone());
                    Association::picked(label, id.clone())
                });
            out.push(assoc);
        }
        out
    }

    fn dispatch_steps(&self, steps: Vec<EdgeStep>) -> Result<(), DispatchError> {
        let report_id = &self.report.id;
        self.dispatcher
            .submit_all(steps.into_iter().map(|step| match step {
                EdgeStep::Add { source, role } => Command::AddEdge {
                    source_id: source,
                    input: RelationAddInput::new(role, report_id.clone()),
                },
                EdgeStep::Delete { relation_id } => Command::DeleteEdge {
                    report_id: report_id.clone(),
                    relation_id,
                },
            }))
    }

    // -----------------------------------------------------------------------
    // Autocomplete
    // -----------------------------------------------------------------------

    /// Search identities and merge the hits into the accumulated options.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; options are left unchanged.
    pub fn search_identities(&mut self, text: &str) -> Result<&[SelectOption], SessionError> {
        let hits = self
            .gateway
            .search_identities(text, self.settings.identities_page_size)?;
        union_options(&mut self.identity_options, hits);
        Ok(&self.identity_options)
    }

    /// Search marking definitions; the hits replace the previous options.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; options are left unchanged.
    pub fn search_marking_definitions(
        &mut self,
        text: &str,
    ) -> Result<&[SelectOption], SessionError> {
        let hits = self
            .gateway
            .search_marking_definitions(text, self.settings.markings_page_size)?;
        self.marking_options = hits;
        Ok(&self.marking_options)
    }

    pub fn identity_options(&self) -> &[SelectOption] {
        &self.identity_options
    }

    pub fn marking_options(&self) -> &[SelectOption] {
        &self.marking_options
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Apply every snapshot returned by completed mutations. Returns whether
    /// the report changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        for snapshot in self.dispatcher.drain_updates() {
            changed |= self.refresh(snapshot);
        }
        changed
    }

    /// Apply a snapshot pushed from elsewhere (e.g. a subscription).
    /// Snapshots of other reports are ignored.
    pub fn refresh(&mut self, snapshot: ReportSnapshot) -> bool {
        if snapshot.id != self.report.id {
            debug!(expected = %self.report.id, got = %snapshot.id, "ignoring foreign snapshot");
            return false;
        }
        if snapshot == self.report {
            return false;
        }
        self.report = snapshot;
        true
    }

    /// Other users currently focused on `field`.
    #[must_use]
    pub fn editors_of(&self, field: Field) -> Vec<&EditUser> {
        editors_of(self.report.editors(), self.me.as_deref(), field.as_str())
    }

    /// Wait for queued commands, apply their results and close the session.
    #[must_use]
    pub fn finish(mut self) -> (ReportSnapshot, DispatchStats) {
        let stats = self.dispatcher.finish();
        self.sync();
        (self.report, stats)
    }
}
