//! Fire-and-forget dispatch of remote mutations.
//!
//! A single worker thread owns the receiving end of a command queue and
//! executes commands one at a time, in submission order. Callers never wait
//! for a command to finish; they only learn about it through the report
//! snapshots the worker forwards on the update channel.
//!
//! Because there is one worker, a delete queued before an add is always sent
//! before it. Failures are logged and dropped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::gateway::{EditInput, GatewayError, RelationAddInput, ReportGateway};
use crate::model::ReportSnapshot;

/// One queued remote mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PatchField {
        report_id: String,
        input: EditInput,
    },
    Focus {
        report_id: String,
        focus_on: String,
    },
    AddEdge {
        source_id: String,
        input: RelationAddInput,
    },
    DeleteEdge {
        report_id: String,
        relation_id: String,
    },
}

impl Command {
    /// Operation name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PatchField { .. } => "fieldPatch",
            Self::Focus { .. } => "contextPatch",
            Self::AddEdge { .. } => "relationAdd",
            Self::DeleteEdge { .. } => "relationDelete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatcher is closed; command {0} dropped")]
    Closed(&'static str),
}

impl DispatchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Closed(_) => ErrorCode::DispatcherClosed,
        }
    }
}

/// Counters reported by the worker when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub executed: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    commands: Option<Sender<Command>>,
    updates: Receiver<ReportSnapshot>,
    worker: Option<JoinHandle<DispatchStats>>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(gateway: Arc<dyn ReportGateway>) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = channel::unbounded::<Command>();
        let (update_tx, update_rx) = channel::unbounded::<ReportSnapshot>();

        let worker = thread::Builder::new()
            .name("dossier-dispatch".into())
            .spawn(move || run_worker(gateway.as_ref(), &cmd_rx, &update_tx))?;

        Ok(Self {
            commands: Some(cmd_tx),
            updates: update_rx,
            worker: Some(worker),
            stats: DispatchStats::default(),
        })
    }

    /// Queue a command without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] after [`Dispatcher::finish`].
    pub fn submit(&self, command: Command) -> Result<(), DispatchError> {
        let kind = command.kind();
        let Some(tx) = &self.commands else {
            return Err(DispatchError::Closed(kind));
        };
        tx.send(command).map_err(|_| DispatchError::Closed(kind))?;
        debug!(kind, "command queued");
        Ok(())
    }

    /// Queue commands that must run in the given order.
    ///
    /// # Errors
    ///
    /// Stops at the first command that cannot be queued.
    pub fn submit_all(&self, commands: impl IntoIterator<Item = Command>) -> Result<(), DispatchError> {
        for command in commands {
            self.submit(command)?;
        }
        Ok(())
    }

    /// Snapshots returned by completed mutations since the last call.
    pub fn drain_updates(&self) -> Vec<ReportSnapshot> {
        self.updates.try_iter().collect()
    }

    /// Close the queue and wait until every queued command has run.
    ///
    /// Calling it again returns the same counters.
    pub fn finish(&mut self) -> DispatchStats {
        drop(self.commands.take());
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(stats) => self.stats = stats,
                Err(_) => warn!("dispatch worker panicked; queued commands may be lost"),
            }
        }
        self.stats
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

fn run_worker(
    gateway: &dyn ReportGateway,
    commands: &Receiver<Command>,
    updates: &Sender<ReportSnapshot>,
) -> DispatchStats {
    let mut stats = DispatchStats::default();
    for command in commands {
        stats.executed += 1;
        match execute(gateway, &command) {
            Ok(Some(snapshot)) => {
                // The receiver lives as long as the dispatcher; a send error
                // only means nobody is listening any more.
                let _ = updates.send(snapshot);
            }
            Ok(None) => {}
            Err(err) => {
                stats.failed += 1;
                warn!(
                    kind = command.kind(),
                    code = %err.code(),
                    error = %err,
                    "remote call failed; ignoring"
                );
            }
        }
    }
    debug!(executed = stats.executed, failed = stats.failed, "dispatch worker stopped");
    stats
}

fn execute(
    gateway: &dyn ReportGateway,
    command: &Command,
) -> Result<Option<ReportSnapshot>, GatewayError> {
    match command {
        Command::PatchField { report_id, input } => gateway.field_patch(report_id, input),
        Command::Focus {
            report_id,
            focus_on,
        } => gateway.context_patch(report_id, focus_on).map(|()| None),
        Command::AddEdge { source_id, input } => gateway.relation_add(source_id, input),
        Command::DeleteEdge {
            report_id,
            relation_id,
        } => gateway.relation_delete(report_id, relation_id),
    }
}
