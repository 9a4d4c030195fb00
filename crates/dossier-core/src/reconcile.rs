//! Relation reconciliation.
//!
//! Turns "what the server has" and "what the user picked" into the edge
//! operations needed to get from one to the other. Two shapes exist:
//!
//! - **Many-valued** (marking definitions): a set difference in both
//!   directions, compared by full value.
//! - **Singular** (created-by identity): no-op, add, or replace, where replace
//!   is a delete of the old edge followed by an add of the new one.
//!
//! Everything here is pure. Inputs are borrowed and never modified; the
//! resulting [`EdgeStep`] plans are executed by the caller, in order.
//!
//! # Replace is not atomic
//!
//! A replace plan is two independent remote calls. If the delete succeeds and
//! the add fails, the report ends up with no author. Nothing here rolls that
//! back; each step can be re-planned and retried from a fresh snapshot.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::model::{Association, SingularAssociation};

// ---------------------------------------------------------------------------
// Edge roles
// ---------------------------------------------------------------------------

/// The fixed role triple sent with every "add edge" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeRole {
    pub from_role: &'static str,
    pub to_role: &'static str,
    pub through: &'static str,
}

/// Identity -> report authorship edge.
pub const CREATED_BY: EdgeRole = EdgeRole {
    from_role: "creator",
    to_role: "so",
    through: "created_by_ref",
};

/// Marking definition -> report edge.
pub const OBJECT_MARKING: EdgeRole = EdgeRole {
    from_role: "marking",
    to_role: "so",
    through: "object_marking_refs",
};

// ---------------------------------------------------------------------------
// Many-valued
// ---------------------------------------------------------------------------

/// How many differences a single marking change turns into edge calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkingBatch {
    /// Only the first added and the first removed entry. A form edit changes
    /// one chip at a time, so this is all a single event can carry.
    #[default]
    First,
    /// Every added and every removed entry.
    All,
}

/// Result of comparing a current and a desired many-valued set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManyDiff {
    /// In `desired`, not in `current`. Desired order.
    pub to_add: Vec<Association>,
    /// In `current`, not in `desired`. Current order.
    pub to_remove: Vec<Association>,
}

impl ManyDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute additions and removals between two association lists.
///
/// Membership is full-value equality on label, value and relation id.
#[must_use]
pub fn reconcile_many(current: &[Association], desired: &[Association]) -> ManyDiff {
    ManyDiff {
        to_add: difference(desired, current),
        to_remove: difference(current, desired),
    }
}

/// Elements of `left` absent from `right`, deduplicated, in `left` order.
fn difference(left: &[Association], right: &[Association]) -> Vec<Association> {
    let mut out: Vec<Association> = Vec::new();
    for item in left {
        if !right.contains(item) && !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Singular
// ---------------------------------------------------------------------------

/// What to do with a single-valued edge after the user picked a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingularAction {
    /// Same target as before.
    NoOp,
    /// No edge yet; link `target`.
    Add { target: String },
    /// Delete the edge `relation`, then link `target`.
    Replace {
        relation: Option<String>,
        target: String,
    },
}

/// Decide the action for a singular association.
///
/// `desired.value` is expected to be set; a `None` desired value against an
/// empty current is treated as a no-op.
#[must_use]
pub fn reconcile_singular(
    current: &SingularAssociation,
    desired: &SingularAssociation,
) -> SingularAction {
    if current.value == desired.value {
        return SingularAction::NoOp;
    }
    let Some(target) = desired.value.clone() else {
        return SingularAction::NoOp;
    };
    match &current.value {
        None => SingularAction::Add { target },
        Some(_) => SingularAction::Replace {
            relation: current.relation.clone(),
            target,
        },
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// One remote edge call, in the order it must be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeStep {
    /// Link `source` to the owning entity with `role`.
    Add { source: String, role: EdgeRole },
    /// Remove the edge identified by `relation_id`.
    Delete { relation_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("edge to '{target}' has no relation id and cannot be deleted")]
    MissingRelationId { target: String },
}

impl ReconcileError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingRelationId { .. } => ErrorCode::MissingRelationId,
        }
    }
}

/// Plan the edge calls for a marking diff: adds first, then deletes.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingRelationId`] if a planned removal has no
/// relation id. Nothing is planned in that case.
pub fn plan_many(diff: &ManyDiff, batch: MarkingBatch) -> Result<Vec<EdgeStep>, ReconcileError> {
    let take = match batch {
        MarkingBatch::First => 1,
        MarkingBatch::All => usize::MAX,
    };

    let mut steps = Vec::new();
    for added in diff.to_add.iter().take(take) {
        steps.push(EdgeStep::Add {
            source: added.value.clone(),
            role: OBJECT_MARKING,
        });
    }
    for removed in diff.to_remove.iter().take(take) {
        let relation_id = removed.relation_id.clone().ok_or_else(|| {
            ReconcileError::MissingRelationId {
                target: removed.value.clone(),
            }
        })?;
        steps.push(EdgeStep::Delete { relation_id });
    }
    Ok(steps)
}

/// Plan the edge calls for a singular action. A replace is delete-then-add.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingRelationId`] when a replace has no
/// relation id for the old edge; adding without deleting would leave two
/// authors.
pub fn plan_singular(action: &SingularAction) -> Result<Vec<EdgeStep>, ReconcileError> {
    match action {
        SingularAction::NoOp => Ok(Vec::new()),
        SingularAction::Add { target } => Ok(vec![EdgeStep::Add {
            source: target.clone(),
            role: CREATED_BY,
        }]),
        SingularAction::Replace { relation, target } => {
            let relation_id = relation
                .clone()
                .ok_or_else(|| ReconcileError::MissingRelationId {
                    target: target.clone(),
                })?;
            Ok(vec![
                EdgeStep::Delete { relation_id },
                EdgeStep::Add {
                    source: target.clone(),
                    role: CREATED_BY,
                },
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(value: Option<&str>, relation: Option<&str>) -> SingularAssociation {
        SingularAssociation {
            label: value.map(|v| format!("label-{v}")),
            value: value.map(str::to_string),
            relation: relation.map(str::to_string),
        }
    }

    #[test]
    fn adding_one_marking() {
        let current = vec![Association::existing("TLP:WHITE", "m1", "e1")];
        let desired = vec![
            Association::existing("TLP:WHITE", "m1", "e1"),
            Association::picked("TLP:RED", "m2"),
        ];
        let diff = reconcile_many(&current, &desired);
        assert_eq!(diff.to_add, vec![Association::picked("TLP:RED", "m2")]);
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn clearing_markings() {
        let current = vec![Association::existing("TLP:WHITE", "m1", "e1")];
        let diff = reconcile_many(&current, &[]);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, current);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let current = vec![Association::existing("A", "m1", "e1")];
        let desired = vec![Association::picked("B", "m2")];
        let (c, d) = (current.clone(), desired.clone());
        let _ = reconcile_many(&current, &desired);
        assert_eq!(current, c);
        assert_eq!(desired, d);
    }

    #[test]
    fn first_batch_plans_one_of_each() {
        let diff = ManyDiff {
            to_add: vec![Association::picked("A", "m2"), Association::picked("B", "m3")],
            to_remove: vec![
                Association::existing("C", "m4", "e4"),
                Association::existing("D", "m5", "e5"),
            ],
        };
        let steps = plan_many(&diff, MarkingBatch::First).expect("plan");
        assert_eq!(
            steps,
            vec![
                EdgeStep::Add {
                    source: "m2".into(),
                    role: OBJECT_MARKING
                },
                EdgeStep::Delete {
                    relation_id: "e4".into()
                },
            ]
        );

        let all = plan_many(&diff, MarkingBatch::All).expect("plan");
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn removal_without_relation_id_is_rejected() {
        let diff = ManyDiff {
            to_add: vec![],
            to_remove: vec![Association::picked("A", "m1")],
        };
        let err = plan_many(&diff, MarkingBatch::All).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::MissingRelationId);
    }

    #[test]
    fn same_author_is_noop() {
        let current = single(Some("A"), Some("r1"));
        let desired = single(Some("A"), None);
        assert_eq!(reconcile_singular(&current, &desired), SingularAction::NoOp);
    }

    #[test]
    fn first_author_is_add() {
        let action = reconcile_singular(&single(None, None), &single(Some("X"), None));
        assert_eq!(
            action,
            SingularAction::Add {
                target: "X".into()
            }
        );
        assert_eq!(
            plan_singular(&action).expect("plan"),
            vec![EdgeStep::Add {
                source: "X".into(),
                role: CREATED_BY
            }]
        );
    }

    #[test]
    fn new_author_replaces_delete_then_add() {
        let action = reconcile_singular(&single(Some("A"), Some("r1")), &single(Some("B"), None));
        assert_eq!(
            action,
            SingularAction::Replace {
                relation: Some("r1".into()),
                target: "B".into()
            }
        );
        assert_eq!(
            plan_singular(&action).expect("plan"),
            vec![
                EdgeStep::Delete {
                    relation_id: "r1".into()
                },
                EdgeStep::Add {
                    source: "B".into(),
                    role: CREATED_BY
                },
            ]
        );
    }

    #[test]
    fn replace_without_relation_fails_to_plan() {
        let action = reconcile_singular(&single(Some("A"), None), &single(Some("B"), None));
        assert!(matches!(
            plan_singular(&action),
            Err(ReconcileError::MissingRelationId { target }) if target == "B"
        ));
    }

    #[test]
    fn batch_policy_parses_from_toml_values() {
        #[derive(Deserialize)]
        struct Wrapper {
            batch: MarkingBatch,
        }
        let w: Wrapper = toml::from_str("batch = \"all\"").expect("parse");
        assert_eq!(w.batch, MarkingBatch::All);
        assert_eq!(MarkingBatch::default(), MarkingBatch::First);
    }
}
