//! The report edit fragment as returned by the server, and the form values
//! derived from it.

use serde::{Deserialize, Serialize};

use super::association::{Association, SingularAssociation};
use crate::presence::EditUser;
use crate::validate::format_date;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedByRef {
    pub node: Option<NodeRef>,
    pub relation: Option<RelationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingNode {
    pub id: String,
    pub definition: String,
    #[serde(default)]
    pub definition_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingEdge {
    pub node: MarkingNode,
    pub relation: RelationRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingConnection {
    #[serde(default)]
    pub edges: Vec<MarkingEdge>,
}

/// Last known server state of one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by_ref: Option<CreatedByRef>,
    #[serde(default)]
    pub marking_definitions: Option<MarkingConnection>,
    #[serde(default)]
    pub edit_context: Option<Vec<EditUser>>,
}

impl ReportSnapshot {
    /// A bare snapshot with only an id, used before the first fetch completes.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            published: None,
            description: None,
            created_by_ref: None,
            marking_definitions: None,
            edit_context: None,
        }
    }

    /// The current created-by edge. Every part is `None` when no author is set.
    #[must_use]
    pub fn created_by(&self) -> SingularAssociation {
        let Some(cbr) = &self.created_by_ref else {
            return SingularAssociation::default();
        };
        SingularAssociation {
            label: cbr.node.as_ref().and_then(|n| n.name.clone()),
            value: cbr.node.as_ref().map(|n| n.id.clone()),
            relation: cbr.relation.as_ref().map(|r| r.id.clone()),
        }
    }

    /// The current marking edges, in server order.
    #[must_use]
    pub fn marking_associations(&self) -> Vec<Association> {
        self.marking_definitions
            .as_ref()
            .map(|conn| {
                conn.edges
                    .iter()
                    .map(|e| {
                        Association::existing(
                            e.node.definition.clone(),
                            e.node.id.clone(),
                            e.relation.id.clone(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Users currently editing this report, as pushed by the server.
    #[must_use]
    pub fn editors(&self) -> &[EditUser] {
        self.edit_context.as_deref().unwrap_or(&[])
    }

    #[must_use]
    pub fn initial_values(&self) -> InitialValues {
        InitialValues {
            name: self.name.clone().unwrap_or_default(),
            published: self
                .published
                .as_deref()
                .and_then(format_date)
                .unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            created_by_ref: self.created_by(),
            marking_definitions: self.marking_associations(),
        }
    }
}

/// Values the edit form starts from. Re-derived after every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialValues {
    pub name: String,
    /// `YYYY-MM-DD`, empty when the report has no parseable date.
    pub published: String,
    pub description: String,
    pub created_by_ref: SingularAssociation,
    pub marking_definitions: Vec<Association>,
}
