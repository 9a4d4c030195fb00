//! The remote side of an edit session.
//!
//! A [`ReportGateway`] performs the queries and mutations the session needs.
//! The CLI provides a GraphQL-over-HTTP implementation; tests use an
//! in-memory recorder.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::model::{ReportSnapshot, SelectOption};
use crate::reconcile::EdgeRole;

/// Input of a field patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditInput {
    pub key: String,
    pub value: String,
}

/// Input of an "add edge" call. The call itself is addressed at the source
/// entity; `to_id` is the owning report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAddInput {
    pub from_role: String,
    pub to_id: String,
    pub to_role: String,
    pub through: String,
}

impl RelationAddInput {
    pub fn new(role: EdgeRole, to_id: impl Into<String>) -> Self {
        Self {
            from_role: role.from_role.to_string(),
            to_id: to_id.into(),
            to_role: role.to_role.to_string(),
            through: role.through.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server rejected the operation: {0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("report not found: {0}")]
    NotFound(String),
}

impl GatewayError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::TransportFailed,
            Self::Rejected(_) => ErrorCode::GraphQlRejected,
            Self::Malformed(_) => ErrorCode::MalformedResponse,
            Self::NotFound(_) => ErrorCode::ReportNotFound,
        }
    }
}

/// Remote queries and mutations used while editing a report.
///
/// Mutations return the updated report when the server sends one back.
pub trait ReportGateway: Send + Sync {
    /// # Errors
    /// Fails on transport errors, server errors, or an unknown id.
    fn fetch_report(&self, id: &str) -> Result<ReportSnapshot, GatewayError>;

    /// # Errors
    /// Fails on transport or server errors.
    fn field_patch(
        &self,
        id: &str,
        input: &EditInput,
    ) -> Result<Option<ReportSnapshot>, GatewayError>;

    /// # Errors
    /// Fails on transport or server errors.
    fn context_patch(&self, id: &str, focus_on: &str) -> Result<(), GatewayError>;

    /// # Errors
    /// Fails on transport or server errors.
    fn relation_add(
        &self,
        source_id: &str,
        input: &RelationAddInput,
    ) -> Result<Option<ReportSnapshot>, GatewayError>;

    /// # Errors
    /// Fails on transport or server errors.
    fn relation_delete(
        &self,
        id: &str,
        relation_id: &str,
    ) -> Result<Option<ReportSnapshot>, GatewayError>;

    /// # Errors
    /// Fails on transport or server errors.
    fn search_identities(
        &self,
        search: &str,
        first: u32,
    ) -> Result<Vec<SelectOption>, GatewayError>;

    /// # Errors
    /// Fails on transport or server errors.
    fn search_marking_definitions(
        &self,
        search: &str,
        first: u32,
    ) -> Result<Vec<SelectOption>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{CREATED_BY, OBJECT_MARKING};

    #[test]
    fn relation_add_input_uses_role_triple() {
        let input = RelationAddInput::new(CREATED_BY, "report-1");
        let json = serde_json::to_value(&input).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "fromRole": "creator",
                "toId": "report-1",
                "toRole": "so",
                "through": "created_by_ref",
            })
        );

        let marking = RelationAddInput::new(OBJECT_MARKING, "report-1");
        assert_eq!(marking.through, "object_marking_refs");
        assert_eq!(marking.from_role, "marking");
    }

    #[test]
    fn error_codes_map() {
        assert_eq!(
            GatewayError::Transport("refused".into()).code(),
            ErrorCode::TransportFailed
        );
        assert_eq!(
            GatewayError::NotFound("r".into()).code(),
            ErrorCode::ReportNotFound
        );
    }
}
