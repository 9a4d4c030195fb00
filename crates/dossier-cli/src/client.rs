//! GraphQL-over-HTTP implementation of [`ReportGateway`].

use std::time::Duration;

use dossier_core::gateway::{EditInput, GatewayError, RelationAddInput, ReportGateway};
use dossier_core::model::{ReportSnapshot, SelectOption};
use serde_json::{Value, json};
use tracing::debug;

const REPORT_FRAGMENT: &str = r"
fragment ReportEdition_report on Report {
    id
    name
    published
    description
    createdByRef {
        node { id name }
        relation { id }
    }
    markingDefinitions {
        edges {
            node { id definition definition_type }
            relation { id }
        }
    }
    editContext { name focusOn }
}";

const REPORT_QUERY: &str = r"
query ReportEditionQuery($id: String!) {
    report(id: $id) { ...ReportEdition_report }
}";

const FIELD_PATCH_MUTATION: &str = r"
mutation ReportEditionFieldPatchMutation($id: ID!, $input: EditInput!) {
    reportEdit(id: $id) {
        fieldPatch(input: $input) { ...ReportEdition_report }
    }
}";

const FOCUS_MUTATION: &str = r"
mutation ReportEditionFocusMutation($id: ID!, $input: EditContext!) {
    reportEdit(id: $id) {
        contextPatch(input: $input) { id }
    }
}";

const RELATION_ADD_MUTATION: &str = r"
mutation ReportEditionRelationAddMutation($id: ID!, $input: RelationAddInput!) {
    reportEdit(id: $id) {
        relationAdd(input: $input) {
            node { ...ReportEdition_report }
        }
    }
}";

const RELATION_DELETE_MUTATION: &str = r"
mutation ReportEditionRelationDeleteMutation($id: ID!, $relationId: ID!) {
    reportEdit(id: $id) {
        relationDelete(relationId: $relationId) {
            node { ...ReportEdition_report }
        }
    }
}";

const IDENTITIES_SEARCH_QUERY: &str = r"
query ReportEditionIdentitiesSearchQuery($search: String, $first: Int) {
    identities(search: $search, first: $first) {
        edges { node { id name } }
    }
}";

const MARKINGS_SEARCH_QUERY: &str = r"
query ReportEditionMarkingDefinitionsSearchQuery($search: String, $first: Int) {
    markingDefinitions(search: $search, first: $first) {
        edges { node { id definition } }
    }
}";

pub struct GraphQlGateway {
    agent: ureq::Agent,
    url: String,
    token: Option<String>,
}

impl GraphQlGateway {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent("dossier-cli")
            .build();
        Self {
            agent,
            url: url.into(),
            token,
        }
    }

    fn execute(&self, document: &str, variables: Value) -> Result<Value, GatewayError> {
        let body = request_body(document, variables);
        debug!(url = %self.url, "graphql request");

        let mut request = self
            .agent
            .post(&self.url)
            .set("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = request.send_json(body).map_err(|err| match err {
            ureq::Error::Status(code, _) => {
                GatewayError::Transport(format!("HTTP {code} from {}", self.url))
            }
            ureq::Error::Transport(t) => GatewayError::Transport(t.to_string()),
        })?;

        let envelope: Value = response
            .into_json()
            .map_err(|e| GatewayError::Malformed(format!("response is not JSON: {e}")))?;
        parse_envelope(envelope)
    }

    fn report_mutation(
        &self,
        document: &str,
        variables: Value,
        pointer: &str,
    ) -> Result<Option<ReportSnapshot>, GatewayError> {
        let data = self.execute(&with_fragment(document), variables)?;
        extract_report(&data, pointer)
    }
}

impl ReportGateway for GraphQlGateway {
    fn fetch_report(&self, id: &str) -> Result<ReportSnapshot, GatewayError> {
        let data = self.execute(&with_fragment(REPORT_QUERY), json!({ "id": id }))?;
        extract_report(&data, "/report")?.ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    fn field_patch(
        &self,
        id: &str,
        input: &EditInput,
    ) -> Result<Option<ReportSnapshot>, GatewayError> {
        self.report_mutation(
            FIELD_PATCH_MUTATION,
            json!({ "id": id, "input": input }),
            "/reportEdit/fieldPatch",
        )
    }

    fn context_patch(&self, id: &str, focus_on: &str) -> Result<(), GatewayError> {
        self.execute(
            FOCUS_MUTATION,
            json!({ "id": id, "input": { "focusOn": focus_on } }),
        )
        .map(|_| ())
    }

    fn relation_add(
        &self,
        source_id: &str,
        input: &RelationAddInput,
    ) -> Result<Option<ReportSnapshot>, GatewayError> {
        self.report_mutation(
            RELATION_ADD_MUTATION,
            json!({ "id": source_id, "input": input }),
            "/reportEdit/relationAdd/node",
        )
    }

    fn relation_delete(
        &self,
        id: &str,
        relation_id: &str,
    ) -> Result<Option<ReportSnapshot>, GatewayError> {
        self.report_mutation(
            RELATION_DELETE_MUTATION,
            json!({ "id": id, "relationId": relation_id }),
            "/reportEdit/relationDelete/node",
        )
    }

    fn search_identities(
        &self,
        search: &str,
        first: u32,
    ) -> Result<Vec<SelectOption>, GatewayError> {
        let data = self.execute(
            IDENTITIES_SEARCH_QUERY,
            json!({ "search": search, "first": first }),
        )?;
        Ok(edge_options(&data, "/identities/edges", "name"))
    }

    fn search_marking_definitions(
        &self,
        search: &str,
        first: u32,
    ) -> Result<Vec<SelectOption>, GatewayError> {
        let data = self.execute(
            MARKINGS_SEARCH_QUERY,
            json!({ "search": search, "first": first }),
        )?;
        Ok(edge_options(&data, "/markingDefinitions/edges", "definition"))
    }
}

fn with_fragment(document: &str) -> String {
    format!("{document}\n{REPORT_FRAGMENT}")
}

fn request_body(document: &str, variables: Value) -> Value {
    json!({ "query": document, "variables": variables })
}

/// Unwrap a GraphQL response envelope into its `data` member.
fn parse_envelope(envelope: Value) -> Result<Value, GatewayError> {
    if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                .collect();
            return Err(GatewayError::Rejected(messages.join("; ")));
        }
    }
    match envelope.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Err(GatewayError::Malformed("response has no data".into())),
    }
}

/// Read the report at `pointer`. A missing or null node is `Ok(None)`.
fn extract_report(data: &Value, pointer: &str) -> Result<Option<ReportSnapshot>, GatewayError> {
    match data.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(node) => serde_json::from_value(node.clone())
            .map(Some)
            .map_err(|e| GatewayError::Malformed(format!("bad report at {pointer}: {e}"))),
    }
}

/// Map `{ edges: [{ node: { id, <label_key> } }] }` to options. Anything
/// missing yields an empty list; malformed nodes are skipped.
fn edge_options(data: &Value, pointer: &str, label_key: &str) -> Vec<SelectOption> {
    data.pointer(pointer)
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| {
                    let node = edge.get("node")?;
                    let id = node.get("id")?.as_str()?;
                    let label = node.get(label_key)?.as_str()?;
                    Some(SelectOption::new(label, id))
                })
                .collect()
        })
        .unwrap_or_default()
}
