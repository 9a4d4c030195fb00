use serde::{Deserialize, Serialize};

/// One edge between a report and a many-valued target (a marking definition).
///
/// `relation_id` is the identifier of the join relation itself. It is present
/// for every edge known to the server and absent for entries the user has just
/// picked and which do not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_id: Option<String>,
}

impl Association {
    /// An edge that already exists on the server.
    pub fn existing(
        label: impl Into<String>,
        value: impl Into<String>,
        relation_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            relation_id: Some(relation_id.into()),
        }
    }

    /// A freshly selected target with no edge yet.
    pub fn picked(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            relation_id: None,
        }
    }
}

impl From<SelectOption> for Association {
    fn from(option: SelectOption) -> Self {
        Self::picked(option.label, option.value)
    }
}

/// The optional single-valued created-by edge.
///
/// `value == None` means no edge currently exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingularAssociation {
    pub label: Option<String>,
    pub value: Option<String>,
    pub relation: Option<String>,
}

impl SingularAssociation {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl From<SelectOption> for SingularAssociation {
    fn from(option: SelectOption) -> Self {
        Self {
            label: Some(option.label),
            value: Some(option.value),
            relation: None,
        }
    }
}

/// An autocomplete entry as offered to the user: a display label and an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Union `incoming` into `options`, keeping first-seen order and skipping
/// entries whose `value` is already present.
pub fn union_options(options: &mut Vec<SelectOption>, incoming: Vec<SelectOption>) {
    for option in incoming {
        if !options.iter().any(|o| o.value == option.value) {
            options.push(option);
        }
    }
}
