//! Who is editing which field.

use serde::{Deserialize, Serialize};

/// A collaborator with the report open, as reported by the server's edit
/// context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUser {
    pub name: String,
    #[serde(default)]
    pub focus_on: Option<String>,
}

/// Other users whose focus is on `field`. `me` is never listed.
pub fn editors_of<'a>(users: &'a [EditUser], me: Option<&str>, field: &str) -> Vec<&'a EditUser> {
    users
        .iter()
        .filter(|u| u.focus_on.as_deref() == Some(field))
        .filter(|u| me != Some(u.name.as_str()))
        .collect()
}
