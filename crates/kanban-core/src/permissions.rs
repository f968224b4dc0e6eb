use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Capability strings granted to the current viewer, e.g. `edit-leads`.
///
/// Plain membership: there is no hierarchy or wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(capabilities.into_iter().map(Into::into).collect())
    }

    pub fn can(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
