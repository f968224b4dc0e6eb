use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use crm_kanban_core::{BoardEntity, GenericItem, Lead, Opportunity, Permissions, ProjectTask};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid KANBAN_ADDR {value:?}: {source}")]
    Addr {
        value: String,
        #[source]
        source: AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Built UI served for every path the API does not claim.
    pub dist: PathBuf,
    /// Capabilities granted to every viewer.
    pub permissions: Permissions,
    /// Reject every status update with a 500.
    pub fail_updates: bool,
}

impl ServerConfig {
    pub const DEFAULT_ADDR: &'static str = "127.0.0.1:8787";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr_value = lookup("KANBAN_ADDR").unwrap_or_else(|| Self::DEFAULT_ADDR.to_string());
        let addr = addr_value.parse().map_err(|source| ConfigError::Addr {
            value: addr_value.clone(),
            source,
        })?;

        let permissions = match lookup("KANBAN_PERMISSIONS") {
            Some(list) => Permissions::new(
                list.split(',')
                    .map(str::trim)
                    .filter(|capability| !capability.is_empty()),
            ),
            None => Permissions::new([
                Lead::config().edit_capability,
                Opportunity::config().edit_capability,
                ProjectTask::config().edit_capability,
                GenericItem::config().edit_capability,
            ]),
        };

        Ok(Self {
            addr,
            dist: lookup("KANBAN_DIST").map_or_else(|| PathBuf::from("dist"), PathBuf::from),
            permissions,
            fail_updates: lookup("KANBAN_FAIL_UPDATES").is_some_and(|v| v == "1" || v == "true"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8787");
        assert_eq!(config.dist, PathBuf::from("dist"));
        assert!(config.permissions.can("edit-leads"));
        assert!(config.permissions.can("edit-items"));
        assert!(!config.fail_updates);
    }

    #[test]
    fn permissions_list_replaces_defaults() {
        let config = config(&[("KANBAN_PERMISSIONS", "edit-leads, ,view-items"), ("KANBAN_FAIL_UPDATES", "1")]).unwrap();
        assert_eq!(config.permissions.iter().collect::<Vec<_>>(), vec!["edit-leads", "view-items"]);
        assert!(config.fail_updates);
    }

    #[test]
    fn bad_address_is_reported() {
        let err = config(&[("KANBAN_ADDR", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }
}
