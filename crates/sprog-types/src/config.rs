//! Runtime configuration.

use crate::error::SprogError;
use serde::{Deserialize, Serialize};

/// Names the runtime reserves inside programs and scopes.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Discriminator field that marks a record as an expression node.
    pub marker: String,
    /// Scope variable holding the standard library.
    pub library_key: String,
    /// Scope variable a function body sees its parameters under.
    pub props_key: String,
    /// Loop variable holding the current element.
    pub item_key: String,
    /// Loop variable holding the current index or object key.
    pub key_key: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            marker: "$sprog".to_string(),
            library_key: "_".to_string(),
            props_key: "props".to_string(),
            item_key: "item".to_string(),
            key_key: "key".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(input: &str) -> Result<Self, SprogError> {
        serde_json::from_str(input)
            .map_err(|err| SprogError::Definition(format!("invalid runtime config: {err}")))
    }

    pub fn from_json(input: serde_json::Value) -> Result<Self, SprogError> {
        serde_json::from_value(input)
            .map_err(|err| SprogError::Definition(format!("invalid runtime config: {err}")))
    }
}
