//! MCP `list_actions` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{parse_id, parse_valence};
use crate::error::ApiError;
use crate::records::types::{ActionFilter, Valence};

/// Parameters for the `list_actions` MCP tool. All filters are optional.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListActionsParams {
    #[schemars(description = "Only actions about this person")]
    pub person_id: Option<String>,

    #[schemars(description = "Only actions with this valence: 'positive', 'negative' or 'neutral'")]
    pub valence: Option<String>,

    #[schemars(description = "Only actions tagged with this theme")]
    pub theme_id: Option<String>,
}

impl ListActionsParams {
    pub fn into_filter(self) -> Result<ActionFilter, ApiError> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Ok(ActionFilter {
            person_id: present(self.person_id)
                .map(|raw| parse_id("person_id", &raw))
                .transpose()?,
            valence: present(self.valence)
                .map(|raw| parse_valence(&raw, Valence::CREATE_VALUES))
                .transpose()?,
            theme_id: present(self.theme_id)
                .map(|raw| parse_id("theme_id", &raw))
                .transpose()?,
        })
    }
}
