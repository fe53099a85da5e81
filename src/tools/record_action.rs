//! MCP `record_action` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{parse_id, parse_valence};
use crate::error::{ApiError, ValidationError};
use crate::pipeline::normalize::parse_timestamp;
use crate::records::types::{NewAction, Valence};

/// Parameters for the `record_action` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecordActionParams {
    #[schemars(description = "ID of the person the action is about")]
    pub person_id: String,

    #[schemars(description = "What happened")]
    pub description: String,

    #[schemars(description = "'positive', 'negative' or 'neutral'")]
    pub valence: String,

    /// Defaults to now.
    #[schemars(
        description = "When it happened: 'YYYY-MM-DDTHH:MM', 'YYYY-MM-DDTHH:MM:SS' (UTC) or RFC 3339. Defaults to now."
    )]
    pub occurred_at: Option<String>,

    #[schemars(description = "Optional supporting references (ticket numbers, links)")]
    pub references: Option<String>,

    #[schemars(description = "IDs of themes to tag the action with")]
    pub themes: Option<Vec<String>>,
}

impl RecordActionParams {
    /// Check the arguments and build the storage input.
    pub fn into_input(self) -> Result<NewAction, ApiError> {
        let person_id = parse_id("person_id", &self.person_id)?;
        let valence = parse_valence(&self.valence, Valence::CREATE_VALUES)?;
        let occurred_at = match self.occurred_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_timestamp(raw).ok_or_else(|| ValidationError::format("occurred_at", raw))?,
            ),
        };
        let themes = self
            .themes
            .unwrap_or_default()
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_id("themes", raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewAction {
            person_id,
            description: self.description,
            valence,
            occurred_at,
            references: self.references,
            themes,
        })
    }
}
