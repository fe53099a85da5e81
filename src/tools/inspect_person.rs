//! MCP `inspect_person` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `inspect_person` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InspectPersonParams {
    /// 20-character person id.
    #[schemars(description = "ID of the person to inspect (20 characters, 0-9 a-v)")]
    pub id: String,
}
