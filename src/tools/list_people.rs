//! MCP `list_people` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `list_people` MCP tool. Takes none; everyone is listed
/// alphabetically.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListPeopleParams {}
