//! MCP `record_person` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::records::types::NewPerson;

/// Parameters for the `record_person` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecordPersonParams {
    #[schemars(description = "Full name of the person")]
    pub name: String,

    #[schemars(description = "Optional role or title (e.g. 'Senior Engineer')")]
    pub role: Option<String>,
}

impl From<RecordPersonParams> for NewPerson {
    fn from(params: RecordPersonParams) -> Self {
        NewPerson {
            name: params.name,
            role: params.role,
        }
    }
}
