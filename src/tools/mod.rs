pub mod inspect_person;
pub mod list_actions;
pub mod list_people;
pub mod record_action;
pub mod record_person;

use inspect_person::InspectPersonParams;
use list_actions::ListActionsParams;
use list_people::ListPeopleParams;
use record_action::RecordActionParams;
use record_person::RecordPersonParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use crate::error::{ApiError, ValidationError};
use crate::handlers::{run_blocking, AppState, Validate};
use crate::id::Id;
use crate::pipeline::{Fragment, Representation, RequestContext};
use crate::records::types::{NewPerson, Valence};
use crate::records::{actions, people};

/// The Tally MCP tool handler. Shares [`AppState`] with the HTTP handlers and
/// calls the same storage operations.
///
/// Tool calls have no inbound HTTP request, so results are always the
/// structured representation. Errors come back as the structured error JSON.
#[derive(Clone)]
pub struct TallyTools {
    tool_router: ToolRouter<Self>,
    state: AppState,
}

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<Id, ApiError> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|cause| ApiError::bad_identifier(field, raw, cause))
}

pub(crate) fn parse_valence(raw: &str, allowed: &[&str]) -> Result<Valence, ApiError> {
    let raw = raw.trim();
    match raw.parse::<Valence>() {
        Ok(valence) if allowed.contains(&valence.as_str()) => Ok(valence),
        _ => Err(ValidationError::invalid("valence", raw, allowed).into()),
    }
}

/// Structured representation of a tool result.
fn reply<T: Fragment>(result: Result<T, ApiError>) -> Result<String, String> {
    let ctx = RequestContext::detached();
    match result {
        Ok(value) => Representation::of(&ctx, &value)
            .map(|repr| repr.body)
            .map_err(|e| format!("serialization failed: {e}")),
        Err(err) => Err(Representation::of_error(&ctx, &err)
            .map(|repr| repr.body)
            .unwrap_or_else(|e| format!("serialization failed: {e}"))),
    }
}

#[tool_router]
impl TallyTools {
    pub fn new(state: AppState) -> Self {
        Self {
            tool_router: Self::tool_router(),
            state,
        }
    }

    /// Record a new person.
    #[tool(description = "Record a person to keep notes about. Returns the stored person with its id.")]
    async fn record_person(
        &self,
        Parameters(params): Parameters<RecordPersonParams>,
    ) -> Result<String, String> {
        let input = NewPerson::from(params);
        let result = match input.validate() {
            Ok(()) => {
                run_blocking(&self.state, move |conn| people::create_person(conn, &input)).await
            }
            Err(err) => Err(err.into()),
        };
        if let Ok(person) = &result {
            tracing::info!(id = %person.id, "record_person called");
        }
        reply(result)
    }

    /// List everyone, alphabetically.
    #[tool(description = "List every recorded person, alphabetically.")]
    async fn list_people(
        &self,
        Parameters(_params): Parameters<ListPeopleParams>,
    ) -> Result<String, String> {
        tracing::info!("list_people called");
        reply(run_blocking(&self.state, |conn| people::list_people(conn)).await)
    }

    /// A person with their full timeline.
    #[tool(description = "Inspect a person by ID. Returns the person with all their actions and conversations, newest first.")]
    async fn inspect_person(
        &self,
        Parameters(params): Parameters<InspectPersonParams>,
    ) -> Result<String, String> {
        tracing::info!(id = %params.id, "inspect_person called");
        let result = match parse_id("id", &params.id) {
            Ok(id) => run_blocking(&self.state, move |conn| people::person_detail(conn, id)).await,
            Err(err) => Err(err),
        };
        reply(result)
    }

    /// Record an action about a person.
    #[tool(description = "Record a dated action about a person. Valence: positive, negative or neutral. occurred_at defaults to now.")]
    async fn record_action(
        &self,
        Parameters(params): Parameters<RecordActionParams>,
    ) -> Result<String, String> {
        let input = params
            .into_input()
            .and_then(|input| input.validate().map(|()| input).map_err(ApiError::from));
        let result = match input {
            Ok(input) => {
                run_blocking(&self.state, move |conn| actions::create_action(conn, &input)).await
            }
            Err(err) => Err(err),
        };
        if let Ok(action) = &result {
            tracing::info!(
                id = %action.id,
                person_id = %action.person_id,
                valence = %action.valence,
                "record_action called"
            );
        }
        reply(result)
    }

    /// List actions, newest first.
    #[tool(description = "List actions newest first, optionally filtered by person_id, valence or theme_id.")]
    async fn list_actions(
        &self,
        Parameters(params): Parameters<ListActionsParams>,
    ) -> Result<String, String> {
        tracing::info!("list_actions called");
        let result = match params.into_filter() {
            Ok(filter) => {
                run_blocking(&self.state, move |conn| actions::list_actions(conn, &filter)).await
            }
            Err(err) => Err(err),
        };
        reply(result)
    }
}

#[tool_handler]
impl ServerHandler for TallyTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Tally keeps records about people. Use record_person to add someone, \
                 record_action to log something they did, and inspect_person to read \
                 their timeline."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
