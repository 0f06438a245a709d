//! Generate / Reset interaction handlers shared by the REPL and the dashboard.

use crate::api::{CompletionClient, GenerationParams};
use crate::error::{AppError, AppResult};
use crate::roles::RoleSelection;
use crate::session::Session;

/// Submit `input` to the assistant playing `selection`.
///
/// Checks run in this order: credential, then input. Neither failure touches
/// the session. On success the session gains exactly one user and one
/// assistant message. When the provider call fails, the user message added
/// for the request is taken back out so the conversation keeps alternating.
pub async fn generate(
    session: &mut Session,
    selection: &RoleSelection,
    input: &str,
    params: &GenerationParams,
    credential: Option<&str>,
    client: &CompletionClient,
) -> AppResult<String> {
    let Some(credential) = credential.filter(|k| !k.trim().is_empty()) else {
        return Err(AppError::missing_key());
    };
    if input.trim().is_empty() {
        return Err(AppError::validation("Please enter a question or idea first."));
    }

    session.initialize(selection.system_prompt());
    session.append_user(input)?;

    match client.complete(session.messages(), params, Some(credential)).await {
        Ok(reply) => {
            session.append_assistant(&reply);
            Ok(reply)
        }
        Err(e) => {
            session.discard_pending_user();
            Err(e)
        }
    }
}

/// Start over with the selection's current, possibly edited, instructions.
pub fn reset(session: &mut Session, selection: &RoleSelection) {
    session.reset(selection.system_prompt());
}
