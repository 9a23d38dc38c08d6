use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::agent::{assemble, AgentInvocation};
use crate::config::BedrockConfig;
use crate::error::GatewayError;
use crate::state::AppState;

pub const MESSAGE_REQUIRED: &str = "message is required";
pub const CONFIGURATION_INCOMPLETE: &str = "Bedrock configuration incomplete";
pub const NO_RESPONSE_FALLBACK: &str = "No response from agent";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatResponse {
    /// An empty answer is replaced so callers can tell it apart from a truncated body.
    pub fn from_assembled(text: String) -> Self {
        let response = if text.is_empty() {
            NO_RESPONSE_FALLBACK.to_string()
        } else {
            text
        };
        Self { response }
    }
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, GatewayError> {
    let span = info_span!("chat", request_id = %Uuid::new_v4());
    async move {
        let result = handle_chat(&state, payload).await;
        if let Err(e) = &result {
            e.log();
        }
        result.map(Json)
    }
    .instrument(span)
    .await
}

async fn handle_chat(
    state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ChatResponse, GatewayError> {
    let message = validate_message(payload)?;
    let invocation = build_invocation(&state.config.bedrock_config, message)?;

    info!(
        "Invoking agent {} (session {}, {} chars)",
        invocation.agent_id,
        invocation.session_id,
        invocation.input_text.chars().count()
    );

    // Nothing is returned to the caller until the whole completion is drained.
    let stream = state.agent.invoke_agent(invocation).await?;
    let text = assemble(stream).await?;

    debug!("Agent responded with {} bytes", text.len());
    Ok(ChatResponse::from_assembled(text))
}

/// Extract a non-blank message. Unparseable bodies count as a missing message.
pub fn validate_message(
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<String, GatewayError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unreadable chat body: {}", rejection.body_text());
            return Err(GatewayError::Validation(MESSAGE_REQUIRED.to_string()));
        }
    };

    request
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| GatewayError::Validation(MESSAGE_REQUIRED.to_string()))
}

/// Combine deployment settings with the caller's message.
pub fn build_invocation(
    config: &BedrockConfig,
    message: String,
) -> Result<AgentInvocation, GatewayError> {
    let (agent_id, agent_alias_id) = config
        .agent_target()
        .ok_or_else(|| GatewayError::Configuration(CONFIGURATION_INCOMPLETE.to_string()))?;

    Ok(AgentInvocation {
        agent_id: agent_id.to_string(),
        agent_alias_id: agent_alias_id.to_string(),
        session_id: config.session_id.clone(),
        input_text: message,
    })
}
