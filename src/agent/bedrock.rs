use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_sdk_bedrockagentruntime::config::{Credentials, Region};
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use aws_sdk_bedrockagentruntime::Client;
use tracing::{debug, info, warn};

use super::interface::{AgentInvocation, AgentRuntime, ChunkStream, ResponseChunk};
use crate::config::BedrockConfig;
use crate::error::UpstreamError;

/// Agents for Amazon Bedrock runtime client
pub struct BedrockAgentRuntime {
    client: Client,
}

impl BedrockAgentRuntime {
    pub async fn new(config: &BedrockConfig) -> Self {
        // One outbound call per chat request.
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled());

        match config.static_credentials() {
            Some((access_key_id, secret_access_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key_id,
                    secret_access_key,
                    config.session_token.clone(),
                    None,
                    "agent-chat-config",
                ));
            }
            None => warn!("No static AWS credentials configured, using the default provider chain"),
        }

        let sdk_config = loader.load().await;
        info!("Initialized BedrockAgentRuntime: region={}", config.region);

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl AgentRuntime for BedrockAgentRuntime {
    async fn invoke_agent(&self, invocation: AgentInvocation) -> Result<ChunkStream, UpstreamError> {
        let output = self
            .client
            .invoke_agent()
            .agent_id(invocation.agent_id)
            .agent_alias_id(invocation.agent_alias_id)
            .session_id(invocation.session_id)
            .input_text(invocation.input_text)
            .send()
            .await
            .map_err(|e| UpstreamError::Invocation(DisplayErrorContext(&e).to_string()))?;

        // Dropping the stream drops the receiver and with it the connection.
        let stream = futures::stream::unfold(Some(output.completion), |receiver| async move {
            let mut receiver = receiver?;
            match receiver.recv().await {
                Ok(Some(event)) => Some((Ok(chunk_from_event(event)), Some(receiver))),
                Ok(None) => None,
                Err(e) => Some((
                    Err(UpstreamError::Stream(DisplayErrorContext(&e).to_string())),
                    None,
                )),
            }
        });

        Ok(Box::new(Box::pin(stream)))
    }
}

fn chunk_from_event(event: ResponseStream) -> ResponseChunk {
    match event {
        ResponseStream::Chunk(part) => match part.bytes {
            Some(blob) => ResponseChunk::payload(blob.into_inner()),
            None => ResponseChunk::empty(),
        },
        other => {
            debug!("Skipping non-text agent event: {}", event_kind(&other));
            ResponseChunk::empty()
        }
    }
}

fn event_kind(event: &ResponseStream) -> &'static str {
    match event {
        ResponseStream::Chunk(_) => "chunk",
        ResponseStream::Trace(_) => "trace",
        ResponseStream::ReturnControl(_) => "return_control",
        ResponseStream::Files(_) => "files",
        _ => "other",
    }
}
