//! Agent runtime seam - the gateway only ever talks to `AgentRuntime`,
//! the Bedrock client lives behind it

use async_trait::async_trait;
use futures::Stream;

use crate::error::UpstreamError;

/// One request to the remote agent, built fresh for every chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInvocation {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub input_text: String,
}

/// A single event of the streamed completion. Metadata-only events carry no bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseChunk {
    pub bytes: Option<Vec<u8>>,
}

impl ResponseChunk {
    pub fn payload(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    pub fn empty() -> Self {
        Self { bytes: None }
    }
}

pub type ChunkStream = Box<dyn Stream<Item = Result<ResponseChunk, UpstreamError>> + Send + Unpin>;

#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start one invocation and hand back its completion, in arrival order.
    async fn invoke_agent(&self, invocation: AgentInvocation) -> Result<ChunkStream, UpstreamError>;
}
