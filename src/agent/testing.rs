//! Scripted `AgentRuntime` for handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::interface::{AgentInvocation, AgentRuntime, ChunkStream, ResponseChunk};
use crate::error::UpstreamError;

pub struct ScriptedAgent {
    events: Vec<Result<ResponseChunk, UpstreamError>>,
    invoke_error: Option<UpstreamError>,
    calls: AtomicUsize,
    last_invocation: Mutex<Option<AgentInvocation>>,
}

impl ScriptedAgent {
    pub fn with_events(events: Vec<Result<ResponseChunk, UpstreamError>>) -> Self {
        Self {
            events,
            invoke_error: None,
            calls: AtomicUsize::new(0),
            last_invocation: Mutex::new(None),
        }
    }

    pub fn with_texts(parts: &[&str]) -> Self {
        Self::with_events(
            parts
                .iter()
                .map(|part| Ok(ResponseChunk::payload(part.as_bytes())))
                .collect(),
        )
    }

    pub fn failing(error: UpstreamError) -> Self {
        Self {
            invoke_error: Some(error),
            ..Self::with_events(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_invocation(&self) -> Option<AgentInvocation> {
        self.last_invocation.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedAgent {
    async fn invoke_agent(&self, invocation: AgentInvocation) -> Result<ChunkStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_invocation.lock().unwrap() = Some(invocation);

        if let Some(error) = &self.invoke_error {
            return Err(error.clone());
        }
        Ok(Box::new(futures::stream::iter(self.events.clone())))
    }
}
