use std::sync::Arc;

use crate::agent::{AgentRuntime, BedrockAgentRuntime};
use crate::config::Config;

/// Read-only per-process state; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agent: Arc<dyn AgentRuntime>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let agent = Arc::new(BedrockAgentRuntime::new(&config.bedrock_config).await);
        Ok(Self::with_agent(config, agent))
    }

    pub fn with_agent(config: Config, agent: Arc<dyn AgentRuntime>) -> Self {
        Self {
            config: Arc::new(config),
            agent,
        }
    }
}
