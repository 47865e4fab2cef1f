//! Agent calls: single-shot, streaming, listing and conversation replies

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::config::LIST_LIMIT;
use crate::domain::{AgentRef, Conversation, Message, ResponseInput};
use crate::infrastructure::traits::{AgentBackend, TextStream};

pub struct AgentService {
    backend: Arc<dyn AgentBackend>,
    default_agent: String,
}

impl AgentService {
    pub fn new(backend: Arc<dyn AgentBackend>, default_agent: impl Into<String>) -> Self {
        Self {
            backend,
            default_agent: default_agent.into(),
        }
    }

    /// Agent name used when none is requested.
    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    /// Look up `name`, or the default agent.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve_agent(&self, name: Option<&str>) -> ApplicationResult<AgentRef> {
        let name = name.unwrap_or(&self.default_agent);
        Ok(self.backend.get_agent(name)?)
    }

    /// Send one message and return the complete response text.
    pub fn call(&self, message: &Message, agent: Option<&str>) -> ApplicationResult<String> {
        let agent = self.resolve_agent(agent)?;
        let text = self
            .backend
            .create_response(ResponseInput::Text(message.as_str()), &agent)?;
        debug!("received {} bytes from {}", text.len(), agent.name);
        Ok(text)
    }

    /// Send one message and return response fragments as they arrive.
    pub fn stream(&self, message: &Message, agent: Option<&str>) -> ApplicationResult<TextStream<'_>> {
        let agent = self.resolve_agent(agent)?;
        Ok(self
            .backend
            .stream_response(ResponseInput::Text(message.as_str()), &agent)?)
    }

    /// Names of the project's agents, at most `LIST_LIMIT`.
    pub fn list(&self) -> ApplicationResult<Vec<String>> {
        Ok(self.backend.list_agents(LIST_LIMIT)?)
    }

    /// Send the whole conversation and return the agent's reply.
    pub fn reply(&self, conversation: &Conversation, agent: &AgentRef) -> ApplicationResult<String> {
        Ok(self
            .backend
            .create_response(ResponseInput::Conversation(conversation.turns()), agent)?)
    }
}
