//! Interactive conversation with one agent
//!
//! ```text
//! AwaitingInput --message--> Sending --reply--> AwaitingInput
//! AwaitingInput --exit/EOF/interrupt--> Done
//! Sending --error--> Done
//! ```

use std::io::Write;

use tracing::debug;

use crate::application::services::AgentService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{AgentRef, Conversation, SessionInput, SessionState, Turn};
use crate::infrastructure::traits::Prompter;
use crate::infrastructure::InfraError;

const PROMPT: &str = "You";

pub struct InteractiveSession<'a> {
    service: &'a AgentService,
    agent: AgentRef,
    conversation: Conversation,
    state: SessionState,
}

fn write_err(e: std::io::Error) -> ApplicationError {
    InfraError::io("write session output", e).into()
}

impl<'a> InteractiveSession<'a> {
    /// Resolve the agent once for the whole session.
    pub fn start(service: &'a AgentService, agent: Option<&str>) -> ApplicationResult<Self> {
        let agent = service.resolve_agent(agent)?;
        Ok(Self::with_agent(service, agent))
    }

    pub fn with_agent(service: &'a AgentService, agent: AgentRef) -> Self {
        Self {
            service,
            agent,
            conversation: Conversation::new(),
            state: SessionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn agent(&self) -> &AgentRef {
        &self.agent
    }

    /// Advance the state machine by one input. Returns the reply, if any.
    ///
    /// On failure the unanswered user turn is dropped and the session is done.
    pub fn step(&mut self, input: SessionInput) -> ApplicationResult<Option<String>> {
        if self.state == SessionState::Done {
            return Ok(None);
        }
        match input {
            SessionInput::End => {
                self.state = SessionState::Done;
                Ok(None)
            }
            SessionInput::Skip => Ok(None),
            SessionInput::Message(text) => {
                self.state = SessionState::Sending;
                self.conversation.push(Turn::user(text));
                match self.service.reply(&self.conversation, &self.agent) {
                    Ok(reply) => {
                        self.conversation.push(Turn::assistant(reply.clone()));
                        self.state = SessionState::AwaitingInput;
                        debug!("conversation has {} turns", self.conversation.len());
                        Ok(Some(reply))
                    }
                    Err(e) => {
                        self.conversation.pop_unanswered();
                        self.state = SessionState::Done;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Prompt, send and print until the user leaves or a call fails.
    pub fn run(&mut self, prompter: &dyn Prompter, out: &mut dyn Write) -> ApplicationResult<()> {
        writeln!(
            out,
            "Interactive session with '{}'. Type 'exit' or 'quit' to end.",
            self.agent.name
        )
        .map_err(write_err)?;

        while self.state != SessionState::Done {
            let line = prompter
                .read_line(PROMPT)
                .map_err(|e| InfraError::io("read input", e))?;
            let input = SessionInput::classify(line.as_deref());
            if let Some(reply) = self.step(input)? {
                writeln!(out, "\nAgent: {}\n", reply).map_err(write_err)?;
            }
        }

        writeln!(out, "Ending session.").map_err(write_err)?;
        Ok(())
    }
}
