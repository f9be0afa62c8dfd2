//! In-memory [`Transport`] with canned responses.
//!
//! Used by the test suites and for replaying captured device output. Each
//! command has a queue of replies; the last text reply repeats once the
//! queue is down to one entry. Commands with no script are answered the way
//! the firmware answers unknown commands.

use std::collections::{HashMap, VecDeque};

use crate::error::{AgentError, AgentResult};
use crate::transport::Transport;

/// What the firmware prints for a command it does not know.
pub const UNKNOWN_COMMAND: &str = "error: command not found\r\r\n";

enum Reply {
    Text(String),
    Fail(AgentError),
}

/// A transport that answers from a script and records what was sent.
pub struct ScriptedTransport {
    host: String,
    replies: HashMap<String, VecDeque<Reply>>,
    sent: Vec<String>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport {
            host: "scripted".to_string(),
            replies: HashMap::new(),
            sent: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Queue a text reply for `command`.
    pub fn respond(mut self, command: &str, response: &str) -> Self {
        self.push(command, Reply::Text(response.to_string()));
        self
    }

    /// Queue several replies for `command`, answered in order.
    pub fn respond_sequence(mut self, command: &str, responses: &[&str]) -> Self {
        for response in responses {
            self.push(command, Reply::Text(response.to_string()));
        }
        self
    }

    /// Queue a one-shot failure for `command`.
    pub fn fail(mut self, command: &str, error: AgentError) -> Self {
        self.push(command, Reply::Fail(error));
        self
    }

    /// Add a reply after construction.
    pub fn push_response(&mut self, command: &str, response: &str) {
        self.push(command, Reply::Text(response.to_string()));
    }

    fn push(&mut self, command: &str, reply: Reply) {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Every command sent, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// How many times `command` was sent.
    pub fn count(&self, command: &str) -> usize {
        self.sent.iter().filter(|c| *c == command).count()
    }

    fn unknown(&self, command: &str) -> AgentError {
        AgentError::CommandFailed {
            host: self.host.clone(),
            command: command.to_string(),
            response: format!("{}\r\n{}", command, UNKNOWN_COMMAND),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, command: &str) -> AgentResult<String> {
        self.sent.push(command.to_string());
        let Some(queue) = self.replies.get_mut(command) else {
            return Err(self.unknown(command));
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            match queue.front() {
                Some(Reply::Text(text)) => Some(Reply::Text(text.clone())),
                _ => queue.pop_front(),
            }
        };
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(self.unknown(command)),
        }
    }
}
