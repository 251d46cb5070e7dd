//! Scripted collaborators for driving a session without network, terminal or processes.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::Result;

use crate::core::conversation::Message;
use crate::core::directive::Directive;
use crate::core::outcome::ExecutionOutcome;
use crate::io::model::{ModelClient, ModelError};
use crate::io::operator::Operator;
use crate::io::sandbox::CommandExecutor;

/// Model that returns queued replies and records every request.
///
/// Once the queue is empty every call fails with a transport error.
pub struct ScriptedModel {
    replies: RefCell<VecDeque<Result<String, ModelError>>>,
    requests: RefCell<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|reply| Ok(reply.to_string())).collect())
    }

    /// Conversation snapshots, one per call.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ModelClient for ScriptedModel {
    fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        self.requests.borrow_mut().push(messages.to_vec());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("no scripted reply left".to_string())))
    }
}

/// Operator that answers from a queue and keeps a transcript of everything shown.
///
/// An exhausted queue behaves like end of input.
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    transcript: String,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            transcript: String::new(),
        }
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

impl Operator for ScriptedOperator {
    fn say(&mut self, text: &str) -> Result<()> {
        self.transcript.push_str(text);
        self.transcript.push('\n');
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.transcript.push_str(prompt);
        let answer = self.answers.pop_front().unwrap_or_default();
        self.transcript.push_str(&answer);
        self.transcript.push('\n');
        Ok(answer)
    }
}

/// Executor that returns queued outcomes and records the commands it was given.
///
/// Running out of outcomes yields a setup failure.
pub struct ScriptedExecutor {
    outcomes: RefCell<VecDeque<ExecutionOutcome>>,
    commands: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: Vec<ExecutionOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, directive: &Directive) -> ExecutionOutcome {
        let command = directive.raw_command();
        self.commands.borrow_mut().push(command.to_string());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| ExecutionOutcome::setup_failed(command, "no scripted outcome left"))
    }
}
