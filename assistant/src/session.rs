//! Orchestration of one interactive session.
//!
//! Each turn sends the whole conversation to the model, shows the reply,
//! and resolves every directive in it (approval, execution, recorded
//! outcome) before the next model call. The session ends when the operator
//! declines to continue, answers `exit`, or the model call fails.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::conversation::{Conversation, Role};
use crate::core::directive::{Directive, extract_directives, has_unterminated_directive};
use crate::core::gate::{
    APPROVAL_QUESTION, CONTINUE_QUESTION, ApprovalDecision, ContinueDecision, FAREWELL,
    FIRST_MESSAGE_PROMPT, NEXT_MESSAGE_PROMPT, approval_notice,
};
use crate::core::outcome::ExecutionOutcome;
use crate::core::sanitize::wrapper_line;
use crate::io::model::{ModelClient, ModelError};
use crate::io::operator::Operator;
use crate::io::sandbox::CommandExecutor;

const CAPACITY_NOTICE: &str = "Conversation storage limit reached.";
const MODEL_ENDED_NOTICE: &str = "\nAI ended the conversation.";

/// How a session finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The operator chose not to continue.
    Stopped,
    /// The operator answered `exit` at an approval prompt.
    Aborted,
}

/// Owns the conversation and the collaborators for one session.
pub struct Session<M, O, X> {
    model: M,
    operator: O,
    executor: X,
    conversation: Conversation,
    capacity_reported: bool,
}

impl<M: ModelClient, O: Operator, X: CommandExecutor> Session<M, O, X> {
    pub fn new(model: M, operator: O, executor: X, conversation: Conversation) -> Self {
        Self {
            model,
            operator,
            executor,
            conversation,
            capacity_reported: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Run the session to completion.
    ///
    /// `words` form the opening user message, joined with single spaces;
    /// when empty the operator is asked for it. Model failures are returned
    /// as errors wrapping [`ModelError`].
    pub fn run(&mut self, system_prompts: &[String], words: &[String]) -> Result<SessionEnd> {
        let opening = if words.is_empty() {
            self.operator.ask(FIRST_MESSAGE_PROMPT)?
        } else {
            words.join(" ")
        };
        for prompt in system_prompts {
            self.record(Role::System, prompt)?;
        }
        self.record(Role::User, &opening)?;

        let mut turn = 0u32;
        loop {
            turn += 1;
            debug!(turn, entries = self.conversation.len(), "requesting model reply");
            let reply = match self
                .model
                .complete(self.conversation.serialize_for_transport())
            {
                Ok(reply) => reply,
                Err(err) => {
                    if let ModelError::Malformed { raw } = &err {
                        self.operator.say(raw)?;
                        self.operator.say(MODEL_ENDED_NOTICE)?;
                    }
                    warn!(turn, err = %err, "model call failed");
                    return Err(err.into());
                }
            };

            if let Some(end) = self.handle_reply(&reply)? {
                info!(turn, ?end, "session finished");
                return Ok(end);
            }
        }
    }

    fn handle_reply(&mut self, reply: &str) -> Result<Option<SessionEnd>> {
        self.record(Role::Assistant, reply)?;
        self.operator.say(reply)?;

        if has_unterminated_directive(reply) {
            warn!("reply has an unterminated directive, ignoring all of its directives");
        }

        let mut found = 0usize;
        for directive in extract_directives(reply) {
            found += 1;
            if let Some(end) = self.handle_directive(&directive)? {
                return Ok(Some(end));
            }
        }
        debug!(directives = found, "reply processed");

        if found == 0 {
            return self.ask_to_continue(false);
        }
        Ok(None)
    }

    fn handle_directive(&mut self, directive: &Directive) -> Result<Option<SessionEnd>> {
        let command = directive.raw_command();
        self.operator.say(&approval_notice(&wrapper_line(command)))?;
        let answer = self.operator.ask(APPROVAL_QUESTION)?;

        match ApprovalDecision::parse(&answer) {
            ApprovalDecision::Approved => {
                let outcome = self.executor.execute(directive);
                info!(status = outcome.status.as_str(), "directive resolved");
                self.report(&outcome)?;
                Ok(None)
            }
            ApprovalDecision::Aborted => {
                info!("operator aborted the session");
                self.operator.say(FAREWELL)?;
                Ok(Some(SessionEnd::Aborted))
            }
            ApprovalDecision::Declined => {
                info!("operator declined directive");
                self.report(&ExecutionOutcome::declined(command))?;
                self.ask_to_continue(true)
            }
        }
    }

    /// Echo an outcome to the operator, then fold it into the conversation.
    fn report(&mut self, outcome: &ExecutionOutcome) -> Result<()> {
        let line = outcome.render();
        self.operator.say(&format!("Command output:\n{line}"))?;
        self.record(Role::User, &line)
    }

    /// Continue with a fresh operator message, or stop. Only a stop after a
    /// decline says goodbye.
    fn ask_to_continue(&mut self, farewell: bool) -> Result<Option<SessionEnd>> {
        let answer = self.operator.ask(CONTINUE_QUESTION)?;
        match ContinueDecision::parse(&answer) {
            ContinueDecision::Continue => {
                let message = self.operator.ask(NEXT_MESSAGE_PROMPT)?;
                self.record(Role::User, &message)?;
                Ok(None)
            }
            ContinueDecision::Stop => {
                if farewell {
                    self.operator.say(FAREWELL)?;
                }
                Ok(Some(SessionEnd::Stopped))
            }
        }
    }

    /// Append to the conversation; a full history is reported once and otherwise ignored.
    fn record(&mut self, role: Role, content: &str) -> Result<()> {
        if let Err(full) = self.conversation.append(role, content) {
            warn!(capacity = full.capacity, ?role, "dropping message");
            if !self.capacity_reported {
                self.capacity_reported = true;
                self.operator.say(CAPACITY_NOTICE)?;
            }
        }
        Ok(())
    }
}
