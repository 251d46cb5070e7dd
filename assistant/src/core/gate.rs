//! Operator decisions for the two-level approval gate.
//!
//! Every unrecognized answer (including empty input and EOF) maps to the
//! most conservative choice.

pub const APPROVAL_QUESTION: &str = "Do you want to proceed? (yes/no/exit) [no]: ";
pub const CONTINUE_QUESTION: &str = "Do you want to continue the conversation? (yes/no) [no]: ";
pub const NEXT_MESSAGE_PROMPT: &str = "Enter your next message: ";
pub const FIRST_MESSAGE_PROMPT: &str = "Enter your message: ";
pub const FAREWELL: &str = "Bye Bye!";

/// Answer to "run this command?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Declined,
    /// End the whole session right away.
    Aborted,
}

impl ApprovalDecision {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("yes") {
            Self::Approved
        } else if input.starts_with("exit") {
            Self::Aborted
        } else {
            Self::Declined
        }
    }
}

/// Answer to "continue the conversation?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueDecision {
    Continue,
    Stop,
}

impl ContinueDecision {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("yes") {
            Self::Continue
        } else {
            Self::Stop
        }
    }
}

/// Text shown before asking for approval.
pub fn approval_notice(wrapper_line: &str) -> String {
    format!("I need to run this command: {wrapper_line}")
}
