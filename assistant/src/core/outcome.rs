//! Structured result of one directive and its conversation rendering.

use crate::core::conversation::{MAX_CONTENT_BYTES, encoded_len, fit_encoded};

/// Appended once when captured output hits its byte budget.
pub const TRUNCATION_NOTICE: &str = "\n\nOutput buffer exceeded so we truncate.\n";
const EMPTY_OUTPUT_MARKER: &str = "Empty or Execution error";
const DECLINED_NOTICE: &str = "sysadmin declined to execute command.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Executed,
    TimedOut,
    Declined,
    /// The child could not be started (spawn or pipe failure).
    SetupFailed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::TimedOut => "timeout",
            Self::Declined => "declined",
            Self::SetupFailed => "setup failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub command: String,
    pub status: OutcomeStatus,
    /// Captured stdout, including the truncation notice when it applies.
    pub captured_output: String,
    pub output_truncated: bool,
}

impl ExecutionOutcome {
    pub fn executed(command: &str, captured_output: String, output_truncated: bool) -> Self {
        Self {
            command: command.to_string(),
            status: OutcomeStatus::Executed,
            captured_output,
            output_truncated,
        }
    }

    pub fn timed_out(command: &str, captured_output: String) -> Self {
        Self {
            command: command.to_string(),
            status: OutcomeStatus::TimedOut,
            captured_output,
            output_truncated: false,
        }
    }

    pub fn declined(command: &str) -> Self {
        Self {
            command: command.to_string(),
            status: OutcomeStatus::Declined,
            captured_output: String::new(),
            output_truncated: false,
        }
    }

    pub fn setup_failed(command: &str, reason: &str) -> Self {
        Self {
            command: command.to_string(),
            status: OutcomeStatus::SetupFailed,
            captured_output: reason.to_string(),
            output_truncated: false,
        }
    }

    /// Single descriptive line folded back into the conversation.
    ///
    /// The line always fits a conversation entry once encoded. Output that
    /// would not fit is cut and closed with [`TRUNCATION_NOTICE`], which then
    /// appears exactly once.
    pub fn render(&self) -> String {
        let head = format!(
            "command executed: <{}> status: <{}> output: <",
            self.command,
            self.status.as_str()
        );
        let output = match self.status {
            OutcomeStatus::Declined => DECLINED_NOTICE,
            _ if self.captured_output.is_empty() => EMPTY_OUTPUT_MARKER,
            _ => self.captured_output.as_str(),
        };
        if encoded_len(&head) + encoded_len(output) + 1 <= MAX_CONTENT_BYTES {
            return format!("{head}{output}>");
        }

        let body = output.strip_suffix(TRUNCATION_NOTICE).unwrap_or(output);
        let reserved = encoded_len(&head) + encoded_len(TRUNCATION_NOTICE) + 1;
        let kept = fit_encoded(body, MAX_CONTENT_BYTES.saturating_sub(reserved));
        format!("{head}{kept}{TRUNCATION_NOTICE}>")
    }
}
