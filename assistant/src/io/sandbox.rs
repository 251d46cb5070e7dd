//! Executor for approved directives.
//!
//! The [`CommandExecutor`] trait decouples the session loop from real process
//! spawning. Tests use scripted executors that return predetermined outcomes.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use crate::core::directive::Directive;
use crate::core::outcome::{ExecutionOutcome, TRUNCATION_NOTICE};
use crate::core::sanitize::{Invocation, plan_invocation};
use crate::io::process::{
    CommandOutput, DEFAULT_COMMAND_TIMEOUT, DEFAULT_OUTPUT_LIMIT_BYTES, run_bounded,
};

/// Runs one approved directive to completion and reports what happened.
pub trait CommandExecutor {
    /// Never fails: every problem becomes part of the returned outcome.
    fn execute(&self, directive: &Directive) -> ExecutionOutcome;
}

/// Executor that runs commands in an isolated child process.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    timeout: Duration,
    output_limit_bytes: usize,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT, DEFAULT_OUTPUT_LIMIT_BYTES)
    }
}

impl ShellExecutor {
    pub fn new(timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            timeout,
            output_limit_bytes,
        }
    }
}

impl CommandExecutor for ShellExecutor {
    #[instrument(skip_all, fields(command = directive.raw_command()))]
    fn execute(&self, directive: &Directive) -> ExecutionOutcome {
        let command = directive.raw_command();
        let invocation = plan_invocation(command);
        debug!(?invocation, "planned invocation");

        match run_bounded(build_command(&invocation), self.timeout, self.output_limit_bytes) {
            Ok(output) if output.timed_out => {
                info!(timeout_secs = self.timeout.as_secs(), "command timed out");
                ExecutionOutcome::timed_out(command, captured_text(&output))
            }
            Ok(output) => {
                info!(exit_code = ?output.status.code(), "command executed");
                ExecutionOutcome::executed(
                    command,
                    captured_text(&output),
                    output.stdout_truncated > 0,
                )
            }
            Err(err) => {
                error!(err = %format!("{err:#}"), "command setup failed");
                ExecutionOutcome::setup_failed(command, &format!("{err:#}"))
            }
        }
    }
}

fn build_command(invocation: &Invocation) -> Command {
    match invocation {
        Invocation::Direct { program, args } => {
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        }
        Invocation::Shell(wrapper) => {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(wrapper);
            cmd
        }
    }
}

/// Lossy stdout text with the truncation notice appended once when needed.
fn captured_text(output: &CommandOutput) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.stdout_truncated > 0 {
        text.push_str(TRUNCATION_NOTICE);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::OutcomeStatus;
    use std::time::Instant;

    fn run(command: &str) -> ExecutionOutcome {
        ShellExecutor::new(Duration::from_secs(10), 1000).execute(&Directive::new(command))
    }

    #[test]
    fn direct_command_captures_stdout() {
        let outcome = run("echo Hello world");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert_eq!(outcome.captured_output, "Hello world\n");
        assert!(!outcome.output_truncated);
    }

    #[test]
    fn shell_command_sees_unescaped_text() {
        let outcome = run(r#"printf '%s|%s\n' "a b" "$((1 + 2))" | tr a A"#);
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert_eq!(outcome.captured_output, "A b|3\n");
    }

    #[test]
    fn backticks_and_dollars_reach_bash_intact() {
        let outcome = run("X=`echo hi`; echo \"$X\\\\\"");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert_eq!(outcome.captured_output, "hi\\\n");
    }

    #[test]
    fn stderr_is_not_captured() {
        let outcome = run("echo visible; echo hidden >&2");
        assert_eq!(outcome.captured_output, "visible\n");
    }

    #[test]
    fn empty_output_is_reported_as_executed() {
        let outcome = run("true");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert!(outcome.captured_output.is_empty());
    }

    #[test]
    fn oversized_output_gets_single_truncation_notice() {
        let executor = ShellExecutor::new(Duration::from_secs(10), 8);
        let outcome = executor.execute(&Directive::new("yes | head -c 100"));
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert!(outcome.output_truncated);
        assert_eq!(
            outcome.captured_output,
            format!("y\ny\ny\ny\n{TRUNCATION_NOTICE}")
        );
        assert_eq!(outcome.captured_output.matches(TRUNCATION_NOTICE).count(), 1);
    }

    #[test]
    fn leading_assignment_reaches_the_command() {
        let outcome = run("GREETING=hi env");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert!(outcome.captured_output.lines().any(|line| line == "GREETING=hi"));

        let outcome = run("LC_ALL=C echo hi");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert_eq!(outcome.captured_output, "hi\n");
    }

    #[test]
    fn shell_only_words_execute() {
        let outcome = run("time true");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert!(outcome.captured_output.is_empty());

        let outcome = run("pushd /tmp");
        assert_eq!(outcome.status, OutcomeStatus::Executed);
        assert!(outcome.captured_output.starts_with("/tmp"));
    }

    #[test]
    fn hanging_command_times_out() {
        let executor = ShellExecutor::new(Duration::from_secs(1), 100);
        let start = Instant::now();
        let outcome = executor.execute(&Directive::new("sleep 60"));
        assert_eq!(outcome.status, OutcomeStatus::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn unknown_program_is_a_setup_failure() {
        let outcome = run("no-such-program-for-assistant-tests --flag");
        assert_eq!(outcome.status, OutcomeStatus::SetupFailed);
        assert!(outcome.captured_output.contains("spawn command"));
    }
}
