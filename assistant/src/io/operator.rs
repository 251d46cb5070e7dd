//! Line-oriented conversation with the human operator.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use anyhow::{Context, Result};

/// Blocking, line-oriented operator channel.
pub trait Operator {
    /// Print `text` followed by a newline.
    fn say(&mut self, text: &str) -> Result<()>;

    /// Print `prompt` and read one line without its line terminator.
    ///
    /// End of input reads as an empty line.
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Operator over any reader/writer pair (stdin/stdout in production).
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
}

impl TerminalOperator<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").context("write to operator")?;
        self.output.flush().context("flush operator output")
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}").context("write prompt")?;
        self.output.flush().context("flush prompt")?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("read operator input")?;
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        Ok(trimmed.to_string())
    }
}
