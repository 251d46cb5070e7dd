//! Interactive shell assistant driven by a remote chat model.
//!
//! The model proposes shell commands inside `<CMD>…</CMD>` markers; each one
//! is shown to the operator, run only on approval in a time-boxed child
//! process, and its outcome is fed back into the conversation. The crate
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (conversation store, directive
//!   extraction, escaping, gate decisions, outcome rendering). No I/O.
//! - **[`io`]**: Side-effecting collaborators (configuration, model client,
//!   operator terminal, process execution) behind traits so tests can script them.
//!
//! [`session`] coordinates core logic with I/O to implement the `ai` binary.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
