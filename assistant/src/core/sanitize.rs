//! Shell escaping and invocation planning for approved commands.
//!
//! The operator approves the wrapper line `bash -c "<escaped>"`. Inside
//! double quotes a POSIX shell only unescapes `\`, `"`, `$` and `` ` ``, so
//! the wrapper always hands bash the original command verbatim.

/// Escape `\`, `"`, `$` and `` ` `` with a single backslash each.
pub fn escape_for_shell(command: &str) -> String {
    let mut escaped = String::with_capacity(command.len());
    for ch in command.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// The line shown to the operator and run by the outer shell.
pub fn wrapper_line(command: &str) -> String {
    format!("bash -c \"{}\"", escape_for_shell(command))
}

/// How an approved command will be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Program and arguments, no shell involved.
    Direct { program: String, args: Vec<String> },
    /// Wrapper line for `sh -c`.
    Shell(String),
}

/// Bash builtins and reserved words; these only mean something inside a shell.
const SHELL_WORDS: &[&str] = &[
    "!", ".", ":", "[[", "alias", "bg", "bind", "break", "builtin", "caller", "case", "cd",
    "command", "compgen", "complete", "compopt", "continue", "coproc", "declare", "dirs",
    "disown", "do", "done", "elif", "else", "enable", "esac", "eval", "exec", "exit", "export",
    "fc", "fg", "fi", "for", "function", "getopts", "hash", "help", "history", "if", "in",
    "jobs", "let", "local", "logout", "mapfile", "popd", "pushd", "read", "readarray",
    "readonly", "return", "select", "set", "shift", "shopt", "source", "suspend", "then",
    "time", "times", "trap", "type", "typeset", "ulimit", "umask", "unalias", "until", "unset",
    "wait", "while", "{", "}",
];

/// Prefer a direct argv when the command needs nothing from a shell.
///
/// Anything beyond plain words (quotes, pipes, redirects, globs, variables,
/// separators, leading assignments, builtins, keywords) goes through the
/// approved wrapper line.
pub fn plan_invocation(command: &str) -> Invocation {
    let mut words = command.split([' ', '\t']).filter(|w| !w.is_empty());
    let plain = command.chars().all(is_plain_char);
    match words.next() {
        Some(program) if plain && runs_without_shell(program) => Invocation::Direct {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
        },
        _ => Invocation::Shell(wrapper_line(command)),
    }
}

/// `NAME=value` prefixes and shell words have no executable to spawn.
fn runs_without_shell(program: &str) -> bool {
    !program.contains('=') && !SHELL_WORDS.contains(&program)
}

fn is_plain_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, ' ' | '\t' | '-' | '_' | '.' | '/' | '=' | ':' | ',' | '+' | '@' | '%')
}
