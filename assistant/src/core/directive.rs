//! Lexical extraction of `<CMD>…</CMD>` directives from assistant text.
//!
//! Matching is literal and non-nesting: a start marker inside an open span
//! is part of the command, and scanning resumes after the span's end marker.
//! If any start marker has no end marker after it, the whole text yields no
//! directives at all.

pub const START_MARKER: &str = "<CMD>";
pub const END_MARKER: &str = "</CMD>";
/// Longest command text kept from a single directive.
pub const MAX_COMMAND_BYTES: usize = 511;

/// A command proposed by the assistant, awaiting approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    raw_command: String,
}

impl Directive {
    /// Build a directive, truncating the command to [`MAX_COMMAND_BYTES`]
    /// on a character boundary.
    pub fn new(command: &str) -> Self {
        let mut end = command.len().min(MAX_COMMAND_BYTES);
        while !command.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            raw_command: command[..end].to_string(),
        }
    }

    pub fn raw_command(&self) -> &str {
        &self.raw_command
    }
}

/// Lazy iterator over the directives of one assistant reply.
///
/// Cloning yields an independent cursor at the same position.
#[derive(Debug, Clone)]
pub struct Directives<'a> {
    rest: &'a str,
}

impl Iterator for Directives<'_> {
    type Item = Directive;

    fn next(&mut self) -> Option<Directive> {
        let (command, after) = next_span(self.rest)?;
        self.rest = after;
        Some(Directive::new(command))
    }
}

/// Scan `text` for directives in left-to-right order.
pub fn extract_directives(text: &str) -> Directives<'_> {
    if has_unterminated_directive(text) {
        return Directives { rest: "" };
    }
    Directives { rest: text }
}

/// True when some start marker has no end marker after it.
pub fn has_unterminated_directive(text: &str) -> bool {
    let mut rest = text;
    loop {
        let Some(start) = rest.find(START_MARKER) else {
            return false;
        };
        let body = &rest[start + START_MARKER.len()..];
        match body.find(END_MARKER) {
            Some(end) => rest = &body[end + END_MARKER.len()..],
            None => return true,
        }
    }
}

/// Locate the next complete span, returning its command text and the remainder.
fn next_span(text: &str) -> Option<(&str, &str)> {
    let start = text.find(START_MARKER)?;
    let body = &text[start + START_MARKER.len()..];
    let end = body.find(END_MARKER)?;
    Some((&body[..end], &body[end + END_MARKER.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(text: &str) -> Vec<String> {
        extract_directives(text)
            .map(|directive| directive.raw_command().to_string())
            .collect()
    }

    #[test]
    fn extracts_directives_in_order() {
        let text = "First <CMD>ls -la</CMD> then <CMD>df -h</CMD> and <CMD>ls -la</CMD>.";
        assert_eq!(commands(text), vec!["ls -la", "df -h", "ls -la"]);
    }

    #[test]
    fn text_without_markers_yields_nothing() {
        assert!(commands("Nothing to run here.").is_empty());
        assert!(!has_unterminated_directive("Nothing to run here."));
    }

    #[test]
    fn unterminated_marker_discards_every_directive() {
        let text = "<CMD>uptime</CMD> and then <CMD>rm -rf /tmp/x";
        assert!(has_unterminated_directive(text));
        assert!(commands(text).is_empty());
    }

    #[test]
    fn end_marker_without_start_is_ignored() {
        assert_eq!(commands("stray </CMD> <CMD>pwd</CMD>"), vec!["pwd"]);
    }

    #[test]
    fn nested_start_marker_belongs_to_the_command() {
        let text = "<CMD>echo <CMD>inner</CMD> tail</CMD>";
        // The first end marker closes the span; the trailing end marker is stray.
        assert_eq!(commands(text), vec!["echo <CMD>inner"]);
    }

    #[test]
    fn empty_directive_is_kept() {
        assert_eq!(commands("<CMD></CMD>"), vec![""]);
    }

    #[test]
    fn long_command_is_truncated_deterministically() {
        let long = "x".repeat(MAX_COMMAND_BYTES + 40);
        let text = format!("{START_MARKER}{long}{END_MARKER}");
        let extracted = commands(&text);
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0], "x".repeat(MAX_COMMAND_BYTES));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let command = format!("{}é", "a".repeat(MAX_COMMAND_BYTES - 1));
        let directive = Directive::new(&command);
        assert_eq!(directive.raw_command(), "a".repeat(MAX_COMMAND_BYTES - 1));
    }

    #[test]
    fn cloned_iterator_restarts_from_same_position() {
        let mut directives = extract_directives("<CMD>a</CMD><CMD>b</CMD><CMD>c</CMD>");
        assert_eq!(directives.next().map(|d| d.raw_command().to_string()), Some("a".into()));
        let snapshot = directives.clone();
        let rest: Vec<String> = directives.map(|d| d.raw_command().to_string()).collect();
        let replay: Vec<String> = snapshot.map(|d| d.raw_command().to_string()).collect();
        assert_eq!(rest, vec!["b", "c"]);
        assert_eq!(replay, rest);
    }

    #[test]
    fn multiline_command_is_preserved() {
        assert_eq!(
            commands("<CMD>cat <<EOF\nhi\nEOF</CMD>"),
            vec!["cat <<EOF\nhi\nEOF"]
        );
    }
}
