//! Append-only, capacity-bounded dialogue history sent to the model.
//!
//! Message content is stored percent-encoded (curl-style: everything except
//! ASCII alphanumerics and `-._~`) so it survives any downstream
//! serialization untouched. Decode with [`Message::decoded`] only when the
//! text is shown to the operator or handed to a shell.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of entries a conversation can hold.
pub const MAX_CONVERSATION_ENTRIES: usize = 25_000;
/// Maximum size of a single message's encoded content.
pub const MAX_CONTENT_BYTES: usize = 64_000;

const TRANSPORT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry. `content` is always in encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Encode `content` and bound it to [`MAX_CONTENT_BYTES`].
    pub fn new(role: Role, content: &str) -> Self {
        let (content, _) = encode_content(content, MAX_CONTENT_BYTES);
        Self { role, content }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Content exactly as it is sent over the wire.
    pub fn encoded(&self) -> &str {
        &self.content
    }

    pub fn decoded(&self) -> String {
        decode_content(&self.content)
    }
}

/// Returned by [`Conversation::append`] once the history is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("conversation storage limit reached ({capacity} entries)")]
pub struct ConversationFull {
    pub capacity: usize,
}

/// Ordered message history. Insertion order is the model's context window.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    capacity: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::with_capacity(MAX_CONVERSATION_ENTRIES)
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::new(),
            capacity,
        }
    }

    /// Encode and append a message.
    ///
    /// Once `capacity` entries are stored every further append is rejected
    /// and the existing history is left untouched.
    pub fn append(&mut self, role: Role, content: &str) -> Result<(), ConversationFull> {
        if self.is_full() {
            return Err(ConversationFull {
                capacity: self.capacity,
            });
        }
        let (encoded, truncated) = encode_content(content, MAX_CONTENT_BYTES);
        if truncated {
            tracing::warn!(
                role = ?role,
                limit = MAX_CONTENT_BYTES,
                "message content truncated to fit encoded limit"
            );
        }
        self.messages.push(Message {
            role,
            content: encoded,
        });
        Ok(())
    }

    /// Full ordered history for the model call.
    pub fn serialize_for_transport(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.messages.len() >= self.capacity
    }
}

/// Percent-encode `content`, keeping the encoded result within `limit` bytes.
///
/// Truncation happens on the raw text at a character boundary, so an escape
/// sequence is never split. Returns the encoded text and whether anything
/// was dropped.
pub fn encode_content(content: &str, limit: usize) -> (String, bool) {
    let kept = fit_encoded(content, limit);
    (
        utf8_percent_encode(kept, TRANSPORT_SET).to_string(),
        kept.len() < content.len(),
    )
}

/// Length of `content` once percent-encoded.
pub fn encoded_len(content: &str) -> usize {
    content.chars().map(encoded_width).sum()
}

/// Longest prefix of `content` whose encoded form fits in `limit` bytes.
pub fn fit_encoded(content: &str, limit: usize) -> &str {
    let mut encoded_len = 0usize;
    for (idx, ch) in content.char_indices() {
        let width = encoded_width(ch);
        if encoded_len + width > limit {
            return &content[..idx];
        }
        encoded_len += width;
    }
    content
}

/// Reverse [`encode_content`]. Invalid UTF-8 is replaced, malformed escapes pass through.
pub fn decode_content(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

fn encoded_width(ch: char) -> usize {
    if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~') {
        1
    } else {
        3 * ch.len_utf8()
    }
}
