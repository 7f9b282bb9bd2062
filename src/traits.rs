use std::fmt;

use serde::{Deserialize, Serialize};

/// The two output streams a span of generated text can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// User-facing answer text.
    Content,
    /// Internal deliberation of the model.
    Thinking,
}

/// Result of one incremental decode call.
///
/// Each field is three-valued: `None` means the channel did not change in
/// this call, `Some("")` means a channel boundary was crossed without any
/// text belonging to it, and `Some(text)` carries the new text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

impl DecodeDelta {
    /// Create a delta with only content text.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            thinking: None,
        }
    }

    /// Create a delta with only thinking text.
    pub fn thinking(text: impl Into<String>) -> Self {
        Self {
            content: None,
            thinking: Some(text.into()),
        }
    }

    /// Append text to the given channel, marking it as touched even when
    /// `text` is empty.
    pub fn push(&mut self, channel: Channel, text: &str) {
        let slot = match channel {
            Channel::Content => &mut self.content,
            Channel::Thinking => &mut self.thinking,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    /// Mark a channel boundary without adding text.
    pub fn touch(&mut self, channel: Channel) {
        self.push(channel, "");
    }

    /// Fold another delta into this one, keeping the three-way distinction.
    pub fn merge(&mut self, other: DecodeDelta) {
        if let Some(text) = other.content {
            self.push(Channel::Content, &text);
        }
        if let Some(text) = other.thinking {
            self.push(Channel::Thinking, &text);
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Content => self.content.as_deref(),
            Channel::Thinking => self.thinking.as_deref(),
        }
    }

    /// True when neither channel changed, i.e. no event should be emitted.
    pub fn is_unchanged(&self) -> bool {
        self.content.is_none() && self.thinking.is_none()
    }
}

/// Result of decoding a complete response in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

impl DecodeResult {
    pub fn new(content: impl Into<String>, thinking: Option<String>) -> Self {
        Self {
            content: content.into(),
            thinking,
        }
    }

    /// Create a result without any reasoning span.
    pub fn content_only(content: impl Into<String>) -> Self {
        Self::new(content, None)
    }
}

impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecodeResult {{ content: {} chars, thinking: {} }}",
            self.content.len(),
            match &self.thinking {
                Some(text) => format!("{} chars", text.len()),
                None => "absent".to_string(),
            }
        )
    }
}

/// Splits model output into content and thinking channels.
///
/// An instance belongs to exactly one generation. It is created when the
/// generation starts, fed every chunk in order and dropped when the
/// generation ends or is cancelled.
pub trait ThinkingDecoder: Send {
    /// Decode one chunk of streamed output against the accumulated state.
    ///
    /// Chunk boundaries may fall anywhere, including inside a marker. Text
    /// that might still turn out to be part of a marker is withheld until a
    /// later call (or [`ThinkingDecoder::finish`]) decides it.
    fn stream_decode(&mut self, chunk: &str) -> DecodeDelta;

    /// Signal the end of the stream and flush any withheld text.
    fn finish(&mut self) -> DecodeDelta;

    /// Decode a complete response. Independent of the incremental state.
    fn decode(&self, full_text: &str) -> DecodeResult;

    /// Return to the state the instance was constructed in.
    fn reset(&mut self);

    /// Name of the decoding convention this instance implements.
    fn decoder_type(&self) -> &str;

    /// Whether the next free text would be routed to the thinking channel.
    fn is_in_thinking(&self) -> bool;
}
