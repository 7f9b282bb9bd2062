// Decoder for reasoning wrapped in a single start/end tag pair,
// e.g. <think>...</think> as emitted by Qwen3 and DeepSeek-R1.

use crate::{
    decoders::helpers::{find_first_marker, split_partial_marker},
    traits::{Channel, DecodeDelta, DecodeResult, ThinkingDecoder},
};

pub const DEFAULT_THINKING_TAG: &str = "think";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// The reasoning span has not been opened yet.
    Untagged,
    /// Inside the reasoning span.
    Thinking,
    /// The reasoning span is over, everything left is content.
    Closed,
}

/// Bracketed-tag thinking decoder.
///
/// Only the first start/end pair is honoured. Markers arriving after the
/// span closed stay embedded in the content.
#[derive(Debug, Clone)]
pub struct BracketedTagDecoder {
    tag: String,
    start_marker: String,
    end_marker: String,
    init_buffer: String,
    phase: Phase,
    /// Withheld suffix that may still grow into a marker.
    pending: String,
    /// The start marker opening the current span has been consumed. A seed
    /// ending with the start marker leaves this unset so the model may
    /// repeat the marker once.
    stripped_start: bool,
    decoder_type: String,
}

impl BracketedTagDecoder {
    /// Create a decoder for `<tag>` / `</tag>`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_init_buffer(tag, "")
    }

    /// Create a decoder resuming from text that was already generated (or
    /// already placed in the prompt), e.g. `"<think>"`.
    ///
    /// The seed goes through the streaming machinery and its output is
    /// discarded.
    pub fn with_init_buffer(tag: impl Into<String>, init_buffer: impl Into<String>) -> Self {
        let tag = tag.into();
        let mut decoder = Self {
            start_marker: format!("<{}>", tag),
            end_marker: format!("</{}>", tag),
            tag,
            init_buffer: init_buffer.into(),
            phase: Phase::Untagged,
            pending: String::new(),
            stripped_start: false,
            decoder_type: "bracketed".to_string(),
        };
        decoder.apply_seed();
        decoder
    }

    /// Create a decoder for a generation whose rendered prompt may already
    /// open the reasoning span. Seeds the start marker when the prompt ends
    /// with it.
    pub fn from_prompt(tag: impl Into<String>, prompt: &str) -> Self {
        let decoder = Self::new(tag);
        decoder.seeded_from_prompt(prompt)
    }

    /// Re-seed this decoder's configuration for `prompt`, see
    /// [`BracketedTagDecoder::from_prompt`].
    ///
    /// A configured seed that already opens the span is kept.
    pub fn seeded_from_prompt(self, prompt: &str) -> Self {
        if self.init_buffer.contains(&self.start_marker) {
            return self;
        }
        if prompt.trim_end().ends_with(&self.start_marker) {
            tracing::debug!(tag = %self.tag, "prompt opens reasoning span, seeding decoder");
            let start_marker = self.start_marker.clone();
            Self::with_init_buffer(self.tag, start_marker).with_decoder_type(self.decoder_type)
        } else {
            self
        }
    }

    /// Override the decoder type reported by [`ThinkingDecoder::decoder_type`].
    pub fn with_decoder_type(mut self, decoder_type: impl Into<String>) -> Self {
        self.decoder_type = decoder_type.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn start_marker(&self) -> &str {
        &self.start_marker
    }

    pub fn end_marker(&self) -> &str {
        &self.end_marker
    }

    pub fn init_buffer(&self) -> &str {
        &self.init_buffer
    }

    fn apply_seed(&mut self) {
        if self.init_buffer.is_empty() {
            return;
        }
        let seed = self.init_buffer.clone();
        let _ = self.process(&seed);

        if self.phase == Phase::Thinking && seed.trim_end().ends_with(&self.start_marker) {
            self.stripped_start = false;
        }
    }

    fn process(&mut self, chunk: &str) -> DecodeDelta {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(chunk);

        let mut delta = DecodeDelta::default();
        let mut rest = text.as_str();

        loop {
            match self.phase {
                Phase::Closed => {
                    if !rest.is_empty() {
                        delta.push(Channel::Content, rest);
                    }
                    break;
                }
                Phase::Untagged => {
                    let markers = [self.start_marker.as_str(), self.end_marker.as_str()];
                    match find_first_marker(rest, &markers) {
                        Some((idx, which)) => {
                            if idx > 0 {
                                delta.push(Channel::Content, &rest[..idx]);
                            }
                            if which == 0 {
                                delta.touch(Channel::Thinking);
                                self.phase = Phase::Thinking;
                                self.stripped_start = true;
                            } else {
                                tracing::debug!(
                                    tag = %self.tag,
                                    "end marker without start marker, treating rest as content"
                                );
                                delta.touch(Channel::Content);
                                self.phase = Phase::Closed;
                            }
                            rest = &rest[idx + markers[which].len()..];
                        }
                        None => {
                            let (ready, tail) = split_partial_marker(rest, &markers);
                            if !ready.is_empty() {
                                delta.push(Channel::Content, ready);
                            }
                            self.pending = tail.to_string();
                            break;
                        }
                    }
                }
                Phase::Thinking => {
                    if !self.stripped_start {
                        // Opening marker repeated by the model after the seed
                        let body = rest.trim_start();
                        let lead = &rest[..rest.len() - body.len()];
                        if let Some(after) = body.strip_prefix(self.start_marker.as_str()) {
                            if !lead.is_empty() {
                                delta.push(Channel::Thinking, lead);
                            }
                            delta.touch(Channel::Thinking);
                            self.stripped_start = true;
                            rest = after;
                            continue;
                        }
                        if !body.is_empty() && self.start_marker.starts_with(body) {
                            if !lead.is_empty() {
                                delta.push(Channel::Thinking, lead);
                            }
                            self.pending = body.to_string();
                            break;
                        }
                        if !body.is_empty() {
                            self.stripped_start = true;
                        }
                    }

                    match rest.find(&self.end_marker) {
                        Some(idx) => {
                            if idx > 0 {
                                delta.push(Channel::Thinking, &rest[..idx]);
                            }
                            delta.touch(Channel::Content);
                            self.phase = Phase::Closed;
                            rest = &rest[idx + self.end_marker.len()..];
                        }
                        None => {
                            let (ready, tail) =
                                split_partial_marker(rest, &[self.end_marker.as_str()]);
                            if !ready.is_empty() {
                                delta.push(Channel::Thinking, ready);
                            }
                            self.pending = tail.to_string();
                            break;
                        }
                    }
                }
            }
        }

        delta
    }
}

impl Default for BracketedTagDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_THINKING_TAG)
    }
}

impl ThinkingDecoder for BracketedTagDecoder {
    fn stream_decode(&mut self, chunk: &str) -> DecodeDelta {
        self.process(chunk)
    }

    fn finish(&mut self) -> DecodeDelta {
        let tail = std::mem::take(&mut self.pending);
        let mut delta = DecodeDelta::default();

        if self.phase == Phase::Thinking {
            tracing::debug!(tag = %self.tag, "stream ended inside reasoning span");
        }
        if !tail.is_empty() {
            let channel = match self.phase {
                Phase::Thinking => Channel::Thinking,
                Phase::Untagged | Phase::Closed => Channel::Content,
            };
            delta.push(channel, &tail);
        }

        delta
    }

    fn decode(&self, full_text: &str) -> DecodeResult {
        // First complete pair, non-greedy
        if let Some(start_idx) = full_text.find(&self.start_marker) {
            let inner_start = start_idx + self.start_marker.len();
            if let Some(rel_end) = full_text[inner_start..].find(&self.end_marker) {
                let inner_end = inner_start + rel_end;
                let thinking = full_text[inner_start..inner_end].trim().to_string();

                let mut content = String::with_capacity(full_text.len());
                content.push_str(&full_text[..start_idx]);
                content.push_str(&full_text[inner_end + self.end_marker.len()..]);

                return DecodeResult::new(content.trim(), Some(thinking));
            }
        }

        // Start marker missing, e.g. it was part of the prompt
        if let Some((before, after)) = full_text.split_once(self.end_marker.as_str()) {
            let thinking = before.trim();
            return DecodeResult::new(
                after.trim(),
                (!thinking.is_empty()).then(|| thinking.to_string()),
            );
        }

        DecodeResult::content_only(full_text.trim())
    }

    fn reset(&mut self) {
        self.phase = Phase::Untagged;
        self.pending.clear();
        self.stripped_start = false;
        self.apply_seed();
    }

    fn decoder_type(&self) -> &str {
        &self.decoder_type
    }

    fn is_in_thinking(&self) -> bool {
        self.phase == Phase::Thinking
    }
}
