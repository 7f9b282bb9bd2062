// Decoder for the role/channel/message/end control-sequence format used by
// GPT-OSS ("harmony"):
//
//   <|start|>assistant<|channel|>analysis<|message|>...<|end|>
//   <|start|>assistant<|channel|>final<|message|>...<|return|>
//
// The channel name between <|channel|> and <|message|> decides where the
// message body goes.

use serde::{Deserialize, Serialize};

use crate::{
    decoders::helpers::{find_first_marker, split_partial_marker},
    traits::{Channel, DecodeDelta, DecodeResult, ThinkingDecoder},
};

pub const DEFAULT_INITIAL_ROLE: &str = "assistant";

fn default_analysis_channel() -> String {
    "analysis".to_string()
}

fn default_final_channel() -> String {
    "final".to_string()
}

/// Literal marker strings of the control-sequence protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlMarkers {
    pub start: String,
    pub channel: String,
    pub message: String,
    pub end: String,
    /// Markers that terminate a message exactly like `end`.
    pub end_aliases: Vec<String>,
}

impl Default for ControlMarkers {
    fn default() -> Self {
        Self {
            start: "<|start|>".to_string(),
            channel: "<|channel|>".to_string(),
            message: "<|message|>".to_string(),
            end: "<|end|>".to_string(),
            end_aliases: vec!["<|return|>".to_string(), "<|call|>".to_string()],
        }
    }
}

impl ControlMarkers {
    /// All marker strings paired with the transition they trigger.
    fn table(&self) -> Vec<(&str, MarkerKind)> {
        let mut table = vec![
            (self.start.as_str(), MarkerKind::Start),
            (self.channel.as_str(), MarkerKind::Channel),
            (self.message.as_str(), MarkerKind::Message),
            (self.end.as_str(), MarkerKind::End),
        ];
        table.extend(
            self.end_aliases
                .iter()
                .map(|alias| (alias.as_str(), MarkerKind::End)),
        );
        table
    }
}

/// Rule deciding which output channel a message body belongs to.
///
/// Model families disagree on the default, so the rule is explicit: either
/// one channel is reasoning and everything else is content, or one channel
/// is content and everything else is reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ChannelPolicy {
    /// Only `analysis` is thinking.
    AnalysisIsThinking {
        #[serde(default = "default_analysis_channel")]
        analysis: String,
    },
    /// Only `final_channel` is content.
    FinalIsContent {
        #[serde(default = "default_final_channel")]
        final_channel: String,
    },
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        ChannelPolicy::analysis_is_thinking()
    }
}

impl ChannelPolicy {
    pub fn analysis_is_thinking() -> Self {
        ChannelPolicy::AnalysisIsThinking {
            analysis: default_analysis_channel(),
        }
    }

    pub fn final_is_content() -> Self {
        ChannelPolicy::FinalIsContent {
            final_channel: default_final_channel(),
        }
    }

    /// The channel name configured by this rule.
    pub fn channel_name(&self) -> &str {
        match self {
            ChannelPolicy::AnalysisIsThinking { analysis } => analysis,
            ChannelPolicy::FinalIsContent { final_channel } => final_channel,
        }
    }

    /// Classify a raw channel header.
    ///
    /// Only the first word is compared, so `commentary to=functions.search`
    /// classifies as `commentary`.
    pub fn classify(&self, channel_header: &str) -> Channel {
        let name = channel_header.split_whitespace().next().unwrap_or("");
        match self {
            ChannelPolicy::AnalysisIsThinking { analysis } => {
                if name == analysis {
                    Channel::Thinking
                } else {
                    Channel::Content
                }
            }
            ChannelPolicy::FinalIsContent { final_channel } => {
                if name == final_channel {
                    Channel::Content
                } else {
                    Channel::Thinking
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Start,
    Channel,
    Message,
    End,
}

/// State of the current message header and body.
#[derive(Debug, Clone)]
struct SequenceState {
    last_marker: MarkerKind,
    role: String,
    channel: String,
    /// A header has been started but has not reached `message` yet.
    open_header: bool,
}

impl SequenceState {
    fn new(initial_role: &str) -> Self {
        Self {
            last_marker: MarkerKind::Start,
            role: initial_role.to_string(),
            channel: String::new(),
            open_header: false,
        }
    }

    fn is_expected(&self, marker: MarkerKind) -> bool {
        match (self.last_marker, marker) {
            // The stream may repeat the start marker the prompt ended with
            (MarkerKind::Start, MarkerKind::Start) => !self.open_header,
            (MarkerKind::Start, MarkerKind::Channel)
            | (MarkerKind::Start, MarkerKind::Message)
            | (MarkerKind::Channel, MarkerKind::Message)
            | (MarkerKind::Message, MarkerKind::End)
            | (MarkerKind::End, MarkerKind::Start) => true,
            _ => false,
        }
    }

    /// Handle free text between markers.
    fn on_text(&mut self, text: &str, policy: &ChannelPolicy, delta: &mut DecodeDelta) {
        match self.last_marker {
            MarkerKind::Start => {
                if !text.is_empty() {
                    self.role.push_str(text);
                    self.open_header = true;
                }
            }
            MarkerKind::Channel => self.channel.push_str(text),
            MarkerKind::Message => {
                if !text.is_empty() {
                    delta.push(policy.classify(&self.channel), text);
                }
            }
            MarkerKind::End => {
                if !text.trim().is_empty() {
                    tracing::warn!(
                        text = %text,
                        "Unexpected text after end marker before next start marker, dropping"
                    );
                }
            }
        }
    }

    fn on_marker(&mut self, marker: MarkerKind, policy: &ChannelPolicy, delta: &mut DecodeDelta) {
        if !self.is_expected(marker) {
            tracing::warn!(
                previous = ?self.last_marker,
                marker = ?marker,
                role = %self.role,
                channel = %self.channel,
                "Out-of-order control marker"
            );
        }

        match marker {
            MarkerKind::Start => {
                self.role.clear();
                self.open_header = true;
            }
            MarkerKind::Channel => {
                self.channel.clear();
                self.open_header = true;
            }
            MarkerKind::Message => {
                if self.last_marker == MarkerKind::Start {
                    self.channel.clear();
                }
                self.open_header = false;
                delta.touch(policy.classify(&self.channel));
            }
            MarkerKind::End => {
                self.open_header = false;
            }
        }

        self.last_marker = marker;
    }
}

/// Control-sequence thinking decoder.
#[derive(Debug, Clone)]
pub struct ControlSequenceDecoder {
    markers: ControlMarkers,
    policy: ChannelPolicy,
    initial_role: String,
    state: SequenceState,
    /// Withheld suffix that may still grow into a marker.
    pending: String,
    decoder_type: String,
}

impl ControlSequenceDecoder {
    /// Create a decoder with the default markers and the given channel rule.
    pub fn new(policy: ChannelPolicy) -> Self {
        Self::with_markers(ControlMarkers::default(), policy)
    }

    pub fn with_markers(markers: ControlMarkers, policy: ChannelPolicy) -> Self {
        Self {
            markers,
            policy,
            initial_role: DEFAULT_INITIAL_ROLE.to_string(),
            state: SequenceState::new(DEFAULT_INITIAL_ROLE),
            pending: String::new(),
            decoder_type: "control_sequence".to_string(),
        }
    }

    /// Set the role the stream is assumed to start in. The prompt usually
    /// ends with `<|start|>assistant`, so generation starts after the role.
    pub fn with_initial_role(mut self, role: impl Into<String>) -> Self {
        self.initial_role = role.into();
        self.state = SequenceState::new(&self.initial_role);
        self
    }

    /// Override the decoder type reported by [`ThinkingDecoder::decoder_type`].
    pub fn with_decoder_type(mut self, decoder_type: impl Into<String>) -> Self {
        self.decoder_type = decoder_type.into();
        self
    }

    pub fn markers(&self) -> &ControlMarkers {
        &self.markers
    }

    pub fn policy(&self) -> &ChannelPolicy {
        &self.policy
    }

    /// Role text of the current message header.
    pub fn role(&self) -> &str {
        &self.state.role
    }

    /// Channel header of the current message.
    pub fn channel(&self) -> &str {
        &self.state.channel
    }

    /// A fresh instance with the same configuration.
    fn fresh(&self) -> Self {
        Self {
            markers: self.markers.clone(),
            policy: self.policy.clone(),
            initial_role: self.initial_role.clone(),
            state: SequenceState::new(&self.initial_role),
            pending: String::new(),
            decoder_type: self.decoder_type.clone(),
        }
    }
}

impl Default for ControlSequenceDecoder {
    fn default() -> Self {
        Self::new(ChannelPolicy::default())
    }
}

impl ThinkingDecoder for ControlSequenceDecoder {
    fn stream_decode(&mut self, chunk: &str) -> DecodeDelta {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(chunk);

        let table = self.markers.table();
        let needles: Vec<&str> = table.iter().map(|(marker, _)| *marker).collect();

        let mut delta = DecodeDelta::default();
        let mut rest = text.as_str();

        // A single chunk may cross several complete message cycles
        loop {
            match find_first_marker(rest, &needles) {
                Some((idx, which)) => {
                    let (marker, kind) = table[which];
                    self.state.on_text(&rest[..idx], &self.policy, &mut delta);
                    self.state.on_marker(kind, &self.policy, &mut delta);
                    rest = &rest[idx + marker.len()..];
                }
                None => {
                    let (ready, tail) = split_partial_marker(rest, &needles);
                    self.state.on_text(ready, &self.policy, &mut delta);
                    self.pending = tail.to_string();
                    break;
                }
            }
        }

        delta
    }

    fn finish(&mut self) -> DecodeDelta {
        let tail = std::mem::take(&mut self.pending);
        let mut delta = DecodeDelta::default();
        self.state.on_text(&tail, &self.policy, &mut delta);

        if self.state.open_header {
            tracing::warn!(
                role = %self.state.role,
                channel = %self.state.channel,
                "Stream ended inside a message header that never reached the message marker"
            );
        }

        delta
    }

    fn decode(&self, full_text: &str) -> DecodeResult {
        let mut decoder = self.fresh();
        let mut delta = decoder.stream_decode(full_text);
        delta.merge(decoder.finish());
        DecodeResult::new(delta.content.unwrap_or_default(), delta.thinking)
    }

    fn reset(&mut self) {
        self.state = SequenceState::new(&self.initial_role);
        self.pending.clear();
    }

    fn decoder_type(&self) -> &str {
        &self.decoder_type
    }

    fn is_in_thinking(&self) -> bool {
        self.state.last_marker == MarkerKind::Message
            && self.policy.classify(&self.state.channel) == Channel::Thinking
    }
}
