use serde::{Deserialize, Serialize};

use super::{ConfigResult, ConfigValidator};
use crate::decoders::{
    control_sequence::DEFAULT_INITIAL_ROLE, BracketedTagDecoder, ChannelPolicy, ControlMarkers,
    ControlSequenceDecoder, Decoder, PassthroughDecoder, DEFAULT_THINKING_TAG,
};

fn default_tag() -> String {
    DEFAULT_THINKING_TAG.to_string()
}

fn default_initial_role() -> String {
    DEFAULT_INITIAL_ROLE.to_string()
}

/// Decoder configuration, tagged by `type`.
///
/// ```json
/// {"type": "bracketed", "tag": "think"}
/// {"type": "control_sequence", "policy": {"rule": "final_is_content"}}
/// {"type": "passthrough"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecoderConfig {
    Bracketed {
        /// Tag name, markers are `<tag>` and `</tag>`
        #[serde(default = "default_tag")]
        tag: String,
        /// Text already generated before decoding starts
        #[serde(default)]
        init_buffer: String,
    },
    ControlSequence {
        #[serde(default)]
        markers: ControlMarkers,
        #[serde(default)]
        policy: ChannelPolicy,
        /// Role the stream starts in
        #[serde(default = "default_initial_role")]
        initial_role: String,
    },
    Passthrough,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig::Bracketed {
            tag: default_tag(),
            init_buffer: String::new(),
        }
    }
}

impl DecoderConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: DecoderConfig = serde_json::from_str(json)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Validate and build a fresh decoder.
    pub fn build(&self) -> ConfigResult<Decoder> {
        ConfigValidator::validate(self)?;

        let decoder = match self {
            DecoderConfig::Bracketed { tag, init_buffer } => {
                Decoder::Bracketed(BracketedTagDecoder::with_init_buffer(tag, init_buffer))
            }
            DecoderConfig::ControlSequence {
                markers,
                policy,
                initial_role,
            } => Decoder::ControlSequence(
                ControlSequenceDecoder::with_markers(markers.clone(), policy.clone())
                    .with_initial_role(initial_role),
            ),
            DecoderConfig::Passthrough => Decoder::Passthrough(PassthroughDecoder::new()),
        };

        Ok(decoder)
    }
}
