pub mod bracketed;
pub mod control_sequence;
pub mod helpers;
pub mod passthrough;

pub use bracketed::{BracketedTagDecoder, DEFAULT_THINKING_TAG};
pub use control_sequence::{ChannelPolicy, ControlMarkers, ControlSequenceDecoder};
pub use passthrough::PassthroughDecoder;

use crate::traits::{DecodeDelta, DecodeResult, ThinkingDecoder};

/// Closed set of supported decoding conventions.
#[derive(Debug, Clone)]
pub enum Decoder {
    Bracketed(BracketedTagDecoder),
    ControlSequence(ControlSequenceDecoder),
    Passthrough(PassthroughDecoder),
}

impl Decoder {
    fn as_dyn(&self) -> &dyn ThinkingDecoder {
        match self {
            Decoder::Bracketed(decoder) => decoder,
            Decoder::ControlSequence(decoder) => decoder,
            Decoder::Passthrough(decoder) => decoder,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn ThinkingDecoder {
        match self {
            Decoder::Bracketed(decoder) => decoder,
            Decoder::ControlSequence(decoder) => decoder,
            Decoder::Passthrough(decoder) => decoder,
        }
    }

    /// Adapt the decoder to a rendered prompt: bracketed decoders start
    /// inside the reasoning span when the prompt already opened it.
    pub fn for_prompt(self, prompt: &str) -> Self {
        match self {
            Decoder::Bracketed(decoder) => Decoder::Bracketed(decoder.seeded_from_prompt(prompt)),
            other => other,
        }
    }
}

impl ThinkingDecoder for Decoder {
    fn stream_decode(&mut self, chunk: &str) -> DecodeDelta {
        self.as_dyn_mut().stream_decode(chunk)
    }

    fn finish(&mut self) -> DecodeDelta {
        self.as_dyn_mut().finish()
    }

    fn decode(&self, full_text: &str) -> DecodeResult {
        self.as_dyn().decode(full_text)
    }

    fn reset(&mut self) {
        self.as_dyn_mut().reset()
    }

    fn decoder_type(&self) -> &str {
        self.as_dyn().decoder_type()
    }

    fn is_in_thinking(&self) -> bool {
        self.as_dyn().is_in_thinking()
    }
}

impl From<BracketedTagDecoder> for Decoder {
    fn from(decoder: BracketedTagDecoder) -> Self {
        Decoder::Bracketed(decoder)
    }
}

impl From<ControlSequenceDecoder> for Decoder {
    fn from(decoder: ControlSequenceDecoder) -> Self {
        Decoder::ControlSequence(decoder)
    }
}

impl From<PassthroughDecoder> for Decoder {
    fn from(decoder: PassthroughDecoder) -> Self {
        Decoder::Passthrough(decoder)
    }
}
