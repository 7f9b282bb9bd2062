// Decoder for models without a reasoning convention: every chunk is content.

use crate::traits::{DecodeDelta, DecodeResult, ThinkingDecoder};

#[derive(Debug, Clone)]
pub struct PassthroughDecoder {
    decoder_type: String,
}

impl PassthroughDecoder {
    pub fn new() -> Self {
        Self {
            decoder_type: "passthrough".to_string(),
        }
    }
}

impl Default for PassthroughDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThinkingDecoder for PassthroughDecoder {
    fn stream_decode(&mut self, chunk: &str) -> DecodeDelta {
        if chunk.is_empty() {
            DecodeDelta::default()
        } else {
            DecodeDelta::content(chunk)
        }
    }

    fn finish(&mut self) -> DecodeDelta {
        DecodeDelta::default()
    }

    fn decode(&self, full_text: &str) -> DecodeResult {
        DecodeResult::content_only(full_text)
    }

    fn reset(&mut self) {}

    fn decoder_type(&self) -> &str {
        &self.decoder_type
    }

    fn is_in_thinking(&self) -> bool {
        false
    }
}
