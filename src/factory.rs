// Factory and registry for creating model-specific thinking decoders.
// Every call returns a fresh instance: decoder state belongs to a single
// generation and is never shared.

use std::{collections::HashMap, sync::Arc};

use crate::{
    config::DecoderConfig,
    decoders::{
        BracketedTagDecoder, ChannelPolicy, ControlSequenceDecoder, Decoder, PassthroughDecoder,
        DEFAULT_THINKING_TAG,
    },
    errors::{DecoderError, DecoderResult},
};

/// Type alias for decoder creator functions.
type DecoderCreator = Arc<dyn Fn() -> Decoder + Send + Sync>;

/// Name of the decoder used when no pattern matches a model.
pub const PASSTHROUGH_DECODER: &str = "passthrough";

/// Registry of named decoders and model-id patterns.
#[derive(Clone)]
pub struct DecoderFactory {
    creators: HashMap<String, DecoderCreator>,
    /// (pattern, decoder_name), checked in registration order
    patterns: Vec<(String, String)>,
}

impl DecoderFactory {
    /// Create a factory with the built-in decoders registered.
    pub fn new() -> Self {
        let mut factory = Self::empty();

        factory.register_decoder(DEFAULT_THINKING_TAG, || {
            BracketedTagDecoder::default().into()
        });

        // Qwen3 emits the start tag itself
        factory.register_decoder("qwen3", || {
            BracketedTagDecoder::default()
                .with_decoder_type("qwen3")
                .into()
        });

        // DeepSeek-R1 chat templates open the reasoning span in the prompt
        factory.register_decoder("deepseek_r1", || {
            BracketedTagDecoder::with_init_buffer(DEFAULT_THINKING_TAG, "<think>")
                .with_decoder_type("deepseek_r1")
                .into()
        });

        // GPT-OSS harmony: analysis channel is reasoning, final and
        // commentary are user-visible
        factory.register_decoder("gpt_oss", || {
            ControlSequenceDecoder::new(ChannelPolicy::analysis_is_thinking())
                .with_decoder_type("gpt_oss")
                .into()
        });

        factory.register_decoder(PASSTHROUGH_DECODER, || PassthroughDecoder::new().into());

        factory.register_pattern("gpt-oss", "gpt_oss");
        factory.register_pattern("gpt_oss", "gpt_oss");
        factory.register_pattern("deepseek-r1", "deepseek_r1");
        factory.register_pattern("qwq", "qwen3");
        factory.register_pattern("qwen3", "qwen3");

        factory
    }

    /// Create a factory without any registered decoders.
    pub fn empty() -> Self {
        Self {
            creators: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// Register a decoder creator under `name`, replacing any previous one.
    pub fn register_decoder<F>(&mut self, name: &str, creator: F)
    where
        F: Fn() -> Decoder + Send + Sync + 'static,
    {
        self.creators.insert(name.to_string(), Arc::new(creator));
    }

    /// Register a decoder built from a configuration. The configuration is
    /// validated once here.
    pub fn register_config(&mut self, name: &str, config: DecoderConfig) -> DecoderResult<()> {
        let template = config.build()?;
        self.register_decoder(name, move || template.clone());
        Ok(())
    }

    /// Register a model pattern to decoder mapping.
    /// Patterns are matched case-insensitively as substrings, first match wins.
    pub fn register_pattern(&mut self, pattern: &str, decoder_name: &str) {
        self.patterns
            .push((pattern.to_lowercase(), decoder_name.to_string()));
    }

    /// Check if a decoder with the given name is registered.
    pub fn has_decoder(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Names of all registered decoders, sorted.
    pub fn decoder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create a fresh decoder by exact name.
    pub fn create_decoder(&self, name: &str) -> DecoderResult<Decoder> {
        self.creators
            .get(name)
            .map(|creator| creator())
            .ok_or_else(|| DecoderError::UnknownDecoder(name.to_string()))
    }

    /// Name of the decoder registered for a model id, if any pattern matches.
    pub fn decoder_name_for_model(&self, model_id: &str) -> Option<&str> {
        let model_lower = model_id.to_lowercase();
        self.patterns
            .iter()
            .find(|(pattern, _)| model_lower.contains(pattern.as_str()))
            .map(|(_, name)| name.as_str())
    }

    /// Check if a registered decoder is available for a model id.
    pub fn has_decoder_for_model(&self, model_id: &str) -> bool {
        self.decoder_name_for_model(model_id)
            .is_some_and(|name| self.has_decoder(name))
    }

    /// Create a fresh decoder for a model id.
    /// Falls back to passthrough when no pattern matches.
    pub fn create(&self, model_id: &str) -> Decoder {
        if let Some(name) = self.decoder_name_for_model(model_id) {
            match self.create_decoder(name) {
                Ok(decoder) => return decoder,
                Err(e) => {
                    tracing::warn!(model_id = %model_id, error = %e, "Pattern points to unregistered decoder");
                }
            }
        }

        tracing::debug!(model_id = %model_id, "No thinking decoder for model, using passthrough");
        self.create_decoder(PASSTHROUGH_DECODER)
            .unwrap_or_else(|_| PassthroughDecoder::new().into())
    }

    /// Create a fresh decoder for a model id, adapted to the rendered prompt
    /// (see [`Decoder::for_prompt`]).
    pub fn create_for_prompt(&self, model_id: &str, prompt: &str) -> Decoder {
        self.create(model_id).for_prompt(prompt)
    }
}

impl Default for DecoderFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ThinkingDecoder;

    #[test]
    fn test_factory_creates_gpt_oss() {
        let factory = DecoderFactory::new();
        let decoder = factory.create("openai/gpt-oss-20b");
        assert_eq!(decoder.decoder_type(), "gpt_oss");
        assert!(matches!(decoder, Decoder::ControlSequence(_)));
    }

    #[test]
    fn test_factory_creates_qwen3() {
        let factory = DecoderFactory::new();
        let decoder = factory.create("mlx-community/Qwen3-0.6B-4bit-DWQ");
        assert_eq!(decoder.decoder_type(), "qwen3");
        assert!(!decoder.is_in_thinking());
    }

    #[test]
    fn test_factory_creates_seeded_deepseek_r1() {
        let factory = DecoderFactory::new();
        let decoder = factory.create("deepseek-ai/DeepSeek-R1-Distill-Qwen-1.5B");
        assert_eq!(decoder.decoder_type(), "deepseek_r1");
        assert!(decoder.is_in_thinking());
    }

    #[test]
    fn test_factory_fallback_to_passthrough() {
        let factory = DecoderFactory::new();
        let decoder = factory.create("gemma-3-1b-it");
        assert_eq!(decoder.decoder_type(), "passthrough");
        assert!(!factory.has_decoder_for_model("gemma-3-1b-it"));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let factory = DecoderFactory::new();
        assert_eq!(factory.create("GPT-OSS-120B").decoder_type(), "gpt_oss");
        assert_eq!(factory.create("QWEN3").decoder_type(), "qwen3");
        assert_eq!(factory.create("QwQ-32B").decoder_type(), "qwen3");
    }

    #[test]
    fn test_fresh_instance_per_call() {
        let factory = DecoderFactory::new();
        let mut first = factory.create("qwen3");
        first.stream_decode("<think>");
        assert!(first.is_in_thinking());

        let second = factory.create("qwen3");
        assert!(!second.is_in_thinking());
    }

    #[test]
    fn test_create_decoder_unknown_name() {
        let factory = DecoderFactory::new();
        match factory.create_decoder("nope") {
            Err(DecoderError::UnknownDecoder(name)) => assert_eq!(name, "nope"),
            other => panic!("Expected UnknownDecoder, got {:?}", other.map(|d| d.decoder_type().to_string())),
        }
    }

    #[test]
    fn test_custom_registration() {
        let mut factory = DecoderFactory::empty();
        assert!(factory.decoder_names().is_empty());

        factory
            .register_config(
                "reason",
                DecoderConfig::Bracketed {
                    tag: "reason".to_string(),
                    init_buffer: String::new(),
                },
            )
            .unwrap();
        factory.register_pattern("My-Model", "reason");

        assert!(factory.has_decoder_for_model("my-model-7b"));
        let decoder = factory.create("my-model-7b");
        let result = decoder.decode("<reason>r</reason>c");
        assert_eq!(result.thinking.as_deref(), Some("r"));
        assert_eq!(result.content, "c");

        // Empty factory still falls back
        assert_eq!(factory.create("other").decoder_type(), "passthrough");
    }

    #[test]
    fn test_register_invalid_config() {
        let mut factory = DecoderFactory::empty();
        let result = factory.register_config(
            "bad",
            DecoderConfig::Bracketed {
                tag: String::new(),
                init_buffer: String::new(),
            },
        );
        assert!(matches!(result, Err(DecoderError::Config(_))));
        assert!(!factory.has_decoder("bad"));
    }

    #[test]
    fn test_create_for_prompt() {
        let factory = DecoderFactory::new();
        let decoder = factory.create_for_prompt("qwen3-8b", "<|im_start|>assistant\n<think>\n");
        assert!(decoder.is_in_thinking());
        assert_eq!(decoder.decoder_type(), "qwen3");
    }

    #[test]
    fn test_decoder_names() {
        let factory = DecoderFactory::new();
        assert_eq!(
            factory.decoder_names(),
            vec!["deepseek_r1", "gpt_oss", "passthrough", "qwen3", "think"]
        );
    }
}
