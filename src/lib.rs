//! Streaming separation of model output into content and thinking channels.
//!
//! A decoder is created per generation, fed every generated chunk through
//! [`ThinkingDecoder::stream_decode`] and finished with
//! [`ThinkingDecoder::finish`]. Non-streaming callers use
//! [`ThinkingDecoder::decode`] on the complete text.

pub mod config;
pub mod decoders;
pub mod errors;
pub mod factory;
pub mod logging;
pub mod traits;

pub use config::{ConfigError, ConfigResult, DecoderConfig};
pub use decoders::{
    BracketedTagDecoder, ChannelPolicy, ControlMarkers, ControlSequenceDecoder, Decoder,
    PassthroughDecoder,
};
pub use errors::{DecoderError, DecoderResult};
pub use factory::DecoderFactory;
pub use logging::{init_logging, LogGuard, LoggingConfig};
pub use traits::{Channel, DecodeDelta, DecodeResult, ThinkingDecoder};
