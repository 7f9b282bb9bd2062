use std::{
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::{bail, Context};
use clap::Parser;
use thinking_decoder::{
    logging::parse_level, Decoder, DecoderConfig, DecoderFactory, LoggingConfig, ThinkingDecoder,
};

#[derive(Parser, Debug)]
#[command(name = "thinking-decode")]
#[command(about = "Split model output read from stdin into content and thinking channels")]
#[command(long_about = r#"
Split model output read from stdin into content and thinking channels.

Examples:
  # One-shot decode with the default <think> decoder
  echo '<think>why</think>because' | thinking-decode

  # Replay a GPT-OSS transcript as a stream of 4-character chunks
  thinking-decode --model gpt-oss-20b --stream --chunk-size 4 < transcript.txt

  # Decoder from a JSON configuration
  thinking-decode --config decoder.json < output.txt
"#)]
struct CliArgs {
    /// Registered decoder name (think, qwen3, deepseek_r1, gpt_oss, passthrough)
    #[arg(long, conflicts_with_all = ["model", "config", "tag"])]
    decoder: Option<String>,

    /// Model id used to pick a decoder by pattern
    #[arg(long, conflicts_with_all = ["config", "tag"])]
    model: Option<String>,

    /// JSON decoder configuration file
    #[arg(long, conflicts_with = "tag")]
    config: Option<PathBuf>,

    /// Tag name for a bracketed decoder, e.g. "think"
    #[arg(long)]
    tag: Option<String>,

    /// Rendered prompt; bracketed decoders start inside the reasoning span
    /// when it ends with the start tag
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Emit one JSON delta per line instead of a single result
    #[arg(long, default_value_t = false)]
    stream: bool,

    /// Characters per streamed chunk
    #[arg(long, default_value_t = 1)]
    chunk_size: usize,

    /// List registered decoders and exit
    #[arg(long, default_value_t = false)]
    list_decoders: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    log_json: bool,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl CliArgs {
    fn logging_config(&self) -> anyhow::Result<LoggingConfig> {
        Ok(LoggingConfig {
            level: parse_level(&self.log_level)?,
            json_format: self.log_json,
            log_dir: self.log_dir.clone(),
            ..Default::default()
        })
    }

    fn build_decoder(&self, factory: &DecoderFactory) -> anyhow::Result<Decoder> {
        let decoder = if let Some(path) = &self.config {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            DecoderConfig::from_json_str(&json)?.build()?
        } else if let Some(tag) = &self.tag {
            DecoderConfig::Bracketed {
                tag: tag.clone(),
                init_buffer: String::new(),
            }
            .build()?
        } else if let Some(name) = &self.decoder {
            factory.create_decoder(name)?
        } else if let Some(model) = &self.model {
            factory.create(model)
        } else {
            DecoderConfig::default().build()?
        };

        match &self.prompt_file {
            Some(path) => {
                let prompt = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read prompt {}", path.display()))?;
                Ok(decoder.for_prompt(&prompt))
            }
            None => Ok(decoder),
        }
    }
}

/// Split `text` into chunks of at most `size` characters.
fn char_chunks(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let _log_guard = thinking_decoder::init_logging(args.logging_config()?);

    let factory = DecoderFactory::new();

    if args.list_decoders {
        for name in factory.decoder_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let mut decoder = args.build_decoder(&factory)?;
    tracing::info!(decoder = decoder.decoder_type(), stream = args.stream, "Decoding stdin");

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.stream {
        let mut emitted = 0usize;
        for chunk in char_chunks(&input, args.chunk_size) {
            let delta = decoder.stream_decode(chunk);
            if !delta.is_unchanged() {
                serde_json::to_writer(&mut out, &delta)?;
                writeln!(out)?;
                emitted += 1;
            }
        }
        let delta = decoder.finish();
        if !delta.is_unchanged() {
            serde_json::to_writer(&mut out, &delta)?;
            writeln!(out)?;
            emitted += 1;
        }
        tracing::debug!(deltas = emitted, "Stream finished");
    } else {
        let result = decoder.decode(&input);
        serde_json::to_writer_pretty(&mut out, &result)?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}
