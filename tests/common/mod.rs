#![allow(dead_code)]

use thinking_decoder::{DecodeDelta, ThinkingDecoder};

/// Per-channel concatenation of streamed deltas. A channel that was never
/// touched stays `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Collected {
    pub content: Option<String>,
    pub thinking: Option<String>,
}

impl Collected {
    pub fn add(&mut self, delta: DecodeDelta) {
        if let Some(text) = delta.content {
            self.content.get_or_insert_with(String::new).push_str(&text);
        }
        if let Some(text) = delta.thinking {
            self.thinking.get_or_insert_with(String::new).push_str(&text);
        }
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Feed `chunks` in order, then finish the stream.
pub fn stream_chunks<D: ThinkingDecoder, S: AsRef<str>>(decoder: &mut D, chunks: &[S]) -> Collected {
    let mut collected = Collected::default();
    for chunk in chunks {
        collected.add(decoder.stream_decode(chunk.as_ref()));
    }
    collected.add(decoder.finish());
    collected
}

/// Every way of cutting `text` in two at a char boundary.
pub fn two_way_splits(text: &str) -> Vec<[&str; 2]> {
    (0..=text.len())
        .filter(|&i| text.is_char_boundary(i))
        .map(|i| [&text[..i], &text[i..]])
        .collect()
}

/// Every way of cutting `text` in three at char boundaries.
pub fn three_way_splits(text: &str) -> Vec<[&str; 3]> {
    let boundaries: Vec<usize> = (0..=text.len())
        .filter(|&i| text.is_char_boundary(i))
        .collect();

    let mut splits = Vec::new();
    for (n, &i) in boundaries.iter().enumerate() {
        for &j in &boundaries[n..] {
            splits.push([&text[..i], &text[i..j], &text[j..]]);
        }
    }
    splits
}

/// One chunk per character.
pub fn char_chunks(text: &str) -> Vec<String> {
    text.chars().map(|c| c.to_string()).collect()
}
