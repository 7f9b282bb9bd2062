//! Streaming vs. one-shot decoding
//!
//! Concatenating the deltas of any chunking of a text must give the same
//! channels as decoding the text at once.

mod common;

use common::{char_chunks, stream_chunks, three_way_splits, two_way_splits, Collected};
use thinking_decoder::{
    BracketedTagDecoder, ChannelPolicy, ControlSequenceDecoder, DecodeResult, ThinkingDecoder,
};

/// The bracketed decoder trims surrounding whitespace in one-shot mode only.
fn assert_bracketed_equivalent(collected: &Collected, expected: &DecodeResult, input: &str) {
    assert_eq!(
        collected.content_str().trim(),
        expected.content,
        "content mismatch for {:?}",
        input
    );
    assert_eq!(
        collected.thinking.as_deref().map(str::trim),
        expected.thinking.as_deref(),
        "thinking mismatch for {:?}",
        input
    );
}

fn assert_control_equivalent(collected: &Collected, expected: &DecodeResult, input: &str) {
    assert_eq!(
        collected.content_str(),
        expected.content,
        "content mismatch for {:?}",
        input
    );
    assert_eq!(
        collected.thinking, expected.thinking,
        "thinking mismatch for {:?}",
        input
    );
}

const BRACKETED_INPUTS: &[&str] = &[
    "no tags here",
    "<think>reasoning</think>answer",
    "<think>step 1\nstep 2</think>\n\nThe answer is 42.",
    "Sure. <think>hidden</think> Visible.",
    "<think>a</think>b<think>c</think>d",
    "<think></think>answer",
    "<think>\n</think>\nanswer",
    "a < b and c </ d <th",
    "<think>x < y and </thin</think>z",
    "<think>多语言 推理</think>答案",
];

#[test]
fn test_bracketed_every_two_way_split() {
    for input in BRACKETED_INPUTS {
        let expected = BracketedTagDecoder::default().decode(input);
        for chunks in two_way_splits(input) {
            let mut decoder = BracketedTagDecoder::default();
            let collected = stream_chunks(&mut decoder, &chunks);
            assert_bracketed_equivalent(&collected, &expected, input);
        }
    }
}

#[test]
fn test_bracketed_every_three_way_split() {
    for input in &BRACKETED_INPUTS[..5] {
        let expected = BracketedTagDecoder::default().decode(input);
        for chunks in three_way_splits(input) {
            let mut decoder = BracketedTagDecoder::default();
            let collected = stream_chunks(&mut decoder, &chunks);
            assert_bracketed_equivalent(&collected, &expected, input);
        }
    }
}

#[test]
fn test_bracketed_single_char_chunks() {
    for input in BRACKETED_INPUTS {
        let expected = BracketedTagDecoder::default().decode(input);
        let mut decoder = BracketedTagDecoder::default();
        let collected = stream_chunks(&mut decoder, &char_chunks(input));
        assert_bracketed_equivalent(&collected, &expected, input);
    }
}

#[test]
fn test_bracketed_lone_end_tag_with_seeded_decoder() {
    // The start tag was part of the prompt, so the output only closes the span
    let inputs = [
        "leftover thinking</think>\nanswer text",
        "</think>answer",
        "a</think>b</think>c",
    ];

    for input in inputs {
        let expected = BracketedTagDecoder::default().decode(input);
        for chunks in two_way_splits(input) {
            let mut decoder = BracketedTagDecoder::with_init_buffer("think", "<think>");
            let collected = stream_chunks(&mut decoder, &chunks);
            assert_bracketed_equivalent(&collected, &expected, input);
        }
    }

    let expected = BracketedTagDecoder::default().decode(inputs[0]);
    assert_eq!(expected.thinking.as_deref(), Some("leftover thinking"));
    assert_eq!(expected.content, "answer text");
}

#[test]
fn test_bracketed_model_repeats_seeded_start_tag() {
    let inputs = [
        "<think>reasoning</think>answer",
        "\n<think>\nstep 1\n</think>\n\nanswer",
        "<think></think>answer",
    ];

    for input in inputs {
        let expected = BracketedTagDecoder::default().decode(input);
        for chunks in three_way_splits(input) {
            let mut decoder = BracketedTagDecoder::with_init_buffer("think", "<think>");
            let collected = stream_chunks(&mut decoder, &chunks);
            assert_bracketed_equivalent(&collected, &expected, input);
        }
    }
}

#[test]
fn test_bracketed_unseeded_lone_end_then_pair_diverges() {
    // Streaming cannot know an early end tag has no start tag without
    // withholding all untagged text, so it closes the span there and keeps
    // the later pair as content. The one-shot decode honours the pair.
    let input = "a</think>b<think>c</think>d";

    let streamed = stream_chunks(&mut BracketedTagDecoder::default(), &[input]);
    assert_eq!(
        streamed,
        Collected {
            content: Some("ab<think>c</think>d".to_string()),
            thinking: None,
        }
    );

    let decoded = BracketedTagDecoder::default().decode(input);
    assert_eq!(decoded.content, "a</think>bd");
    assert_eq!(decoded.thinking.as_deref(), Some("c"));

    // Chunking does not change the streamed result
    for chunks in two_way_splits(input) {
        let collected = stream_chunks(&mut BracketedTagDecoder::default(), &chunks);
        assert_eq!(collected, streamed, "split {:?}", chunks);
    }
}

#[test]
fn test_bracketed_custom_tag_every_split() {
    let input = "<reason>because</reason><think>not a tag here</think>";
    let expected = BracketedTagDecoder::new("reason").decode(input);
    assert_eq!(expected.thinking.as_deref(), Some("because"));
    assert_eq!(expected.content, "<think>not a tag here</think>");

    for chunks in two_way_splits(input) {
        let mut decoder = BracketedTagDecoder::new("reason");
        let collected = stream_chunks(&mut decoder, &chunks);
        assert_bracketed_equivalent(&collected, &expected, input);
    }
}

const CONTROL_INPUTS: &[&str] = &[
    "<|start|>assistant<|channel|>analysis<|message|>internal notes<|end|><|start|>assistant<|channel|>final<|message|>visible answer<|end|>",
    "<|channel|>analysis<|message|>Let me think.<|end|><|start|>assistant<|channel|>final<|message|>Hi!<|return|>",
    "<|channel|>analysis<|message|>a<|end|>stray<|start|>assistant<|channel|>final<|message|>b<|end|>",
    "<|channel|>commentary to=functions.search <|constrain|>json<|message|>{\"q\": 1}<|call|>",
    "<|channel|>final<|message|>ends with a partial <|",
    "no markers at all",
    "<|message|>header without channel",
];

#[test]
fn test_control_sequence_every_two_way_split() {
    for policy in [ChannelPolicy::analysis_is_thinking(), ChannelPolicy::final_is_content()] {
        for input in CONTROL_INPUTS {
            let expected = ControlSequenceDecoder::new(policy.clone()).decode(input);
            for chunks in two_way_splits(input) {
                let mut decoder = ControlSequenceDecoder::new(policy.clone());
                let collected = stream_chunks(&mut decoder, &chunks);
                assert_control_equivalent(&collected, &expected, input);
            }
        }
    }
}

#[test]
fn test_control_sequence_every_three_way_split() {
    let input = CONTROL_INPUTS[1];
    let expected = ControlSequenceDecoder::default().decode(input);
    for chunks in three_way_splits(input) {
        let mut decoder = ControlSequenceDecoder::default();
        let collected = stream_chunks(&mut decoder, &chunks);
        assert_control_equivalent(&collected, &expected, input);
    }
}

#[test]
fn test_control_sequence_single_char_chunks() {
    for input in CONTROL_INPUTS {
        let expected = ControlSequenceDecoder::default().decode(input);
        let mut decoder = ControlSequenceDecoder::default();
        let collected = stream_chunks(&mut decoder, &char_chunks(input));
        assert_control_equivalent(&collected, &expected, input);
    }
}

#[test]
fn test_control_sequence_expected_routing() {
    let result = ControlSequenceDecoder::default().decode(CONTROL_INPUTS[0]);
    assert_eq!(result.thinking.as_deref(), Some("internal notes"));
    assert_eq!(result.content, "visible answer");

    let result = ControlSequenceDecoder::default().decode(CONTROL_INPUTS[5]);
    assert_eq!(result.content, "");
    assert_eq!(result.thinking, None);

    let result = ControlSequenceDecoder::default().decode(CONTROL_INPUTS[4]);
    assert_eq!(result.content, "ends with a partial <|");
}
