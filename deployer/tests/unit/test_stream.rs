//! Chunk-boundary independence of the log pipeline

use std::sync::Arc;

use minici::stream::classifier::{ClassifiedEvent, Classifier, ClassifierSettings};
use minici::stream::decoder::ChunkDecoder;
use minici::stream::pipeline::LogPipeline;
use proptest::prelude::*;

fn classifier() -> Arc<Classifier> {
    Arc::new(Classifier::new(&ClassifierSettings::default()).unwrap())
}

/// Cut `bytes` at the given offsets (taken modulo the length)
fn split(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return vec![Vec::new()];
    }
    let mut offsets: Vec<usize> = cuts.iter().map(|c| c % bytes.len()).collect();
    offsets.push(0);
    offsets.push(bytes.len());
    offsets.sort_unstable();
    offsets.dedup();
    offsets
        .windows(2)
        .map(|w| bytes[w[0]..w[1]].to_vec())
        .collect()
}

fn run(chunks: &[Vec<u8>]) -> (Vec<ClassifiedEvent>, Option<String>) {
    let mut pipeline = LogPipeline::new(classifier());
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(pipeline.push(chunk));
    }
    let leftover = pipeline.finish();
    (events, leftover)
}

fn line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :/.()é✅-]{0,24}"
}

fn frame() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => line().prop_map(|l| format!("data: {}\n\n", l)),
        1 => line().prop_map(|l| format!("event: {}\n\n", l)),
        1 => (1u16..9999).prop_map(|p| format!("data: listening on http://localhost:{}/\n\n", p)),
        1 => line().prop_map(|l| format!("data: Error: {}\n\n", l)),
    ]
}

proptest! {
    #[test]
    fn test_events_do_not_depend_on_chunking(
        frames in prop::collection::vec(frame(), 0..12),
        tail in line(),
        cuts in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let body = format!("{}{}", frames.concat(), tail);
        let whole = run(&[body.as_bytes().to_vec()]);
        let chunked = run(&split(body.as_bytes(), &cuts));

        prop_assert_eq!(&chunked, &whole);

        let expected: Vec<String> = frames
            .iter()
            .filter_map(|f| f.strip_prefix("data: "))
            .map(|f| f.trim_end_matches('\n').to_string())
            .collect();
        let lines: Vec<String> = whole.0.into_iter().map(|e| e.line).collect();
        prop_assert_eq!(lines, expected);
    }

    #[test]
    fn test_decoder_matches_lossy_decoding(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        cuts in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let mut decoder = ChunkDecoder::new();
        let mut text = String::new();
        for chunk in split(&bytes, &cuts) {
            text.push_str(&decoder.decode(&chunk));
        }
        text.push_str(&decoder.finish());

        prop_assert_eq!(text, String::from_utf8_lossy(&bytes).into_owned());
    }
}

#[test]
fn test_emoji_split_at_every_byte() {
    let body = "data: 🚀 Deploying\n\ndata: ✅ Live at http://localhost:3000\n\n";
    let bytes = body.as_bytes();

    for cut in 1..bytes.len() {
        let (events, leftover) = run(&[bytes[..cut].to_vec(), bytes[cut..].to_vec()]);
        assert_eq!(events.len(), 2, "cut at {}", cut);
        assert_eq!(events[0].line, "🚀 Deploying");
        assert_eq!(events[1].live_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(leftover, None);
    }
}
