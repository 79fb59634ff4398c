//! Decoder, framer and classifier for one session

use std::sync::Arc;

use crate::stream::classifier::{ClassifiedEvent, Classifier};
use crate::stream::decoder::ChunkDecoder;
use crate::stream::framer::EventFramer;

/// Turns response chunks into classified log events
#[derive(Debug)]
pub struct LogPipeline {
    decoder: ChunkDecoder,
    framer: EventFramer,
    classifier: Arc<Classifier>,
}

impl LogPipeline {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        Self {
            decoder: ChunkDecoder::new(),
            framer: EventFramer::new(),
            classifier,
        }
    }

    /// Process one network chunk
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ClassifiedEvent> {
        let text = self.decoder.decode(chunk);
        self.framer
            .push(&text)
            .into_iter()
            .map(|line| self.classifier.classify(line))
            .collect()
    }

    /// End of stream; returns any unterminated trailing text, which is not
    /// treated as an event
    pub fn finish(&mut self) -> Option<String> {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            // Can't complete a frame on its own, only extend the leftover
            let _ = self.framer.push(&tail);
        }
        self.framer.finish()
    }
}
