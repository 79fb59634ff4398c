//! Event framing for the build log stream
//!
//! Frames are separated by a blank line. A frame carries a log line when it
//! starts with `data: `; anything else is dropped.

/// Separator between two frames
pub const FRAME_DELIMITER: &str = "\n\n";

/// Prefix of a frame carrying a log line
pub const DATA_PREFIX: &str = "data: ";

/// Splits decoded text into log lines, independent of chunk boundaries
#[derive(Debug, Default)]
pub struct EventFramer {
    buffer: String,
}

impl EventFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded fragment and return the log lines it completes
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        // A delimiter may straddle the old tail and the new fragment
        let mut search_from = self.buffer.len().saturating_sub(FRAME_DELIMITER.len() - 1);
        while !self.buffer.is_char_boundary(search_from) {
            search_from -= 1;
        }
        self.buffer.push_str(fragment);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut cursor = search_from;
        while let Some(pos) = self.buffer[cursor..].find(FRAME_DELIMITER) {
            let end = cursor + pos;
            if let Some(line) = self.buffer[start..end].strip_prefix(DATA_PREFIX) {
                lines.push(line.to_string());
            }
            start = end + FRAME_DELIMITER.len();
            cursor = start;
        }

        self.buffer.drain(..start);
        lines
    }

    /// Text of the incomplete trailing frame
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// End of stream: the incomplete trailing frame is handed back, not emitted
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
