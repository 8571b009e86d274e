// crates/partition-hub-client/src/stream.rs
// ============================================================================
// Module: Event Stream Reassembly
// Description: Pull-based SSE frame decoder and delta text assembler.
// Purpose: Rebuild one logical text from an incrementally delivered response.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`FrameDecoder`] accepts arbitrary byte chunks and yields complete frames;
//! bytes after the last newline are held until the next push. Only `data:`
//! lines produce frames. [`StreamAssembler`] appends delta text in arrival
//! order until a stop marker, after which the text is final.
//!
//! Frame format:
//! - `data: {"event":{"contentBlockDelta":{"delta":{"text":"..."}}}}` is a delta.
//! - `data: {"event":{"messageStop":{...}}}` or `data: [DONE]` ends the message.
//! - Any other JSON frame is ignored; unparseable frames are skipped.
//!
//! Output is independent of how the input bytes were chunked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON pointer to a frame's delta text.
pub const DELTA_TEXT_POINTER: &str = "/event/contentBlockDelta/delta/text";
/// JSON pointer to a frame's stop marker.
pub const MESSAGE_STOP_POINTER: &str = "/event/messageStop";
/// Plain-text stop sentinel.
pub const DONE_SENTINEL: &str = "[DONE]";
/// SSE data field prefix.
const DATA_PREFIX: &str = "data:";

// ============================================================================
// SECTION: Frames
// ============================================================================

/// One decoded stream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Partial text to append.
    Delta(String),
    /// End-of-message marker.
    MessageStop,
    /// Well-formed frame with no text (metadata, start markers).
    Other,
    /// Frame that could not be decoded, with the reason.
    Malformed(String),
}

// ============================================================================
// SECTION: Decoder
// ============================================================================

/// Incremental line decoder for `text/event-stream` bodies.
///
/// # Invariants
/// - `pending` never exceeds `max_line_bytes`.
/// - Each oversized line yields exactly one [`StreamFrame::Malformed`].
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes of the current incomplete line.
    pending: Vec<u8>,
    /// Maximum accepted line length.
    max_line_bytes: usize,
    /// True while skipping the remainder of an oversized line.
    discarding: bool,
}

impl FrameDecoder {
    /// Creates a decoder that rejects lines longer than `max_line_bytes`.
    #[must_use]
    pub const fn new(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_bytes,
            discarding: false,
        }
    }

    /// Feeds a chunk and returns every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        let mut rest = chunk;
        while let Some(position) = rest.iter().position(|byte| *byte == b'\n') {
            let (head, tail) = rest.split_at(position);
            rest = tail.get(1 ..).unwrap_or_default();
            if self.discarding {
                self.discarding = false;
                self.pending.clear();
                continue;
            }
            if self.pending.len() + head.len() > self.max_line_bytes {
                self.pending.clear();
                frames.push(oversized_line());
                continue;
            }
            self.pending.extend_from_slice(head);
            let line = std::mem::take(&mut self.pending);
            if let Some(frame) = decode_line(&line) {
                frames.push(frame);
            }
        }
        if !self.discarding {
            if self.pending.len() + rest.len() > self.max_line_bytes {
                self.pending.clear();
                self.discarding = true;
                frames.push(oversized_line());
            } else {
                self.pending.extend_from_slice(rest);
            }
        }
        frames
    }

    /// Flushes a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        if self.discarding {
            self.discarding = false;
            self.pending.clear();
            return Vec::new();
        }
        let line = std::mem::take(&mut self.pending);
        decode_line(&line).into_iter().collect()
    }
}

/// Frame reported for a line over the size limit.
fn oversized_line() -> StreamFrame {
    StreamFrame::Malformed("stream line exceeds size limit".to_string())
}

/// Decodes one complete line (without its newline).
fn decode_line(line: &[u8]) -> Option<StreamFrame> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return None;
    }
    let Ok(text) = std::str::from_utf8(line) else {
        return Some(StreamFrame::Malformed("stream line is not utf-8".to_string()));
    };
    let payload = text.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(StreamFrame::MessageStop);
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Some(classify_frame(&value)),
        Err(err) => Some(StreamFrame::Malformed(format!("invalid frame json: {err}"))),
    }
}

/// Classifies a parsed `data:` payload.
fn classify_frame(value: &Value) -> StreamFrame {
    match value.pointer(DELTA_TEXT_POINTER) {
        Some(Value::String(text)) => StreamFrame::Delta(text.clone()),
        Some(_) => StreamFrame::Malformed("delta text is not a string".to_string()),
        None if value.pointer(MESSAGE_STOP_POINTER).is_some() => StreamFrame::MessageStop,
        None => StreamFrame::Other,
    }
}

// ============================================================================
// SECTION: Assembler
// ============================================================================

/// Final state of a reassembled stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamOutcome {
    /// Concatenated delta text.
    pub text: String,
    /// True when a stop marker was seen.
    pub complete: bool,
    /// Number of malformed frames skipped.
    pub skipped_frames: usize,
}

/// Accumulates delta frames into one text buffer.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    /// Accumulated state.
    outcome: StreamOutcome,
}

impl StreamAssembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame. Returns the skip reason for malformed frames.
    pub fn apply(&mut self, frame: StreamFrame) -> Option<String> {
        match frame {
            StreamFrame::Delta(text) if !self.outcome.complete => {
                self.outcome.text.push_str(&text);
                None
            }
            StreamFrame::MessageStop => {
                self.outcome.complete = true;
                None
            }
            StreamFrame::Malformed(reason) => {
                self.outcome.skipped_frames += 1;
                Some(reason)
            }
            StreamFrame::Delta(_) | StreamFrame::Other => None,
        }
    }

    /// Returns true once a stop marker has been applied.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.outcome.complete
    }

    /// Returns the text accumulated so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.outcome.text
    }

    /// Consumes the assembler.
    #[must_use]
    pub fn finish(self) -> StreamOutcome {
        self.outcome
    }
}

/// Decodes and assembles a whole stream delivered as `chunks`.
#[must_use]
pub fn reassemble<'a>(
    chunks: impl IntoIterator<Item = &'a [u8]>,
    max_line_bytes: usize,
) -> StreamOutcome {
    let mut decoder = FrameDecoder::new(max_line_bytes);
    let mut assembler = StreamAssembler::new();
    for chunk in chunks {
        for frame in decoder.push(chunk) {
            assembler.apply(frame);
        }
    }
    for frame in decoder.finish() {
        assembler.apply(frame);
    }
    assembler.finish()
}
