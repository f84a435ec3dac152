//! `text/event-stream` framing.
//!
//! Frames are `data: <json>\n\n`. The decoder is incremental: chunks may split
//! a frame anywhere, including between `\r` and `\n`. Each decoded frame
//! records where it ended inside the chunk that completed it, so a relay can
//! cut a chunk right after a terminal frame without re-encoding anything.

use crate::RelayEvent;

/// Encode an event as a single `data:` frame.
pub fn encode_frame(event: &RelayEvent) -> String {
    // RelayEvent only holds strings, an enum and a bool; serialization cannot fail
    let json = serde_json::to_string(event).unwrap_or_default();
    format!("data: {}\n\n", json)
}

/// One dispatched event-stream frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// Offset just past the frame's blank line, relative to the chunk that completed it
    pub end: usize,
}

impl Frame {
    pub fn relay_event(&self) -> Result<RelayEvent, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// True when the frame carries a RelayEvent with `done == true`
    pub fn is_terminal(&self) -> bool {
        self.relay_event().map(|e| e.is_terminal()).unwrap_or(false)
    }
}

/// Bytes of an unfinished frame the decoder holds before giving up
pub const MAX_PENDING_FRAME: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
#[error("event-stream frame exceeds {limit} bytes")]
pub struct FrameTooLarge {
    pub limit: usize,
}

/// Incremental event-stream decoder
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes of the current, not yet terminated line
    buf: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    limit: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_FRAME)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            data: Vec::new(),
            event: None,
            limit,
        }
    }

    /// Feed a chunk and return every frame it completes.
    ///
    /// Fails once the unfinished frame left over after this chunk is larger
    /// than the limit; the decoder is reset and the stream should be dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, FrameTooLarge> {
        // `buf` never holds a '\n', so every line terminator found below lies in `chunk`
        let base = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;

        while let Some(rel) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let line_end = start + rel;
            let line = &self.buf[start..line_end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.is_empty() {
                if let Some(mut frame) = self.dispatch() {
                    frame.end = line_end + 1 - base;
                    frames.push(frame);
                }
            } else {
                let line = String::from_utf8_lossy(line).into_owned();
                self.process_line(&line);
            }

            start = line_end + 1;
        }

        self.buf.drain(..start);

        let pending = self.buf.len() + self.data.iter().map(String::len).sum::<usize>();
        if pending > self.limit {
            self.buf.clear();
            self.data.clear();
            self.event = None;
            return Err(FrameTooLarge { limit: self.limit });
        }

        Ok(frames)
    }

    /// True when no partial frame is buffered
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty() && self.data.is_empty() && self.event.is_none()
    }

    fn process_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id / retry are not used by the restart stream
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<Frame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(Frame {
            event,
            data,
            end: 0,
        })
    }
}
