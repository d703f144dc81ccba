use agentcore::{StreamEvent, StreamProtocolError};

const DATA_PREFIX: &str = "data: ";

/// Splits a byte stream into `data: ` lines and decodes each as one event.
///
/// Bytes are buffered until a newline arrives, so a line split across reads
/// (including inside a multi-byte character) is decoded once it is complete.
#[derive(Debug, Default)]
pub struct EventLineDecoder {
    buffer: Vec<u8>,
}

impl EventLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and decode every line they complete
    pub fn feed(&mut self, data: &[u8]) -> Vec<Result<StreamEvent, StreamProtocolError>> {
        self.buffer.extend_from_slice(data);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + pos;
            if let Some(event) = decode_line(&self.buffer[start..end]) {
                events.push(event);
            }
            start = end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        events
    }

    /// Decode whatever is left once the stream has ended
    pub fn finish(&mut self) -> Vec<Result<StreamEvent, StreamProtocolError>> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest).into_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// `None` for lines that are not events at all
fn decode_line(raw: &[u8]) -> Option<Result<StreamEvent, StreamProtocolError>> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            return Some(Err(StreamProtocolError::MalformedEvent {
                line: String::from_utf8_lossy(raw).into_owned(),
                reason: e.to_string(),
            }))
        }
    };

    let payload = line.strip_prefix(DATA_PREFIX)?;
    Some(
        serde_json::from_str(payload).map_err(|e| StreamProtocolError::MalformedEvent {
            line: line.to_string(),
            reason: e.to_string(),
        }),
    )
}
