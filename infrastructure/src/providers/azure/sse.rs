//! Server-Sent Events line decoding for the streamed completions response.
//!
//! The response body arrives as arbitrary byte chunks; lines are split on
//! `\n` so multi-byte characters never straddle a line boundary even when
//! they straddle a chunk boundary. Payload lines look like
//! `data: {...}`, and the stream ends with the `data: [DONE]` sentinel.

/// End-of-stream sentinel payload.
pub const DONE_MARKER: &str = "[DONE]";

/// Incremental line splitter over streamed response bytes.
#[derive(Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line, trimmed, if one is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    /// Whatever remains after the byte stream ended, if non-empty.
    pub fn remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        if line.is_empty() { None } else { Some(line) }
    }
}

/// Extract the payload of a `data: ` line.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_across_chunk_boundaries() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: {\"a\":");
        assert_eq!(buffer.next_line(), None);
        buffer.push(b" 1}\ndata: [DONE]\n");
        assert_eq!(buffer.next_line().unwrap(), "data: {\"a\": 1}");
        assert_eq!(buffer.next_line().unwrap(), "data: [DONE]");
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn multibyte_text_survives_chunk_splits() {
        // "안" is three bytes; split it across two pushes.
        let bytes = "data: 안녕\n".as_bytes();
        let mut buffer = LineBuffer::new();
        buffer.push(&bytes[..8]);
        assert_eq!(buffer.next_line(), None);
        buffer.push(&bytes[8..]);
        assert_eq!(buffer.next_line().unwrap(), "data: 안녕");
    }

    #[test]
    fn data_payload_strips_the_prefix() {
        assert_eq!(data_payload("data: {\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(data_payload("data: [DONE]"), Some(DONE_MARKER));
        assert_eq!(data_payload("event: ping"), None);
        assert_eq!(data_payload(""), None);
    }

    #[test]
    fn remainder_returns_a_trailing_unterminated_line() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: tail");
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.remainder().unwrap(), "data: tail");
        assert_eq!(buffer.remainder(), None);
    }
}
