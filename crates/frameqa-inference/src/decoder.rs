//! Newline-delimited record framing.

/// Splits a chunked byte stream into complete lines.
///
/// Only `\n`-terminated lines are released; the trailing partial fragment
/// (which may end in the middle of a UTF-8 sequence) stays buffered until the
/// next chunk or [`LineDecoder::finish`].
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, blank lines skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Release whatever unterminated fragment remains at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Bytes currently held back.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_record_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(br#"{"message":{"cont"#).is_empty());
        assert!(decoder.pending() > 0);
        let lines = decoder.push(b"ent\":\"hi\"}}\n{\"done\"");
        assert_eq!(lines, vec![r#"{"message":{"content":"hi"}}"#]);
        assert_eq!(decoder.finish().as_deref(), Some(r#"{"done""#));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "{\"content\":\"café\"}\n".as_bytes();
        // split inside the two-byte 'é'
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&text[..split]).is_empty());
        let lines = decoder.push(&text[split..]);
        assert_eq!(lines, vec!["{\"content\":\"café\"}"]);
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"\n\r\n{\"done\":true}\r\n");
        assert_eq!(lines, vec![r#"{"done":true}"#]);
    }
}
