//! Decoding of an upstream chat completion event stream.
//!
//! Only `data:` lines matter. `[DONE]` ends the stream; a JSON payload
//! yields each non-empty `choices[].delta.content`; any other payload is
//! passed through verbatim as text.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;

use crate::client::ChunkStream;
use crate::error::LlmError;

/// Payload marking the end of an upstream stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Meaning of one `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Text fragments to forward, in order. May be empty.
    Chunks(Vec<String>),
    /// The upstream stream is complete.
    Done,
}

/// Decode one line of the event stream. Non-`data:` and blank lines give `None`.
pub fn decode_line(line: &str) -> Option<Decoded> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_MARKER {
        return Some(Decoded::Done);
    }

    let Ok(value) = serde_json::from_str::<Value>(payload) else {
        return Some(Decoded::Chunks(vec![payload.to_string()]));
    };

    let chunks = value
        .get("choices")
        .and_then(Value::as_array)
        .map(|choices| {
            choices
                .iter()
                .filter_map(|c| c.pointer("/delta/content").and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(Decoded::Chunks(chunks))
}

// ---------------------------------------------------------------------------
// Line buffering
// ---------------------------------------------------------------------------

/// Splits a byte stream into `\n`-terminated lines.
///
/// Bytes are buffered until a newline arrives, so multi-byte characters
/// split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append bytes and return every line completed by them, without the
    /// line terminator (`\n` or `\r\n`).
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// The trailing unterminated line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

// ---------------------------------------------------------------------------
// Stream adapter
// ---------------------------------------------------------------------------

struct DecodeState<B, E> {
    bytes: BoxStream<'static, Result<B, E>>,
    lines: LineBuffer,
    ready: VecDeque<String>,
    finished: bool,
}

impl<B, E> DecodeState<B, E> {
    /// Queue the chunks of one line. Returns `true` once `[DONE]` is seen.
    fn apply(&mut self, line: &str) -> bool {
        match decode_line(line) {
            Some(Decoded::Done) => {
                self.finished = true;
                true
            }
            Some(Decoded::Chunks(chunks)) => {
                self.ready.extend(chunks);
                false
            }
            None => false,
        }
    }
}

/// Turn an upstream body into a stream of text chunks.
///
/// Ends after `[DONE]` or when the body ends. A transport error is yielded
/// once and ends the stream.
pub fn decode_stream<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    let state = DecodeState {
        bytes: bytes.boxed(),
        lines: LineBuffer::default(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.ready.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    for line in state.lines.push(bytes.as_ref()) {
                        if state.apply(&line) {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    if let Some(line) = state.lines.finish() {
                        state.apply(&line);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn body(parts: &[&'static str]) -> Vec<Result<&'static [u8], LlmError>> {
        parts.iter().copied().map(|p| Ok(p.as_bytes())).collect()
    }

    async fn collect(parts: Vec<Result<&'static [u8], LlmError>>) -> Vec<Result<String, LlmError>> {
        decode_stream(stream::iter(parts)).collect().await
    }

    #[test]
    fn delta_content_is_extracted() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}},{"delta":{"content":""}}]}"#;
        assert_eq!(decode_line(line), Some(Decoded::Chunks(vec!["Hel".to_string()])));
    }

    #[test]
    fn role_only_delta_yields_nothing() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(decode_line(line), Some(Decoded::Chunks(Vec::new())));
    }

    #[test]
    fn non_data_lines_ignored() {
        assert_eq!(decode_line(": keep-alive"), None);
        assert_eq!(decode_line("event: message"), None);
        assert_eq!(decode_line("data:   "), None);
    }

    #[test]
    fn done_and_plain_text() {
        assert_eq!(decode_line("data: [DONE]"), Some(Decoded::Done));
        assert_eq!(
            decode_line("data: not json"),
            Some(Decoded::Chunks(vec!["not json".to_string()]))
        );
    }

    #[test]
    fn line_buffer_joins_split_utf8() {
        let text = "data: 你好\n".as_bytes();
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(&text[..8]).is_empty());
        assert_eq!(buffer.push(&text[8..]), vec!["data: 你好".to_string()]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn line_buffer_strips_crlf() {
        let mut buffer = LineBuffer::default();
        assert_eq!(buffer.push(b"a\r\nb"), vec!["a".to_string()]);
        assert_eq!(buffer.finish(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn stream_stops_at_done() {
        let chunks = collect(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\ndata: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ]))
        .await;
        let texts: Vec<_> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(texts, vec!["Hello", " world"]);
    }

    #[tokio::test]
    async fn unterminated_last_line_is_decoded() {
        let chunks = collect(body(&["data: tail"])).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), "tail");
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let parts = vec![
            Ok("data: first\n".as_bytes()),
            Err(LlmError::Malformed("reset".to_string())),
            Ok("data: never\n".as_bytes()),
        ];
        let chunks = collect(parts).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap(), "first");
        assert_matches!(chunks[1], Err(LlmError::Malformed(_)));
    }
}
