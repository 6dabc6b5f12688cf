//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! The OpenAI-compatible endpoint streams chat completions as SSE frames:
//! `data:` lines carrying chunk JSON, terminated by a literal
//! `data: [DONE]` frame. This module converts the raw byte stream into a
//! stream of parsed [`ChatCompletionChunk`]s.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::types::ChatCompletionChunk;

/// One decoded SSE frame.
enum SseFrame {
    /// A data frame carrying a chunk, or a parse failure for that frame.
    Chunk(Result<ChatCompletionChunk>),
    /// A frame with no data line (comments, keep-alives); skipped.
    Empty,
    /// The `[DONE]` terminator.
    Done,
}

/// Process a stream of bytes into a stream of chat completion chunks.
///
/// Handles frame buffering across chunk boundaries, the `[DONE]`
/// terminator, and error conditions. The output stream ends when the
/// terminator arrives or the underlying byte stream is exhausted.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    // Use a state machine to process the SSE stream. `pending` holds
    // bytes whose trailing UTF-8 sequence is still incomplete; a
    // multibyte character may arrive split across network chunks.
    let buffer = String::new();
    let pending: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, pending),
        move |(mut stream, mut buffer, mut pending)| async move {
            loop {
                // First check if we have a complete frame in the buffer
                if let Some((frame, remaining)) = extract_frame(&buffer) {
                    buffer = remaining;
                    match frame {
                        SseFrame::Chunk(chunk) => {
                            return Some((chunk, (stream, buffer, pending)));
                        }
                        SseFrame::Empty => continue,
                        SseFrame::Done => return None,
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        pending.extend_from_slice(&bytes);
                        match drain_complete_utf8(&mut pending) {
                            Ok(text) => buffer.push_str(&text),
                            Err(e) => {
                                return Some((Err(e), (stream, buffer, pending)));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, pending)));
                    }
                    None => {
                        // End of stream; a trailing frame may lack the blank line.
                        if !buffer.trim().is_empty() {
                            let trailing = std::mem::take(&mut buffer);
                            if let SseFrame::Chunk(chunk) = parse_frame(&trailing) {
                                return Some((chunk, (stream, buffer, pending)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Drains the longest complete UTF-8 prefix of `pending` as a string.
///
/// An incomplete trailing sequence is left in place for the next chunk
/// to finish; genuinely invalid bytes are an encoding error.
fn drain_complete_utf8(pending: &mut Vec<u8>) -> Result<String> {
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            Ok(text)
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            Ok(text)
        }
        Err(e) => {
            pending.clear();
            Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ))
        }
    }
}

/// Extract a complete SSE frame from a buffer string.
///
/// Frames are delimited by double newlines.
fn extract_frame(buffer: &str) -> Option<(SseFrame, String)> {
    let (frame_text, rest) = buffer.split_once("\n\n")?;
    Some((parse_frame(frame_text), rest.to_string()))
}

/// Parse one SSE frame into a chunk, the terminator, or a skippable frame.
fn parse_frame(frame_text: &str) -> SseFrame {
    let mut data = None;
    for line in frame_text.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim());
        }
    }

    match data {
        Some("[DONE]") => SseFrame::Done,
        Some(json_str) => match serde_json::from_str::<ChatCompletionChunk>(json_str) {
            Ok(chunk) => SseFrame::Chunk(Ok(chunk)),
            Err(e) => SseFrame::Chunk(Err(Error::serialization(
                format!("Failed to parse chunk JSON: {e}"),
                Some(Box::new(e)),
            ))),
        },
        None => SseFrame::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_stream(chunks: Vec<&'static [u8]>) -> impl Stream<Item = reqwest::Result<Bytes>> + Unpin
    {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))),
        ))
    }

    #[tokio::test]
    async fn parse_content_chunks() {
        let data: &[u8] = b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                            data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n\
                            data: [DONE]\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![data])));

        let first = sse.next().await.unwrap().unwrap();
        assert_eq!(first.fragment(), Some("Hel"));
        let second = sse.next().await.unwrap().unwrap();
        assert_eq!(second.fragment(), Some("lo"));
        assert!(sse.next().await.is_none(), "[DONE] must end the stream");
    }

    #[tokio::test]
    async fn frame_split_across_chunks() {
        let chunk1: &[u8] = b"data: {\"choices\":[{\"index\":0,\"del";
        let chunk2: &[u8] = b"ta\":{\"content\":\"hi\"}}]}\n\ndata: [DONE]\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![chunk1, chunk2])));

        let first = sse.next().await.unwrap().unwrap();
        assert_eq!(first.fragment(), Some("hi"));
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn multibyte_character_split_across_chunks() {
        // "pi \u{2248} 3" with the three-byte \u{2248} split between
        // network chunks; the decoder must hold the partial sequence
        // back rather than report an encoding error.
        let chunk1: &[u8] =
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"pi \xe2\x89";
        let chunk2: &[u8] = b"\x88 3\"}}]}\n\ndata: [DONE]\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![chunk1, chunk2])));

        let first = sse.next().await.unwrap().unwrap();
        assert_eq!(first.fragment(), Some("pi \u{2248} 3"));
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn invalid_bytes_surface_an_encoding_error() {
        let data: &[u8] = b"data: \xff\xff\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![data])));
        let event = sse.next().await.unwrap();
        assert!(matches!(event, Err(Error::Encoding { .. })));
    }

    #[tokio::test]
    async fn malformed_json_surfaces_an_error() {
        let data: &[u8] = b"data: {not json}\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![data])));
        let event = sse.next().await.unwrap();
        assert!(event.is_err());
    }

    #[tokio::test]
    async fn comment_frames_are_skipped() {
        let data: &[u8] = b": keep-alive\n\n\
                            data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ok\"}}]}\n\n\
                            data: [DONE]\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![data])));
        let first = sse.next().await.unwrap().unwrap();
        assert_eq!(first.fragment(), Some("ok"));
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_end_without_done_terminates() {
        let data: &[u8] = b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"partial\"}}]}\n\n";
        let mut sse = Box::pin(process_sse(byte_stream(vec![data])));
        let first = sse.next().await.unwrap().unwrap();
        assert_eq!(first.fragment(), Some("partial"));
        assert!(sse.next().await.is_none());
    }
}
