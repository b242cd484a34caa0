//! Minimal SSE framing helpers shared by all three wire protocols: lines
//! beginning `data: ` carrying JSON, events terminated by a blank line.

use bytes::Bytes;
use serde::Serialize;

/// Encodes one `data: <json>\n\n` frame.
pub fn encode_data<T: Serialize>(value: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}

/// Encodes a named SSE event (Anthropic's `event: message_stop` style).
pub fn encode_named<T: Serialize>(event: &str, value: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(Bytes::from(format!("event: {event}\ndata: {json}\n\n")))
}

/// The literal `data: [DONE]\n\n` sentinel OpenAI Chat Completions streams end with.
pub const OPENAI_DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Splits a raw upstream byte buffer into complete SSE frames, returning the
/// parsed frames and any trailing partial frame to prepend to the next read.
/// Used by the streaming pump to feed `response_in` one event at a time
/// regardless of how TCP happened to chunk the bytes.
pub fn split_frames(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    loop {
        if let Some(pos) = find_double_newline(buf) {
            let frame: Vec<u8> = buf.drain(..pos).collect();
            // drop the separator itself (either "\n\n" or "\r\n\r\n")
            let sep_len = if buf.starts_with(b"\r\n") { 4 } else { 2 };
            let to_remove = sep_len.min(buf.len());
            buf.drain(..to_remove);
            frames.push(frame);
        } else {
            break;
        }
    }
    frames
}

fn find_double_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2)
        .position(|w| w == b"\n\n")
        .or_else(|| buf.windows(4).position(|w| w == b"\r\n\r\n"))
}

/// Extracts the payload after a `data: ` prefix from one SSE frame, ignoring
/// any leading `event: ...` line.
pub fn data_payload(frame: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(frame).ok()?;
    text.lines()
        .find_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(|s| s.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_frames_across_reads() {
        let mut buf = b"data: a\n\ndata: b\n\nda".to_vec();
        let frames = split_frames(&mut buf);
        assert_eq!(frames.len(), 2);
        assert_eq!(data_payload(&frames[0]), Some("a"));
        assert_eq!(data_payload(&frames[1]), Some("b"));
        assert_eq!(buf, b"da");
    }
}
