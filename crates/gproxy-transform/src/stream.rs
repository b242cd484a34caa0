//! Streaming half of the pipeline: feeds upstream SSE frames through
//! `response_in` one at a time, maintaining a per-request [`StreamCursor`],
//! and re-emits each delta through `response_out` for the client protocol.

use bytes::Bytes;
use gproxy_protocol::{sse, ProtocolTag};

use crate::uif::{StreamCursor, UifDelta};
use crate::{codec, TransformResult};

/// Holds the incremental parser state for one in-flight streaming
/// response. Created once per request; never shared or reused.
pub struct StreamPipeline {
    provider_tag: ProtocolTag,
    client_tag: ProtocolTag,
    cursor: StreamCursor,
    carry: Vec<u8>,
}

impl StreamPipeline {
    pub fn new(provider_tag: ProtocolTag, client_tag: ProtocolTag) -> Self {
        Self {
            provider_tag,
            client_tag,
            cursor: StreamCursor::default(),
            carry: Vec::new(),
        }
    }

    /// Feeds a raw chunk of upstream bytes. Returns zero or more client-ready
    /// frames; any partial trailing frame is retained for the next call.
    pub fn push_upstream_bytes(&mut self, chunk: &[u8]) -> TransformResult<Vec<Bytes>> {
        self.carry.extend_from_slice(chunk);
        let frames = sse::split_frames(&mut self.carry);

        let mut out = Vec::with_capacity(frames.len());
        for frame in frames {
            if let Some(delta) = self.push_frame(&frame)? {
                out.push(delta);
            }
        }
        Ok(out)
    }

    fn push_frame(&mut self, frame: &[u8]) -> TransformResult<Option<Bytes>> {
        let first_byte = !self.cursor.first_chunk_seen;
        let delta = codec::decode_stream_frame(self.provider_tag, frame, &mut self.cursor)?;
        if first_byte {
            self.cursor.first_chunk_seen = true;
        }

        match delta {
            Some(delta) => {
                let frame = codec::encode_stream_frame(self.client_tag, &delta, &self.cursor)?;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    /// True once the first frame carrying provider content has been seen;
    /// callers use this transition to record TTFT.
    pub fn first_chunk_seen(&self) -> bool {
        self.cursor.first_chunk_seen
    }

    pub fn cursor(&self) -> &StreamCursor {
        &self.cursor
    }

    /// The client-protocol terminal sentinel, emitted regardless of what the
    /// provider's own completion signal looked like.
    pub fn terminal_frame(&self) -> TransformResult<Bytes> {
        let delta = UifDelta {
            is_terminal: true,
            ..Default::default()
        };
        codec::encode_stream_frame(self.client_tag, &delta, &self.cursor)
    }
}
