//! Server-sent-event demultiplexer.
//!
//! Turns a provider's raw response bytes into an ordered stream of
//! [`StreamDelta`]s. Bytes are buffered until a full line is available, so
//! frames and multi-byte characters split across network chunks are
//! reassembled before decoding.

use std::collections::VecDeque;
use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::trace;
use wopr_core::error::ProviderError;
use wopr_core::provider::{DeltaStream, ProviderKind, StreamDelta};

use crate::{anthropic, gemini, openai};

const DATA_MARKER: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental line decoder for one dialect.
#[derive(Debug)]
pub struct SseDecoder {
    kind: ProviderKind,
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            buffer: Vec::new(),
        }
    }

    /// Feed one chunk; returns the deltas of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamDelta> {
        self.buffer.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(delta) = self.decode_line(&self.buffer[start..end]) {
                deltas.push(delta);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);
        deltas
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<StreamDelta> {
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest)
    }

    fn decode_line(&self, line: &[u8]) -> Option<StreamDelta> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let line = String::from_utf8_lossy(line);
        let data = line.trim_start().strip_prefix(DATA_MARKER)?;
        let data = data.strip_prefix(' ').unwrap_or(data);

        if data.trim() == DONE_SENTINEL {
            return None;
        }

        let parsed = match self.kind {
            ProviderKind::OpenAi => openai::frame_text(data),
            ProviderKind::Anthropic => anthropic::frame_text(data),
            ProviderKind::Gemini => gemini::frame_text(data),
        };

        match parsed {
            Ok(Some(text)) if !text.is_empty() => Some(StreamDelta::new(text)),
            Ok(_) => None,
            Err(e) => {
                trace!(provider = %self.kind, data = %data, error = %e, "Ignoring unparseable SSE frame");
                None
            }
        }
    }
}

struct DemuxState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<StreamDelta>,
    cancel: CancellationToken,
    done: bool,
}

enum Step<T> {
    Cancelled,
    Chunk(Option<T>),
}

/// Wrap a byte stream into a lazy [`DeltaStream`].
///
/// The cancellation token is checked between chunk reads. Cancellation and
/// transport failures are each reported once, after which the stream ends.
pub fn delta_stream<S, B, E>(bytes: S, kind: ProviderKind, cancel: CancellationToken) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DemuxState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(kind),
        pending: VecDeque::new(),
        cancel,
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(delta) = st.pending.pop_front() {
                return Some((Ok(delta), st));
            }
            if st.done {
                return None;
            }

            let cancel = st.cancel.clone();
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Cancelled,
                next = st.bytes.next() => Step::Chunk(next),
            };

            match step {
                Step::Cancelled => {
                    st.done = true;
                    return Some((Err(ProviderError::Cancelled), st));
                }
                Step::Chunk(Some(Ok(chunk))) => {
                    let deltas = st.decoder.push(chunk.as_ref());
                    st.pending.extend(deltas);
                }
                Step::Chunk(Some(Err(e))) => {
                    st.done = true;
                    return Some((Err(ProviderError::Transport(e.to_string())), st));
                }
                Step::Chunk(None) => {
                    st.done = true;
                    st.pending.extend(st.decoder.finish());
                }
            }
        }
    }))
}
