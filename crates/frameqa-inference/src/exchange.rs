//! Decoding of one streamed inference exchange.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::decoder::LineDecoder;
use crate::error::{InferenceError, InferenceResult};
use crate::types::{parse_record, StreamRecord};

/// Item produced by an exchange.
///
/// A successful exchange yields exactly one `Chunk` with the consolidated
/// answer followed by `Done`. A failed one ends with a single `Err`.
/// `Progress` is yielded after every body read that completed neither, so
/// the consumer regains control between network reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeItem {
    Progress,
    Chunk(String),
    Done,
}

/// Boxed stream of exchange items. Dropping it releases the underlying reader.
pub type ExchangeStream = Pin<Box<dyn Stream<Item = InferenceResult<ExchangeItem>> + Send>>;

struct ExchangeState<S> {
    body: Pin<Box<S>>,
    decoder: LineDecoder,
    text: String,
    queued: VecDeque<InferenceResult<ExchangeItem>>,
    finished: bool,
}

impl<S> ExchangeState<S> {
    fn apply(&mut self, line: &str) {
        if self.finished {
            return;
        }
        match parse_record(line) {
            Ok(StreamRecord::Content(fragment)) => self.text.push_str(&fragment),
            Ok(StreamRecord::Done(fragment)) => {
                self.text.push_str(&fragment);
                let text = std::mem::take(&mut self.text);
                debug!(chars = text.len(), "Inference exchange done");
                self.queued.push_back(Ok(ExchangeItem::Chunk(text)));
                self.queued.push_back(Ok(ExchangeItem::Done));
                self.finished = true;
            }
            Ok(StreamRecord::Error(message)) => {
                self.queued.push_back(Err(InferenceError::Service(message)));
                self.finished = true;
            }
            Err(e) => {
                warn!(error = %e, line = %line, "Skipping malformed inference record");
            }
        }
    }
}

/// Turn a chunked response body into an exchange stream.
///
/// Records are parsed only once complete; a malformed record is skipped.
/// The body is read only when the stream is polled, one read per poll, and
/// is not polled again after a done or error marker.
pub fn decode_exchange<S, B, E>(body: S) -> ExchangeStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<InferenceError> + Send + 'static,
{
    let state = ExchangeState {
        body: Box::pin(body),
        decoder: LineDecoder::new(),
        text: String::new(),
        queued: VecDeque::new(),
        finished: false,
    };

    let items = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.queued.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    for line in st.decoder.push(chunk.as_ref()) {
                        st.apply(&line);
                    }
                    if st.queued.is_empty() && !st.finished {
                        return Some((Ok(ExchangeItem::Progress), st));
                    }
                }
                Some(Err(e)) => {
                    st.queued.push_back(Err(e.into()));
                    st.finished = true;
                }
                None => {
                    if let Some(line) = st.decoder.finish() {
                        st.apply(&line);
                    }
                    if !st.finished {
                        st.queued.push_back(Err(InferenceError::Truncated));
                        st.finished = true;
                    }
                }
            }
        }
    });

    Box::pin(items)
}
