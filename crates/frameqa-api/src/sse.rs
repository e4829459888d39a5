//! Server-sent event stream encoding.
//!
//! Each event is written as `data: <json>\r\n\r\n`. The orchestrator feeds
//! an [`SseWriter`]; the paired [`Body`] is returned as the HTTP response.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use frameqa_models::StreamEvent;
use frameqa_pipeline::{EventSink, SinkClosed};
use futures_util::stream;
use tokio::sync::mpsc;
use tracing::warn;

use crate::metrics;

/// Encode one event as an SSE frame.
pub fn encode(event: &StreamEvent) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {}\r\n\r\n", json)))
}

/// Writing half of an event stream response.
#[derive(Debug)]
pub struct SseWriter {
    tx: mpsc::Sender<Bytes>,
}

/// Create a writer and the response body it feeds.
///
/// The channel holds a single frame, so `emit` returns only once the
/// previous frame was taken by the transport.
pub fn channel() -> (SseWriter, Body) {
    let (tx, rx) = mpsc::channel::<Bytes>(1);
    let frames = stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|frame| (Ok::<_, Infallible>(frame), rx))
    });
    (SseWriter { tx }, Body::from_stream(frames))
}

#[async_trait]
impl EventSink for SseWriter {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        let frame = frame_or_closed(encode(&event))?;
        self.tx.send(frame).await.map_err(|_| SinkClosed)?;
        metrics::record_event_sent(event.event_type().as_str());
        Ok(())
    }
}

/// An event that cannot be encoded closes the stream instead of being skipped.
fn frame_or_closed(encoded: Result<Bytes, serde_json::Error>) -> Result<Bytes, SinkClosed> {
    encoded.map_err(|e| {
        warn!(error = %e, "Failed to encode stream event, closing stream");
        SinkClosed
    })
}

/// Wrap an event body in a `text/event-stream` response.
pub fn response(body: Body) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
            (
                header::HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame() {
        let frame = encode(&StreamEvent::text(2, "A cat.")).unwrap();
        assert_eq!(
            &frame[..],
            b"data: {\"type\":\"text\",\"i\":2,\"content\":\"A cat.\"}\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_writer_feeds_body() {
        let (mut writer, body) = channel();
        let task = tokio::spawn(async move {
            writer.emit(StreamEvent::image(1, "/images/cat/1.png")).await.unwrap();
            writer.emit(StreamEvent::end(1)).await.unwrap();
        });

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        task.await.unwrap();

        assert_eq!(
            String::from_utf8(bytes.to_vec()).unwrap(),
            "data: {\"type\":\"image\",\"i\":1,\"path\":\"/images/cat/1.png\"}\r\n\r\n\
             data: {\"type\":\"end\",\"i\":1}\r\n\r\n"
        );
    }

    #[test]
    fn test_encoding_failure_closes_stream() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(frame_or_closed(Err(err)), Err(SinkClosed));

        let frame = encode(&StreamEvent::cancelled());
        assert_eq!(
            frame_or_closed(frame).unwrap(),
            Bytes::from_static(b"data: {\"type\":\"cancelled\"}\r\n\r\n")
        );
    }

    #[tokio::test]
    async fn test_dropped_body_closes_writer() {
        let (mut writer, body) = channel();
        drop(body);
        assert_eq!(writer.emit(StreamEvent::cancelled()).await, Err(SinkClosed));
    }
}
