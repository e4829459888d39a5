//! Destination of a session's stream events.

use async_trait::async_trait;
use frameqa_models::StreamEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// The receiving side of an event stream went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Event stream closed by receiver")]
pub struct SinkClosed;

/// Where the orchestrator pushes events, in emission order.
///
/// `emit` returns once the event has been handed to the transport, so an
/// implementation applies backpressure to the analysis loop.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed>;
}

#[async_trait]
impl EventSink for mpsc::Sender<StreamEvent> {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.send(event).await.map_err(|_| SinkClosed)
    }
}

#[async_trait]
impl EventSink for Vec<StreamEvent> {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (mut tx, rx) = mpsc::channel::<StreamEvent>(1);
        drop(rx);
        assert_eq!(tx.emit(StreamEvent::end(1)).await, Err(SinkClosed));
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (mut tx, mut rx) = mpsc::channel::<StreamEvent>(4);
        tx.emit(StreamEvent::image(1, "1.png")).await.unwrap();
        tx.emit(StreamEvent::text(1, "yes")).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(StreamEvent::image(1, "1.png")));
        assert_eq!(rx.recv().await, Some(StreamEvent::text(1, "yes")));
        assert_eq!(rx.recv().await, None);
    }
}
