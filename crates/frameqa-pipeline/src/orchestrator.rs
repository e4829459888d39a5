//! Analysis session state machine.
//!
//! A session walks a video one whole second at a time: extract the frame,
//! announce it, ask the inference service about it, forward the answer.
//! States run `Init -> Looping -> {Completing | Cancelling | Failing} -> Closed`,
//! and every session emits exactly one terminal event.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use frameqa_inference::{ExchangeItem, InferenceError, InferenceResult, InferenceService};
use frameqa_media::FrameSource;
use frameqa_models::{AnalyzeRequest, SessionKey, StreamEvent, VideoRef};
use futures_util::StreamExt;
use tracing::{debug, Instrument};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::logging::SessionLogger;
use crate::metrics;
use crate::sink::EventSink;
use crate::tracker::SessionTracker;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every second up to `last_second` was processed
    Completed { last_second: u32, frames: u32 },
    /// Stopped by request after `frames` fully processed frames
    Cancelled { frames: u32 },
    /// A fatal error was reported to the client
    Failed { message: String },
    /// The client went away; no terminal event could be delivered
    Disconnected { frames: u32 },
}

impl SessionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::Completed { .. } => "completed",
            SessionOutcome::Cancelled { .. } => "cancelled",
            SessionOutcome::Failed { .. } => "failed",
            SessionOutcome::Disconnected { .. } => "disconnected",
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Init,
    Looping { second: u32 },
    Completing,
    Cancelling,
    Failing(PipelineError),
    Closed(SessionOutcome),
}

/// Result of one inference exchange.
enum Exchange {
    Answered(String),
    /// Liveness dropped mid-exchange; the stream was released unread.
    Abandoned,
}

/// Per-session working data.
struct Session {
    video: VideoRef,
    key: SessionKey,
    prompt: String,
    last_second: u32,
    output_dir: PathBuf,
    frames: u32,
    logger: SessionLogger,
}

/// Drives analysis sessions.
///
/// Cheap to clone; every clone shares the same tracker and backends.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    tracker: Arc<SessionTracker>,
    frames: Arc<dyn FrameSource>,
    inference: Arc<dyn InferenceService>,
    config: PipelineConfig,
}

impl AnalysisOrchestrator {
    pub fn new(
        tracker: Arc<SessionTracker>,
        frames: Arc<dyn FrameSource>,
        inference: Arc<dyn InferenceService>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            tracker,
            frames,
            inference,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one session to completion, writing its events into `sink`.
    ///
    /// The request is expected to have passed `AnalyzeRequest::validate`.
    pub async fn run<S: EventSink>(&self, request: &AnalyzeRequest, sink: &mut S) -> SessionOutcome {
        let video = VideoRef::resolve(&self.config.videos_dir, request.video_id.clone());
        let key = video.session_key();
        let logger = SessionLogger::new(&key, &video.video_id);
        let span = logger.create_span();

        let session = Session {
            prompt: self.inference.prompt_for(&request.question),
            output_dir: PathBuf::new(),
            last_second: 0,
            frames: 0,
            video,
            key,
            logger,
        };

        self.drive(session, sink).instrument(span).await
    }

    async fn drive<S: EventSink>(&self, mut session: Session, sink: &mut S) -> SessionOutcome {
        metrics::record_session_started();
        session
            .logger
            .log_start(&format!("question of {} chars", session.prompt.len()));

        // Removes the tracker entry on every exit path, panics included.
        let mut cleanup = None;
        let mut state = SessionState::Init;

        let outcome = loop {
            state = match state {
                SessionState::Init => match self.init(&mut session).await {
                    Ok(()) => {
                        self.tracker.register(&session.key);
                        let tracker = Arc::clone(&self.tracker);
                        let key = session.key.clone();
                        cleanup = Some(scopeguard::guard((), move |_| {
                            tracker.remove(&key);
                        }));
                        SessionState::Looping { second: 1 }
                    }
                    Err(e) => SessionState::Failing(e),
                },

                SessionState::Looping { second } => self.step(&mut session, second, sink).await,

                SessionState::Completing => {
                    session.logger.log_completion(&format!(
                        "processed {} frames up to {}s",
                        session.frames, session.last_second
                    ));
                    match sink.emit(StreamEvent::end(session.last_second)).await {
                        Ok(()) => SessionState::Closed(SessionOutcome::Completed {
                            last_second: session.last_second,
                            frames: session.frames,
                        }),
                        Err(_) => SessionState::Closed(SessionOutcome::Disconnected {
                            frames: session.frames,
                        }),
                    }
                }

                SessionState::Cancelling => {
                    session
                        .logger
                        .log_completion(&format!("stopped after {} frames", session.frames));
                    match sink.emit(StreamEvent::cancelled()).await {
                        Ok(()) => SessionState::Closed(SessionOutcome::Cancelled {
                            frames: session.frames,
                        }),
                        Err(_) => SessionState::Closed(SessionOutcome::Disconnected {
                            frames: session.frames,
                        }),
                    }
                }

                SessionState::Failing(error) => {
                    let message = error.client_message();
                    session.logger.log_error(&format!("[{}] {}", error.kind(), message));
                    // Delivery is best effort; the session is over either way.
                    if sink.emit(StreamEvent::error(message.clone())).await.is_err() {
                        debug!("Client gone before error event was delivered");
                    }
                    SessionState::Closed(SessionOutcome::Failed { message })
                }

                SessionState::Closed(outcome) => break outcome,
            };
        };

        drop(cleanup);
        metrics::record_session_finished(outcome.label());
        outcome
    }

    /// Validate the video and prepare the frame directory.
    async fn init(&self, session: &mut Session) -> Result<(), PipelineError> {
        let path = session.video.path.clone();
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            _ => {
                return Err(PipelineError::input(format!(
                    "Video not found: {}",
                    session.video.video_id
                )))
            }
        }

        let duration = self
            .frames
            .duration(&path)
            .await
            .map_err(PipelineError::Probe)?;
        if !duration.is_finite() || duration < 1.0 {
            return Err(PipelineError::input(format!(
                "Video {} is shorter than one second ({:.2}s)",
                session.video.video_id, duration
            )));
        }
        // `i <= duration` over whole seconds stops at the floor.
        session.last_second = duration.floor() as u32;

        session.output_dir = self
            .frames
            .prepare_output_dir(&self.config.images_dir, session.video.stem())
            .await
            .map_err(|source| PipelineError::Media {
                second: 1,
                last_processed: 0,
                source,
            })?;

        debug!(
            duration,
            last_second = session.last_second,
            output_dir = %session.output_dir.display(),
            "Session initialized"
        );
        Ok(())
    }

    /// Process the frame at `second` and pick the next state.
    async fn step<S: EventSink>(&self, session: &mut Session, second: u32, sink: &mut S) -> SessionState {
        if second > session.last_second {
            return SessionState::Completing;
        }
        if !self.tracker.is_live(&session.key) {
            return SessionState::Cancelling;
        }

        let started = Instant::now();
        let frame = match self
            .frames
            .extract_frame(&session.video.path, second, &session.output_dir)
            .await
        {
            Ok(frame) => frame,
            Err(source) => {
                return SessionState::Failing(PipelineError::Media {
                    second,
                    last_processed: second - 1,
                    source,
                })
            }
        };
        metrics::record_extraction_duration(started.elapsed().as_secs_f64());

        let image = StreamEvent::image(second, self.config.frame_url(&frame.path));
        if sink.emit(image).await.is_err() {
            return self.disconnected(session);
        }

        let started = Instant::now();
        let answer = match self.exchange(&session.key, &frame.path, &session.prompt).await {
            Ok(Exchange::Answered(answer)) => answer,
            Ok(Exchange::Abandoned) => {
                metrics::record_inference_duration("abandoned", started.elapsed().as_secs_f64());
                session
                    .logger
                    .log_progress(second, "stop requested, abandoning inference");
                return SessionState::Cancelling;
            }
            Err(source) => {
                metrics::record_inference_duration("error", started.elapsed().as_secs_f64());
                return SessionState::Failing(PipelineError::Inference {
                    second,
                    last_processed: second - 1,
                    source,
                });
            }
        };
        metrics::record_inference_duration("completed", started.elapsed().as_secs_f64());

        if answer.trim().is_empty() {
            session.logger.log_progress(second, "empty answer, no text event");
        } else if sink.emit(StreamEvent::text(second, answer)).await.is_err() {
            return self.disconnected(session);
        }

        session.frames += 1;
        metrics::record_frame_analyzed();
        session
            .logger
            .log_progress(second, &format!("frame {}/{} done", second, session.last_second));

        SessionState::Looping { second: second + 1 }
    }

    /// Consume one inference exchange, checking liveness before every read.
    ///
    /// The exchange yields after each body read, so a stop is seen before the
    /// next read. Returning early drops the stream, which releases the connection.
    async fn exchange(
        &self,
        key: &SessionKey,
        image: &Path,
        prompt: &str,
    ) -> InferenceResult<Exchange> {
        let mut stream = self.inference.stream(image, prompt).await?;
        let mut answer = String::new();

        loop {
            if !self.tracker.is_live(key) {
                return Ok(Exchange::Abandoned);
            }
            match stream.next().await {
                Some(Ok(ExchangeItem::Progress)) => {}
                Some(Ok(ExchangeItem::Chunk(text))) => answer.push_str(&text),
                Some(Ok(ExchangeItem::Done)) => return Ok(Exchange::Answered(answer)),
                Some(Err(e)) => return Err(e),
                None => return Err(InferenceError::Truncated),
            }
        }
    }

    fn disconnected(&self, session: &Session) -> SessionState {
        session.logger.log_warning("client disconnected, stopping");
        SessionState::Closed(SessionOutcome::Disconnected {
            frames: session.frames,
        })
    }
}
