//! In-memory transport doubles for unit tests

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::telemetry::{Event, OutboundMessage};
use crate::transport::{Frame, OutboundSink, TransportError};

#[derive(Debug, Default)]
struct SinkState {
    frames: Vec<Frame>,
    writes: usize,
    fail_on_write: Option<usize>,
    stalled: bool,
    close_stalled: bool,
    write_delay: Option<Duration>,
    closes: usize,
}

/// Test-side view of a [`MockSink`]
#[derive(Debug, Clone, Default)]
pub(crate) struct SinkRecorder {
    state: Arc<Mutex<SinkState>>,
}

impl SinkRecorder {
    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap()
    }

    /// Every frame written so far
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames.clone()
    }

    /// Decoded application messages
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Text(payload) => Some(serde_json::from_slice(&payload).unwrap()),
                _ => None,
            })
            .collect()
    }

    /// Decoded readings only
    pub fn readings(&self) -> Vec<Event> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                OutboundMessage::Reading(event) => Some(event),
                OutboundMessage::Reset => None,
            })
            .collect()
    }

    /// Number of ping frames written
    pub fn pings(&self) -> usize {
        self.frames().iter().filter(|f| **f == Frame::Ping).count()
    }

    /// Number of pong frames written
    pub fn pongs(&self) -> usize {
        self.frames().iter().filter(|f| **f == Frame::Pong).count()
    }

    /// Fail the `n`-th write attempt (1-based) and every later one
    pub fn fail_on_write(&self, n: usize) {
        self.lock().fail_on_write = Some(n);
    }

    /// Make every following write hang forever
    pub fn stall(&self) {
        self.lock().stalled = true;
    }

    /// Make closing hang forever
    pub fn stall_close(&self) {
        self.lock().close_stalled = true;
    }

    /// Make every following write take `delay` before it lands
    pub fn delay_writes(&self, delay: Duration) {
        self.lock().write_delay = Some(delay);
    }

    /// Number of times the sink was closed
    pub fn close_count(&self) -> usize {
        self.lock().closes
    }
}

/// Recording [`OutboundSink`] with injectable failures
#[derive(Debug)]
pub(crate) struct MockSink {
    recorder: SinkRecorder,
}

impl MockSink {
    pub fn new() -> (Self, SinkRecorder) {
        let recorder = SinkRecorder::default();
        (
            Self {
                recorder: recorder.clone(),
            },
            recorder,
        )
    }
}

impl OutboundSink for MockSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let (stalled, delay) = {
            let mut state = self.recorder.lock();
            state.writes += 1;

            if state.closes > 0 {
                return Err(TransportError::Closed);
            }
            if state.fail_on_write.is_some_and(|n| state.writes >= n) {
                return Err(TransportError::Io("injected failure".into()));
            }
            (state.stalled, state.write_delay)
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.recorder.lock().frames.push(frame);
        Ok(())
    }

    async fn close(&mut self) {
        let stalled = {
            let mut state = self.recorder.lock();
            state.closes += 1;
            state.close_stalled
        };

        if stalled {
            std::future::pending::<()>().await;
        }
    }
}
