//! Deferred painting of inert formula containers
//!
//! Hosts without iframe support get an empty container per formula, filled in by a host
//! renderer after the document is loaded. The renderer reports completion through a
//! [`PaintHandle`]; hosts that cannot wait on it tick a [`ReadinessPoll`] every
//! [`READINESS_INTERVAL`] instead, giving up after a bounded number of attempts.

use log::debug;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

pub const READINESS_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// What the renderer should paint, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintRequest {
    /// Value of the container's `data-paint-id` attribute.
    pub container_id: String,
    pub markup: String,
}

/// Size reported by the renderer once the formula is painted, as CSS lengths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaintedSize {
    pub width: String,
    pub height: String,
    pub vertical_align: String,
}

/// Paints formulas into containers. Implemented by the integration.
pub trait HostRenderer: Send + Sync {
    fn begin_paint(&self, request: &PaintRequest) -> PaintHandle;
}

/// Renderer side of the completion signal.
#[derive(Debug, Clone)]
pub struct PaintNotifier {
    sender: Sender<PaintedSize>,
}

impl PaintNotifier {
    pub fn ready(&self, size: PaintedSize) {
        // The pipeline side may already have given up waiting.
        let _ = self.sender.send(size);
    }
}

/// Pipeline side of the completion signal.
#[derive(Debug)]
pub struct PaintHandle {
    receiver: Receiver<PaintedSize>,
}

pub fn paint_channel() -> (PaintNotifier, PaintHandle) {
    let (sender, receiver) = mpsc::channel();
    (PaintNotifier { sender }, PaintHandle { receiver })
}

impl PaintHandle {
    /// Completed size, without blocking. `None` while painting or when the renderer is gone.
    pub fn try_ready(&self) -> Option<PaintedSize> {
        match self.receiver.try_recv() {
            Ok(size) => Some(size),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks until the renderer completes or `timeout` expires.
    pub fn wait(&self, timeout: Duration) -> Option<PaintedSize> {
        match self.receiver.recv_timeout(timeout) {
            Ok(size) => Some(size),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Bounded readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPoll {
    attempts: u32,
    max_attempts: u32,
}

impl Default for ReadinessPoll {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Ready(PaintedSize),
    Pending { retry_after: Duration },
    Abandoned,
}

impl ReadinessPoll {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn tick(&mut self, handle: &PaintHandle) -> PollState {
        if let Some(size) = handle.try_ready() {
            return PollState::Ready(size);
        }
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            PollState::Abandoned
        } else {
            PollState::Pending {
                retry_after: READINESS_INTERVAL,
            }
        }
    }
}

/// A paint started during a conversion, returned to the caller to follow up on.
#[derive(Debug)]
pub struct ScheduledPaint {
    pub request: PaintRequest,
    pub handle: PaintHandle,
    pub poll: ReadinessPoll,
}

impl ScheduledPaint {
    pub fn start(renderer: &dyn HostRenderer, request: PaintRequest) -> Self {
        debug!("scheduling paint for container {}", request.container_id);
        let handle = renderer.begin_paint(&request);
        Self {
            request,
            handle,
            poll: ReadinessPoll::default(),
        }
    }

    pub fn tick(&mut self) -> PollState {
        self.poll.tick(&self.handle)
    }
}
