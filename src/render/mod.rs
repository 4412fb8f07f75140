//! Frame-coalescing render scheduler.
//!
//! ```text
//!          schedule (request frame)          frame: request + paint
//!   Idle ─────────────────────────→ Pending ───────────────────────→ PendingWithExtra
//!    ↑                                 ↑                                   │
//!    │                                 └──────────── schedule ─────────────┤
//!    └──────────────────────── frame (no paint) ───────────────────────────┘
//! ```
//!
//! However many models are scheduled between two frames, only the most
//! recent one is painted, and at most one paint happens per frame.

mod mount;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use thiserror::Error;

pub use mount::Mount;

/// Paint callback handed to a [`FrameRequester`].
pub type FrameCallback = Box<dyn FnOnce()>;

/// Host primitive that runs a callback before the next paint.
pub trait FrameRequester {
    fn request_frame(&self, callback: FrameCallback);
}

/// Frame source driven explicitly by the host: callbacks wait until
/// [`ManualFrames::fire`].
#[derive(Clone, Default)]
pub struct ManualFrames {
    queue: Rc<RefCell<Vec<FrameCallback>>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the callbacks requested so far. Callbacks requested while firing
    /// wait for the next call. Returns how many ran.
    pub fn fire(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }

    /// Fire frames until none are pending, at most `max_frames` times.
    /// Returns the number of frames fired.
    pub fn settle(&self, max_frames: usize) -> usize {
        let mut fired = 0;
        while fired < max_frames && self.pending() > 0 {
            self.fire();
            fired += 1;
        }
        fired
    }

    /// Fire pending frames on a fixed interval, forever. Must run on a
    /// local task set since frames are not `Send`.
    pub async fn drive(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.fire();
        }
    }
}

impl FrameRequester for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue.borrow_mut().push(callback);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unexpected frame callback: no render was pending")]
    UnexpectedFrame,

    #[error("Frame callback fired while a paint was in progress")]
    Reentrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No frame requested.
    Idle,
    /// A frame is requested and a model waits to be painted.
    Pending,
    /// Painted; the extra frame requested after the paint is outstanding.
    PendingWithExtra,
}

struct Inner<S> {
    state: Cell<RenderState>,
    latest: RefCell<Option<S>>,
    paint: RefCell<Box<dyn FnMut(&S)>>,
    frames: Rc<dyn FrameRequester>,
}

/// Coalesces schedules into at most one paint per frame.
pub struct RenderScheduler<S> {
    inner: Rc<Inner<S>>,
}

impl<S> Clone for RenderScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Clone + 'static> RenderScheduler<S> {
    pub fn new(frames: Rc<dyn FrameRequester>, paint: impl FnMut(&S) + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: Cell::new(RenderState::Idle),
                latest: RefCell::new(None),
                paint: RefCell::new(Box::new(paint)),
                frames,
            }),
        }
    }

    pub fn state(&self) -> RenderState {
        self.inner.state.get()
    }

    /// Record `model` as the one to paint next. Only the first schedule
    /// after going idle requests a frame; later ones just replace the model.
    pub fn schedule(&self, model: S) {
        *self.inner.latest.borrow_mut() = Some(model);
        if self.inner.state.get() == RenderState::Idle {
            self.request();
        }
        tracing::trace!(previous = ?self.inner.state.get(), "render scheduled");
        self.inner.state.set(RenderState::Pending);
    }

    /// Paint callback body. Hosts that drive frames themselves call this
    /// directly; a frame while idle is an invariant violation.
    ///
    /// A paint always requests one extra frame. If nothing was scheduled by
    /// then, that frame returns the scheduler to idle without painting.
    pub fn frame(&self) -> Result<(), RenderError> {
        match self.inner.state.get() {
            RenderState::Idle => {
                tracing::error!("frame callback fired with no pending render");
                Err(RenderError::UnexpectedFrame)
            }
            RenderState::Pending => {
                self.request();
                self.inner.state.set(RenderState::PendingWithExtra);
                self.paint_latest()
            }
            RenderState::PendingWithExtra => {
                self.inner.state.set(RenderState::Idle);
                Ok(())
            }
        }
    }

    fn paint_latest(&self) -> Result<(), RenderError> {
        let Some(model) = self.inner.latest.borrow().clone() else {
            return Ok(());
        };
        let Ok(mut paint) = self.inner.paint.try_borrow_mut() else {
            tracing::error!("frame callback re-entered a paint");
            return Err(RenderError::Reentrant);
        };
        tracing::debug!("painting latest model");
        (*paint)(&model);
        Ok(())
    }

    fn request(&self) {
        let weak: Weak<Inner<S>> = Rc::downgrade(&self.inner);
        self.inner.frames.request_frame(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(err) = (RenderScheduler { inner }).frame() {
                tracing::error!(error = %err, "render frame failed");
            }
        }));
    }
}
