//! Trampolined event queue.
//!
//! A [`Process`] describes how to react to one input at a time. [`attach`]
//! turns a process into a running instance: inputs are buffered by
//! [`QueueHandle::push`] and drained by [`QueueHandle::run`], which loops
//! instead of recursing so bursts of any length never grow the call stack.
//!
//! ```text
//! push ──→ pending ──→ run() ──→ Loop::step ──→ ... ──→ Loop::tick ──→ parked
//!            ↑                        │
//!            └──── re-entrant push ───┘
//! ```

mod process;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

pub use process::{stepper, with_accum, with_accum_vec, with_cont, Accumulate};

/// State machine driving one process.
///
/// Both operations consume the current state and return the next one, so a
/// stale `Loop` can never be fed twice.
pub trait Loop<I> {
    /// Handle one input.
    fn step(self: Box<Self>, input: I) -> BoxLoop<I>;

    /// Commit: called once the pending buffer is momentarily empty.
    fn tick(self: Box<Self>) -> BoxLoop<I>;
}

pub type BoxLoop<I> = Box<dyn Loop<I>>;

/// Builds the initial [`Loop`] of a process given the handle its outputs go to.
pub type Process<I, O> = Box<dyn FnOnce(QueueHandle<O>) -> BoxLoop<I>>;

pub(crate) trait Sink<O> {
    fn push(&self, value: O);
    fn run(&self);
}

/// The push/run door of a running instance.
pub struct QueueHandle<O> {
    sink: Rc<dyn Sink<O>>,
}

impl<O> Clone for QueueHandle<O> {
    fn clone(&self) -> Self {
        Self {
            sink: Rc::clone(&self.sink),
        }
    }
}

impl<O: 'static> QueueHandle<O> {
    /// Append to the pending buffer. Never drains.
    pub fn push(&self, value: O) {
        self.sink.push(value);
    }

    /// Drain the pending buffer. A no-op when another drain of the same
    /// instance is already in progress.
    pub fn run(&self) {
        self.sink.run();
    }

    /// Adapt this handle to accept `P`, converting each value with `f`.
    pub fn map_input<P: 'static>(&self, f: impl Fn(P) -> O + 'static) -> QueueHandle<P> {
        QueueHandle {
            sink: Rc::new(MappedSink {
                inner: self.clone(),
                f,
            }),
        }
    }

    /// A handle that forwards every pushed value to `f`; `run` does nothing.
    pub fn from_fn(f: impl Fn(O) + 'static) -> Self {
        Self {
            sink: Rc::new(FnSink { f }),
        }
    }
}

struct MappedSink<O, F> {
    inner: QueueHandle<O>,
    f: F,
}

impl<P, O: 'static, F: Fn(P) -> O> Sink<P> for MappedSink<O, F> {
    fn push(&self, value: P) {
        self.inner.push((self.f)(value));
    }

    fn run(&self) {
        self.inner.run();
    }
}

struct FnSink<F> {
    f: F,
}

impl<O, F: Fn(O)> Sink<O> for FnSink<F> {
    fn push(&self, value: O) {
        (self.f)(value);
    }

    fn run(&self) {}
}

/// One running instance: the pending inputs plus the parked [`Loop`].
///
/// `parked` is empty exactly while a drain owns the machine.
struct Engine<I> {
    pending: RefCell<VecDeque<I>>,
    parked: RefCell<Option<BoxLoop<I>>>,
}

impl<I> Engine<I> {
    fn new() -> Self {
        Self {
            pending: RefCell::new(VecDeque::new()),
            parked: RefCell::new(None),
        }
    }

    fn next_input(&self) -> Option<I> {
        self.pending.borrow_mut().pop_front()
    }

    fn drain(&self) {
        let claimed = self.parked.borrow_mut().take();
        let Some(mut machine) = claimed else {
            return;
        };
        if self.pending.borrow().is_empty() {
            *self.parked.borrow_mut() = Some(machine);
            return;
        }

        let mut steps = 0usize;
        let mut commits = 0usize;
        loop {
            // The borrow on `pending` must end before the Loop runs: the
            // callback is free to push into this same instance.
            let next = self.next_input();
            match next {
                Some(input) => {
                    machine = machine.step(input);
                    steps += 1;
                }
                None => {
                    let committed = machine.tick();
                    commits += 1;
                    if self.pending.borrow().is_empty() {
                        *self.parked.borrow_mut() = Some(committed);
                        tracing::trace!(steps, commits, "queue drained");
                        return;
                    }
                    machine = committed;
                }
            }
        }
    }
}

impl<I> Sink<I> for Engine<I> {
    fn push(&self, value: I) {
        self.pending.borrow_mut().push_back(value);
    }

    fn run(&self) {
        self.drain();
    }
}

/// Handle given to the process itself; it does not keep the engine alive.
struct WeakEngine<I>(Weak<Engine<I>>);

impl<I> Sink<I> for WeakEngine<I> {
    fn push(&self, value: I) {
        match self.0.upgrade() {
            Some(engine) => engine.push(value),
            None => tracing::trace!("push to a detached queue ignored"),
        }
    }

    fn run(&self) {
        if let Some(engine) = self.0.upgrade() {
            engine.drain();
        }
    }
}

/// Start a process whose outputs feed back into its own input buffer.
///
/// Nothing is processed until the first [`QueueHandle::run`].
pub fn attach<I: 'static>(process: Process<I, I>) -> QueueHandle<I> {
    let engine = Rc::new(Engine::new());
    let own = QueueHandle {
        sink: Rc::new(WeakEngine(Rc::downgrade(&engine))) as Rc<dyn Sink<I>>,
    };
    let machine = process(own);
    *engine.parked.borrow_mut() = Some(machine);
    QueueHandle {
        sink: engine as Rc<dyn Sink<I>>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter {
        seen: Rc<Cell<usize>>,
    }

    impl Loop<u32> for Counter {
        fn step(self: Box<Self>, _input: u32) -> BoxLoop<u32> {
            self.seen.set(self.seen.get() + 1);
            self
        }

        fn tick(self: Box<Self>) -> BoxLoop<u32> {
            self
        }
    }

    #[test]
    fn nothing_runs_before_run() {
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let queue = attach(Box::new(move |_: QueueHandle<u32>| -> BoxLoop<u32> {
            Box::new(Counter { seen: counter })
        }));

        queue.push(1);
        queue.push(2);
        assert_eq!(seen.get(), 0);

        queue.run();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn run_on_idle_instance_is_noop() {
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let queue = attach(Box::new(move |_: QueueHandle<u32>| -> BoxLoop<u32> {
            Box::new(Counter { seen: counter })
        }));

        queue.run();
        queue.run();
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn map_input_converts_before_push() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let handle = QueueHandle::from_fn(move |v: String| log.borrow_mut().push(v));
        let mapped = handle.map_input(|n: u32| format!("#{n}"));

        mapped.push(7);
        mapped.run();
        assert_eq!(*seen.borrow(), vec!["#7".to_string()]);
    }
}
