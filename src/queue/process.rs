//! Process constructors layered on the queue engine.

use std::marker::PhantomData;

use super::{BoxLoop, Loop, Process, QueueHandle};

/// Stateless process: every input is mapped with `f` and forwarded to the
/// output handle, which is run immediately.
pub fn stepper<I, O>(f: impl Fn(I) -> O + 'static) -> Process<I, O>
where
    I: 'static,
    O: 'static,
{
    Box::new(move |next: QueueHandle<O>| -> BoxLoop<I> {
        Box::new(Stepper { f, next })
    })
}

struct Stepper<F, O> {
    f: F,
    next: QueueHandle<O>,
}

impl<I, O, F> Loop<I> for Stepper<F, O>
where
    O: 'static,
    F: Fn(I) -> O + 'static,
{
    fn step(self: Box<Self>, input: I) -> BoxLoop<I> {
        self.next.push((self.f)(input));
        self.next.run();
        self
    }

    fn tick(self: Box<Self>) -> BoxLoop<I> {
        self
    }
}

/// Process that hands every input to a side-effecting continuation.
///
/// The continuation receives the output handle so work that completes later
/// can `push` + `run` its results.
pub fn with_cont<I, O>(k: impl Fn(&QueueHandle<O>, I) + 'static) -> Process<I, O>
where
    I: 'static,
    O: 'static,
{
    Box::new(move |next: QueueHandle<O>| -> BoxLoop<I> {
        Box::new(Cont { k, next })
    })
}

struct Cont<K, O> {
    k: K,
    next: QueueHandle<O>,
}

impl<I, O, K> Loop<I> for Cont<K, O>
where
    O: 'static,
    K: Fn(&QueueHandle<O>, I) + 'static,
{
    fn step(self: Box<Self>, input: I) -> BoxLoop<I> {
        (self.k)(&self.next, input);
        self
    }

    fn tick(self: Box<Self>) -> BoxLoop<I> {
        self
    }
}

/// Explicit-state process description: fold inputs with `update`, flush
/// with `commit`.
pub trait Accumulate<I> {
    type State;

    fn update(&self, state: Self::State, input: I) -> Self::State;

    fn commit(&self, state: Self::State) -> Self::State;
}

/// Build a process from an [`Accumulate`] description and its initial state.
pub fn with_accum<I, O, A>(make: impl FnOnce(QueueHandle<O>) -> (A, A::State) + 'static) -> Process<I, O>
where
    I: 'static,
    O: 'static,
    A: Accumulate<I> + 'static,
    A::State: 'static,
{
    Box::new(move |next: QueueHandle<O>| -> BoxLoop<I> {
        let (spec, state) = make(next);
        Box::new(AccumLoop {
            spec,
            state,
            _input: PhantomData,
        })
    })
}

struct AccumLoop<A: Accumulate<I>, I> {
    spec: A,
    state: A::State,
    _input: PhantomData<fn(I)>,
}

impl<I, A> Loop<I> for AccumLoop<A, I>
where
    I: 'static,
    A: Accumulate<I> + 'static,
    A::State: 'static,
{
    fn step(self: Box<Self>, input: I) -> BoxLoop<I> {
        let AccumLoop { spec, state, _input } = *self;
        let state = spec.update(state, input);
        Box::new(AccumLoop {
            spec,
            state,
            _input,
        })
    }

    fn tick(self: Box<Self>) -> BoxLoop<I> {
        let AccumLoop { spec, state, _input } = *self;
        let state = spec.commit(state);
        Box::new(AccumLoop {
            spec,
            state,
            _input,
        })
    }
}

/// Batch every input since the last commit and hand the batch, in arrival
/// order, to the callback built by `make`. The buffer is empty again after
/// each commit.
pub fn with_accum_vec<I, O, F>(make: impl FnOnce(QueueHandle<O>) -> F + 'static) -> Process<I, O>
where
    I: 'static,
    O: 'static,
    F: Fn(Vec<I>) + 'static,
{
    with_accum(move |next: QueueHandle<O>| (Batch { flush: make(next) }, Vec::new()))
}

struct Batch<F> {
    flush: F,
}

impl<I, F: Fn(Vec<I>)> Accumulate<I> for Batch<F> {
    type State = Vec<I>;

    fn update(&self, mut state: Vec<I>, input: I) -> Vec<I> {
        state.push(input);
        state
    }

    fn commit(&self, state: Vec<I>) -> Vec<I> {
        (self.flush)(state);
        Vec::new()
    }
}
