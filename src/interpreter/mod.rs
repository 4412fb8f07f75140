//! Effect interpreter combinators.
//!
//! Interpreters are ordinary [`Process`]es over an effect channel. Two
//! channels are combined with [`merge_interpreter`] over [`Either`], an
//! application with no effects of some kind uses [`interpret_never`], and
//! callback-style handlers are lifted with [`lift_cont`].

use std::convert::Infallible;

use crate::queue::{with_cont, BoxLoop, Loop, Process, QueueHandle};

/// Two-way tagged union used to share one effect channel between two
/// independent interpreters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    pub fn map_left<T>(self, f: impl FnOnce(L) -> T) -> Either<T, R> {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    pub fn map_right<T>(self, f: impl FnOnce(R) -> T) -> Either<L, T> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(f(r)),
        }
    }

    /// Collapse both sides into one value.
    pub fn either<T>(self, left: impl FnOnce(L) -> T, right: impl FnOnce(R) -> T) -> T {
        match self {
            Either::Left(l) => left(l),
            Either::Right(r) => right(r),
        }
    }
}

/// Run two interpreters side by side over `Either<F, G>`.
///
/// Each input is routed to the matching side only; every commit of the
/// merged queue commits both sides.
pub fn merge_interpreter<F, G, O>(lhs: Process<F, O>, rhs: Process<G, O>) -> Process<Either<F, G>, O>
where
    F: 'static,
    G: 'static,
    O: 'static,
{
    Box::new(move |queue: QueueHandle<O>| -> BoxLoop<Either<F, G>> {
        let left = lhs(queue.clone());
        let right = rhs(queue);
        Box::new(Merged { left, right })
    })
}

struct Merged<F, G> {
    left: BoxLoop<F>,
    right: BoxLoop<G>,
}

impl<F: 'static, G: 'static> Loop<Either<F, G>> for Merged<F, G> {
    fn step(self: Box<Self>, input: Either<F, G>) -> BoxLoop<Either<F, G>> {
        let Merged { left, right } = *self;
        match input {
            Either::Left(effect) => Box::new(Merged {
                left: left.step(effect),
                right,
            }),
            Either::Right(effect) => Box::new(Merged {
                left,
                right: right.step(effect),
            }),
        }
    }

    fn tick(self: Box<Self>) -> BoxLoop<Either<F, G>> {
        let Merged { left, right } = *self;
        Box::new(Merged {
            left: left.tick(),
            right: right.tick(),
        })
    }
}

/// Interpreter for a channel that never carries effects.
///
/// The channel type is uninhabited, so wiring real effects into it is
/// rejected by the compiler rather than discovered at runtime.
pub fn interpret_never<O: 'static>() -> Process<Infallible, O> {
    Box::new(|_: QueueHandle<O>| -> BoxLoop<Infallible> { Box::new(Never) })
}

struct Never;

impl Loop<Infallible> for Never {
    fn step(self: Box<Self>, input: Infallible) -> BoxLoop<Infallible> {
        match input {}
    }

    fn tick(self: Box<Self>) -> BoxLoop<Infallible> {
        self
    }
}

/// Completion callback handed to [`lift_cont`] handlers.
///
/// Resolving re-enters the driving queue through the same push/run door as
/// synchronous actions.
pub struct Resolver<O> {
    queue: QueueHandle<O>,
}

impl<O> Clone for Resolver<O> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<O: 'static> Resolver<O> {
    pub fn resolve(&self, value: O) {
        self.queue.push(value);
        self.queue.run();
    }
}

/// Wrap a callback-based effect handler as an interpreter.
pub fn lift_cont<F, O>(k: impl Fn(F, Resolver<O>) + 'static) -> Process<F, O>
where
    F: 'static,
    O: 'static,
{
    with_cont(move |queue: &QueueHandle<O>, effect: F| {
        k(
            effect,
            Resolver {
                queue: queue.clone(),
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_helpers() {
        let left: Either<u8, &str> = Either::Left(2);
        assert!(left.is_left());
        assert_eq!(left.map_left(|n| n * 2), Either::Left(4));

        let right: Either<u8, &str> = Either::Right("x");
        assert!(right.is_right());
        assert_eq!(right.either(|n| n.to_string(), |s| s.to_uppercase()), "X");
    }
}
