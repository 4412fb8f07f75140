//! Application driver.
//!
//! # Architecture
//!
//! ```text
//! push(action) ──→ queue ──→ update ──→ model ──→ commit ──→ render scheduler
//!      ↑                       │                    │
//!      │                    effects            subscriptions
//!      │                       ↓                    ↓
//!      └────────────────── interpreter (Either<Effect, Sub>)
//! ```
//!
//! - **Component**: pure `init` / `update` / `render` / `subscriptions`
//! - **AppInstance**: the host-facing handle (push, run, snapshot, restore,
//!   subscribe)

mod component;
mod driver;
mod subscribers;

use crate::interpreter::Either;

pub use component::{Component, Transition};
pub use driver::{make, AppInstance, AppInterpreter, AppOptions, RenderTarget};
pub use subscribers::Unsubscribe;

/// Delivered to subscribers after every processed action.
#[derive(Debug, Clone, PartialEq)]
pub struct AppChange<S, A> {
    pub old: S,
    pub action: A,
    pub model: S,
}

/// Inputs of the application queue.
pub enum AppAction<C: Component> {
    /// Queued once by `make` so the first run commits and starts the
    /// initial subscriptions even when nothing else is pending.
    Start,
    /// Swap the model without running `update`.
    Restore(C::Model),
    Action(C::Action),
    /// Effect or subscription bound for the interpreter.
    Interpret(Either<C::Effect, C::Sub>),
}
