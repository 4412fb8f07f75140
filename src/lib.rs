//! Single-threaded Elm-architecture runtime.
//!
//! Actions go through a trampolined event queue ([`queue`]), effects are
//! handled by composable interpreters ([`interpreter`]), and models are
//! rendered into a virtual tree ([`vdom`]) that is patched onto a host
//! display surface ([`dom`], [`patch`]) at most once per frame ([`render`]).
//! [`app`] wires a [`app::Component`] to all of it.

pub mod app;
pub mod config;
pub mod dom;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod patch;
pub mod queue;
pub mod render;
pub mod storage;
pub mod todo;
pub mod transport;
pub mod vdom;

pub use error::{Error, Result};
