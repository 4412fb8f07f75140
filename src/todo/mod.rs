//! TodoMVC sample application.
//!
//! A plain client of the runtime: the reducer describes snapshot writes as
//! effects and never touches storage itself. Hosts pair it with
//! [`crate::storage::storage_interpreter`] on the effect channel and
//! [`crate::interpreter::interpret_never`] on the subscription channel.

mod action;
mod state;
mod update;
mod view;

use std::convert::Infallible;

use crate::app::{Component, Transition};
use crate::storage::{SnapshotStore, WriteSnapshot};
use crate::vdom::VNode;

pub use action::TodoAction;
pub use state::{StoredTodos, Todo, Todos, Visibility};
pub use update::{update, TodoTransition};
pub use view::render;

pub type TodoEffect = WriteSnapshot<StoredTodos>;

/// Todo component seeded from an optional stored snapshot.
#[derive(Debug, Clone, Default)]
pub struct TodoApp {
    stored: Option<StoredTodos>,
}

impl TodoApp {
    pub fn new(stored: Option<StoredTodos>) -> Self {
        Self { stored }
    }

    /// Seed from whatever `store` holds; a missing file starts empty.
    pub fn from_store(store: &SnapshotStore) -> crate::Result<Self> {
        let stored = store.load()?;
        tracing::debug!(path = %store.path().display(), restored = stored.is_some(), "todos loaded");
        Ok(Self::new(stored))
    }
}

impl Component for TodoApp {
    type Model = Todos;
    type Action = TodoAction;
    type Effect = TodoEffect;
    type Sub = Infallible;

    fn init(&self) -> Transition<Todos, TodoEffect> {
        Transition::pure(Todos::from_stored(self.stored.clone()))
    }

    fn update(&self, model: &Todos, action: TodoAction) -> Transition<Todos, TodoEffect> {
        update(model, action)
    }

    fn render(&self, model: &Todos) -> VNode<TodoAction> {
        render(model)
    }
}
