use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    /// UI-only; not persisted.
    #[serde(default, skip_serializing)]
    pub editing: bool,
}

impl Todo {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            editing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    All,
    Active,
    Completed,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::All, Visibility::Active, Visibility::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::All => "all",
            Visibility::Active => "active",
            Visibility::Completed => "completed",
        }
    }

    pub fn admits(self, todo: &Todo) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Active => !todo.completed,
            Visibility::Completed => todo.completed,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Visibility::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown filter '{s}' (expected all, active or completed)"))
    }
}

/// Application model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Todos {
    pub todos: Vec<Todo>,
    /// Text of the new-todo input.
    pub pending: String,
    /// Next id to hand out.
    pub fresh: u64,
    pub visibility: Visibility,
}

impl Todos {
    pub fn from_stored(stored: Option<StoredTodos>) -> Self {
        match stored {
            Some(stored) => Self {
                todos: stored.todos,
                fresh: stored.fresh,
                ..Self::default()
            },
            None => Self::default(),
        }
    }

    pub fn to_stored(&self) -> StoredTodos {
        StoredTodos {
            todos: self.todos.clone(),
            fresh: self.fresh,
        }
    }

    pub fn find(&self, id: u64) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn visible(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(move |t| self.visibility.admits(t))
    }

    pub fn remaining(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }
}

/// Persisted part of the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTodos {
    pub todos: Vec<Todo>,
    pub fresh: u64,
}
