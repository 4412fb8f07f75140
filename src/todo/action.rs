use super::state::Visibility;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoAction {
    None,
    UpdatePending(String),
    /// Turn the pending text into a todo.
    AddTodo,
    UpdateTodo { id: u64, text: String },
    ToggleTodo { id: u64, completed: bool },
    EditingTodo { id: u64, editing: bool },
    DeleteTodo(u64),
    DeleteCompleted,
    /// Set every todo's completed flag.
    ToggleAll(bool),
    ChangeVisibility(Visibility),
}
