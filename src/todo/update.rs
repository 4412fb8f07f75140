use super::action::TodoAction;
use super::state::{Todo, Todos};
use super::TodoEffect;
use crate::app::Transition;
use crate::storage::WriteSnapshot;

pub type TodoTransition = Transition<Todos, TodoEffect>;

/// Pure state transition. Every change to the persisted part of the model
/// carries one snapshot write.
pub fn update(model: &Todos, action: TodoAction) -> TodoTransition {
    match action {
        TodoAction::None => Transition::pure(model.clone()),

        TodoAction::UpdatePending(pending) => Transition::pure(Todos {
            pending,
            ..model.clone()
        }),

        TodoAction::AddTodo => {
            let text = model.pending.trim();
            if text.is_empty() {
                return Transition::pure(model.clone());
            }
            let mut next = model.clone();
            next.todos.push(Todo::new(model.fresh, text));
            next.pending.clear();
            next.fresh += 1;
            persist(next)
        }

        TodoAction::UpdateTodo { id, text } => persist(modify_where(model, id, |t| t.text = text)),

        TodoAction::ToggleTodo { id, completed } => {
            persist(modify_where(model, id, |t| t.completed = completed))
        }

        TodoAction::EditingTodo { id, editing } => {
            Transition::pure(modify_where(model, id, |t| t.editing = editing))
        }

        TodoAction::DeleteTodo(id) => {
            let mut next = model.clone();
            next.todos.retain(|t| t.id != id);
            persist(next)
        }

        TodoAction::DeleteCompleted => {
            let mut next = model.clone();
            next.todos.retain(|t| !t.completed);
            persist(next)
        }

        TodoAction::ToggleAll(completed) => {
            let mut next = model.clone();
            for todo in &mut next.todos {
                todo.completed = completed;
            }
            persist(next)
        }

        TodoAction::ChangeVisibility(visibility) => Transition::pure(Todos {
            visibility,
            ..model.clone()
        }),
    }
}

fn persist(model: Todos) -> TodoTransition {
    let write = WriteSnapshot::new(model.to_stored());
    Transition::pure(model).with_effect(write)
}

fn modify_where(model: &Todos, id: u64, modify: impl FnOnce(&mut Todo)) -> Todos {
    let mut next = model.clone();
    if let Some(todo) = next.todos.iter_mut().find(|t| t.id == id) {
        modify(todo);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::Visibility;

    fn with_pending(text: &str) -> Todos {
        Todos {
            pending: text.to_string(),
            ..Todos::default()
        }
    }

    #[test]
    fn add_todo_takes_pending_text_and_persists() {
        let next = update(&with_pending("  buy milk "), TodoAction::AddTodo);
        assert_eq!(next.model.todos, vec![Todo::new(0, "buy milk")]);
        assert_eq!(next.model.pending, "");
        assert_eq!(next.model.fresh, 1);
        assert_eq!(next.effects, vec![WriteSnapshot::new(next.model.to_stored())]);
    }

    #[test]
    fn blank_pending_adds_nothing() {
        let model = with_pending("   ");
        let next = update(&model, TodoAction::AddTodo);
        assert_eq!(next.model, model);
        assert!(next.effects.is_empty());
    }

    #[test]
    fn view_only_changes_do_not_persist() {
        let model = Todos::default();
        let pending = update(&model, TodoAction::UpdatePending("x".into()));
        assert!(pending.effects.is_empty());
        let filter = update(&model, TodoAction::ChangeVisibility(Visibility::Active));
        assert!(filter.effects.is_empty());
        assert_eq!(filter.model.visibility, Visibility::Active);
    }

    #[test]
    fn editing_flag_is_not_persisted() {
        let model = update(&with_pending("a"), TodoAction::AddTodo).model;

        let start = update(&model, TodoAction::EditingTodo { id: 0, editing: true });
        assert!(start.model.todos[0].editing);
        assert!(start.effects.is_empty());

        let stop = update(&start.model, TodoAction::EditingTodo { id: 0, editing: false });
        assert!(!stop.model.todos[0].editing);
        assert!(stop.effects.is_empty());
    }

    #[test]
    fn toggle_all_and_delete_completed() {
        let mut model = Todos::default();
        for text in ["a", "b", "c"] {
            model = update(&Todos { pending: text.into(), ..model }, TodoAction::AddTodo).model;
        }
        let model = update(&model, TodoAction::ToggleTodo { id: 1, completed: true }).model;
        assert_eq!(model.remaining(), 2);

        let all = update(&model, TodoAction::ToggleAll(true)).model;
        assert_eq!(all.remaining(), 0);

        let cleared = update(&model, TodoAction::DeleteCompleted).model;
        let ids: Vec<u64> = cleared.todos.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn unknown_id_leaves_todos_unchanged() {
        let model = update(&with_pending("a"), TodoAction::AddTodo).model;
        let next = update(&model, TodoAction::UpdateTodo { id: 42, text: "z".into() });
        assert_eq!(next.model, model);
    }
}
