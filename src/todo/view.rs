//! TodoMVC markup. Header, list and footer are thunks keyed on the parts of
//! the model they read, so typing in the new-todo field re-renders only the
//! header.

use super::action::TodoAction;
use super::state::{Todo, Todos, Visibility};
use crate::vdom::{h, lazy, lazy2, lazy_keyed, on_check, on_click, on_input, on_key, text, VNode};

type Html = VNode<TodoAction>;

pub fn render(model: &Todos) -> Html {
    h(
        "div.todomvc-wrapper",
        [
            h(
                "section.todoapp",
                [
                    lazy("header.header", render_input, model.pending.clone()),
                    lazy2("section.main", render_todos, model.visibility, model.todos.clone()),
                    lazy2("footer.footer", render_control, model.visibility, model.todos.clone()),
                ],
            ),
            lazy("footer.info", render_info, ()),
        ],
    )
}

fn render_input(pending: &String) -> Html {
    let input = h("input.new-todo", [])
        .attr("placeholder", "What needs to be done?")
        .prop("value", pending.as_str())
        .prop("type", "text")
        .prop("autofocus", true)
        .prop("name", "newTodo");
    let input = on_input(input, TodoAction::UpdatePending);
    let input = on_key(input, |key, _| match key {
        "Enter" => Some(TodoAction::AddTodo),
        "Escape" => Some(TodoAction::UpdatePending(String::new())),
        _ => None,
    });
    h("header.header", [h("h1", [text("todos")]), input])
}

fn render_todos(visibility: &Visibility, todos: &Vec<Todo>) -> Html {
    let all_completed = todos.iter().all(|t| t.completed);
    let toggle_all = h("input.toggle-all", [])
        .attr("id", "toggle-all")
        .prop("type", "checkbox")
        .prop("name", "toggle")
        .prop("checked", all_completed);
    let toggle_all = on_check(toggle_all, move |_| TodoAction::ToggleAll(!all_completed));

    let items = todos
        .iter()
        .filter(|t| visibility.admits(t))
        .map(|t| lazy_keyed("li", t.id.to_string(), render_todo, t.clone()));

    let style = if todos.is_empty() {
        "visibility: hidden"
    } else {
        "visibility: visible"
    };
    h(
        "section.main",
        [
            toggle_all,
            h("label", [text("Mark all as completed")]).attr("for", "toggle-all"),
            h("ul.todo-list", items),
        ],
    )
    .attr("style", style)
}

fn render_todo(todo: &Todo) -> Html {
    let body = if todo.editing {
        render_todo_input(todo)
    } else {
        render_todo_desc(todo)
    };
    h("li", [body])
        .class("completed", todo.completed)
        .class("editing", todo.editing)
}

fn render_todo_input(todo: &Todo) -> Html {
    let id = todo.id;
    let input = h("input.edit", [])
        .prop("type", "text")
        .prop("value", todo.text.as_str())
        .on("blur", move |_| Some(TodoAction::EditingTodo { id, editing: false }));
    let input = on_input(input, move |text| TodoAction::UpdateTodo { id, text });
    on_key(input, move |key, _| match key {
        "Enter" | "Escape" => Some(TodoAction::EditingTodo { id, editing: false }),
        _ => None,
    })
}

fn render_todo_desc(todo: &Todo) -> Html {
    let id = todo.id;
    let toggle = h("input.toggle", [])
        .prop("type", "checkbox")
        .prop("checked", todo.completed);
    h(
        "div.view",
        [
            on_check(toggle, move |completed| TodoAction::ToggleTodo { id, completed }),
            h("label", [text(todo.text.clone())])
                .on("dblclick", move |_| Some(TodoAction::EditingTodo { id, editing: true })),
            on_click(h("button.destroy", []).prop("type", "button"), TodoAction::DeleteTodo(id)),
        ],
    )
}

fn render_control(visibility: &Visibility, todos: &Vec<Todo>) -> Html {
    let completed = todos.iter().filter(|t| t.completed).count();
    let left = todos.len() - completed;
    let footer = h(
        "footer.footer",
        [
            lazy("span.todo-count", render_count, left),
            lazy("ul.filters", render_filters, *visibility),
            lazy("button.clear-completed", render_clear, completed),
        ],
    );
    if todos.is_empty() {
        footer.attr("hidden", "")
    } else {
        footer
    }
}

fn render_count(count: &usize) -> Html {
    let suffix = if *count == 1 { " item left" } else { " items left" };
    h("span.todo-count", [h("strong", [text(count.to_string())]), text(suffix)])
}

fn render_filters(active: &Visibility) -> Html {
    h(
        "ul.filters",
        Visibility::ALL.into_iter().map(|item| {
            let link = h("a", [text(item.as_str())])
                .class("active", *active == item)
                .attr("href", format!("#/{item}"));
            h("li", [on_click(link, TodoAction::ChangeVisibility(item))])
        }),
    )
}

fn render_clear(completed: &usize) -> Html {
    let button = on_click(
        h("button.clear-completed", [text(format!("Clear completed ({completed})"))]),
        TodoAction::DeleteCompleted,
    );
    if *completed == 0 {
        button.attr("hidden", "")
    } else {
        button
    }
}

fn render_info(_: &()) -> Html {
    h(
        "footer.info",
        [
            h("p", [text("Double-click to edit a todo")]),
            h(
                "p",
                [
                    text("Part of "),
                    h("a", [text("TodoMVC")]).attr("href", "http://todomvc.com"),
                ],
            ),
        ],
    )
}
