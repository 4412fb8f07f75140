//! Patching display trees onto the in-memory host.

mod common;

use common::*;
use serde_json::json;
use tealoop::dom::{DomEvent, ElementId};
use tealoop::vdom::{h, on_click, text, AnyMsg, VNode};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Msg {
    Pressed,
    Created(ElementId),
    Removed(ElementId),
}

fn msgs(raw: Vec<AnyMsg>) -> Vec<Msg> {
    raw.into_iter()
        .map(|m| *m.downcast::<Msg>().expect("Msg"))
        .collect()
}

fn field(placeholder: Option<&str>, value: &str, on: bool) -> VNode<Msg> {
    let mut input = h("input.field", []).prop("value", value).class("on", on);
    if let Some(placeholder) = placeholder {
        input = input.attr("placeholder", placeholder);
    }
    h("div", [input])
}

#[test]
fn attributes_properties_and_classes_follow_the_tree() {
    let (emit, _) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);

    stage.patch(field(Some("What needs to be done?"), "milk", true));
    let input = stage.query("input.field").expect("input");
    {
        let dom = stage.dom.borrow();
        assert_eq!(dom.attribute(input, "placeholder"), Some("What needs to be done?"));
        assert_eq!(dom.property(input, "value"), Some(&json!("milk")));
        assert!(dom.has_class(input, "on"));
    }

    stage.patch(field(None, "eggs", false));
    assert_eq!(stage.query("input.field"), Some(input), "element is reused");
    let dom = stage.dom.borrow();
    assert_eq!(dom.attribute(input, "placeholder"), None);
    assert_eq!(dom.property(input, "value"), Some(&json!("eggs")));
    assert!(!dom.has_class(input, "on"));
    assert!(dom.has_class(input, "field"), "selector classes stay");
}

#[test]
fn changed_text_is_updated_in_place() {
    let (emit, _) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);

    stage.patch(h::<Msg>("div", [h("p", [text("before")])]));
    stage.dom.borrow_mut().reset_stats();

    stage.patch(h::<Msg>("div", [h("p", [text("after")])]));
    let stats = stage.dom.borrow().stats();
    assert_eq!(stats.text_updates, 1);
    assert_eq!(stats.created, 0);
    assert_eq!(stats.removed, 0);
    assert_eq!(stage.html(), "<div><p>after</p></div>");
}

#[test]
fn unkeyed_children_grow_and_shrink_at_the_end() {
    let (emit, _) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);
    let list = |n: usize| h::<Msg>("div", (0..n).map(|i| h("span", [text(i.to_string())])));

    stage.patch(list(2));
    stage.dom.borrow_mut().reset_stats();

    stage.patch(list(4));
    assert_eq!(stage.dom.borrow().stats().created, 4, "two spans plus their text");
    assert_eq!(
        stage.html(),
        "<div><span>0</span><span>1</span><span>2</span><span>3</span></div>"
    );

    stage.dom.borrow_mut().reset_stats();
    stage.patch(list(1));
    assert_eq!(stage.dom.borrow().stats().removed, 3);
    assert_eq!(stage.html(), "<div><span>0</span></div>");
}

#[test]
fn changed_selector_replaces_the_element() {
    let (emit, _) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);

    stage.patch(h::<Msg>("div", [h("p", [text("x")])]));
    let p = stage.query("p").expect("p");

    stage.patch(h::<Msg>("div", [h("section", [text("x")])]));
    assert!(!stage.dom.borrow().contains(p));
    assert_eq!(stage.html(), "<div><section>x</section></div>");
}

#[test]
fn handlers_emit_their_messages() {
    let (emit, seen) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);

    stage.patch(h("div", [on_click(h("button", [text("go")]), Msg::Pressed)]));
    let button = stage.query("button").expect("button");

    assert!(stage.fire(DomEvent::new("click", button)));
    assert!(stage.fire(DomEvent::new("click", button)));
    assert_eq!(*seen.borrow(), vec![Msg::Pressed, Msg::Pressed]);
    assert!(!stage.fire(DomEvent::new("keyup", button)), "nothing listens for keyup");
}

#[test]
fn dropped_handler_removes_the_host_listener() {
    let (emit, seen) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);

    stage.patch(h("div", [on_click(h("button", []), Msg::Pressed)]));
    let button = stage.query("button").expect("button");
    stage.dom.borrow_mut().reset_stats();

    stage.patch(h::<Msg>("div", [h("button", [])]));
    assert_eq!(stage.dom.borrow().stats().listeners_removed, 1);
    assert!(stage.dom.borrow().listener_names(button).is_empty());
    assert!(!stage.fire(DomEvent::new("click", button)));
    assert!(seen.borrow().is_empty());
}

#[test]
fn removed_subtree_releases_nested_listeners() {
    let (emit, _) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);

    stage.patch(h(
        "div",
        [h("section", [on_click(h("button", []), Msg::Pressed)])],
    ));
    stage.dom.borrow_mut().reset_stats();

    stage.patch(h::<Msg>("div", []));
    let stats = stage.dom.borrow().stats();
    assert_eq!(stats.listeners_removed, 1);
    assert_eq!(stats.removed, 1, "only the subtree root is detached");
}

#[test]
fn ref_callbacks_report_created_and_removed_elements() {
    let (emit, _) = typed_emit::<Msg>();
    let mut stage = Stage::new(emit);
    let tracked = || {
        h::<Msg>("ul", [h("li", [])])
            .on_created(|el| Some(Msg::Created(el)))
            .on_removed(|el| Some(Msg::Removed(el)))
    };

    let created = msgs(stage.patch(h("div", [tracked()])));
    let ul = stage.query("ul").expect("ul");
    assert_eq!(created, vec![Msg::Created(ul)]);

    let untouched = msgs(stage.patch(h("div", [tracked()])));
    assert!(untouched.is_empty(), "patching in place raises nothing");

    let removed = msgs(stage.patch(h::<Msg>("div", [])));
    assert_eq!(removed, vec![Msg::Removed(ul)]);
}
