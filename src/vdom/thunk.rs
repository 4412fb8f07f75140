//! Memoized subtrees.
//!
//! A thunk stores a render function and its arguments instead of children.
//! On re-patch the previous realized subtree is reused as long as the render
//! function is the same and every argument compares equal slot by slot.

use std::any::Any;
use std::rc::Rc;

use super::map::apply_transform;
use super::{Node, NodeData, VNode};

/// Argument slot of a thunk, compared with `PartialEq` after a type check.
pub trait ThunkArg {
    fn as_any(&self) -> &dyn Any;

    fn same_as(&self, other: &dyn ThunkArg) -> bool;
}

impl<T: PartialEq + 'static> ThunkArg for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn ThunkArg) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

pub(crate) struct Thunk {
    pub(crate) sel: String,
    /// Address of the render function.
    render_id: usize,
    args: Vec<Rc<dyn ThunkArg>>,
    render: Rc<dyn Fn() -> Node>,
}

impl Thunk {
    /// Whether a subtree rendered by `previous` can stand in for `self`.
    pub(crate) fn matches(&self, previous: &Thunk) -> bool {
        self.render_id == previous.render_id
            && self.args.len() == previous.args.len()
            && self
                .args
                .iter()
                .zip(&previous.args)
                .all(|(cur, old)| cur.same_as(old.as_ref()))
    }
}

fn placeholder<A>(sel: &str, key: Option<String>, thunk: Thunk) -> VNode<A> {
    VNode::from_node(Node {
        sel: Some(sel.to_string()),
        data: NodeData {
            key,
            thunk: Some(Rc::new(thunk)),
            ..NodeData::default()
        },
        ..Node::default()
    })
}

/// Memoized subtree rendered by `render(&arg)`.
pub fn lazy<A, T>(sel: &str, render: fn(&T) -> VNode<A>, arg: T) -> VNode<A>
where
    A: 'static,
    T: PartialEq + 'static,
{
    lazy_with_key(sel, None, render, arg)
}

/// Keyed variant of [`lazy`], for use among keyed siblings.
pub fn lazy_keyed<A, T>(sel: &str, key: impl Into<String>, render: fn(&T) -> VNode<A>, arg: T) -> VNode<A>
where
    A: 'static,
    T: PartialEq + 'static,
{
    lazy_with_key(sel, Some(key.into()), render, arg)
}

fn lazy_with_key<A, T>(sel: &str, key: Option<String>, render: fn(&T) -> VNode<A>, arg: T) -> VNode<A>
where
    A: 'static,
    T: PartialEq + 'static,
{
    let arg = Rc::new(arg);
    let captured = Rc::clone(&arg);
    let thunk = Thunk {
        sel: sel.to_string(),
        render_id: render as usize,
        args: vec![arg as Rc<dyn ThunkArg>],
        render: Rc::new(move || render(&captured).into_node()),
    };
    placeholder(sel, key, thunk)
}

pub fn lazy2<A, T, U>(sel: &str, render: fn(&T, &U) -> VNode<A>, a: T, b: U) -> VNode<A>
where
    A: 'static,
    T: PartialEq + 'static,
    U: PartialEq + 'static,
{
    let (a, b) = (Rc::new(a), Rc::new(b));
    let (ca, cb) = (Rc::clone(&a), Rc::clone(&b));
    let thunk = Thunk {
        sel: sel.to_string(),
        render_id: render as usize,
        args: vec![a as Rc<dyn ThunkArg>, b as Rc<dyn ThunkArg>],
        render: Rc::new(move || render(&ca, &cb).into_node()),
    };
    placeholder(sel, None, thunk)
}

pub fn lazy3<A, T, U, V>(sel: &str, render: fn(&T, &U, &V) -> VNode<A>, a: T, b: U, c: V) -> VNode<A>
where
    A: 'static,
    T: PartialEq + 'static,
    U: PartialEq + 'static,
    V: PartialEq + 'static,
{
    let (a, b, c) = (Rc::new(a), Rc::new(b), Rc::new(c));
    let (ca, cb, cc) = (Rc::clone(&a), Rc::clone(&b), Rc::clone(&c));
    let thunk = Thunk {
        sel: sel.to_string(),
        render_id: render as usize,
        args: vec![
            a as Rc<dyn ThunkArg>,
            b as Rc<dyn ThunkArg>,
            c as Rc<dyn ThunkArg>,
        ],
        render: Rc::new(move || render(&ca, &cb, &cc).into_node()),
    };
    placeholder(sel, None, thunk)
}

/// Evaluate a thunk placeholder. The result carries the thunk's pending
/// transform but not the thunk itself; the patcher re-attaches it once the
/// result is realized.
pub(crate) fn render_thunk(placeholder: &Node) -> Option<Node> {
    let thunk = placeholder.data.thunk.as_ref()?;
    let mut rendered = (thunk.render)();
    if let Some(f) = &placeholder.data.cofn {
        apply_transform(f, &mut rendered, false);
    }
    tracing::debug!(sel = %thunk.sel, "thunk rendered");
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdom::{h, text};

    fn label(name: &String) -> VNode<()> {
        h("span", [text(name.clone())])
    }

    fn other(name: &String) -> VNode<()> {
        h("b", [text(name.clone())])
    }

    fn thunk_of(node: VNode<()>) -> Rc<Thunk> {
        node.into_node().data.thunk.expect("thunk")
    }

    #[test]
    fn equal_args_match() {
        let a = thunk_of(lazy("span", label, "x".to_string()));
        let b = thunk_of(lazy("span", label, "x".to_string()));
        assert!(b.matches(&a));
    }

    #[test]
    fn changed_arg_or_render_does_not_match() {
        let a = thunk_of(lazy("span", label, "x".to_string()));
        let b = thunk_of(lazy("span", label, "y".to_string()));
        let c = thunk_of(lazy("span", other, "x".to_string()));
        assert!(!b.matches(&a));
        assert!(!c.matches(&a));
    }

    #[test]
    fn arg_type_mismatch_does_not_match() {
        fn count(n: &u32) -> VNode<()> {
            text(n.to_string())
        }
        fn count64(n: &u64) -> VNode<()> {
            text(n.to_string())
        }
        let a = thunk_of(lazy("span", count, 1u32));
        let mut b = thunk_of(lazy("span", count64, 1u64));
        // Force the same render identity so only the argument check differs.
        if let Some(b) = Rc::get_mut(&mut b) {
            b.render_id = a.render_id;
        }
        assert!(!b.matches(&a));
    }

    #[test]
    fn render_thunk_evaluates_render() {
        let node = lazy("span", label, "hello".to_string()).into_node();
        let rendered = render_thunk(&node).expect("rendered");
        assert_eq!(rendered.sel(), Some("span"));
        assert!(!rendered.is_thunk());
        assert_eq!(rendered.children()[0].text(), Some("hello"));
    }
}
